//! Tunables for routing and tour optimisation.

use serde::{Deserialize, Serialize};

/// How a connection that breaks the wait or walk budget is priced when
/// optimising for transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPricing {
    /// Charge the configured penalty: discouraged, still usable.
    #[default]
    Penalty,
    /// Charge [`INFEASIBLE_WEIGHT`](super::INFEASIBLE_WEIGHT): only used when
    /// nothing else reaches the stop.
    Infeasible,
}

/// Coefficients that scale each heuristic into time or hop estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    /// km/h, for the distance heuristic under time.
    pub avg_bus_speed: f64,
    /// km, for the distance heuristic under transfers.
    pub avg_interstop_distance: f64,
    pub lines_count_to_time: f64,
    pub lines_count_to_transfers: f64,
    pub conn_count_to_time: f64,
    pub conn_count_to_transfers: f64,
    pub lines_overlap_to_time: f64,
    pub lines_overlap_to_transfers: f64,
    pub coverage_to_time: f64,
    pub coverage_to_transfers: f64,
    pub lines_popularity_to_time: f64,
    pub lines_popularity_to_transfers: f64,
    pub lines_avg_time_importance: f64,
    pub lines_avg_dist_importance: f64,
    /// Seconds, a typical ride between consecutive stops.
    pub avg_transfer_time: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            avg_bus_speed: 20.0,
            avg_interstop_distance: 0.5,
            lines_count_to_time: 600.0,
            lines_count_to_transfers: 1.0,
            conn_count_to_time: 3000.0,
            conn_count_to_transfers: 5.0,
            lines_overlap_to_time: 900.0,
            lines_overlap_to_transfers: 2.0,
            coverage_to_time: 300.0,
            coverage_to_transfers: 1.0,
            lines_popularity_to_time: 6000.0,
            lines_popularity_to_transfers: 10.0,
            lines_avg_time_importance: 1.0,
            lines_avg_dist_importance: 1.0,
            avg_transfer_time: 120.0,
        }
    }
}

/// Configuration for point-to-point routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Longest walk, in seconds, priced as a normal hop under transfers.
    pub allowed_walk_time: i32,
    /// Longest wait, in seconds, priced as a normal hop under transfers.
    pub allowed_wait_time: i32,
    /// Weight of a hop that breaks either budget.
    pub penalty: i64,
    pub transfer_pricing: TransferPricing,
    pub heuristic: HeuristicWeights,
}

impl BridgeConfig {
    pub fn new(allowed_walk_time: i32, allowed_wait_time: i32, penalty: i64) -> Self {
        Self {
            allowed_walk_time,
            allowed_wait_time,
            penalty,
            ..Self::default()
        }
    }

    pub fn with_transfer_pricing(mut self, pricing: TransferPricing) -> Self {
        self.transfer_pricing = pricing;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            allowed_walk_time: 600,  // 10 minutes
            allowed_wait_time: 1200, // 20 minutes
            penalty: 10,
            transfer_pricing: TransferPricing::Penalty,
            heuristic: HeuristicWeights::default(),
        }
    }
}

/// Configuration for the tour optimiser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabuConfig {
    pub max_iterations: usize,
    /// Length of the window of recent costs seen by aspiration.
    pub memory_size: usize,
    /// Tabu map bound used when a tour asks for one.
    pub tabu_limit: usize,
    /// Stop once the same local optimum repeats this many times.
    pub repetitions_limit: Option<usize>,
    /// Neighborhoods no larger than this are never sampled.
    pub min_sampling: usize,
}

impl TabuConfig {
    pub fn new(max_iterations: usize, memory_size: usize) -> Self {
        Self {
            max_iterations,
            memory_size,
            ..Self::default()
        }
    }
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            max_iterations: 40,
            memory_size: 5,
            tabu_limit: 20,
            repetitions_limit: Some(3),
            min_sampling: 6,
        }
    }
}
