//! Tour queries for the Tabu Search optimiser.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::time::parse_clock;
use crate::stops::StopIndex;

use super::formulation::{FormulationError, Parameter};

/// Stops of a closed tour in visiting order. The first stop is the anchor
/// the tour starts from and returns to.
pub type RoutePlan = Vec<String>;

/// Observer of each new best plan: `(previous, next, previous_cost, next_cost)`.
pub type PlanObserver = Arc<dyn Fn(&RoutePlan, &RoutePlan, f64, f64) + Send + Sync>;

/// When a tabu plan may be chosen anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspirationType {
    /// Its cost beats the mean of recent costs.
    Average,
    /// Its cost beats the worst recent cost.
    Max,
    /// Never.
    #[default]
    None,
}

impl AspirationType {
    /// Whether a tabu plan costing `cost` is admitted given recent costs.
    pub fn admits(self, memory: &[f64], cost: f64) -> bool {
        if memory.is_empty() {
            return false;
        }
        match self {
            AspirationType::Average => cost < memory.iter().sum::<f64>() / memory.len() as f64,
            AspirationType::Max => cost < memory.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AspirationType::None => false,
        }
    }
}

/// How the swap neighborhood is thinned before it is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingType {
    /// Keep plans whose total straight-line length is at most the mean.
    ByDistance,
    /// Keep plans whose consecutive stops share lines at least as well as the mean.
    ByOverlap,
    #[default]
    None,
}

/// A tour to optimise.
#[derive(Clone)]
pub struct TabuFormulation {
    pub stops: RoutePlan,
    /// Departure from the anchor, seconds since midnight.
    pub time: i32,
    pub parameter: Parameter,
    pub aspiration: AspirationType,
    /// Bound the tabu map at the configured size.
    pub tabu_limit: bool,
    pub sampling: SamplingType,
    pub on_change: Option<PlanObserver>,
}

impl TabuFormulation {
    /// A tour with no aspiration, no tabu limit and no sampling.
    pub fn new(stops: RoutePlan, time: i32, parameter: Parameter) -> Self {
        Self {
            stops,
            time,
            parameter,
            aspiration: AspirationType::None,
            tabu_limit: false,
            sampling: SamplingType::None,
            on_change: None,
        }
    }

    pub fn with_aspiration(mut self, aspiration: AspirationType) -> Self {
        self.aspiration = aspiration;
        self
    }

    pub fn with_tabu_limit(mut self, tabu_limit: bool) -> Self {
        self.tabu_limit = tabu_limit;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingType) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: impl Fn(&RoutePlan, &RoutePlan, f64, f64) + Send + Sync + 'static,
    ) -> Self {
        self.on_change = Some(Arc::new(on_change));
        self
    }

    /// Build a tour from user input, resolving every stop name.
    pub fn resolve(
        index: &StopIndex,
        stops: &[String],
        time: &str,
        parameter: Parameter,
    ) -> Result<Self, FormulationError> {
        let resolved = stops
            .iter()
            .map(|name| index.resolve(name))
            .collect::<Result<Vec<_>, _>>()?;
        if resolved.len() < 2 {
            return Err(FormulationError::TooFewStops(resolved.len()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = resolved.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(FormulationError::DuplicateStop(duplicate.clone()));
        }
        Ok(Self::new(resolved, parse_clock(time)?, parameter))
    }
}

impl fmt::Debug for TabuFormulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabuFormulation")
            .field("stops", &self.stops)
            .field("time", &self.time)
            .field("parameter", &self.parameter)
            .field("aspiration", &self.aspiration)
            .field("tabu_limit", &self.tabu_limit)
            .field("sampling", &self.sampling)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Cache key for one leg of a tour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteParams {
    pub start: String,
    pub end: String,
    pub time: i32,
    pub parameter: Parameter,
}

/// Cache key for a whole tour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePlanWithConfig {
    pub plan: RoutePlan,
    pub time: i32,
    pub parameter: Parameter,
}
