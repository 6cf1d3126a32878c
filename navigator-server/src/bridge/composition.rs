//! Turns a [`Formulation`] into the closures the solvers consume.
//!
//! Edge weights and heuristic estimates are computed from live graph data
//! each time a node is expanded; nothing here mutates the graph.

use crate::algorithm::{Edge, Problem, Weight};
use crate::data::{BusStop, Connection, TransitGraph};

use super::config::{BridgeConfig, TransferPricing};
use super::formulation::{Algorithm, Formulation, Heuristic, Parameter};
use super::node::StatefulNode;

/// Weight of a hop priced as infeasible.
///
/// Larger than any route of feasible hops, and small enough that millions
/// of infeasible hops still sum without saturating.
pub const INFEASIBLE_WEIGHT: Weight = 1 << 40;

/// Map a "more is better" signal onto a decreasing estimate: `k / (v + 1)`.
pub fn as_maximizing(value: f64, conversion: f64) -> f64 {
    conversion / (value + 1.0)
}

/// Graph and configuration shared by the edge fetcher and heuristics.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    graph: &'a TransitGraph,
    config: &'a BridgeConfig,
    parameter: Parameter,
}

impl<'a> Composer<'a> {
    pub fn new(graph: &'a TransitGraph, config: &'a BridgeConfig, parameter: Parameter) -> Self {
        Self {
            graph,
            config,
            parameter,
        }
    }

    /// Build the search problem for `formulation`.
    ///
    /// Only [`Algorithm::PathFinder`] gets a heuristic.
    pub fn problem(self, formulation: &Formulation) -> Problem<'a, StatefulNode> {
        let start = StatefulNode::start(formulation.start.as_str(), formulation.time);
        let goal = StatefulNode::goal(formulation.end.as_str());
        let problem = Problem::new(start, goal, move |node: &StatefulNode| self.edges(node));

        match formulation.algorithm {
            Algorithm::Dijkstra => problem,
            Algorithm::PathFinder => {
                let kind = formulation.heuristic;
                let end = formulation.end.clone();
                problem.with_heuristic(move |node: &StatefulNode| self.estimate(kind, node, &end))
            }
        }
    }

    /// Every connection out of the node's stop, as weighted edges.
    ///
    /// Unknown stops have no edges.
    pub fn edges(&self, node: &StatefulNode) -> Vec<Edge<StatefulNode>> {
        let Some(stop) = self.graph.stop(&node.stop_name) else {
            return Vec::new();
        };
        stop.connections()
            .iter()
            .map(|connection| {
                Edge::new(
                    node.clone(),
                    node.evolve(connection),
                    self.weight(node, connection),
                    connection.description(),
                )
            })
            .collect()
    }

    /// Cost of taking `connection` from `node`.
    pub fn weight(&self, node: &StatefulNode, connection: &Connection) -> Weight {
        match self.parameter {
            Parameter::Time => Weight::from(connection.total_time_cost(node.time)),
            Parameter::Transfers => {
                let over_budget = match connection {
                    Connection::Walk(walk) => walk.duration > self.config.allowed_walk_time,
                    Connection::Transfer(ride) => {
                        ride.waiting_time(node.time) > self.config.allowed_wait_time
                    }
                };
                if !over_budget {
                    return 1;
                }
                match self.config.transfer_pricing {
                    TransferPricing::Penalty => self.config.penalty,
                    TransferPricing::Infeasible => INFEASIBLE_WEIGHT,
                }
            }
        }
    }

    /// Heuristic estimate from `node` to the stop named `end`.
    ///
    /// Zero when either stop is unknown.
    pub fn estimate(&self, kind: Heuristic, node: &StatefulNode, end: &str) -> f64 {
        let (Some(current), Some(end)) = (self.graph.stop(&node.stop_name), self.graph.stop(end))
        else {
            return 0.0;
        };

        match kind {
            Heuristic::Empty => 0.0,
            Heuristic::Distance => self.distance(current, end),
            Heuristic::LinesCount => self.lines_count(current),
            Heuristic::ConnectionCount => self.connection_count(current),
            Heuristic::LinesOverlap => self.lines_overlap(current, end),
            Heuristic::LocationsCoverage => self.locations_coverage(current),
            Heuristic::LinePopularity => self.line_popularity(current),
            Heuristic::LineAvgTime => self.line_avg_time(current),
            Heuristic::LineAvgDistance => self.line_avg_distance(current, end),
            Heuristic::DistanceAndOverlap => {
                self.distance(current, end) + self.lines_overlap(current, end)
            }
            Heuristic::CompoundCount => {
                self.lines_count(current)
                    + self.connection_count(current)
                    + self.locations_coverage(current)
            }
        }
    }

    /// Pick the time or transfers coefficient.
    fn per_parameter(&self, to_time: f64, to_transfers: f64) -> f64 {
        match self.parameter {
            Parameter::Time => to_time,
            Parameter::Transfers => to_transfers,
        }
    }

    fn distance_km(current: &BusStop, end: &BusStop) -> f64 {
        match (current.location(), end.location()) {
            (Some(a), Some(b)) => a.distance_km(&b),
            _ => 0.0,
        }
    }

    fn distance(&self, current: &BusStop, end: &BusStop) -> f64 {
        let distance = Self::distance_km(current, end);
        let weights = &self.config.heuristic;
        match self.parameter {
            Parameter::Time => distance / weights.avg_bus_speed * 3600.0 * 0.5,
            Parameter::Transfers => distance / weights.avg_interstop_distance,
        }
    }

    fn lines_count(&self, current: &BusStop) -> f64 {
        let w = &self.config.heuristic;
        as_maximizing(
            current.lines().len() as f64,
            self.per_parameter(w.lines_count_to_time, w.lines_count_to_transfers),
        )
    }

    fn connection_count(&self, current: &BusStop) -> f64 {
        let w = &self.config.heuristic;
        as_maximizing(
            current.connections().len() as f64,
            self.per_parameter(w.conn_count_to_time, w.conn_count_to_transfers),
        )
    }

    fn lines_overlap(&self, current: &BusStop, end: &BusStop) -> f64 {
        let w = &self.config.heuristic;
        let overlap = current.lines().intersection(end.lines()).count();
        as_maximizing(
            overlap as f64,
            self.per_parameter(w.lines_overlap_to_time, w.lines_overlap_to_transfers),
        )
    }

    fn locations_coverage(&self, current: &BusStop) -> f64 {
        let w = &self.config.heuristic;
        as_maximizing(
            current.locations().len() as f64,
            self.per_parameter(w.coverage_to_time, w.coverage_to_transfers),
        )
    }

    fn line_popularity(&self, current: &BusStop) -> f64 {
        let w = &self.config.heuristic;
        let popularity = current
            .lines()
            .iter()
            .filter_map(|line| self.graph.line_popularity(line))
            .max()
            .unwrap_or(0);
        as_maximizing(
            f64::from(popularity),
            self.per_parameter(w.lines_popularity_to_time, w.lines_popularity_to_transfers),
        )
    }

    fn line_avg_time(&self, current: &BusStop) -> f64 {
        let w = &self.config.heuristic;
        let Some(mean) = mean(
            current
                .lines()
                .iter()
                .filter_map(|line| self.graph.average_time_of(line))
                .map(f64::from),
        ) else {
            return 0.0;
        };
        match self.parameter {
            Parameter::Time => mean * w.lines_avg_time_importance,
            Parameter::Transfers => mean / w.avg_transfer_time * w.lines_avg_time_importance,
        }
    }

    fn line_avg_distance(&self, current: &BusStop, end: &BusStop) -> f64 {
        let w = &self.config.heuristic;
        let Some(mean) = mean(
            current
                .lines()
                .iter()
                .filter_map(|line| self.graph.average_distance_of(line)),
        ) else {
            return 0.0;
        };
        let hops = Self::distance_km(current, end) / mean;
        match self.parameter {
            Parameter::Time => hops * w.avg_transfer_time * w.lines_avg_dist_importance,
            Parameter::Transfers => hops * w.lines_avg_dist_importance,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (count, total) = values.fold((0usize, 0.0), |(n, sum), v| (n + 1, sum + v));
    (count > 0).then(|| total / count as f64)
}
