//! Point-to-point routing over the transit graph.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::algorithm::{CancelToken, Cancelled, Edge, Solution, dijkstra_until, path_finder_until};
use crate::data::TransitGraph;
use crate::data::time::{to_time_description, to_time_string};

use super::composition::Composer;
use super::config::BridgeConfig;
use super::formulation::{Algorithm, Formulation, Parameter};
use super::node::StatefulNode;

/// Edges of a journey, each carrying the passenger state at both ends.
pub type Route = Solution<StatefulNode>;

/// Headline facts about a non-empty route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub departure: i32,
    pub arrival: i32,
    pub transfers: u32,
    pub rides_and_walks: u32,
}

impl RouteSummary {
    /// `None` for an empty route.
    pub fn of(route: &[Edge<StatefulNode>]) -> Option<Self> {
        let first = route.first()?;
        let last = route.last()?;
        Some(Self {
            departure: first.start.time,
            arrival: last.end.time,
            transfers: last.end.transfers,
            rides_and_walks: last.end.rides_and_walks,
        })
    }

    /// Seconds between departure and arrival.
    pub fn duration(&self) -> i32 {
        self.arrival - self.departure
    }
}

/// Runs formulations against a shared, read-only graph.
#[derive(Debug, Clone)]
pub struct BridgeService {
    graph: Arc<TransitGraph>,
    config: Arc<BridgeConfig>,
}

impl BridgeService {
    pub fn new(graph: Arc<TransitGraph>, config: BridgeConfig) -> Self {
        Self {
            graph,
            config: Arc::new(config),
        }
    }

    pub fn graph(&self) -> &TransitGraph {
        &self.graph
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Solve `formulation` and time the search.
    ///
    /// Stop names are not checked: an unknown start simply has no edges.
    pub fn solve(&self, formulation: &Formulation) -> (Route, Duration) {
        // A fresh token is never cancelled.
        self.solve_until(formulation, &CancelToken::new())
            .unwrap_or_default()
    }

    /// [`BridgeService::solve`] that gives up once `cancel` is set.
    pub fn solve_until(
        &self,
        formulation: &Formulation,
        cancel: &CancelToken,
    ) -> Result<(Route, Duration), Cancelled> {
        let composer = Composer::new(&self.graph, &self.config, formulation.parameter);
        let problem = composer.problem(formulation);

        let started = Instant::now();
        let route = match formulation.algorithm {
            Algorithm::Dijkstra => dijkstra_until(&problem, cancel)?,
            Algorithm::PathFinder => path_finder_until(&problem, cancel)?,
        };
        let elapsed = started.elapsed();

        debug!(
            start = %formulation.start,
            end = %formulation.end,
            algorithm = ?formulation.algorithm,
            heuristic = ?formulation.heuristic,
            edges = route.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "route solved"
        );
        Ok((route, elapsed))
    }

    /// Solve and describe the result for a person.
    pub fn solve_and_report(&self, formulation: &Formulation) -> String {
        let (route, elapsed) = self.solve(formulation);
        Self::report(formulation, &route, elapsed)
    }

    /// Multi-line description of a solved formulation.
    pub fn report(
        formulation: &Formulation,
        route: &[Edge<StatefulNode>],
        elapsed: Duration,
    ) -> String {
        let mut lines = Vec::new();
        match RouteSummary::of(route) {
            Some(summary) => {
                lines.extend(route.iter().map(|edge| edge.description.clone()));
                lines.push(format!(
                    "Time: {} - {} ({})",
                    to_time_string(summary.departure),
                    to_time_string(summary.arrival),
                    to_time_description(summary.duration()),
                ));
                lines.push(format!("Transfers: {}", summary.transfers));
                lines.push(format!(
                    "Different lines and walks: {}",
                    summary.rides_and_walks
                ));
            }
            None if formulation.start == formulation.end => {
                lines.push(format!("Already at {}", formulation.start));
            }
            None => {
                lines.push(format!(
                    "No route found from {} to {}",
                    formulation.start, formulation.end
                ));
            }
        }
        lines.push(format!("Minimized parameter: {}", formulation.parameter));
        lines.push(format!("Finished in {elapsed:?}"));
        lines.join("\n")
    }
}

/// Whether an empty route means the passenger is already at the goal.
pub fn already_there(formulation: &Formulation, route: &Route) -> bool {
    route.is_empty() && formulation.start == formulation.end
}

/// Cost of `route` under `parameter`, as the solvers counted it.
pub fn route_cost(route: &Route, parameter: Parameter) -> i64 {
    match parameter {
        Parameter::Time => RouteSummary::of(route).map_or(0, |s| i64::from(s.duration())),
        Parameter::Transfers => route.len() as i64,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::algorithm::solution_weight;
    use crate::bridge::{Heuristic, INFEASIBLE_WEIGHT, TransferPricing};
    use crate::data::connection::tests::ride;
    use crate::data::{Connection, Location, TransitGraphBuilder, WalkConnection};

    /// A -(line 1, 08:00-08:10)-> B -(walk, 300 s)-> C, plus an island D.
    pub(crate) fn abc_graph() -> Arc<TransitGraph> {
        let mut builder = TransitGraphBuilder::new();
        builder
            .add_connection(ride("A", "B", "1", 28800, 29400))
            .add_connection(Connection::Walk(WalkConnection {
                start: "B".into(),
                end: "C".into(),
                distance_km: 300.0 / 3600.0 * 5.0,
                duration: 300,
            }))
            .add_location("A", Location::new(51.10, 17.03))
            .add_location("B", Location::new(51.11, 17.03))
            .add_location("C", Location::new(51.11, 17.04))
            .add_location("D", Location::new(52.0, 18.0));
        Arc::new(builder.build())
    }

    fn service() -> BridgeService {
        BridgeService::new(abc_graph(), BridgeConfig::default())
    }

    fn query(algorithm: Algorithm, start: &str, end: &str) -> Formulation {
        Formulation::new(
            Parameter::Time,
            algorithm,
            algorithm.default_heuristic(),
            start,
            end,
            28800,
        )
    }

    #[test]
    fn ride_then_walk() {
        for algorithm in [Algorithm::Dijkstra, Algorithm::PathFinder] {
            let (route, _) = service().solve(&query(algorithm, "A", "C"));

            assert_eq!(route.len(), 2, "{algorithm:?}");
            let summary = RouteSummary::of(&route).unwrap();
            assert_eq!(summary.departure, 28800);
            assert_eq!(summary.arrival, 29700);
            assert_eq!(summary.transfers, 2);
            assert_eq!(summary.rides_and_walks, 2);
            assert_eq!(route_cost(&route, Parameter::Time), 900);
            assert_eq!(route_cost(&route, Parameter::Transfers), 2);
        }
    }

    #[test]
    fn already_there_versus_unreachable() {
        let service = service();

        let home = query(Algorithm::Dijkstra, "A", "A");
        let (route, elapsed) = service.solve(&home);
        assert!(route.is_empty());
        assert!(already_there(&home, &route));
        assert!(BridgeService::report(&home, &route, elapsed).starts_with("Already at A"));

        let island = query(Algorithm::Dijkstra, "A", "D");
        let (route, elapsed) = service.solve(&island);
        assert!(route.is_empty());
        assert!(!already_there(&island, &route));
        assert!(
            BridgeService::report(&island, &route, elapsed).starts_with("No route found from A to D")
        );
    }

    #[test]
    fn unknown_start_is_unreachable() {
        let (route, _) = service().solve(&query(Algorithm::PathFinder, "Nowhere", "C"));
        assert!(route.is_empty());
    }

    #[test]
    fn report_lists_legs_and_totals() {
        let report = service().solve_and_report(&query(Algorithm::Dijkstra, "A", "C"));
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "MPK by vehicle \"1\": A (08:00:00) - B (08:10:00)");
        assert!(lines[1].starts_with("Walk "));
        assert_eq!(lines[2], "Time: 08:00:00 - 08:15:00 (15min 00s)");
        assert_eq!(lines[3], "Transfers: 2");
        assert_eq!(lines[4], "Different lines and walks: 2");
        assert_eq!(lines[5], "Minimized parameter: Time");
        assert!(lines[6].starts_with("Finished in "));
    }

    #[test]
    fn long_chain_of_infeasible_hops_is_still_a_route() {
        let mut builder = TransitGraphBuilder::new();
        for i in 0..5 {
            builder.add_connection(Connection::Walk(WalkConnection::new(
                format!("S{i}"),
                format!("S{}", i + 1),
                2.0,
            )));
        }
        let config = BridgeConfig::default().with_transfer_pricing(TransferPricing::Infeasible);
        let service = BridgeService::new(Arc::new(builder.build()), config);

        for algorithm in [Algorithm::Dijkstra, Algorithm::PathFinder] {
            let formulation = Formulation {
                parameter: Parameter::Transfers,
                ..query(algorithm, "S0", "S5")
            };
            let (route, _) = service.solve(&formulation);
            assert_eq!(route.len(), 5, "{algorithm:?}");
            assert_eq!(solution_weight(&route), 5 * INFEASIBLE_WEIGHT, "{algorithm:?}");
            assert_eq!(route_cost(&route, Parameter::Transfers), 5);
        }
    }

    #[test]
    fn cancelled_solve() {
        let token = CancelToken::new();
        token.cancel();
        let result = service().solve_until(&query(Algorithm::Dijkstra, "A", "C"), &token);
        assert_eq!(result.unwrap_err(), Cancelled);
    }

    #[test]
    fn every_heuristic_reaches_the_goal() {
        let service = service();
        for heuristic in Heuristic::ALL {
            let formulation = Formulation {
                heuristic,
                ..query(Algorithm::PathFinder, "A", "C")
            };
            let (route, _) = service.solve(&formulation);
            assert_eq!(route.last().map(|e| e.end.stop_name.as_str()), Some("C"), "{heuristic:?}");
        }
    }
}
