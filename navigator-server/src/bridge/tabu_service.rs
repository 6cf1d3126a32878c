//! Circular tour optimisation with Tabu Search.
//!
//! A tour is a permutation of stop names. Its cost comes from routing every
//! consecutive leg with [`BridgeService`], so each candidate evaluation is a
//! handful of point-to-point searches. Legs and whole tours are memoised.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use moka::sync::Cache;
use tracing::{debug, info};

use crate::algorithm::{CancelToken, Cancelled, TabuSearch};
use crate::data::time::{to_time_description, to_time_string};

use super::composition::as_maximizing;
use super::config::TabuConfig;
use super::formulation::{Algorithm, Formulation, Heuristic, Parameter};
use super::service::{BridgeService, Route};
use super::tabu_formulation::{
    AspirationType, RoutePlan, RouteParams, RoutePlanWithConfig, SamplingType, TabuFormulation,
};

/// A plan routed leg by leg.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourRoute {
    /// Every leg's edges, in order.
    pub route: Route,
    /// Legs with no route between distinct stops.
    pub unreachable_legs: Vec<(String, String)>,
}

impl TourRoute {
    /// Scalar cost of the tour: seconds from `departure` to the final
    /// arrival for time, edge count for transfers. Infinite when a leg is
    /// unreachable.
    pub fn cost(&self, parameter: Parameter, departure: i32) -> f64 {
        if !self.unreachable_legs.is_empty() {
            return f64::INFINITY;
        }
        match parameter {
            Parameter::Time => self
                .route
                .last()
                .map_or(0.0, |edge| f64::from(edge.end.time - departure)),
            Parameter::Transfers => self.route.len() as f64,
        }
    }
}

/// Best tour found for a [`TabuFormulation`].
#[derive(Debug, Clone)]
pub struct TourSolution {
    pub plan: RoutePlan,
    pub tour: TourRoute,
    pub cost: f64,
    pub elapsed: Duration,
}

/// All swaps of two non-anchor positions, produced one at a time.
#[derive(Debug, Clone)]
pub struct Swaps {
    plan: RoutePlan,
    i: usize,
    j: usize,
}

impl Swaps {
    pub fn new(plan: RoutePlan) -> Self {
        Self { plan, i: 1, j: 2 }
    }
}

impl Iterator for Swaps {
    type Item = RoutePlan;

    fn next(&mut self) -> Option<RoutePlan> {
        while self.i < self.plan.len() {
            if self.j < self.plan.len() {
                let mut next = self.plan.clone();
                next.swap(self.i, self.j);
                self.j += 1;
                return Some(next);
            }
            self.i += 1;
            self.j = self.i + 1;
        }
        None
    }
}

/// Tour optimiser with leg and tour caches.
///
/// The caches live as long as the service and are never evicted; keys
/// include the departure time, so an entry is only reused for an
/// identical query.
pub struct TabuBridgeService {
    bridge: BridgeService,
    config: TabuConfig,
    routes: Cache<RoutePlanWithConfig, Arc<TourRoute>>,
    legs: Cache<RouteParams, Arc<Route>>,
    computed_legs: AtomicUsize,
}

impl TabuBridgeService {
    pub fn new(bridge: BridgeService, config: TabuConfig) -> Self {
        Self {
            bridge,
            config,
            routes: Cache::builder().build(),
            legs: Cache::builder().build(),
            computed_legs: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &TabuConfig {
        &self.config
    }

    /// Legs actually routed so far, cache hits excluded.
    pub fn computed_legs(&self) -> usize {
        self.computed_legs.load(Ordering::Relaxed)
    }

    /// Optimise the tour and return its route and the time spent.
    pub fn solve(&self, formulation: &TabuFormulation) -> (Route, Duration) {
        // A fresh token is never cancelled.
        self.solve_until(formulation, &CancelToken::new())
            .map(|solution| (solution.tour.route, solution.elapsed))
            .unwrap_or_default()
    }

    /// Optimise the tour, giving up once `cancel` is set.
    pub fn solve_until(
        &self,
        formulation: &TabuFormulation,
        cancel: &CancelToken,
    ) -> Result<TourSolution, Cancelled> {
        let started = Instant::now();
        let time = formulation.time;
        let parameter = formulation.parameter;
        let sampling = formulation.sampling;

        let mut search = TabuSearch::new(
            formulation.stops.clone(),
            move |plan: &RoutePlan| self.neighborhood(plan, sampling),
            move |plan: &RoutePlan| self.evaluate(plan, time, parameter, cancel),
            self.config.max_iterations,
        )
        .with_memory_size(self.config.memory_size)
        .with_cancel_token(cancel.clone());

        let aspiration = formulation.aspiration;
        if aspiration != AspirationType::None {
            search = search.with_aspiration(move |memory, cost| aspiration.admits(memory, cost));
        }
        if formulation.tabu_limit {
            search = search.with_tabu_limit(self.config.tabu_limit);
        }
        if let Some(limit) = self.config.repetitions_limit {
            search = search.with_repetitions_limit(limit);
        }
        if let Some(observer) = formulation.on_change.clone() {
            search = search.with_on_change(move |from, to, from_cost, to_cost| {
                observer(from, to, from_cost, to_cost)
            });
        }

        let plan = search.run();
        cancel.check()?;

        let tour = self.plan_to_route(&plan, time, parameter, cancel)?;
        let cost = tour.cost(parameter, time);
        let elapsed = started.elapsed();
        info!(
            stops = plan.len(),
            cost,
            elapsed_ms = elapsed.as_millis() as u64,
            computed_legs = self.computed_legs(),
            "tour solved"
        );
        Ok(TourSolution {
            plan,
            tour: (*tour).clone(),
            cost,
            elapsed,
        })
    }

    /// Optimise and describe the result for a person.
    pub fn solve_and_report(&self, formulation: &TabuFormulation) -> String {
        match self.solve_until(formulation, &CancelToken::new()) {
            Ok(solution) => Self::report(formulation, &solution),
            Err(Cancelled) => "Solution timed out".to_string(),
        }
    }

    /// Multi-line description of a solved tour.
    pub fn report(formulation: &TabuFormulation, solution: &TourSolution) -> String {
        let mut lines = Vec::new();
        let mut order = solution.plan.clone();
        if let Some(anchor) = solution.plan.first() {
            order.push(anchor.clone());
        }
        lines.push(format!("Tour: {}", order.join(" -> ")));
        lines.extend(solution.tour.route.iter().map(|edge| edge.description.clone()));
        for (start, end) in &solution.tour.unreachable_legs {
            lines.push(format!("No route found from {start} to {end}"));
        }
        if let Some(last) = solution.tour.route.last() {
            lines.push(format!(
                "Time: {} - {} ({})",
                to_time_string(formulation.time),
                to_time_string(last.end.time),
                to_time_description(last.end.time - formulation.time),
            ));
        }
        lines.push(format!("Transfers: {}", solution.tour.route.len()));
        lines.push(format!("Minimized parameter: {}", formulation.parameter));
        lines.push(format!("Cost: {}", solution.cost));
        lines.push(format!("Finished in {:?}", solution.elapsed));
        lines.join("\n")
    }

    /// Cost of a plan, infinite if it cannot be routed.
    fn evaluate(&self, plan: &RoutePlan, time: i32, parameter: Parameter, cancel: &CancelToken) -> f64 {
        match self.plan_to_route(plan, time, parameter, cancel) {
            Ok(tour) => tour.cost(parameter, time),
            Err(Cancelled) => f64::INFINITY,
        }
    }

    /// Swap neighborhood of `plan`, thinned by `sampling`.
    pub fn neighborhood(
        &self,
        plan: &RoutePlan,
        sampling: SamplingType,
    ) -> Box<dyn Iterator<Item = RoutePlan> + '_> {
        let swaps = Swaps::new(plan.clone());
        match sampling {
            SamplingType::None => Box::new(swaps),
            SamplingType::ByDistance => {
                Box::new(self.sample(swaps.collect(), |p| self.straight_line_length(p)).into_iter())
            }
            SamplingType::ByOverlap => {
                Box::new(self.sample(swaps.collect(), |p| self.line_overlap_cost(p)).into_iter())
            }
        }
    }

    /// Keep candidates whose proxy cost is at most the mean.
    fn sample(&self, candidates: Vec<RoutePlan>, proxy: impl Fn(&RoutePlan) -> f64) -> Vec<RoutePlan> {
        if candidates.len() <= self.config.min_sampling {
            return candidates;
        }
        let costs: Vec<f64> = candidates.iter().map(&proxy).collect();
        let mean = costs.iter().sum::<f64>() / costs.len() as f64;
        let kept: Vec<RoutePlan> = candidates
            .iter()
            .zip(&costs)
            .filter(|(_, cost)| **cost <= mean)
            .map(|(plan, _)| plan.clone())
            .collect();
        debug!(candidates = candidates.len(), kept = kept.len(), "sampled neighborhood");
        if kept.is_empty() { candidates } else { kept }
    }

    /// Consecutive stop pairs of the closed tour.
    fn closed_pairs(plan: &RoutePlan) -> impl Iterator<Item = (&String, &String)> {
        plan.iter().zip(plan.iter().skip(1).chain(plan.first()))
    }

    fn straight_line_length(&self, plan: &RoutePlan) -> f64 {
        let graph = self.bridge.graph();
        Self::closed_pairs(plan)
            .map(|(a, b)| {
                let a = graph.stop(a).and_then(|s| s.location());
                let b = graph.stop(b).and_then(|s| s.location());
                match (a, b) {
                    (Some(a), Some(b)) => a.distance_km(&b),
                    _ => 0.0,
                }
            })
            .sum()
    }

    fn line_overlap_cost(&self, plan: &RoutePlan) -> f64 {
        let graph = self.bridge.graph();
        Self::closed_pairs(plan)
            .map(|(a, b)| {
                let overlap = match (graph.stop(a), graph.stop(b)) {
                    (Some(a), Some(b)) => a.lines().intersection(b.lines()).count(),
                    _ => 0,
                };
                as_maximizing(overlap as f64, 1.0)
            })
            .sum()
    }

    /// Route every leg of the closed tour, chaining arrival times.
    pub fn plan_to_route(
        &self,
        plan: &RoutePlan,
        time: i32,
        parameter: Parameter,
        cancel: &CancelToken,
    ) -> Result<Arc<TourRoute>, Cancelled> {
        let key = RoutePlanWithConfig {
            plan: plan.clone(),
            time,
            parameter,
        };
        if let Some(hit) = self.routes.get(&key) {
            return Ok(hit);
        }

        let mut tour = TourRoute::default();
        let mut current = time;
        for (start, end) in Self::closed_pairs(plan) {
            let params = RouteParams {
                start: start.clone(),
                end: end.clone(),
                time: current,
                parameter,
            };
            let leg = self.route_between_until(&params, cancel)?;
            match leg.last() {
                Some(edge) => current = edge.end.time,
                None if start != end => tour.unreachable_legs.push((start.clone(), end.clone())),
                None => {}
            }
            tour.route.extend(leg.iter().cloned());
        }

        let tour = Arc::new(tour);
        self.routes.insert(key, Arc::clone(&tour));
        Ok(tour)
    }

    /// Best single leg, memoised by its exact parameters.
    pub fn route_between(&self, params: &RouteParams) -> Arc<Route> {
        self.route_between_until(params, &CancelToken::new())
            .unwrap_or_default()
    }

    /// [`TabuBridgeService::route_between`] that gives up once `cancel` is set.
    ///
    /// Cancelled legs are not cached.
    pub fn route_between_until(
        &self,
        params: &RouteParams,
        cancel: &CancelToken,
    ) -> Result<Arc<Route>, Cancelled> {
        if let Some(hit) = self.legs.get(params) {
            return Ok(hit);
        }
        let formulation = Formulation::new(
            params.parameter,
            Algorithm::PathFinder,
            Heuristic::DistanceAndOverlap,
            params.start.as_str(),
            params.end.as_str(),
            params.time,
        );
        let (route, _) = self.bridge.solve_until(&formulation, cancel)?;
        self.computed_legs.fetch_add(1, Ordering::Relaxed);

        let route = Arc::new(route);
        self.legs.insert(params.clone(), Arc::clone(&route));
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeConfig;
    use crate::bridge::service::tests::abc_graph;
    use crate::data::connection::tests::ride;
    use crate::data::{Location, TransitGraphBuilder};
    use std::sync::Mutex;

    fn names(stops: &[&str]) -> RoutePlan {
        stops.iter().map(|s| s.to_string()).collect()
    }

    /// Four stops on a ring line running every 10 minutes all day, clockwise
    /// A-B-C-D, with the counter-clockwise direction much slower.
    fn ring_service() -> TabuBridgeService {
        let mut builder = TransitGraphBuilder::new();
        let ring = ["A", "B", "C", "D"];
        for slot in 0..144 {
            let t = slot * 600;
            for k in 0..4 {
                let (from, to) = (ring[k], ring[(k + 1) % 4]);
                builder.add_connection(ride(from, to, "cw", t, t + 120));
                builder.add_connection(ride(to, from, "ccw", t, t + 500));
            }
        }
        for (k, stop) in ring.iter().enumerate() {
            builder.add_location(stop, Location::new(51.0 + k as f64 * 0.01, 17.0));
        }
        let bridge = BridgeService::new(Arc::new(builder.build()), BridgeConfig::default());
        TabuBridgeService::new(bridge, TabuConfig::new(10, 5))
    }

    #[test]
    fn swaps_keep_the_anchor() {
        let swaps: Vec<RoutePlan> = Swaps::new(names(&["A", "B", "C", "D"])).collect();
        assert_eq!(
            swaps,
            vec![
                names(&["A", "C", "B", "D"]),
                names(&["A", "D", "C", "B"]),
                names(&["A", "B", "D", "C"]),
            ]
        );
        assert_eq!(Swaps::new(names(&["A", "B"])).count(), 0);
        assert_eq!(Swaps::new(Vec::new()).count(), 0);
    }

    #[test]
    fn swap_count_is_quadratic() {
        let plan: RoutePlan = (0..8).map(|i| i.to_string()).collect();
        assert_eq!(Swaps::new(plan).count(), 7 * 6 / 2);
    }

    #[test]
    fn leg_cache_is_idempotent() {
        let service = ring_service();
        let params = RouteParams {
            start: "A".into(),
            end: "C".into(),
            time: 28800,
            parameter: Parameter::Time,
        };

        let first = service.route_between(&params);
        assert_eq!(service.computed_legs(), 1);
        let second = service.route_between(&params);
        assert_eq!(service.computed_legs(), 1);
        assert_eq!(*first, *second);
        let weights: Vec<_> = first.iter().map(|e| e.weight).collect();
        let again: Vec<_> = second.iter().map(|e| e.weight).collect();
        assert_eq!(weights, again);

        // A different departure time is a different key.
        service.route_between(&RouteParams { time: 28801, ..params });
        assert_eq!(service.computed_legs(), 2);
    }

    #[test]
    fn tour_cost_chains_leg_times() {
        let service = ring_service();
        let tour = service
            .plan_to_route(&names(&["A", "B", "C", "D"]), 28800, Parameter::Time, &CancelToken::new())
            .unwrap();

        assert!(tour.unreachable_legs.is_empty());
        assert_eq!(tour.route.len(), 4);
        // Four clockwise hops, each leg waiting for the next 10-minute slot.
        assert_eq!(tour.route[0].start.time, 28800);
        assert_eq!(tour.route[3].end.time, 30720);
        assert_eq!(tour.cost(Parameter::Time, 28800), 1920.0);
        assert_eq!(tour.cost(Parameter::Transfers, 28800), 4.0);

        // Cached: routing the same plan again computes nothing new.
        let legs = service.computed_legs();
        service
            .plan_to_route(&names(&["A", "B", "C", "D"]), 28800, Parameter::Time, &CancelToken::new())
            .unwrap();
        assert_eq!(service.computed_legs(), legs);
    }

    #[test]
    fn optimiser_never_worsens_the_initial_tour() {
        let service = ring_service();
        let initial = names(&["A", "C", "B", "D"]);
        let initial_cost = service
            .plan_to_route(&initial, 28800, Parameter::Time, &CancelToken::new())
            .unwrap()
            .cost(Parameter::Time, 28800);

        let formulation = TabuFormulation::new(initial, 28800, Parameter::Time)
            .with_aspiration(AspirationType::Average)
            .with_tabu_limit(true);
        let solution = service.solve_until(&formulation, &CancelToken::new()).unwrap();

        assert!(solution.cost <= initial_cost);
        assert_eq!(solution.plan[0], "A");
        assert_eq!(solution.plan, names(&["A", "B", "C", "D"]));
    }

    #[test]
    fn observer_sees_improvements() {
        let service = ring_service();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let formulation =
            TabuFormulation::new(names(&["A", "D", "C", "B"]), 28800, Parameter::Time)
                .with_on_change(move |_, to, from_cost, to_cost| {
                    sink.lock().unwrap().push((to.clone(), from_cost, to_cost));
                });

        let solution = service.solve_until(&formulation, &CancelToken::new()).unwrap();
        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|(_, from, to)| to < from));
        assert_eq!(seen.last().map(|(plan, _, _)| plan), Some(&solution.plan));
    }

    #[test]
    fn unreachable_leg_makes_tour_infinite() {
        let bridge = BridgeService::new(abc_graph(), BridgeConfig::default());
        let service = TabuBridgeService::new(bridge, TabuConfig::new(5, 5));
        let tour = service
            .plan_to_route(&names(&["A", "D"]), 28800, Parameter::Time, &CancelToken::new())
            .unwrap();

        assert_eq!(tour.unreachable_legs, vec![("A".to_string(), "D".to_string()), ("D".to_string(), "A".to_string())]);
        assert!(tour.route.is_empty());
        assert_eq!(tour.cost(Parameter::Time, 28800), f64::INFINITY);
    }

    #[test]
    fn cancelled_tour_is_reported_and_not_cached() {
        let service = ring_service();
        let token = CancelToken::new();
        token.cancel();
        let formulation = TabuFormulation::new(names(&["A", "B", "C"]), 28800, Parameter::Time);

        assert_eq!(service.solve_until(&formulation, &token).unwrap_err(), Cancelled);
        assert_eq!(service.computed_legs(), 0);
        let report = service.solve_and_report(&formulation);
        assert!(report.starts_with("Tour: A -> "));
        assert!(report.contains("Finished in "));
    }

    #[test]
    fn sampling_none_is_the_full_neighborhood() {
        let service = ring_service();
        let plan = names(&["A", "B", "C", "D"]);
        let all: Vec<RoutePlan> = service.neighborhood(&plan, SamplingType::None).collect();
        assert_eq!(all, Swaps::new(plan).collect::<Vec<_>>());
    }

    #[test]
    fn sampling_keeps_a_non_empty_subset_of_large_neighborhoods() {
        let mut builder = TransitGraphBuilder::new();
        let stops: Vec<String> = (0..6).map(|i| format!("S{i}")).collect();
        for (i, stop) in stops.iter().enumerate() {
            builder.add_location(stop, Location::new(51.0 + (i * i) as f64 * 0.01, 17.0 + i as f64 * 0.02));
            builder.add_connection(ride(stop, &stops[(i + 1) % 6], &format!("L{}", i % 2), 0, 60));
        }
        let bridge = BridgeService::new(Arc::new(builder.build()), BridgeConfig::default());
        let service = TabuBridgeService::new(bridge, TabuConfig::default());
        let all: Vec<RoutePlan> = Swaps::new(stops.clone()).collect();
        assert!(all.len() > service.config().min_sampling);

        for sampling in [SamplingType::ByDistance, SamplingType::ByOverlap] {
            let sampled: Vec<RoutePlan> = service.neighborhood(&stops, sampling).collect();
            assert!(!sampled.is_empty(), "{sampling:?}");
            assert!(sampled.len() <= all.len());
            assert!(sampled.iter().all(|p| all.contains(p)));
        }
    }

    #[test]
    fn small_neighborhoods_are_not_sampled() {
        let service = ring_service();
        let plan = names(&["A", "B", "C", "D"]);
        let sampled: Vec<RoutePlan> = service.neighborhood(&plan, SamplingType::ByDistance).collect();
        assert_eq!(sampled.len(), 3);
    }
}
