//! Glue between the transit graph and the generic solvers.
//!
//! A query is first resolved into a [`Formulation`] (or a
//! [`TabuFormulation`] for tours), then composed into a search
//! [`Problem`](crate::algorithm::Problem) over [`StatefulNode`]s and solved.

mod composition;
mod config;
mod formulation;
mod node;
mod service;
mod tabu_formulation;
mod tabu_service;

pub use composition::{Composer, INFEASIBLE_WEIGHT, as_maximizing};
pub use config::{BridgeConfig, HeuristicWeights, TabuConfig, TransferPricing};
pub use formulation::{Algorithm, Formulation, FormulationError, Heuristic, Parameter};
pub use node::StatefulNode;
pub use service::{BridgeService, Route, RouteSummary, already_there, route_cost};
pub use tabu_formulation::{
    AspirationType, PlanObserver, RouteParams, RoutePlan, RoutePlanWithConfig, SamplingType,
    TabuFormulation,
};
pub use tabu_service::{Swaps, TabuBridgeService, TourRoute, TourSolution};
