//! Generic search algorithms.
//!
//! Everything in this module is independent of transit data: the solvers
//! only see a [`Problem`] over some node type and return a [`Solution`].
//! The transit-specific state model lives in [`crate::bridge`].

mod cancel;
mod dijkstra;
mod frontier;
mod path_finder;
mod problem;
mod tabu;

pub use cancel::{CancelToken, Cancelled};
pub use dijkstra::{dijkstra, dijkstra_until};
pub use path_finder::{path_finder, path_finder_until};
pub use problem::{Edge, EdgeFetcher, HeuristicFn, Problem, Solution, Weight, solution_weight, trace_route};
pub use tabu::{Step, TabuSearch};
