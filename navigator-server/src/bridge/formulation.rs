//! Validated routing queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::time::{TimeError, parse_clock};
use crate::stops::{StopIndex, StopLookupError};

/// Quantity a route minimises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Elapsed seconds, waits included.
    Time,
    /// Number of hops, rides and walks alike.
    Transfers,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Time => write!(f, "Time"),
            Parameter::Transfers => write!(f, "Transfers"),
        }
    }
}

/// Point-to-point solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Dijkstra,
    /// Heuristic-guided best-first search (A*).
    #[serde(alias = "a*", alias = "astar", alias = "a_star")]
    PathFinder,
}

impl Algorithm {
    /// Heuristic used when a query names none.
    pub fn default_heuristic(self) -> Heuristic {
        match self {
            Algorithm::Dijkstra => Heuristic::Empty,
            Algorithm::PathFinder => Heuristic::DistanceAndOverlap,
        }
    }
}

/// Estimate of the remaining cost used to guide [`Algorithm::PathFinder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    Empty,
    Distance,
    LinesCount,
    ConnectionCount,
    LinesOverlap,
    LocationsCoverage,
    LinePopularity,
    LineAvgTime,
    LineAvgDistance,
    DistanceAndOverlap,
    CompoundCount,
}

impl Heuristic {
    pub const ALL: [Heuristic; 11] = [
        Heuristic::Empty,
        Heuristic::Distance,
        Heuristic::LinesCount,
        Heuristic::ConnectionCount,
        Heuristic::LinesOverlap,
        Heuristic::LocationsCoverage,
        Heuristic::LinePopularity,
        Heuristic::LineAvgTime,
        Heuristic::LineAvgDistance,
        Heuristic::DistanceAndOverlap,
        Heuristic::CompoundCount,
    ];
}

/// Errors from turning user input into a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulationError {
    /// A stop name did not resolve
    #[error(transparent)]
    Stop(#[from] StopLookupError),

    /// The departure time did not parse
    #[error(transparent)]
    Time(#[from] TimeError),

    /// A tour needs at least two distinct stops
    #[error("a tour needs at least 2 stops, got {0}")]
    TooFewStops(usize),

    /// A tour names the same stop twice
    #[error("stop {0:?} appears more than once in the tour")]
    DuplicateStop(String),
}

/// A fully specified point-to-point query.
///
/// Stop names are exact graph keys and `time` is seconds since midnight.
/// The routing engine takes these as given and does not re-check them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Formulation {
    pub parameter: Parameter,
    pub algorithm: Algorithm,
    pub heuristic: Heuristic,
    pub start: String,
    pub end: String,
    pub time: i32,
}

impl Formulation {
    pub fn new(
        parameter: Parameter,
        algorithm: Algorithm,
        heuristic: Heuristic,
        start: impl Into<String>,
        end: impl Into<String>,
        time: i32,
    ) -> Self {
        Self {
            parameter,
            algorithm,
            heuristic,
            start: start.into(),
            end: end.into(),
            time,
        }
    }

    /// Build a query from user input, resolving stop names and the clock time.
    pub fn resolve(
        stops: &StopIndex,
        parameter: Parameter,
        algorithm: Algorithm,
        heuristic: Option<Heuristic>,
        start: &str,
        end: &str,
        time: &str,
    ) -> Result<Self, FormulationError> {
        Ok(Self {
            parameter,
            algorithm,
            heuristic: heuristic.unwrap_or(algorithm.default_heuristic()),
            start: stops.resolve(start)?,
            end: stops.resolve(end)?,
            time: parse_clock(time)?,
        })
    }
}
