//! Search state for time-dependent routing.

use std::hash::{Hash, Hasher};

use crate::data::Connection;

/// A passenger at a stop at some moment, with their journey so far.
///
/// Equality and hashing look at `stop_name` only. The searches therefore
/// treat every arrival at a stop as the same vertex and keep whichever
/// they reach first; the time and counters ride along as payload. This is
/// an approximation of the full time-expanded state space, not an exact
/// model of it.
#[derive(Debug, Clone)]
pub struct StatefulNode {
    pub stop_name: String,
    /// Seconds since midnight of the query's day. Not wrapped past midnight.
    pub time: i32,
    /// Hops taken so far.
    pub transfers: u32,
    /// Distinct rides and walks: staying on one line counts once.
    pub rides_and_walks: u32,
    /// Line of the last hop, `None` after a walk or at the start.
    pub last_line: Option<String>,
}

impl StatefulNode {
    /// The passenger at `stop_name` at `time`, nothing travelled yet.
    pub fn start(stop_name: impl Into<String>, time: i32) -> Self {
        Self {
            stop_name: stop_name.into(),
            time,
            transfers: 0,
            rides_and_walks: 0,
            last_line: None,
        }
    }

    /// A goal marker, matched by stop name alone.
    pub fn goal(stop_name: impl Into<String>) -> Self {
        Self {
            time: -1,
            ..Self::start(stop_name, 0)
        }
    }

    /// State after taking `connection` from here.
    pub fn evolve(&self, connection: &Connection) -> Self {
        let line = connection.line();
        let continues = self.rides_and_walks > 0 && line == self.last_line.as_deref();
        Self {
            stop_name: connection.end().to_string(),
            time: self.time + connection.total_time_cost(self.time),
            transfers: self.transfers + 1,
            rides_and_walks: self.rides_and_walks + u32::from(!continues),
            last_line: line.map(str::to_string),
        }
    }
}

impl PartialEq for StatefulNode {
    fn eq(&self, other: &Self) -> bool {
        self.stop_name == other.stop_name
    }
}

impl Eq for StatefulNode {}

impl Hash for StatefulNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stop_name.hash(state);
    }
}
