//! Directed, time-aware links between stops.

use serde::Serialize;

use super::location::Location;
use super::time::{time_distance, to_distance_description, to_time_description, to_time_string};

/// Walking speed used to price walk connections.
pub const WALK_SPEED_KMH: f64 = 5.0;

/// A scheduled ride between two consecutive stops of a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferConnection {
    pub start: String,
    pub end: String,
    pub company: String,
    pub line: String,
    /// Seconds since midnight, within the day.
    pub departure_time: i32,
    /// Seconds since midnight, within the day. May be before departure.
    pub arrival_time: i32,
    pub start_location: Location,
    pub end_location: Location,
}

impl TransferConnection {
    /// Ride time, wrapping past midnight.
    pub fn duration(&self) -> i32 {
        time_distance(self.departure_time, self.arrival_time)
    }

    /// Wait from `passenger_time` until the next departure.
    pub fn waiting_time(&self, passenger_time: i32) -> i32 {
        time_distance(passenger_time, self.departure_time)
    }

    pub fn distance_km(&self) -> f64 {
        self.start_location.distance_km(&self.end_location)
    }

    pub fn description(&self) -> String {
        format!(
            "{} by vehicle \"{}\": {} ({}) - {} ({})",
            self.company,
            self.line,
            self.start,
            to_time_string(self.departure_time),
            self.end,
            to_time_string(self.arrival_time),
        )
    }
}

/// A walk between two stops, always available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkConnection {
    pub start: String,
    pub end: String,
    pub distance_km: f64,
    /// Seconds.
    pub duration: i32,
}

impl WalkConnection {
    /// Walk of `distance_km` at [`WALK_SPEED_KMH`].
    pub fn new(start: impl Into<String>, end: impl Into<String>, distance_km: f64) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            distance_km,
            duration: (distance_km / WALK_SPEED_KMH * 3600.0).round() as i32,
        }
    }

    /// Walk between two located stops.
    pub fn between(
        start: impl Into<String>,
        end: impl Into<String>,
        from: &Location,
        to: &Location,
    ) -> Self {
        Self::new(start, end, from.distance_km(to))
    }

    pub fn description(&self) -> String {
        format!(
            "Walk {} from {} to {} for {}",
            to_distance_description(self.distance_km),
            self.start,
            self.end,
            to_time_description(self.duration),
        )
    }
}

/// Either a ride or a walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Connection {
    Transfer(TransferConnection),
    Walk(WalkConnection),
}

impl Connection {
    pub fn start(&self) -> &str {
        match self {
            Connection::Transfer(c) => &c.start,
            Connection::Walk(c) => &c.start,
        }
    }

    pub fn end(&self) -> &str {
        match self {
            Connection::Transfer(c) => &c.end,
            Connection::Walk(c) => &c.end,
        }
    }

    /// Line ridden, `None` for walks.
    pub fn line(&self) -> Option<&str> {
        match self {
            Connection::Transfer(c) => Some(&c.line),
            Connection::Walk(_) => None,
        }
    }

    /// Travel time in seconds, excluding any wait.
    pub fn duration(&self) -> i32 {
        match self {
            Connection::Transfer(c) => c.duration(),
            Connection::Walk(c) => c.duration,
        }
    }

    pub fn distance_km(&self) -> f64 {
        match self {
            Connection::Transfer(c) => c.distance_km(),
            Connection::Walk(c) => c.distance_km,
        }
    }

    /// Seconds a passenger at `passenger_time` waits before setting off.
    pub fn waiting_time(&self, passenger_time: i32) -> i32 {
        match self {
            Connection::Transfer(c) => c.waiting_time(passenger_time),
            Connection::Walk(_) => 0,
        }
    }

    /// Wait plus travel time.
    pub fn total_time_cost(&self, passenger_time: i32) -> i32 {
        self.waiting_time(passenger_time) + self.duration()
    }

    pub fn description(&self) -> String {
        match self {
            Connection::Transfer(c) => c.description(),
            Connection::Walk(c) => c.description(),
        }
    }
}
