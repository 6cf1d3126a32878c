//! Stops of the transit graph.

use std::collections::BTreeSet;

use super::connection::Connection;
use super::location::Location;

/// A named stop, its outgoing connections and everything observed about it.
#[derive(Debug, Clone)]
pub struct BusStop {
    name: String,
    connections: Vec<Connection>,
    locations: Vec<Location>,
    lines: BTreeSet<String>,
    location: Option<Location>,
}

impl BusStop {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: Vec::new(),
            locations: Vec::new(),
            lines: BTreeSet::new(),
            location: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outgoing connections.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Distinct coordinates observed for this stop.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Lines departing from this stop.
    pub fn lines(&self) -> &BTreeSet<String> {
        &self.lines
    }

    /// Mean of the observed locations, `None` if none were observed.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub(crate) fn add_connection(&mut self, connection: Connection) {
        if let Some(line) = connection.line() {
            self.lines.insert(line.to_string());
        }
        self.connections.push(connection);
    }

    pub(crate) fn add_location(&mut self, location: Location) {
        if !self.locations.iter().any(|l| l.key() == location.key()) {
            self.locations.push(location);
        }
    }

    /// Fix the stop's location as the mean of everything observed so far.
    pub(crate) fn settle_location(&mut self) {
        self.location = Location::mean(&self.locations);
    }
}
