//! The in-memory transit graph.
//!
//! Built once at start-up by [`TransitGraphBuilder`] and read-only after
//! that, so it can be shared between concurrent searches behind an `Arc`.

use std::collections::HashMap;

use tracing::info;

use super::bus_stop::BusStop;
use super::connection::{Connection, TransferConnection, WalkConnection};
use super::location::Location;
use super::schedule::ScheduleRecord;
use super::time::{time_distance, to_distance_description, to_time_description};

/// Per-line aggregates gathered while ingesting records.
#[derive(Debug, Clone, Default)]
struct LineStats {
    popularity: u32,
    total_time: i64,
    total_distance_km: f64,
}

/// Stops keyed by name plus per-line statistics.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    stops: HashMap<String, BusStop>,
    lines: HashMap<String, LineStats>,
}

impl TransitGraph {
    /// Every stop, keyed by name.
    pub fn bus_stops(&self) -> &HashMap<String, BusStop> {
        &self.stops
    }

    pub fn stop(&self, name: &str) -> Option<&BusStop> {
        self.stops.get(name)
    }

    /// Number of records seen for `line`.
    pub fn line_popularity(&self, line: &str) -> Option<u32> {
        self.lines.get(line).map(|stats| stats.popularity)
    }

    /// Mean ride time between consecutive stops of `line`, rounded to seconds.
    ///
    /// `None` for unknown lines or when the total is not positive.
    pub fn average_time_of(&self, line: &str) -> Option<i32> {
        let stats = self.lines.get(line)?;
        if stats.total_time <= 0 || stats.popularity == 0 {
            return None;
        }
        Some((stats.total_time as f64 / f64::from(stats.popularity)).round() as i32)
    }

    /// Mean distance between consecutive stops of `line`, in kilometres.
    pub fn average_distance_of(&self, line: &str) -> Option<f64> {
        let stats = self.lines.get(line)?;
        if stats.total_distance_km <= 0.0 || stats.popularity == 0 {
            return None;
        }
        Some(stats.total_distance_km / f64::from(stats.popularity))
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn connection_count(&self) -> usize {
        self.stops.values().map(|s| s.connections().len()).sum()
    }

    /// Names of every known line.
    pub fn line_names(&self) -> impl Iterator<Item = &str> {
        self.lines.keys().map(String::as_str)
    }

    /// Sizes and the top five lines by popularity, speed and length.
    pub fn summary(&self) -> GraphSummary {
        let mut popular: Vec<(String, u32)> = self
            .lines
            .iter()
            .map(|(line, stats)| (line.clone(), stats.popularity))
            .collect();
        popular.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        popular.truncate(5);

        let mut fastest: Vec<(String, i32)> = self
            .line_names()
            .filter_map(|line| Some((line.to_string(), self.average_time_of(line)?)))
            .collect();
        fastest.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        fastest.truncate(5);

        let mut longest: Vec<(String, f64)> = self
            .line_names()
            .filter_map(|line| Some((line.to_string(), self.average_distance_of(line)?)))
            .collect();
        longest.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        longest.truncate(5);

        GraphSummary {
            stops: self.stop_count(),
            connections: self.connection_count(),
            popular_lines: popular,
            fastest_lines: fastest,
            longest_lines: longest,
        }
    }

    /// Log [`TransitGraph::summary`] at `info`.
    pub fn log_summary(&self) {
        let summary = self.summary();
        info!(
            stops = summary.stops,
            connections = summary.connections,
            "graph loaded"
        );
        let join = |items: Vec<String>| items.join(", ");
        info!(
            "popular lines: {}",
            join(summary.popular_lines.iter().map(|(l, n)| format!("{l} ({n} transfers)")).collect())
        );
        info!(
            "fastest lines: {}",
            join(summary.fastest_lines.iter().map(|(l, t)| format!("{l} ({})", to_time_description(*t))).collect())
        );
        info!(
            "longest lines: {}",
            join(summary.longest_lines.iter().map(|(l, d)| format!("{l} ({})", to_distance_description(*d))).collect())
        );
    }
}

/// Headline numbers about a loaded graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSummary {
    pub stops: usize,
    pub connections: usize,
    pub popular_lines: Vec<(String, u32)>,
    pub fastest_lines: Vec<(String, i32)>,
    pub longest_lines: Vec<(String, f64)>,
}

/// Accumulates schedule records into a [`TransitGraph`].
#[derive(Debug, Default)]
pub struct TransitGraphBuilder {
    stops: HashMap<String, BusStop>,
    // Insertion order, so walk synthesis is deterministic.
    order: Vec<String>,
    lines: HashMap<String, LineStats>,
}

impl TransitGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn stop_mut(&mut self, name: &str) -> &mut BusStop {
        if !self.stops.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.stops
            .entry(name.to_string())
            .or_insert_with(|| BusStop::new(name))
    }

    /// Make sure a stop exists, even without connections.
    #[cfg(test)]
    pub(crate) fn add_stop(&mut self, name: &str) -> &mut Self {
        self.stop_mut(name);
        self
    }

    /// Record an observed coordinate for a stop.
    pub fn add_location(&mut self, name: &str, location: Location) -> &mut Self {
        self.stop_mut(name).add_location(location);
        self
    }

    /// Add a connection to its start stop, creating both endpoints.
    pub fn add_connection(&mut self, connection: Connection) -> &mut Self {
        self.stop_mut(connection.end());
        let start = connection.start().to_string();
        self.stop_mut(&start).add_connection(connection);
        self
    }

    /// Add one ride and update the line statistics.
    pub fn add_record(&mut self, record: &ScheduleRecord) -> &mut Self {
        let connection = TransferConnection {
            start: record.start_stop.clone(),
            end: record.end_stop.clone(),
            company: record.company.clone(),
            line: record.line.clone(),
            departure_time: record.departure_time,
            arrival_time: record.arrival_time,
            start_location: record.start_location,
            end_location: record.end_location,
        };
        self.add_connection(Connection::Transfer(connection));
        self.add_location(&record.start_stop, record.start_location);
        self.add_location(&record.end_stop, record.end_location);

        let stats = self.lines.entry(record.line.clone()).or_default();
        stats.popularity += 1;
        stats.total_time += i64::from(time_distance(record.departure_time, record.arrival_time));
        stats.total_distance_km += record.start_location.distance_km(&record.end_location);
        self
    }

    /// Connect every pair of located stops by walks in both directions.
    ///
    /// With `max_distance_km` set, only pairs at most that far apart are
    /// connected. Stop locations are settled first.
    pub fn connect_by_walk(&mut self, max_distance_km: Option<f64>) -> &mut Self {
        self.settle_locations();

        let located: Vec<(String, Location)> = self
            .order
            .iter()
            .filter_map(|name| Some((name.clone(), self.stops.get(name)?.location()?)))
            .collect();

        let mut added = 0usize;
        for (i, (a, a_loc)) in located.iter().enumerate() {
            for (b, b_loc) in &located[i + 1..] {
                let distance = a_loc.distance_km(b_loc);
                if max_distance_km.is_some_and(|max| distance > max) {
                    continue;
                }
                self.add_connection(Connection::Walk(WalkConnection::new(a, b, distance)));
                self.add_connection(Connection::Walk(WalkConnection::new(b, a, distance)));
                added += 2;
            }
        }
        info!(walks = added, "synthesised walk connections");
        self
    }

    fn settle_locations(&mut self) {
        for stop in self.stops.values_mut() {
            stop.settle_location();
        }
    }

    /// Finish the graph. Stop locations are fixed from this point on.
    pub fn build(mut self) -> TransitGraph {
        self.settle_locations();
        TransitGraph {
            stops: self.stops,
            lines: self.lines,
        }
    }
}
