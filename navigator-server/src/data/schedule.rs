//! Schedule CSV ingestion.
//!
//! Each row describes one ride between two consecutive stops:
//!
//! ```text
//! index,company,line,departure_time,arrival_time,start_stop,end_stop,start_lat,start_lon,end_lat,end_lon
//! 0,MPK,A,20:52:00,20:53:00,Kwiska,Kwiska,51.1220,16.9790,51.1230,16.9820
//! ```
//!
//! Columns are read by position, so the header names do not matter.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::error::DataError;
use super::graph::{TransitGraph, TransitGraphBuilder};
use super::location::Location;
use super::time::{normalize, parse_time_value};
use crate::config::GraphConfig;

/// One validated schedule row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub index: i64,
    pub company: String,
    pub line: String,
    /// Seconds since midnight, normalised into the day.
    pub departure_time: i32,
    /// Seconds since midnight, normalised into the day.
    pub arrival_time: i32,
    pub start_stop: String,
    pub end_stop: String,
    pub start_location: Location,
    pub end_location: Location,
}

#[derive(Debug, Deserialize)]
struct RawScheduleRow {
    index: i64,
    company: String,
    line: String,
    departure_time: String,
    arrival_time: String,
    start_stop: String,
    end_stop: String,
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
}

impl TryFrom<RawScheduleRow> for ScheduleRecord {
    type Error = DataError;

    fn try_from(raw: RawScheduleRow) -> Result<Self, Self::Error> {
        let index = raw.index;
        let time = |s: &str| {
            parse_time_value(s)
                .map(normalize)
                .map_err(|source| DataError::Time { index, source })
        };
        let departure_time = time(&raw.departure_time)?;
        let arrival_time = time(&raw.arrival_time)?;

        if raw.start_stop.trim().is_empty() || raw.end_stop.trim().is_empty() {
            return Err(DataError::Record {
                index,
                reason: "stop name is empty",
            });
        }
        if raw.line.trim().is_empty() {
            return Err(DataError::Record {
                index,
                reason: "line is empty",
            });
        }

        Ok(Self {
            index,
            company: raw.company,
            line: raw.line,
            departure_time,
            arrival_time,
            start_stop: raw.start_stop,
            end_stop: raw.end_stop,
            start_location: Location::new(raw.start_lat, raw.start_lon),
            end_location: Location::new(raw.end_lat, raw.end_lon),
        })
    }
}

/// Read schedule records, skipping rows that fail to parse.
///
/// Returns the records and the number of rows skipped.
pub fn read_records<R: Read>(reader: R) -> Result<(Vec<ScheduleRecord>, usize), DataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    // Rows are read as bytes so a row that is not UTF-8 is skipped like any
    // other bad row; only read failures abort.
    for row in csv_reader.byte_records() {
        let row = row?;
        let line = row.position().map(|p| p.line());
        let parsed = csv::StringRecord::from_byte_record(row)
            .map_err(|e| e.utf8_error().to_string())
            .and_then(|row| {
                row.deserialize::<RawScheduleRow>(None)
                    .map_err(DataError::from)
                    .and_then(ScheduleRecord::try_from)
                    .map_err(|e| e.to_string())
            });
        match parsed {
            Ok(record) => records.push(record),
            Err(error) => {
                skipped += 1;
                warn!(line, %error, "skipping schedule row");
            }
        }
    }
    Ok((records, skipped))
}

/// Build the transit graph from CSV data.
pub fn load_graph_from_reader<R: Read>(
    reader: R,
    config: &GraphConfig,
) -> Result<TransitGraph, DataError> {
    let started = std::time::Instant::now();
    let (records, skipped) = read_records(reader)?;
    if records.is_empty() {
        return Err(DataError::Empty);
    }

    let mut builder = TransitGraphBuilder::new();
    for (count, record) in records.iter().enumerate() {
        builder.add_record(record);
        if (count + 1) % 10_000 == 0 {
            info!(records = count + 1, "parsed schedule records");
        }
    }
    info!(
        records = records.len(),
        skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "parsed schedule"
    );

    let walk_started = std::time::Instant::now();
    builder.connect_by_walk(config.walk_distance_limit());
    info!(
        elapsed_ms = walk_started.elapsed().as_millis() as u64,
        "joined stops by walk"
    );

    let graph = builder.build();
    graph.log_summary();
    Ok(graph)
}

/// Build the transit graph from the schedule file named in `config`.
pub fn load_graph(config: &GraphConfig) -> Result<TransitGraph, DataError> {
    load_graph_from_path(&config.schedule_path, config)
}

/// Build the transit graph from a CSV file.
pub fn load_graph_from_path(
    path: impl AsRef<Path>,
    config: &GraphConfig,
) -> Result<TransitGraph, DataError> {
    let file = std::fs::File::open(path.as_ref())?;
    load_graph_from_reader(std::io::BufReader::new(file), config)
}
