//! Transit data: stops, connections and the graph built from a schedule.

mod bus_stop;
pub(crate) mod connection;
mod error;
mod graph;
mod location;
mod schedule;
pub mod time;

pub use bus_stop::BusStop;
pub use connection::{Connection, TransferConnection, WALK_SPEED_KMH, WalkConnection};
pub use error::DataError;
pub use graph::{GraphSummary, TransitGraph, TransitGraphBuilder};
pub use location::Location;
pub use schedule::{ScheduleRecord, load_graph, load_graph_from_path, load_graph_from_reader, read_records};
pub use time::TimeError;
