//! Public transit navigator server.
//!
//! Loads a timetable into a graph of stops and connections, answers
//! point-to-point queries with Dijkstra or A*, and orders multi-stop tours
//! with Tabu Search.

pub mod algorithm;
pub mod bridge;
pub mod config;
pub mod data;
pub mod deadline;
pub mod stops;
pub mod web;
