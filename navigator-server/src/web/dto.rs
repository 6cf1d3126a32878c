//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::algorithm::Edge;
use crate::bridge::{
    Algorithm, AspirationType, Heuristic, Parameter, RoutePlan, SamplingType, StatefulNode,
};
use crate::data::time::to_time_string;
use crate::stops::StopMatch;

/// Request to route between two stops.
#[derive(Debug, Deserialize)]
pub struct RoutePlanRequest {
    /// Starting stop, as typed
    pub start: String,

    /// Destination stop, as typed
    pub end: String,

    /// Departure time, `HH:MM:SS`
    pub time: String,

    pub parameter: Parameter,

    pub algorithm: Algorithm,

    /// Defaults depend on the algorithm
    pub heuristic: Option<Heuristic>,
}

/// Response for a routed query.
#[derive(Debug, Serialize)]
pub struct RoutePlanResponse {
    /// Whether any route was found
    pub found: bool,

    /// Start and end are the same stop
    pub already_there: bool,

    /// Human-readable report
    pub report: String,

    pub legs: Vec<LegResult>,

    /// Seconds travelled or hops taken, per the minimised parameter
    pub cost: i64,

    pub elapsed_ms: u64,
}

/// Request to optimise a circular tour.
#[derive(Debug, Deserialize)]
pub struct TourPlanRequest {
    /// Stops to visit; the first is where the tour starts and ends
    pub stops: Vec<String>,

    /// Departure time, `HH:MM:SS`
    pub time: String,

    pub parameter: Parameter,

    #[serde(default)]
    pub aspiration: AspirationType,

    #[serde(default)]
    pub tabu_limit: bool,

    #[serde(default)]
    pub sampling: SamplingType,
}

/// Response for an optimised tour.
#[derive(Debug, Serialize)]
pub struct TourPlanResponse {
    /// Best visiting order found
    pub plan: RoutePlan,

    pub report: String,

    pub legs: Vec<LegResult>,

    /// `null` when some leg is unreachable
    pub cost: Option<f64>,

    /// Every new best plan, in the order they were found
    pub improvements: Vec<Improvement>,

    pub elapsed_ms: u64,
}

/// A new best plan seen during tour optimisation.
#[derive(Debug, Clone, Serialize)]
pub struct Improvement {
    pub from_cost: f64,
    pub to_cost: f64,
    pub plan: RoutePlan,
}

/// One ride or walk of a route.
#[derive(Debug, Serialize)]
pub struct LegResult {
    pub from: String,
    pub to: String,

    /// Line ridden, absent for walks
    pub line: Option<String>,

    /// When the passenger is at `from`, before any wait
    pub ready_at: String,

    /// Arrival at `to`
    pub arrival: String,

    pub description: String,

    /// Cost the solver charged for this leg
    pub weight: i64,
}

/// Request to search stops by name.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    /// Search query
    pub q: String,

    /// Maximum number of results
    pub limit: Option<usize>,
}

/// Response for stop search.
#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub stops: Vec<StopMatch>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl LegResult {
    pub fn from_edge(edge: &Edge<StatefulNode>) -> Self {
        Self {
            from: edge.start.stop_name.clone(),
            to: edge.end.stop_name.clone(),
            line: edge.end.last_line.clone(),
            ready_at: to_time_string(edge.start.time),
            arrival: to_time_string(edge.end.time),
            description: edge.description.clone(),
            weight: edge.weight,
        }
    }

    pub fn from_route(route: &[Edge<StatefulNode>]) -> Vec<Self> {
        route.iter().map(Self::from_edge).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Connection;
    use crate::data::connection::tests::ride;

    fn edge(connection: &Connection) -> Edge<StatefulNode> {
        let start = StatefulNode::start("A", 28500);
        let end = start.evolve(connection);
        Edge::new(start, end, 900, connection.description())
    }

    #[test]
    fn leg_from_ride() {
        let leg = LegResult::from_edge(&edge(&ride("A", "B", "1", 28800, 29400)));
        assert_eq!(leg.from, "A");
        assert_eq!(leg.to, "B");
        assert_eq!(leg.line.as_deref(), Some("1"));
        assert_eq!(leg.ready_at, "07:55:00");
        assert_eq!(leg.arrival, "08:10:00");
        assert_eq!(leg.weight, 900);
    }

    #[test]
    fn route_request_defaults_heuristic() {
        let req: RoutePlanRequest = serde_json::from_str(
            r#"{"start": "A", "end": "B", "time": "08:00:00", "parameter": "time", "algorithm": "a*"}"#,
        )
        .unwrap();
        assert_eq!(req.algorithm, Algorithm::PathFinder);
        assert_eq!(req.heuristic, None);
    }

    #[test]
    fn tour_request_options_are_optional() {
        let req: TourPlanRequest = serde_json::from_str(
            r#"{"stops": ["A", "B"], "time": "08:00:00", "parameter": "transfers"}"#,
        )
        .unwrap();
        assert_eq!(req.aspiration, AspirationType::None);
        assert!(!req.tabu_limit);
        assert_eq!(req.sampling, SamplingType::None);

        let req: TourPlanRequest = serde_json::from_str(
            r#"{"stops": ["A", "B", "C"], "time": "08:00:00", "parameter": "time",
                "aspiration": "max", "tabu_limit": true, "sampling": "by_distance"}"#,
        )
        .unwrap();
        assert_eq!(req.aspiration, AspirationType::Max);
        assert!(req.tabu_limit);
        assert_eq!(req.sampling, SamplingType::ByDistance);
    }

    #[test]
    fn unreachable_cost_serializes_as_null() {
        let response = TourPlanResponse {
            plan: vec!["A".into(), "D".into()],
            report: String::new(),
            legs: Vec::new(),
            cost: None,
            improvements: Vec::new(),
            elapsed_ms: 1,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["cost"].is_null());
    }
}
