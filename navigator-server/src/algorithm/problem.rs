//! Weighted directed search spaces.

use std::collections::HashMap;
use std::hash::Hash;

/// Edge weight. Always non-negative.
pub type Weight = i64;

/// A directed, weighted edge between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<N> {
    /// Node the edge leaves from.
    pub start: N,
    /// Node the edge arrives at.
    pub end: N,
    /// Cost of traversing the edge.
    pub weight: Weight,
    /// Human-readable description of the traversal.
    pub description: String,
}

impl<N> Edge<N> {
    /// Create a new edge.
    pub fn new(start: N, end: N, weight: Weight, description: impl Into<String>) -> Self {
        Self {
            start,
            end,
            weight,
            description: description.into(),
        }
    }
}

/// Ordered edges from start to end.
///
/// Empty both when start and end coincide and when the end is unreachable;
/// callers tell the two apart by comparing the endpoints.
pub type Solution<N> = Vec<Edge<N>>;

/// Outgoing edges of a node.
pub type EdgeFetcher<'a, N> = Box<dyn Fn(&N) -> Vec<Edge<N>> + 'a>;

/// Estimated remaining cost from a node to the goal.
pub type HeuristicFn<'a, N> = Box<dyn Fn(&N) -> f64 + 'a>;

/// A single-pair search problem.
///
/// The edge fetcher and heuristic must be pure functions of the node and
/// whatever configuration they captured.
pub struct Problem<'a, N> {
    /// Where the search starts.
    pub start: N,

    /// The goal node.
    pub end: N,

    /// Generates outgoing edges lazily, per expanded node.
    pub edges: EdgeFetcher<'a, N>,

    /// Heuristic for guided search. Absent for plain Dijkstra.
    pub heuristic: Option<HeuristicFn<'a, N>>,
}

impl<'a, N> Problem<'a, N> {
    /// Create a problem without a heuristic.
    pub fn new(start: N, end: N, edges: impl Fn(&N) -> Vec<Edge<N>> + 'a) -> Self {
        Self {
            start,
            end,
            edges: Box::new(edges),
            heuristic: None,
        }
    }

    /// Attach a heuristic.
    pub fn with_heuristic(mut self, heuristic: impl Fn(&N) -> f64 + 'a) -> Self {
        self.heuristic = Some(Box::new(heuristic));
        self
    }

    /// Outgoing edges of `node`.
    pub fn edges_from(&self, node: &N) -> Vec<Edge<N>> {
        (self.edges)(node)
    }

    /// Heuristic estimate for `node`, or zero without a heuristic.
    pub fn estimate(&self, node: &N) -> f64 {
        self.heuristic.as_ref().map_or(0.0, |h| h(node))
    }
}

/// Walk predecessor edges back from `end` and return them in travel order.
///
/// Returns an empty solution when `end` has no predecessor.
pub fn trace_route<N>(footprints: &HashMap<N, Edge<N>>, end: &N) -> Solution<N>
where
    N: Eq + Hash + Clone,
{
    let mut route = Vec::new();
    let mut current = footprints.get(end);
    while let Some(edge) = current {
        // A predecessor chain can never be longer than the map itself.
        if route.len() >= footprints.len() {
            break;
        }
        route.push(edge.clone());
        current = footprints.get(&edge.start);
    }
    route.reverse();
    route
}

/// Sum of edge weights, saturating.
pub fn solution_weight<N>(solution: &[Edge<N>]) -> Weight {
    solution
        .iter()
        .fold(0, |total: Weight, edge| total.saturating_add(edge.weight))
}
