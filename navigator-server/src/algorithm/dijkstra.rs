//! Dijkstra's shortest-path search.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use super::cancel::{CancelToken, Cancelled};
use super::frontier::Frontier;
use super::problem::{Edge, Problem, Solution, Weight, trace_route};

/// Find the least-weight path from `problem.start` to `problem.end`.
///
/// The whole reachable component is settled; there is no early exit on
/// reaching the goal. Returns an empty solution when the goal is the start
/// or is unreachable.
pub fn dijkstra<N>(problem: &Problem<'_, N>) -> Solution<N>
where
    N: Eq + Hash + Clone,
{
    // A fresh token is never cancelled.
    dijkstra_until(problem, &CancelToken::new()).unwrap_or_default()
}

/// [`dijkstra`] that gives up once `cancel` is set.
pub fn dijkstra_until<N>(
    problem: &Problem<'_, N>,
    cancel: &CancelToken,
) -> Result<Solution<N>, Cancelled>
where
    N: Eq + Hash + Clone,
{
    let mut distances: HashMap<N, Weight> = HashMap::new();
    let mut footprints: HashMap<N, Edge<N>> = HashMap::new();
    let mut queue = Frontier::new();

    distances.insert(problem.start.clone(), 0);
    queue.push(0, problem.start.clone());

    let mut settled = 0usize;
    while let Some((node_distance, _, node)) = queue.pop() {
        cancel.check()?;

        // Stale entry: a shorter distance was recorded after it was queued.
        if distances.get(&node).is_some_and(|best| node_distance > *best) {
            continue;
        }
        settled += 1;

        for edge in problem.edges_from(&node) {
            let new_distance = node_distance.saturating_add(edge.weight);
            // A node without a recorded distance is unreached.
            if distances.get(&edge.end).is_none_or(|best| new_distance < *best) {
                distances.insert(edge.end.clone(), new_distance);
                queue.push(new_distance, edge.end.clone());
                footprints.insert(edge.end.clone(), edge);
            }
        }
    }

    debug!(
        settled,
        reached = footprints.contains_key(&problem.end),
        "dijkstra finished"
    );
    Ok(trace_route(&footprints, &problem.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::problem::tests::graph_problem;
    use crate::algorithm::solution_weight;

    #[test]
    fn finds_cheaper_indirect_path() {
        let edges = [(0, 1, 10), (0, 2, 1), (2, 1, 2), (1, 3, 1)];
        let problem = graph_problem(&edges, 0, 3);

        let route = dijkstra(&problem);
        let stops: Vec<u32> = route.iter().map(|e| e.end).collect();
        assert_eq!(stops, vec![2, 1, 3]);
        assert_eq!(solution_weight(&route), 4);
    }

    #[test]
    fn start_equals_end_is_empty() {
        let edges = [(0, 1, 1), (1, 0, 1)];
        let problem = graph_problem(&edges, 0, 0);
        assert!(dijkstra(&problem).is_empty());
    }

    #[test]
    fn unreachable_is_empty() {
        let edges = [(0, 1, 1), (2, 3, 1)];
        let problem = graph_problem(&edges, 0, 3);
        assert!(dijkstra(&problem).is_empty());
    }

    #[test]
    fn zero_weight_edges() {
        let edges = [(0, 1, 0), (1, 2, 0), (0, 2, 1)];
        let problem = graph_problem(&edges, 0, 2);
        let route = dijkstra(&problem);
        assert_eq!(solution_weight(&route), 0);
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn huge_weights_still_reach_the_goal() {
        let huge = Weight::MAX / 4;
        let edges = [(0, 1, huge), (1, 2, huge), (2, 3, huge), (3, 4, huge), (4, 5, huge)];
        let problem = graph_problem(&edges, 0, 5);

        let route = dijkstra(&problem);
        assert_eq!(route.len(), 5);
        assert_eq!(solution_weight(&route), Weight::MAX);
    }

    #[test]
    fn cancelled_search_reports_cancellation() {
        let edges = [(0, 1, 1)];
        let problem = graph_problem(&edges, 0, 1);
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(dijkstra_until(&problem, &token), Err(Cancelled));
    }
}
