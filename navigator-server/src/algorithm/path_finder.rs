//! A*-style guided best-first search.
//!
//! Heuristics used with this solver are not required to be admissible, so
//! the result is a guided search rather than a guaranteed shortest path.
//! Closed nodes are never reopened.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use ordered_float::OrderedFloat;
use tracing::debug;

use super::cancel::{CancelToken, Cancelled};
use super::frontier::Frontier;
use super::problem::{Edge, Problem, Solution, Weight, trace_route};

/// Guided search from `problem.start` to `problem.end`.
///
/// Stops as soon as the goal is popped from the open set. A missing
/// heuristic counts as zero.
pub fn path_finder<N>(problem: &Problem<'_, N>) -> Solution<N>
where
    N: Eq + Hash + Clone,
{
    path_finder_until(problem, &CancelToken::new()).unwrap_or_default()
}

/// [`path_finder`] that gives up once `cancel` is set.
pub fn path_finder_until<N>(
    problem: &Problem<'_, N>,
    cancel: &CancelToken,
) -> Result<Solution<N>, Cancelled>
where
    N: Eq + Hash + Clone,
{
    let mut g: HashMap<N, Weight> = HashMap::new();
    let mut h: HashMap<N, f64> = HashMap::new();
    let mut parents: HashMap<N, Edge<N>> = HashMap::new();
    let mut closed: HashSet<N> = HashSet::new();
    // Open nodes mapped to the sequence number of their live queue entry.
    let mut open: HashMap<N, u64> = HashMap::new();
    let mut frontier = Frontier::new();

    let start_estimate = problem.estimate(&problem.start);
    g.insert(problem.start.clone(), 0);
    h.insert(problem.start.clone(), start_estimate);
    let seq = frontier.push(OrderedFloat(start_estimate), problem.start.clone());
    open.insert(problem.start.clone(), seq);

    let mut expanded = 0usize;
    while let Some((_, seq, current)) = frontier.pop() {
        cancel.check()?;

        if open.get(&current) != Some(&seq) {
            continue;
        }
        open.remove(&current);
        if current == problem.end {
            break;
        }

        let current_g = g.get(&current).copied().unwrap_or_default();
        closed.insert(current.clone());
        expanded += 1;

        for edge in problem.edges_from(&current) {
            let next = edge.end.clone();
            if closed.contains(&next) {
                continue;
            }

            let tentative = current_g.saturating_add(edge.weight);
            let estimate = if open.contains_key(&next) {
                if g.get(&next).is_some_and(|best| tentative >= *best) {
                    continue;
                }
                h.get(&next).copied().unwrap_or(0.0)
            } else {
                let estimate = problem.estimate(&next);
                h.insert(next.clone(), estimate);
                estimate
            };

            g.insert(next.clone(), tentative);
            parents.insert(next.clone(), edge);
            let seq = frontier.push(OrderedFloat(tentative as f64 + estimate), next.clone());
            open.insert(next, seq);
        }
    }

    debug!(
        expanded,
        reached = parents.contains_key(&problem.end),
        "path finder finished"
    );
    Ok(trace_route(&parents, &problem.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::problem::tests::graph_problem;
    use crate::algorithm::{dijkstra, solution_weight};

    #[test]
    fn zero_heuristic_matches_dijkstra() {
        let edges = [(0, 1, 10), (0, 2, 1), (2, 1, 2), (1, 3, 1), (2, 3, 9)];
        let problem = graph_problem(&edges, 0, 3).with_heuristic(|_| 0.0);

        let guided = path_finder(&problem);
        assert_eq!(solution_weight(&guided), solution_weight(&dijkstra(&problem)));
        assert_eq!(solution_weight(&guided), 4);
    }

    #[test]
    fn reopens_open_node_with_cheaper_path() {
        // 0->1 is expensive but discovered first; 0->2->1 improves it while 1 is open.
        let edges = [(0, 1, 10), (0, 2, 1), (2, 1, 1), (1, 3, 1)];
        let problem = graph_problem(&edges, 0, 3);

        let route = path_finder(&problem);
        let stops: Vec<u32> = route.iter().map(|e| e.end).collect();
        assert_eq!(stops, vec![2, 1, 3]);
    }

    #[test]
    fn misleading_heuristic_never_beats_dijkstra() {
        // The heuristic pushes the search down the expensive branch first.
        let edges = [(0, 1, 1), (1, 3, 1), (0, 2, 1), (2, 3, 10)];
        let problem = graph_problem(&edges, 0, 3).with_heuristic(|n| match n {
            1 => 100.0,
            _ => 0.0,
        });

        let guided = path_finder(&problem);
        assert!(solution_weight(&guided) >= solution_weight(&dijkstra(&problem)));
        assert_eq!(guided.last().map(|e| e.end), Some(3));
    }

    #[test]
    fn start_equals_end_is_empty() {
        let edges = [(0, 1, 1)];
        let problem = graph_problem(&edges, 0, 0);
        assert!(path_finder(&problem).is_empty());
    }

    #[test]
    fn unreachable_is_empty() {
        let edges = [(0, 1, 1), (2, 3, 1)];
        let problem = graph_problem(&edges, 0, 3);
        assert!(path_finder(&problem).is_empty());
    }

    #[test]
    fn stops_at_goal_without_exploring_further() {
        use std::cell::Cell;

        let expansions = Cell::new(0);
        let problem = Problem::new(0u32, 1u32, |n: &u32| {
            expansions.set(expansions.get() + 1);
            vec![Edge::new(*n, n + 1, 1, "step")]
        });

        let route = path_finder(&problem);
        assert_eq!(route.len(), 1);
        assert_eq!(expansions.get(), 1);
    }

    #[test]
    fn cancelled_search_reports_cancellation() {
        let edges = [(0, 1, 1)];
        let problem = graph_problem(&edges, 0, 1);
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(path_finder_until(&problem, &token), Err(Cancelled));
    }
}

#[cfg(test)]
mod proptests {
    use crate::algorithm::problem::tests::graph_problem;
    use super::*;
    use crate::algorithm::{dijkstra, solution_weight};
    use proptest::prelude::*;

    fn small_graph() -> impl Strategy<Value = Vec<(u32, u32, Weight)>> {
        prop::collection::vec((0u32..6, 0u32..6, 0i64..20), 0..18)
    }

    proptest! {
        /// Without a heuristic the cost equals Dijkstra's.
        #[test]
        fn admissible_matches_dijkstra(edges in small_graph(), start in 0u32..6, end in 0u32..6) {
            let problem = graph_problem(&edges, start, end);
            let exact = dijkstra(&problem);
            let guided = path_finder(&problem);
            prop_assert_eq!(solution_weight(&guided), solution_weight(&exact));
            prop_assert_eq!(guided.is_empty(), exact.is_empty());
        }

        /// Half the true remaining cost is admissible and consistent, so the
        /// guided search still finds an optimal route.
        #[test]
        fn consistent_heuristic_matches_dijkstra(
            edges in small_graph(),
            start in 0u32..6,
            end in 0u32..6,
        ) {
            let remaining: Vec<f64> = (0u32..6)
                .map(|node| {
                    let route = dijkstra(&graph_problem(&edges, node, end));
                    if node == end {
                        0.0
                    } else if route.is_empty() {
                        // Cannot reach the goal at all.
                        1e6
                    } else {
                        solution_weight(&route) as f64 / 2.0
                    }
                })
                .collect();

            let problem = graph_problem(&edges, start, end)
                .with_heuristic(move |n| remaining[*n as usize]);
            let exact = dijkstra(&problem);
            let guided = path_finder(&problem);
            prop_assert_eq!(solution_weight(&guided), solution_weight(&exact));
            prop_assert_eq!(guided.is_empty(), exact.is_empty());
        }

        /// An arbitrary heuristic may cost optimality, never undercut it.
        #[test]
        fn arbitrary_heuristic_never_below_dijkstra(
            edges in small_graph(),
            start in 0u32..6,
            end in 0u32..6,
            estimates in prop::collection::vec(0.0f64..50.0, 6),
        ) {
            prop_assume!(start != end);
            let problem = graph_problem(&edges, start, end)
                .with_heuristic(move |n| estimates[*n as usize]);
            let exact = dijkstra(&problem);
            let guided = path_finder(&problem);
            if !exact.is_empty() {
                prop_assert!(!guided.is_empty());
                prop_assert!(solution_weight(&guided) >= solution_weight(&exact));
            }
        }
    }
}
