//! Tabu Search over an arbitrary state type.
//!
//! Each iteration moves to the cheapest feasible neighbor of the current
//! local optimum, even when that neighbor is worse, and remembers it in a
//! tabu map so the search does not immediately cycle back. The best state
//! ever seen is what [`TabuSearch::run`] returns.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, trace};

use super::cancel::CancelToken;

type Neighborhood<'a, S> = Box<dyn Fn(&S) -> Box<dyn Iterator<Item = S> + 'a> + 'a>;
type CostFn<'a, S> = Box<dyn Fn(&S) -> f64 + 'a>;
type Aspiration<'a> = Box<dyn Fn(&[f64], f64) -> bool + 'a>;
type OnChange<'a, S> = Box<dyn FnMut(&S, &S, f64, f64) + 'a>;

/// Outcome of a single iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to a new local optimum; the search can continue.
    Moved,
    /// Every neighbor was tabu and none was admitted by aspiration.
    Exhausted,
    /// The same local optimum repeated more often than allowed.
    Repeating,
    /// The iteration budget is spent.
    Finished,
    /// The cancellation token was set.
    Cancelled,
}

/// Tabu Search state and configuration.
pub struct TabuSearch<'a, S> {
    neighborhood: Neighborhood<'a, S>,
    cost: CostFn<'a, S>,
    max_iterations: usize,
    memory_size: usize,
    aspiration: Option<Aspiration<'a>>,
    tabu_limit: Option<usize>,
    repetitions_limit: Option<usize>,
    on_change: Option<OnChange<'a, S>>,
    cancel: CancelToken,

    step: usize,
    tabu: HashMap<S, i64>,
    memory: Vec<f64>,
    local_optimum: S,
    global_optimum: S,
    global_best_cost: f64,
    repetitions: usize,
}

impl<'a, S> TabuSearch<'a, S>
where
    S: Clone + Eq + Hash,
{
    /// Create a search starting from `initial`.
    ///
    /// `neighborhood` must produce a finite sequence and may be called many
    /// times for the same state. Lower `cost` is better.
    pub fn new<N, I, C>(initial: S, neighborhood: N, cost: C, max_iterations: usize) -> Self
    where
        N: Fn(&S) -> I + 'a,
        I: Iterator<Item = S> + 'a,
        C: Fn(&S) -> f64 + 'a,
    {
        let initial_cost = cost(&initial);
        let mut tabu = HashMap::new();
        tabu.insert(initial.clone(), -1);

        let neighborhood: Neighborhood<'a, S> =
            Box::new(move |state: &S| -> Box<dyn Iterator<Item = S> + 'a> {
                Box::new(neighborhood(state))
            });

        Self {
            neighborhood,
            cost: Box::new(cost),
            max_iterations,
            memory_size: 5,
            aspiration: None,
            tabu_limit: None,
            repetitions_limit: None,
            on_change: None,
            cancel: CancelToken::new(),
            step: 0,
            tabu,
            memory: vec![initial_cost],
            local_optimum: initial.clone(),
            global_optimum: initial,
            global_best_cost: initial_cost,
            repetitions: 0,
        }
    }

    /// Length of the sliding window of recent costs.
    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self.trim_memory();
        self
    }

    /// Admit tabu neighbors for which `aspiration(memory, cost)` holds.
    pub fn with_aspiration(mut self, aspiration: impl Fn(&[f64], f64) -> bool + 'a) -> Self {
        self.aspiration = Some(Box::new(aspiration));
        self
    }

    /// Bound the number of states held in the tabu map.
    pub fn with_tabu_limit(mut self, limit: usize) -> Self {
        self.tabu_limit = Some(limit);
        self.evict_tabu();
        self
    }

    /// Stop after the local optimum repeats more than `limit` times in a row.
    pub fn with_repetitions_limit(mut self, limit: usize) -> Self {
        self.repetitions_limit = Some(limit);
        self
    }

    /// Observe every new global best as `(previous, next, previous_cost, next_cost)`.
    pub fn with_on_change(mut self, on_change: impl FnMut(&S, &S, f64, f64) + 'a) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    /// Stop at the next iteration once `cancel` is set.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run until a stopping rule fires and return the best state seen.
    pub fn run(mut self) -> S {
        let outcome = loop {
            match self.step() {
                Step::Moved => continue,
                other => break other,
            }
        };
        debug!(
            ?outcome,
            iterations = self.step,
            best_cost = self.global_best_cost,
            "tabu search finished"
        );
        self.global_optimum
    }

    /// Perform one iteration.
    pub fn step(&mut self) -> Step {
        if self.cancel.is_cancelled() {
            return Step::Cancelled;
        }
        if self.step >= self.max_iterations {
            return Step::Finished;
        }

        let Some((next, next_cost)) = self.find_local_optimum() else {
            return Step::Exhausted;
        };

        let repeated = next == self.local_optimum;
        self.add_to_tabu(next.clone());
        self.add_to_memory(next_cost);

        if next_cost < self.global_best_cost {
            debug!(
                iteration = self.step,
                from = self.global_best_cost,
                to = next_cost,
                "new global optimum"
            );
            if let Some(on_change) = self.on_change.as_mut() {
                on_change(&self.global_optimum, &next, self.global_best_cost, next_cost);
            }
            self.global_optimum = next.clone();
            self.global_best_cost = next_cost;
        }

        self.local_optimum = next;
        self.repetitions = if repeated { self.repetitions + 1 } else { 0 };
        self.step += 1;
        trace!(iteration = self.step, cost = next_cost, "moved");

        match self.repetitions_limit {
            Some(limit) if self.repetitions > limit => Step::Repeating,
            _ => Step::Moved,
        }
    }

    /// Best state seen so far.
    pub fn global_optimum(&self) -> &S {
        &self.global_optimum
    }

    /// Cost of the best state seen so far.
    pub fn global_best_cost(&self) -> f64 {
        self.global_best_cost
    }

    /// Current local optimum.
    pub fn local_optimum(&self) -> &S {
        &self.local_optimum
    }

    /// Number of states currently tabu.
    pub fn tabu_len(&self) -> usize {
        self.tabu.len()
    }

    /// Recent costs, oldest first.
    pub fn memory(&self) -> &[f64] {
        &self.memory
    }

    /// Iterations performed.
    pub fn iterations(&self) -> usize {
        self.step
    }

    /// Cheapest feasible neighbor of the local optimum; ties keep the first.
    fn find_local_optimum(&self) -> Option<(S, f64)> {
        let mut best: Option<(S, f64)> = None;
        for neighbor in (self.neighborhood)(&self.local_optimum) {
            let is_tabu = self.tabu.contains_key(&neighbor);
            if is_tabu && self.aspiration.is_none() {
                continue;
            }

            let cost = (self.cost)(&neighbor);
            if is_tabu {
                let admitted = self
                    .aspiration
                    .as_ref()
                    .is_some_and(|aspiration| aspiration(&self.memory, cost));
                if !admitted {
                    continue;
                }
            }

            let improves = match &best {
                Some((_, best_cost)) => cost < *best_cost,
                None => true,
            };
            if improves {
                best = Some((neighbor, cost));
            }
        }
        best
    }

    fn add_to_tabu(&mut self, state: S) {
        self.tabu.insert(state, self.step as i64);
        self.evict_tabu();
    }

    fn evict_tabu(&mut self) {
        let Some(limit) = self.tabu_limit else {
            return;
        };
        while self.tabu.len() > limit {
            let oldest = self
                .tabu
                .iter()
                .min_by_key(|(_, stamp)| **stamp)
                .map(|(state, _)| state.clone());
            match oldest {
                Some(state) => {
                    self.tabu.remove(&state);
                }
                None => break,
            }
        }
    }

    fn add_to_memory(&mut self, cost: f64) {
        self.memory.push(cost);
        self.trim_memory();
    }

    fn trim_memory(&mut self) {
        while self.memory.len() > self.memory_size.max(1) {
            self.memory.remove(0);
        }
    }
}
