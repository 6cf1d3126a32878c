//! Stop name lookup.
//!
//! Users type stop names by hand, so lookups tolerate small typos: an
//! exact match wins, otherwise the closest name by case-insensitive edit
//! distance is accepted if it is close enough and unambiguous.

use serde::Serialize;

use crate::data::TransitGraph;

/// How many suggestions to offer when a name cannot be resolved.
const MAX_SUGGESTIONS: usize = 5;

/// Errors from resolving a stop name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StopLookupError {
    /// Nothing was entered
    #[error("stop name is empty")]
    Empty,

    /// No stop is close enough to the query
    #[error("unknown stop {query:?}{}", format_suggestions(.suggestions))]
    NotFound {
        query: String,
        suggestions: Vec<String>,
    },

    /// Several stops are equally close to the query
    #[error("stop {query:?} is ambiguous: {}", .candidates.join(", "))]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(", did you mean: {}", suggestions.join(", "))
    }
}

/// A stop name and its edit distance from a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopMatch {
    pub name: String,
    pub distance: usize,
}

/// Sorted stop names with their lowercase forms.
#[derive(Debug, Clone, Default)]
pub struct StopIndex {
    names: Vec<String>,
    lowercase: Vec<String>,
    allowed_distance: usize,
}

impl StopIndex {
    /// Index `names`, accepting fuzzy matches up to `allowed_distance` edits.
    pub fn new(names: impl IntoIterator<Item = String>, allowed_distance: usize) -> Self {
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        names.dedup();
        let lowercase = names.iter().map(|n| n.to_lowercase()).collect();
        Self {
            names,
            lowercase,
            allowed_distance,
        }
    }

    /// Index every stop of `graph`.
    pub fn from_graph(graph: &TransitGraph, allowed_distance: usize) -> Self {
        Self::new(graph.bus_stops().keys().cloned(), allowed_distance)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `name` is a stop, exactly.
    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    /// Resolve a typed name to a known stop name.
    pub fn resolve(&self, query: &str) -> Result<String, StopLookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StopLookupError::Empty);
        }
        if self.contains(query) {
            return Ok(query.to_string());
        }

        let ranked = self.rank(query);
        let Some(best) = ranked.first() else {
            return Err(StopLookupError::NotFound {
                query: query.to_string(),
                suggestions: Vec::new(),
            });
        };

        if best.distance > self.allowed_distance {
            return Err(StopLookupError::NotFound {
                query: query.to_string(),
                suggestions: ranked
                    .into_iter()
                    .take(MAX_SUGGESTIONS)
                    .map(|m| m.name)
                    .collect(),
            });
        }

        let tied: Vec<String> = ranked
            .iter()
            .take_while(|m| m.distance == best.distance)
            .map(|m| m.name.clone())
            .collect();
        if tied.len() > 1 {
            return Err(StopLookupError::Ambiguous {
                query: query.to_string(),
                candidates: tied,
            });
        }
        Ok(best.name.clone())
    }

    /// Up to `limit` stops ranked by closeness to `query`.
    ///
    /// Names containing the query rank before others at the same distance.
    pub fn search(&self, query: &str, limit: usize) -> Vec<StopMatch> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let mut ranked = self.rank(query);
        let needle = query.to_lowercase();
        ranked.sort_by_key(|m| {
            let contains = m.name.to_lowercase().contains(&needle);
            (!contains, m.distance)
        });
        ranked.truncate(limit);
        ranked
    }

    /// Every stop by ascending distance, then name.
    fn rank(&self, query: &str) -> Vec<StopMatch> {
        let needle = query.to_lowercase();
        let mut ranked: Vec<StopMatch> = self
            .names
            .iter()
            .zip(&self.lowercase)
            .map(|(name, lower)| StopMatch {
                name: name.clone(),
                distance: levenshtein(&needle, lower),
            })
            .collect();
        // Names are already sorted, and the sort is stable.
        ranked.sort_by_key(|m| m.distance);
        ranked
    }
}

/// Edit distance between two strings, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
