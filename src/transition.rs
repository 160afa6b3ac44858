//! Empirical next-action model.
//!
//! A transition is a pair of neighbouring entries in the action log that
//! belong to the same user. Pairs whose two actions come from different
//! users are not transitions, even when they are adjacent in the log.

use crate::record::Action;
use std::collections::{BTreeMap, HashMap};

/// Successor counters for every action type, built by folding the log.
///
/// # Examples
///
/// ```
/// use actionfold::{Action, TransitionCounts};
///
/// let log = vec![
///     Action::new(1, "A", 1),
///     Action::new(2, "B", 1),
///     Action::new(3, "A", 1),
///     Action::new(4, "C", 1),
/// ];
/// let counts = TransitionCounts::from_actions(&log);
/// let p = counts.probabilities("A");
/// assert_eq!(p["B"], 0.5);
/// assert_eq!(p["C"], 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionCounts {
    successors: HashMap<String, HashMap<String, u64>>,
    last: Option<(i64, String)>,
}

impl TransitionCounts {
    /// Fold one action into the counters.
    ///
    /// Usable directly as a [`ReduceFn`](crate::ReduceFn) with
    /// [`Dataset::fold`](crate::Dataset::fold).
    pub fn reduce(mut self, action: &Action) -> Self {
        if let Some((prev_user, prev_type)) = self.last.take() {
            if prev_user == action.user_id {
                *self
                    .successors
                    .entry(prev_type)
                    .or_default()
                    .entry(action.action_type.clone())
                    .or_insert(0) += 1;
            }
        }
        self.last = Some((action.user_id, action.action_type.clone()));
        self
    }

    /// Count all transitions in an ordered action log.
    pub fn from_actions(actions: &[Action]) -> Self {
        actions.iter().fold(Self::default(), Self::reduce)
    }

    /// Observed successor counts for `action_type`. Empty if it was never
    /// followed by an action of the same user.
    pub fn successors(&self, action_type: &str) -> BTreeMap<&str, u64> {
        self.successors
            .get(action_type)
            .map(|row| row.iter().map(|(t, &n)| (t.as_str(), n)).collect())
            .unwrap_or_default()
    }

    /// Number of transitions out of `action_type`.
    pub fn total_from(&self, action_type: &str) -> u64 {
        self.successors
            .get(action_type)
            .map_or(0, |row| row.values().sum())
    }

    /// Probability of each successor type following `action_type`.
    ///
    /// Only successors actually observed are present. The map is empty when
    /// no transition out of `action_type` exists; otherwise its values sum
    /// to 1.0 up to rounding.
    pub fn probabilities(&self, action_type: &str) -> BTreeMap<String, f64> {
        let Some(row) = self.successors.get(action_type) else {
            return BTreeMap::new();
        };
        let total: u64 = row.values().sum();
        if total == 0 {
            return BTreeMap::new();
        }
        row.iter()
            .map(|(next, &count)| (next.clone(), count as f64 / total as f64))
            .collect()
    }

    /// Action types that have at least one observed transition.
    pub fn source_types(&self) -> impl Iterator<Item = &str> {
        self.successors.keys().map(String::as_str)
    }
}
