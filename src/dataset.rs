use crate::error::LoadError;
use crate::load::{load_actions, load_users, read_input};
use crate::record::{Action, User};
use crate::referral::ReferralGraph;
use crate::transition::TransitionCounts;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh64::Xxh64;

/// A pure function that folds an action into state.
///
/// # Examples
///
/// ```
/// use actionfold::{Action, ReduceFn};
///
/// fn counter(state: u64, _action: &Action) -> u64 {
///     state + 1
/// }
///
/// let reducer: ReduceFn<u64> = counter;
/// ```
pub type ReduceFn<S> = fn(S, &Action) -> S;

/// Immutable snapshot of all users and the ordered action log.
///
/// Built once at startup and shared by reference (typically behind an
/// `Arc`) with every query. Nothing in it changes after construction, so
/// concurrent readers need no locking.
#[derive(Debug, Clone)]
pub struct Dataset {
    users: Vec<User>,
    actions: Vec<Action>,
    user_index: HashMap<i64, usize>,
    fingerprint: String,
}

/// Record counts of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub users: usize,
    pub actions: usize,
    pub referral_edges: usize,
}

impl Dataset {
    /// Build a snapshot from already decoded records.
    ///
    /// `actions` must be in chronological order; no sorting is done. When
    /// two users share an id, lookups return the first one.
    pub fn new(users: Vec<User>, actions: Vec<Action>) -> Self {
        let mut user_index = HashMap::with_capacity(users.len());
        for (pos, user) in users.iter().enumerate() {
            user_index.entry(user.id).or_insert(pos);
        }
        let fingerprint = fingerprint(&users, &actions);
        Dataset {
            users,
            actions,
            user_index,
            fingerprint,
        }
    }

    /// Decode both inputs and build a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if either input fails to decode.
    pub fn from_bytes(users: &[u8], actions: &[u8]) -> Result<Self, LoadError> {
        Ok(Dataset::new(load_users(users)?, load_actions(actions)?))
    }

    /// Create a builder that loads the dataset from files.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use actionfold::Dataset;
    ///
    /// let dataset = Dataset::builder()
    ///     .users_path("data/users.json")
    ///     .actions_path("data/actions.jsonl.zst")
    ///     .open()
    ///     .unwrap();
    /// println!("{} users", dataset.users().len());
    /// ```
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::new()
    }

    /// All users, in load order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// The action log, in load order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Look up a user by id. `None` means not found.
    pub fn find_user_by_id(&self, id: i64) -> Option<&User> {
        self.user_index.get(&id).map(|&pos| &self.users[pos])
    }

    /// Every action performed by `user_id`, in log order. Full scan.
    pub fn actions_by_user(&self, user_id: i64) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|action| action.user_id == user_id)
            .collect()
    }

    /// Fold the action log, in order, through `reducer`.
    pub fn fold<S>(&self, init: S, reducer: ReduceFn<S>) -> S {
        self.actions.iter().fold(init, reducer)
    }

    /// Hex-encoded xxh64 over the decoded records.
    ///
    /// Independent of input formatting: the same records loaded from a JSON
    /// array or from JSON Lines have the same fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Record counts.
    pub fn stats(&self) -> Stats {
        Stats {
            users: self.users.len(),
            actions: self.actions.len(),
            referral_edges: self
                .actions
                .iter()
                .filter(|a| a.referral_edge().is_some())
                .count(),
        }
    }

    /// The user with `id`, or `None` when no such user was loaded.
    pub fn user_by_id(&self, id: i64) -> Option<&User> {
        let user = self.find_user_by_id(id);
        log::debug!("actionfold: user lookup {id}: found={}", user.is_some());
        user
    }

    /// Number of actions whose `user_id` is `id`; 0 for unknown users.
    pub fn user_action_count(&self, id: i64) -> u64 {
        self.actions.iter().filter(|a| a.user_id == id).count() as u64
    }

    /// Empirical distribution of the action type that follows
    /// `action_type` for the same user.
    ///
    /// # Examples
    ///
    /// ```
    /// use actionfold::{Action, Dataset};
    ///
    /// let dataset = Dataset::new(
    ///     vec![],
    ///     vec![Action::new(1, "SIGN_UP", 1), Action::new(2, "LOGIN", 1)],
    /// );
    /// assert_eq!(dataset.next_action_probabilities("SIGN_UP")["LOGIN"], 1.0);
    /// assert!(dataset.next_action_probabilities("LOGIN").is_empty());
    /// ```
    pub fn next_action_probabilities(&self, action_type: &str) -> BTreeMap<String, f64> {
        let counts = self.fold(TransitionCounts::default(), TransitionCounts::reduce);
        let probabilities = counts.probabilities(action_type);
        log::debug!(
            "actionfold: {} transitions out of '{action_type}' across {} successor types",
            counts.total_from(action_type),
            probabilities.len()
        );
        probabilities
    }

    /// Reach count for every loaded user, recomputed on each call.
    pub fn referral_index(&self) -> BTreeMap<i64, u64> {
        ReferralGraph::from_actions(&self.actions)
            .referral_index(self.users.iter().map(|user| user.id))
    }
}

/// Builder for loading a [`Dataset`] from files.
///
/// Defaults to `users.json` and `actions.json` in the working directory.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    users_path: PathBuf,
    actions_path: PathBuf,
}

impl DatasetBuilder {
    fn new() -> Self {
        DatasetBuilder {
            users_path: PathBuf::from("users.json"),
            actions_path: PathBuf::from("actions.json"),
        }
    }

    /// Path to the users JSON array (`.zst` allowed).
    pub fn users_path(mut self, path: impl AsRef<Path>) -> Self {
        self.users_path = path.as_ref().to_path_buf();
        self
    }

    /// Path to the action log, JSON array or JSON Lines (`.zst` allowed).
    pub fn actions_path(mut self, path: impl AsRef<Path>) -> Self {
        self.actions_path = path.as_ref().to_path_buf();
        self
    }

    /// Read and decode both files.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if either file can't be read or decoded.
    pub fn open(self) -> Result<Dataset, LoadError> {
        let users = load_users(&read_input(&self.users_path)?)?;
        let actions = load_actions(&read_input(&self.actions_path)?)?;
        let dataset = Dataset::new(users, actions);

        let stats = dataset.stats();
        log::info!(
            "actionfold: loaded {} users from {} and {} actions ({} referrals) from {}, fingerprint {}",
            stats.users,
            self.users_path.display(),
            stats.actions,
            stats.referral_edges,
            self.actions_path.display(),
            dataset.fingerprint()
        );
        Ok(dataset)
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn fingerprint(users: &[User], actions: &[Action]) -> String {
    let mut hasher = Xxh64::new(0);
    let mut field = |bytes: &[u8]| {
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };

    field(&(users.len() as u64).to_le_bytes());
    for user in users {
        field(&user.id.to_le_bytes());
        field(user.name.as_bytes());
        field(user.created_at.as_bytes());
    }

    field(&(actions.len() as u64).to_le_bytes());
    for action in actions {
        field(&action.id.to_le_bytes());
        field(action.action_type.as_bytes());
        field(&action.user_id.to_le_bytes());
        match action.target_user {
            Some(target) => field(&target.to_le_bytes()),
            None => field(&[]),
        }
        field(action.created_at.as_bytes());
    }

    format!("{:016x}", hasher.digest())
}
