use serde::{Deserialize, Serialize};

/// Action type tag that marks a referral: `user_id` referred `target_user`.
pub const REFER_USER: &str = "REFER_USER";

/// A user record, loaded once at startup and never mutated.
///
/// # Examples
///
/// ```
/// use actionfold::User;
///
/// let user = User::new(7, "Ada").with_created_at("2024-01-01T00:00:00Z");
/// assert_eq!(user.id, 7);
/// assert_eq!(user.created_at, "2024-01-01T00:00:00Z");
///
/// let json = serde_json::to_string(&user).unwrap();
/// assert!(json.contains("\"createdAt\""));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    /// Creation timestamp, kept exactly as it appeared in the input.
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

impl User {
    /// Create a user with an empty `created_at`.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        User {
            id,
            name: name.into(),
            created_at: String::new(),
        }
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }
}

/// One entry in the chronological action log.
///
/// The type tag is an open set; only [`REFER_USER`] has meaning to the
/// referral engine. Position in the log is the only notion of time the
/// analytics use: `created_at` is carried through but never parsed.
///
/// # Examples
///
/// ```
/// use actionfold::{Action, REFER_USER};
///
/// let action = Action::new(1, REFER_USER, 10).with_target(11);
/// assert!(action.is_referral());
/// assert_eq!(action.referral_edge(), Some((10, 11)));
///
/// let click = Action::new(2, "CLICK", 10);
/// assert_eq!(click.referral_edge(), None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: i64,

    /// Serialized as `"type"`.
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(rename = "userId")]
    pub user_id: i64,

    /// Second participant, present for referral-like actions. Omitted from
    /// serialized output when `None`.
    #[serde(
        rename = "targetUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_user: Option<i64>,

    #[serde(rename = "createdAt", default)]
    pub created_at: String,
}

impl Action {
    /// Create an action with no target and an empty `created_at`.
    pub fn new(id: i64, action_type: &str, user_id: i64) -> Self {
        Action {
            id,
            action_type: action_type.to_string(),
            user_id,
            target_user: None,
            created_at: String::new(),
        }
    }

    /// Set the target user.
    pub fn with_target(mut self, target_user: i64) -> Self {
        self.target_user = Some(target_user);
        self
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    /// Whether this action's type is [`REFER_USER`].
    pub fn is_referral(&self) -> bool {
        self.action_type == REFER_USER
    }

    /// The `(referrer, referred)` edge this action contributes to the
    /// referral graph, if any. A referral without a target yields nothing.
    pub fn referral_edge(&self) -> Option<(i64, i64)> {
        if !self.is_referral() {
            return None;
        }
        self.target_user.map(|target| (self.user_id, target))
    }
}
