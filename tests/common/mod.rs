#![allow(dead_code)]

use actionfold::{Action, REFER_USER, User};
use std::fs;
use std::path::Path;

pub fn user(id: i64) -> User {
    User::new(id, format!("user_{id}")).with_created_at("2024-01-01T00:00:00Z")
}

pub fn users(ids: &[i64]) -> Vec<User> {
    ids.iter().map(|&id| user(id)).collect()
}

pub fn act(id: i64, action_type: &str, user_id: i64) -> Action {
    Action::new(id, action_type, user_id).with_created_at("2024-01-02T00:00:00Z")
}

pub fn refer(id: i64, from: i64, to: i64) -> Action {
    act(id, REFER_USER, from).with_target(to)
}

/// Actions with sequential ids from `(type, user)` pairs.
pub fn log_of(entries: &[(&str, i64)]) -> Vec<Action> {
    entries
        .iter()
        .enumerate()
        .map(|(i, &(t, u))| act(i as i64 + 1, t, u))
        .collect()
}

/// Referral actions with sequential ids from `(from, to)` pairs.
pub fn referrals(edges: &[(i64, i64)]) -> Vec<Action> {
    edges
        .iter()
        .enumerate()
        .map(|(i, &(from, to))| refer(i as i64 + 1, from, to))
        .collect()
}

pub const USERS_JSON: &str = r#"[
  {"id": 1, "name": "Alice", "createdAt": "2024-01-01T00:00:00Z"},
  {"id": 2, "name": "Bob", "createdAt": "2024-01-02T00:00:00Z"},
  {"id": 3, "name": "Carol", "createdAt": "2024-01-03T00:00:00Z"}
]"#;

pub const ACTIONS_JSON: &str = r#"[
  {"id": 1, "type": "SIGN_UP", "userId": 1, "createdAt": "2024-02-01T00:00:00Z"},
  {"id": 2, "type": "REFER_USER", "userId": 1, "targetUser": 2, "createdAt": "2024-02-02T00:00:00Z"},
  {"id": 3, "type": "SIGN_UP", "userId": 2, "createdAt": "2024-02-03T00:00:00Z"},
  {"id": 4, "type": "REFER_USER", "userId": 2, "targetUser": 3, "createdAt": "2024-02-04T00:00:00Z"},
  {"id": 5, "type": "VIEW", "userId": 2, "createdAt": "2024-02-05T00:00:00Z"},
  {"id": 6, "type": "SIGN_UP", "userId": 3, "createdAt": "2024-02-06T00:00:00Z"}
]"#;

/// The contents of `ACTIONS_JSON` as JSON Lines.
pub fn actions_jsonl() -> String {
    let actions: Vec<serde_json::Value> = serde_json::from_str(ACTIONS_JSON).unwrap();
    actions
        .iter()
        .map(|a| format!("{a}\n"))
        .collect()
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
