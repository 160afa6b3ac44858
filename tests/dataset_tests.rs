mod common;

use actionfold::{Action, Dataset, Stats};
use common::{ACTIONS_JSON, USERS_JSON, act, actions_jsonl, refer, user, users};

fn sample() -> Dataset {
    Dataset::from_bytes(USERS_JSON.as_bytes(), ACTIONS_JSON.as_bytes()).unwrap()
}

#[test]
fn test_user_by_id_found() {
    let dataset = sample();
    for expected in dataset.users() {
        assert_eq!(dataset.user_by_id(expected.id), Some(expected));
    }
}

#[test]
fn test_user_by_id_not_found() {
    let dataset = sample();
    assert_eq!(dataset.user_by_id(4), None);
    assert_eq!(dataset.user_by_id(-1), None);
}

#[test]
fn test_user_action_count() {
    let dataset = sample();
    assert_eq!(dataset.user_action_count(1), 2);
    assert_eq!(dataset.user_action_count(2), 3);
    assert_eq!(dataset.user_action_count(3), 1);
}

#[test]
fn test_user_action_count_unknown_or_silent() {
    let dataset = Dataset::new(users(&[1, 2]), vec![act(1, "VIEW", 1)]);
    assert_eq!(dataset.user_action_count(2), 0);
    assert_eq!(dataset.user_action_count(99), 0);
}

#[test]
fn test_actions_of_unknown_user_still_count() {
    // userId is not validated against the user list
    let dataset = Dataset::new(users(&[1]), vec![act(1, "VIEW", 7), act(2, "VIEW", 7)]);
    assert_eq!(dataset.user_action_count(7), 2);
    assert_eq!(dataset.user_by_id(7), None);
}

#[test]
fn test_actions_by_user_in_log_order() {
    let dataset = sample();
    let ids: Vec<i64> = dataset.actions_by_user(2).iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 4, 5]);
    assert!(dataset.actions_by_user(42).is_empty());
}

#[test]
fn test_fold_visits_actions_in_order() {
    fn last_type(_: String, action: &Action) -> String {
        action.action_type.clone()
    }
    fn count(state: u64, _: &Action) -> u64 {
        state + 1
    }

    let dataset = sample();
    assert_eq!(dataset.fold(String::new(), last_type), "SIGN_UP");
    assert_eq!(dataset.fold(0, count), 6);
}

#[test]
fn test_stats() {
    let dataset = Dataset::new(
        users(&[1, 2]),
        vec![
            refer(1, 1, 2),
            act(2, "REFER_USER", 2), // no target, not an edge
            act(3, "VIEW", 2),
        ],
    );
    assert_eq!(
        dataset.stats(),
        Stats {
            users: 2,
            actions: 3,
            referral_edges: 1,
        }
    );
}

#[test]
fn test_fingerprint_ignores_input_format() {
    let a = sample();
    let b = Dataset::from_bytes(USERS_JSON.as_bytes(), actions_jsonl().as_bytes()).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_fingerprint_tracks_order() {
    let forward = Dataset::new(vec![user(1)], vec![act(1, "A", 1), act(2, "B", 1)]);
    let reversed = Dataset::new(vec![user(1)], vec![act(2, "B", 1), act(1, "A", 1)]);
    assert_ne!(forward.fingerprint(), reversed.fingerprint());
    assert!(forward.fingerprint().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_empty_dataset() {
    let dataset = Dataset::new(vec![], vec![]);
    assert!(dataset.next_action_probabilities("A").is_empty());
    assert!(dataset.referral_index().is_empty());
    assert_eq!(dataset.user_action_count(1), 0);
}

#[test]
fn test_dataset_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Dataset>();

    let dataset = std::sync::Arc::new(sample());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dataset = dataset.clone();
            std::thread::spawn(move || dataset.referral_index())
        })
        .collect();
    for handle in handles {
        let index = handle.join().unwrap();
        assert_eq!(index[&1], 2);
    }
}
