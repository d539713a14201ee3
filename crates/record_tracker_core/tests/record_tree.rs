use record_tracker_core::{RecordPath, RecordTree};
use serde_json::json;

fn path(year: &str, month: &str, day: &str) -> RecordPath {
    RecordPath::new(year, month, day).unwrap()
}

#[test]
fn insert_creates_missing_year_and_month() {
    let mut tree = RecordTree::new();
    assert_eq!(tree.insert(&path("2024", "Jan", "5"), json!("x")), None);

    assert_eq!(tree.to_document(), json!({"2024": {"Jan": {"5": "x"}}}));
}

#[test]
fn insert_is_last_write_wins_at_the_leaf() {
    let mut tree = RecordTree::new();
    tree.insert(&path("2024", "Jan", "5"), json!("x"));
    let previous = tree.insert(&path("2024", "Jan", "5"), json!(1));

    assert_eq!(previous, Some(json!("x")));
    assert_eq!(tree.get(&path("2024", "Jan", "5")), Some(&json!(1)));
    assert_eq!(tree.leaf_count(), 1);
}

#[test]
fn deleting_only_day_prunes_month() {
    let mut tree =
        RecordTree::from_document(json!({"2024": {"Jan": {"5": "x"}, "Feb": {"1": 1}}})).unwrap();
    tree.remove(&path("2024", "Jan", "5"));

    assert_eq!(tree.to_document(), json!({"2024": {"Feb": {"1": 1}}}));
}

#[test]
fn deleting_only_month_prunes_year() {
    let mut tree =
        RecordTree::from_document(json!({"2023": {"Dec": {"31": "x"}}, "2024": {"Jan": {"1": 1}}}))
            .unwrap();
    tree.remove(&path("2023", "Dec", "31"));

    assert_eq!(tree.to_document(), json!({"2024": {"Jan": {"1": 1}}}));
}

#[test]
fn deleting_one_of_several_days_keeps_month() {
    let mut tree = RecordTree::from_document(json!({"2024": {"Jan": {"5": "x", "6": 1}}})).unwrap();
    assert_eq!(tree.remove(&path("2024", "Jan", "5")), Some(json!("x")));

    assert_eq!(tree.to_document(), json!({"2024": {"Jan": {"6": 1}}}));
}

#[test]
fn unknown_leaf_values_survive_a_rewrite() {
    let document = json!({"2024": {"Jan": {"1": {"note": "legacy"}, "2": "maybe"}}});
    let tree = RecordTree::from_document(document.clone()).unwrap();

    assert_eq!(tree.to_document(), document);
}

#[test]
fn non_object_root_is_rejected() {
    let err = RecordTree::from_document(json!("x")).unwrap_err();
    assert_eq!(err.location, "/");
}
