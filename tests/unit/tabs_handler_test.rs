//! Unit tests for the authoritative tabs handler.

use course_tabs::database::Database;
use course_tabs::services::tabs_handler::{StoredTab, TabsHandler, TabsHandlerTrait, STATIC_TAB_TYPE};
use course_tabs::types::course::CourseKey;
use course_tabs::types::errors::StoreError;
use course_tabs::types::policy::BoundaryPolicy;
use course_tabs::types::tab::TabRecord;
use serde_json::json;

const AUTHOR: &str = "staff";

fn key() -> CourseKey {
    CourseKey::parse("course-v1:edX+Demo+2024").unwrap()
}

fn wiki() -> TabRecord {
    TabRecord {
        is_hideable: true,
        ..TabRecord::fixed("wiki", "Wiki")
    }
}

/// courseware, info (fixed) | wiki (hideable) | p1, p2 (static pages)
fn setup() -> TabsHandler {
    let mut handler = TabsHandler::new(Database::open_in_memory().unwrap(), BoundaryPolicy::Partitioned);
    handler
        .create_course(
            &key(),
            &[
                StoredTab::new("courseware", TabRecord::fixed("courseware", "Course")),
                StoredTab::new("course_info", TabRecord::fixed("info", "Home")),
                StoredTab::new("wiki", wiki()),
                StoredTab::new(STATIC_TAB_TYPE, TabRecord::custom_page("p1", "loc-p1", "Syllabus")),
                StoredTab::new(STATIC_TAB_TYPE, TabRecord::custom_page("p2", "loc-p2", "FAQ")),
            ],
        )
        .unwrap();
    handler.grant_author(&key(), AUTHOR).unwrap();
    handler
}

fn ids(handler: &TabsHandler) -> Vec<String> {
    handler
        .load_tabs(&key())
        .unwrap()
        .into_iter()
        .map(|t| t.tab_id)
        .collect()
}

fn validation_message(err: StoreError) -> String {
    match err {
        StoreError::Validation(msg) => msg,
        other => panic!("expected validation error, got {:?}", other),
    }
}

// ─── Loading ───

#[test]
fn test_load_and_static_tabs() {
    let handler = setup();
    assert_eq!(ids(&handler), vec!["courseware", "info", "wiki", "p1", "p2"]);

    let statics: Vec<String> = handler.static_tabs(&key()).unwrap().into_iter().map(|t| t.tab_id).collect();
    assert_eq!(statics, vec!["p1", "p2"]);
}

#[test]
fn test_unknown_course() {
    let handler = setup();
    let other = CourseKey::parse("edX/Other/2024").unwrap();
    assert_eq!(
        handler.load_tabs(&other).unwrap_err(),
        StoreError::CourseNotFound("edX/Other/2024".to_string())
    );
}

#[test]
fn test_create_course_rejects_duplicates() {
    let mut handler = setup();
    let tab = StoredTab::new(STATIC_TAB_TYPE, TabRecord::custom_page("p1", "loc", "x"));
    let err = handler.create_course(&key(), &[tab.clone(), tab]).unwrap_err();
    assert!(validation_message(err).contains("duplicate"));
    assert_eq!(ids(&handler).len(), 5);
}

// ─── Permissions and request shapes ───

#[test]
fn test_update_requires_author_access() {
    let mut handler = setup();
    let err = handler
        .update_tabs(&key(), "student", &json!({"tabs": []}))
        .unwrap_err();
    assert!(matches!(err, StoreError::PermissionDenied(_)));
    assert!(handler.has_author_access(&key(), AUTHOR).unwrap());
    assert!(!handler.has_author_access(&key(), "student").unwrap());
}

#[test]
fn test_unsupported_request() {
    let mut handler = setup();
    let err = handler.update_tabs(&key(), AUTHOR, &json!({"name": "x"})).unwrap_err();
    assert_eq!(
        err,
        StoreError::UnsupportedRequest("Creating or changing tab content is not supported.".to_string())
    );
}

// ─── Reordering ───

#[test]
fn test_static_only_request_permutes_static_slots() {
    let mut handler = setup();
    handler
        .update_tabs(&key(), AUTHOR, &json!({"tabs": [{"tab_id": "p2"}, {"tab_locator": "loc-p1"}]}))
        .unwrap();
    assert_eq!(ids(&handler), vec!["courseware", "info", "wiki", "p2", "p1"]);
    assert_eq!(handler.last_updated_by(&key()).unwrap(), Some(AUTHOR.to_string()));
}

#[test]
fn test_tabs_not_listed_are_appended() {
    let mut handler = setup();
    handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [{"tab_id": "courseware"}, {"tab_id": "info"}, {"tab_id": "p2"}]}),
        )
        .unwrap();
    assert_eq!(ids(&handler), vec!["courseware", "info", "p2", "wiki", "p1"]);
}

#[test]
fn test_reorder_is_idempotent() {
    let mut handler = setup();
    let request = json!({"tabs": [
        {"tab_id": "courseware"}, {"tab_id": "info"}, {"tab_id": "wiki"},
        {"tab_id": "p2"}, {"tab_id": "p1"}
    ]});
    handler.update_tabs(&key(), AUTHOR, &request).unwrap();
    let first = handler.load_tabs(&key()).unwrap();
    handler.update_tabs(&key(), AUTHOR, &request).unwrap();
    assert_eq!(handler.load_tabs(&key()).unwrap(), first);
}

#[test]
fn test_reorder_across_fixed_tab_is_invalid() {
    let mut handler = setup();
    let err = handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [
                {"tab_id": "courseware"}, {"tab_id": "p1"}, {"tab_id": "info"},
                {"tab_id": "wiki"}, {"tab_id": "p2"}
            ]}),
        )
        .unwrap_err();
    assert!(validation_message(err).starts_with("New list of tabs is not valid: "));
    assert_eq!(ids(&handler), vec!["courseware", "info", "wiki", "p1", "p2"]);
}

#[test]
fn test_fixed_tabs_cannot_swap() {
    let mut handler = setup();
    let err = handler
        .update_tabs(&key(), AUTHOR, &json!({"tabs": [{"tab_id": "info"}, {"tab_id": "courseware"}]}))
        .unwrap_err();
    assert!(validation_message(err).contains("cannot be reordered"));
}

#[test]
fn test_unknown_entry_does_not_exist() {
    let mut handler = setup();
    let err = handler
        .update_tabs(&key(), AUTHOR, &json!({"tabs": [{"tab_id": "ghost"}]}))
        .unwrap_err();
    assert_eq!(
        validation_message(err),
        "Tab with id_locator '{\"tab_id\": \"ghost\"}' does not exist."
    );
}

#[test]
fn test_new_entry_creates_static_tab() {
    let mut handler = setup();
    handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [
                {"tab_id": "courseware"}, {"tab_id": "info"}, {"tab_id": "wiki"},
                {"tab_id": "p1"}, {"tab_id": "p2"},
                {"tab_id": "p3", "tab_locator": "loc-p3", "name": "Resources", "is_movable": true}
            ]}),
        )
        .unwrap();

    let statics = handler.static_tabs(&key()).unwrap();
    let created = statics.iter().find(|t| t.tab_id == "p3").unwrap();
    assert_eq!(created.locator.as_deref(), Some("loc-p3"));
    assert_eq!(created.name, "Resources");
    assert!(created.is_movable);
}

fn seeded(policy: BoundaryPolicy, tabs: &[StoredTab]) -> TabsHandler {
    let mut handler = TabsHandler::new(Database::open_in_memory().unwrap(), policy);
    handler.create_course(&key(), tabs).unwrap();
    handler.grant_author(&key(), AUTHOR).unwrap();
    handler
}

fn static_page(id: &str) -> StoredTab {
    StoredTab::new(STATIC_TAB_TYPE, TabRecord::custom_page(id, &format!("loc-{}", id), id))
}

#[test]
fn test_new_static_page_stays_before_trailing_fixed_tab() {
    let mut handler = seeded(
        BoundaryPolicy::Partitioned,
        &[
            StoredTab::new("courseware", TabRecord::fixed("courseware", "Course")),
            static_page("p1"),
            static_page("p2"),
            StoredTab::new("progress", TabRecord::fixed("progress", "Progress")),
        ],
    );
    handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [
                {"tab_id": "p1"}, {"tab_id": "p3", "tab_locator": "loc-p3"}, {"tab_id": "p2"}
            ]}),
        )
        .unwrap();
    assert_eq!(ids(&handler), vec!["courseware", "p1", "p3", "p2", "progress"]);
}

#[test]
fn test_tab_left_in_place_keeps_older_layout_valid() {
    // p0 sits between fixed tabs, which AfterAllFixed would not allow today.
    let layout = [
        StoredTab::new("courseware", TabRecord::fixed("courseware", "Course")),
        StoredTab::new("course_info", TabRecord::fixed("info", "Home")),
        static_page("p0"),
        StoredTab::new("progress", TabRecord::fixed("progress", "Progress")),
        static_page("p1"),
    ];
    let mut handler = seeded(BoundaryPolicy::AfterAllFixed, &layout);

    handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [
                {"tab_id": "courseware"}, {"tab_id": "info"}, {"tab_id": "p0"},
                {"tab_id": "progress"}, {"tab_id": "p1", "is_hidden": true}
            ]}),
        )
        .unwrap();
    let p1 = handler.load_tabs(&key()).unwrap().into_iter().find(|t| t.tab_id == "p1").unwrap();
    assert!(p1.is_hidden);

    let err = handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [
                {"tab_id": "courseware"}, {"tab_id": "info"}, {"tab_id": "p0"},
                {"tab_id": "p1"}, {"tab_id": "progress"}
            ]}),
        )
        .unwrap_err();
    assert_eq!(
        validation_message(err),
        "New list of tabs is not valid: tab 'p1' may not be placed at position 3."
    );
    assert_eq!(ids(&handler), vec!["courseware", "info", "p0", "progress", "p1"]);
}

#[test]
fn test_removed_tabs_are_deleted() {
    let mut handler = setup();
    handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [{"tab_id": "courseware"}, {"tab_id": "info"}, {"tab_id": "wiki"}, {"tab_id": "p2"}],
                    "removed": ["p1", "never-existed"]}),
        )
        .unwrap();
    assert_eq!(ids(&handler), vec!["courseware", "info", "wiki", "p2"]);
}

#[test]
fn test_removing_fixed_tab_fails() {
    let mut handler = setup();
    let err = handler
        .update_tabs(&key(), AUTHOR, &json!({"tabs": [], "removed": ["courseware"]}))
        .unwrap_err();
    assert!(validation_message(err).contains("cannot be removed"));
    assert_eq!(ids(&handler).len(), 5);
}

// ─── Visibility ───

#[test]
fn test_hidden_flag_in_reorder_request() {
    let mut handler = setup();
    handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [
                {"tab_id": "courseware"}, {"tab_id": "info"}, {"tab_id": "wiki", "is_hidden": true},
                {"tab_id": "p1"}, {"tab_id": "p2"}
            ]}),
        )
        .unwrap();
    let tabs = handler.load_tabs(&key()).unwrap();
    assert!(tabs.iter().find(|t| t.tab_id == "wiki").unwrap().is_hidden);

    let err = handler
        .update_tabs(
            &key(),
            AUTHOR,
            &json!({"tabs": [{"tab_id": "courseware", "is_hidden": true}, {"tab_id": "info"}]}),
        )
        .unwrap_err();
    assert_eq!(validation_message(err), "Tab of type courseware can not be hidden");
}

#[test]
fn test_edit_tab_visibility() {
    let mut handler = setup();
    handler
        .update_tabs(&key(), AUTHOR, &json!({"tab_id_locator": {"tab_locator": "loc-p1"}, "is_hidden": true}))
        .unwrap();
    let p1 = handler.static_tabs(&key()).unwrap().into_iter().find(|t| t.tab_id == "p1").unwrap();
    assert!(p1.is_hidden);

    let err = handler
        .update_tabs(&key(), AUTHOR, &json!({"tab_id_locator": {"tab_id": "info"}, "is_hidden": true}))
        .unwrap_err();
    assert_eq!(validation_message(err), "Tab of type course_info can not be hidden");

    let err = handler
        .update_tabs(&key(), AUTHOR, &json!({"tab_id_locator": {"tab_id": "p1"}}))
        .unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedRequest(_)));
}

// ─── Primitive edits ───

#[test]
fn test_primitive_edits_protect_first_tabs() {
    let mut handler = setup();
    for num in [0, 1] {
        let err = handler.primitive_insert(&key(), num, "progress", "Progress").unwrap_err();
        assert_eq!(validation_message(err), "Tabs 1 and 2 cannot be edited");
        let err = handler.primitive_delete(&key(), num).unwrap_err();
        assert_eq!(validation_message(err), "Tabs 1 and 2 cannot be edited");
    }
}

#[test]
fn test_primitive_edits_refuse_static_tabs() {
    let mut handler = setup();
    let err = handler.primitive_insert(&key(), 2, STATIC_TAB_TYPE, "x").unwrap_err();
    assert_eq!(
        validation_message(err),
        "Tabs of type static_tab cannot be edited here (use Studio)"
    );
    let err = handler.primitive_delete(&key(), 3).unwrap_err();
    assert_eq!(
        validation_message(err),
        "Tabs of type static_tab cannot be edited here (use Studio)"
    );
}

#[test]
fn test_primitive_insert_then_delete() {
    let mut handler = setup();
    handler.primitive_insert(&key(), 2, "progress", "Progress").unwrap();
    assert_eq!(ids(&handler), vec!["courseware", "info", "progress", "wiki", "p1", "p2"]);
    assert_eq!(handler.last_updated_by(&key()).unwrap(), Some("primitive_command".to_string()));

    handler.primitive_delete(&key(), 2).unwrap();
    assert_eq!(ids(&handler), vec!["courseware", "info", "wiki", "p1", "p2"]);

    assert!(matches!(handler.primitive_delete(&key(), 99), Err(StoreError::Validation(_))));
}
