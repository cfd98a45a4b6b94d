//! Property-based tests for rollback.
//!
//! Whatever action is applied, a failed sync restores exactly the snapshot
//! that was visible before the action.

use course_tabs::managers::reorder_controller::{ControllerEvent, ReorderController, Submission};
use course_tabs::managers::tab_collection::TabCollection;
use course_tabs::types::course::CourseKey;
use course_tabs::types::delta::TabAction;
use course_tabs::types::errors::SyncError;
use course_tabs::types::policy::BoundaryPolicy;
use course_tabs::types::tab::TabRecord;
use proptest::prelude::*;

const IDS: [&str; 5] = ["courseware", "info", "p1", "p2", "p3"];

fn controller() -> ReorderController {
    let tabs = vec![
        TabRecord::fixed("courseware", "Course"),
        TabRecord::fixed("info", "Home"),
        TabRecord::custom_page("p1", "loc-p1", "One"),
        TabRecord::custom_page("p2", "loc-p2", "Two"),
        TabRecord::custom_page("p3", "loc-p3", "Three"),
    ];
    ReorderController::new(
        CourseKey::parse("course-v1:edX+Demo+2024").unwrap(),
        TabCollection::from_descriptors(tabs, BoundaryPolicy::Partitioned).unwrap(),
    )
}

fn arb_action() -> impl Strategy<Value = TabAction> {
    let id = (0..IDS.len()).prop_map(|i| IDS[i].to_string());
    prop_oneof![
        (id.clone(), 0..6usize).prop_map(|(tab_id, to_index)| TabAction::Move { tab_id, to_index }),
        id.clone().prop_map(|tab_id| TabAction::Remove { tab_id }),
        id.prop_map(|tab_id| TabAction::ToggleVisibility { tab_id }),
        prop::option::of(0..7usize).prop_map(|at_index| TabAction::Add {
            descriptor: TabRecord::custom_page("p9", "loc-p9", "Nine"),
            at_index,
        }),
    ]
}

fn arb_failure() -> impl Strategy<Value = SyncError> {
    prop_oneof![
        Just(SyncError::TransientNetwork("timed out".to_string())),
        Just(SyncError::Rejected("HTTP 400".to_string())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn failed_sync_restores_previous_snapshot(
        warmup in prop::collection::vec(arb_action(), 0..5),
        action in arb_action(),
        failure in arb_failure(),
    ) {
        let mut c = controller();
        for a in warmup {
            if let Ok(Submission::InFlight(_)) = c.submit(a) {
                c.resolve(Ok(()));
            }
        }

        let before = c.snapshot();
        match c.submit(action) {
            Ok(Submission::InFlight(_)) => {
                let events = c.resolve(Err(failure.clone()));
                prop_assert_eq!(
                    events,
                    vec![ControllerEvent::RolledBack { restored: before.clone(), error: failure }]
                );
            }
            Ok(other) => prop_assert!(false, "unexpected submission {:?}", other),
            Err(_) => {}
        }
        prop_assert_eq!(c.snapshot(), before);
        prop_assert!(c.is_idle());
    }
}
