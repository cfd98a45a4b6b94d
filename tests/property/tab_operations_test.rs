//! Property-based tests for tab collection operations.
//!
//! For any sequence of insert/remove/move calls, every successful call keeps
//! ids unique and fixed tabs in their original relative order, and every failed
//! call leaves the collection untouched.

use std::collections::HashSet;

use course_tabs::managers::tab_collection::{TabCollection, TabCollectionTrait};
use course_tabs::types::policy::BoundaryPolicy;
use course_tabs::types::tab::TabRecord;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum TabOp {
    Insert(usize),
    Remove(usize),
    Move(usize, usize),
    Toggle(usize),
}

fn arb_ops() -> impl Strategy<Value = Vec<TabOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0..12usize).prop_map(TabOp::Insert),
            2 => (0..12usize).prop_map(TabOp::Remove),
            4 => (0..12usize, 0..12usize).prop_map(|(a, b)| TabOp::Move(a, b)),
            1 => (0..12usize).prop_map(TabOp::Toggle),
        ],
        1..60,
    )
}

fn arb_policy() -> impl Strategy<Value = BoundaryPolicy> {
    prop_oneof![
        Just(BoundaryPolicy::Partitioned),
        Just(BoundaryPolicy::AfterAllFixed),
        Just(BoundaryPolicy::NotBeforeFirstFixed),
    ]
}

fn seed(policy: BoundaryPolicy) -> TabCollection {
    TabCollection::from_descriptors(
        vec![
            TabRecord::fixed("courseware", "Course"),
            TabRecord::fixed("info", "Home"),
            TabRecord::custom_page("p0", "loc-p0", "Zero"),
            TabRecord::fixed("progress", "Progress"),
            TabRecord::custom_page("p1", "loc-p1", "One"),
        ],
        policy,
    )
    .unwrap()
}

fn fixed_order(c: &TabCollection) -> Vec<String> {
    c.records()
        .iter()
        .filter(|t| t.is_fixed())
        .map(|t| t.tab_id.clone())
        .collect()
}

fn pick(c: &TabCollection, idx: usize) -> String {
    let records = c.records();
    records[idx % records.len()].tab_id.clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tab_invariants_hold(policy in arb_policy(), ops in arb_ops()) {
        let mut c = seed(policy);
        let fixed = fixed_order(&c);
        let mut next_id = 0;

        for op in &ops {
            let before = c.clone();
            let result = match op {
                TabOp::Insert(at) => {
                    next_id += 1;
                    let id = format!("new{}", next_id);
                    c.insert(TabRecord::custom_page(&id, &id, "New"), *at)
                }
                TabOp::Remove(idx) => c.remove(&pick(&c, *idx)),
                TabOp::Move(idx, to) => c.move_tab(&pick(&c, *idx), *to),
                TabOp::Toggle(idx) => c.toggle_visibility(&pick(&c, *idx)),
            };

            if result.is_err() {
                prop_assert_eq!(&c, &before, "failed {:?} changed the collection", op);
            }

            let ids: HashSet<&str> = c.records().iter().map(|t| t.tab_id.as_str()).collect();
            prop_assert_eq!(ids.len(), c.len());
            prop_assert_eq!(fixed_order(&c), fixed.clone());
        }
    }

    #[test]
    fn move_and_back_restores_order(idx in 0..5usize, to in 0..5usize) {
        let mut c = seed(BoundaryPolicy::Partitioned);
        let original = c.snapshot();
        let tab_id = pick(&c, idx);
        let from = c.position(&tab_id).unwrap();

        if c.move_tab(&tab_id, to).is_ok() {
            c.move_tab(&tab_id, from).unwrap();
            prop_assert_eq!(c.snapshot(), original);
        }
    }
}
