//! Properties of the lexicographic range walk.
//!
//! The range condition is pure: it maps a sort key, an anchor tuple,
//! and a direction to a filter document. These tests evaluate the
//! generated filter against synthetic documents and check it is exactly
//! the lexicographic strict order — anchor-exclusive, duplicate-free,
//! and total over distinct tuples.

use std::collections::HashMap;

use mongodb::bson::{Bson, Document};
use proptest::prelude::*;

use ledgergate_cursor::{range_condition, sort_document, AnchorTuple, Direction};

const SORT_KEY: &[&str] = &["h", "i", "id"];

fn tuple(values: (i64, i64, i64)) -> AnchorTuple {
    AnchorTuple(vec![
        Bson::Int64(values.0),
        Bson::Int64(values.1),
        Bson::Int64(values.2),
    ])
}

fn fields(values: (i64, i64, i64)) -> HashMap<&'static str, i64> {
    HashMap::from([("h", values.0), ("i", values.1), ("id", values.2)])
}

fn bound_as_i64(bound: &Bson) -> i64 {
    match bound {
        Bson::Int64(value) => *value,
        Bson::Int32(value) => i64::from(*value),
        other => panic!("unexpected bound {other:?}"),
    }
}

/// Evaluate a range-condition document against flat fields.
fn matches(condition: &Document, document: &HashMap<&str, i64>) -> bool {
    condition.iter().all(|(key, value)| match key.as_str() {
        "$or" => value
            .as_array()
            .expect("$or holds an array")
            .iter()
            .any(|clause| matches(clause.as_document().expect("clause"), document)),
        field => {
            let actual = document[field];
            match value {
                Bson::Document(operator) => operator.iter().all(|(name, bound)| {
                    let bound = bound_as_i64(bound);
                    match name.as_str() {
                        "$lt" => actual < bound,
                        "$gt" => actual > bound,
                        other => panic!("unexpected operator {other}"),
                    }
                }),
                literal => actual == bound_as_i64(literal),
            }
        }
    })
}

// small ranges force ties in the leading fields
fn triple() -> impl Strategy<Value = (i64, i64, i64)> {
    (0_i64..8, 0_i64..8, 0_i64..8)
}

proptest! {
    /// The condition is exactly the lexicographic strict order.
    #[test]
    fn condition_is_the_lexicographic_order(anchor in triple(), candidate in triple()) {
        let from = range_condition(SORT_KEY, &tuple(anchor), Direction::From);
        let since = range_condition(SORT_KEY, &tuple(anchor), Direction::Since);
        let document = fields(candidate);

        prop_assert_eq!(matches(&from, &document), candidate < anchor);
        prop_assert_eq!(matches(&since, &document), candidate > anchor);
    }

    /// The anchor never appears on either side.
    #[test]
    fn anchor_is_excluded(anchor in triple()) {
        let document = fields(anchor);
        let from = range_condition(SORT_KEY, &tuple(anchor), Direction::From);
        let since = range_condition(SORT_KEY, &tuple(anchor), Direction::Since);

        prop_assert!(!matches(&from, &document));
        prop_assert!(!matches(&since, &document));
    }

    /// Every other tuple lands on exactly one side.
    #[test]
    fn sides_partition_the_collection(anchor in triple(), candidate in triple()) {
        prop_assume!(anchor != candidate);
        let from = range_condition(SORT_KEY, &tuple(anchor), Direction::From);
        let since = range_condition(SORT_KEY, &tuple(anchor), Direction::Since);
        let document = fields(candidate);

        prop_assert_ne!(matches(&from, &document), matches(&since, &document));
    }

    /// Paging a whole collection through the condition reproduces it,
    /// in strictly decreasing order, without duplicates.
    #[test]
    fn matched_window_is_strictly_decreasing(
        anchor in triple(),
        mut collection in prop::collection::vec(triple(), 0..40),
    ) {
        collection.sort_unstable();
        collection.dedup();

        let from = range_condition(SORT_KEY, &tuple(anchor), Direction::From);
        let mut window: Vec<_> = collection
            .iter()
            .copied()
            .filter(|candidate| matches(&from, &fields(*candidate)))
            .collect();
        window.sort_unstable_by(|a, b| b.cmp(a));

        for pair in window.windows(2) {
            prop_assert!(pair[0] > pair[1]);
        }
        for candidate in &window {
            prop_assert!(*candidate < anchor);
        }
    }
}

#[test]
fn lower_sentinel_from_side_is_empty() {
    let anchor = tuple((i64::MIN, i64::MIN, i64::MIN));
    let from = range_condition(SORT_KEY, &anchor, Direction::From);
    for h in 0..8 {
        for i in 0..8 {
            assert!(!matches(&from, &fields((h, i, 0))));
        }
    }
}

#[test]
fn upper_sentinel_since_side_is_empty() {
    let anchor = tuple((i64::MAX, i64::MAX, i64::MAX));
    let since = range_condition(SORT_KEY, &anchor, Direction::Since);
    for h in 0..8 {
        for i in 0..8 {
            assert!(!matches(&since, &fields((h, i, 0))));
        }
    }
}

#[test]
fn sort_specifications_cover_the_whole_key() {
    let descending = sort_document(SORT_KEY, -1);
    assert_eq!(descending.len(), SORT_KEY.len());
    assert!(descending.iter().all(|(_, order)| order == &Bson::Int32(-1)));

    let ascending = sort_document(SORT_KEY, 1);
    assert!(ascending.iter().all(|(_, order)| order == &Bson::Int32(1)));
}
