//! Property-based tests using proptest
//!
//! These tests verify parameter indexing, filter evaluation and the store's
//! delete guard using randomized inputs.

use ec2emu::context::Context;
use ec2emu::filter::{apply, matches_criterion};
use ec2emu::outcome::{ErrorCode, Outcome};
use ec2emu::params::{parse_filters, FilterCriterion, RawParams};
use ec2emu::resource::dispatch::dispatch;
use ec2emu::resource::model::Image;
use ec2emu::store::Collection;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// Generate an arbitrary projection record
fn arb_record() -> impl Strategy<Value = Map<String, Value>> {
    (
        "[a-z]{1,8}",
        prop_oneof!["available", "pending", "deleted"],
        prop_oneof!["x86_64", "arm64", "i386"],
    )
        .prop_map(|(name, state, arch)| {
            let mut record = Map::new();
            record.insert("name".into(), json!(name));
            record.insert("state".into(), json!(state));
            record.insert("architecture".into(), json!(arch));
            record
        })
}

fn arb_records() -> impl Strategy<Value = Vec<Map<String, Value>>> {
    prop::collection::vec(arb_record(), 0..50)
}

fn arb_values() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            Just("available".to_string()),
            Just("pending".to_string()),
            Just("deleted".to_string()),
            Just("x86_64".to_string()),
            Just("arm64".to_string()),
        ],
        0..4,
    )
}

fn arb_criterion() -> impl Strategy<Value = FilterCriterion> {
    (prop_oneof!["state", "architecture"], arb_values())
        .prop_map(|(field, values)| FilterCriterion::new(&field, values))
}

fn field_in(record: &Map<String, Value>, criterion: &FilterCriterion) -> bool {
    let value = record[&criterion.field].as_str().unwrap_or_default();
    criterion.values.iter().any(|v| v == value)
}

// =============================================================================
// Indexing Tests
// =============================================================================

mod indexing_tests {
    use super::*;

    proptest! {
        /// Entries after the first missing index are never read
        #[test]
        fn list_stops_at_first_gap(
            n in 0usize..10,
            tail in prop::collection::vec(1usize..5, 0..5),
        ) {
            let mut pairs: Vec<(String, String)> = (1..=n)
                .map(|i| (format!("ImageId.{}", i), format!("ami-{}", i)))
                .collect();
            // skip index n + 1, then add a few higher indices
            let mut index = n + 1;
            for step in tail {
                index += step;
                pairs.push((format!("ImageId.{}", index), "ami-late".to_string()));
            }

            let params = RawParams::from_pairs(pairs);
            let ids = params.indexed_list("ImageId");
            prop_assert_eq!(ids.len(), n);
            prop_assert!(ids.iter().all(|id| id != "ami-late"));
        }

        /// Filter groups follow the same gap rule
        #[test]
        fn filter_groups_stop_at_first_gap(n in 0usize..6) {
            let mut pairs = Vec::new();
            for i in 1..=n {
                pairs.push((format!("Filter.{}.Name", i), "state".to_string()));
                pairs.push((format!("Filter.{}.Value.1", i), "available".to_string()));
            }
            pairs.push((format!("Filter.{}.Name", n + 2), "name".to_string()));

            let filters = parse_filters(&RawParams::from_pairs(pairs)).unwrap();
            prop_assert_eq!(filters.len(), n);
        }
    }
}

// =============================================================================
// Filter Logic Tests
// =============================================================================

mod filter_tests {
    use super::*;

    proptest! {
        /// An empty filter set returns every record unchanged
        #[test]
        fn empty_filter_is_identity(records in arb_records()) {
            let filtered = apply(&Vec::new(), records.clone());
            prop_assert_eq!(filtered, records);
        }

        /// A criterion without values matches nothing
        #[test]
        fn empty_values_fail_closed(records in arb_records()) {
            let filters = vec![FilterCriterion::new("state", Vec::new())];
            prop_assert!(apply(&filters, records).is_empty());
        }

        /// Values within a criterion are OR-ed; criteria are AND-ed
        #[test]
        fn criteria_and_values_or(
            record in arb_record(),
            first in arb_criterion(),
            second in arb_criterion(),
        ) {
            prop_assert_eq!(matches_criterion(&first, &record), field_in(&record, &first));
            prop_assert_eq!(matches_criterion(&second, &record), field_in(&record, &second));

            let expected = field_in(&record, &first) && field_in(&record, &second);
            let filtered = apply(&vec![first, second], vec![record]);
            prop_assert_eq!(!filtered.is_empty(), expected);
        }

        /// Filtering keeps the input order and never invents records
        #[test]
        fn filter_is_ordered_subset(records in arb_records(), criterion in arb_criterion()) {
            let filtered = apply(&vec![criterion.clone()], records.clone());
            let mut remaining = records.iter();
            for kept in &filtered {
                prop_assert!(field_in(kept, &criterion));
                prop_assert!(remaining.any(|r| r == kept));
            }
        }
    }
}

// =============================================================================
// Store Tests
// =============================================================================

mod store_tests {
    use super::*;

    proptest! {
        /// A blocked delete changes nothing, however often it is retried
        #[test]
        fn blocked_delete_is_idempotent(
            children in prop::collection::vec("i-[0-9a-f]{8}", 1..5),
            attempts in 1usize..6,
        ) {
            let mut images = Collection::new();
            let mut image = Image::new("ami-1", "golden", "123456789012", "2024-01-01T00:00:00.000Z");
            image.instance_ids = children.clone();
            images.put(image);

            for _ in 0..attempts {
                let err = images.delete("ami-1").unwrap_err();
                prop_assert_eq!(err.code, ErrorCode::DependencyViolation);
                prop_assert_eq!(&images.get("ami-1").unwrap().instance_ids, &children);
            }

            for child in &children {
                images.unlink_child("ami-1", Image::INSTANCES, child);
            }
            prop_assert!(images.delete("ami-1").is_ok());
            prop_assert!(images.get("ami-1").is_err());
        }
    }
}

// =============================================================================
// Outcome Tests
// =============================================================================

mod outcome_tests {
    use super::*;

    fn arb_request() -> impl Strategy<Value = Vec<(String, String)>> {
        let action = prop_oneof![
            "CreateVpc",
            "DescribeVpcs",
            "DeleteVpc",
            "CreateSubnet",
            "DescribeImages",
            "RunInstances",
            "CreateTags",
        ];
        let key = prop::sample::select(vec![
            "CidrBlock",
            "VpcId",
            "ImageId",
            "MaxResults",
            "Filter.1.Name",
            "Filter.1.Value.1",
            "ResourceId.1",
        ]);
        let value = prop::sample::select(vec!["10.0.0.0/16", "vpc-1", "abc", "5", "state", "available"]);
        (action, prop::collection::vec((key, value), 0..5)).prop_map(|(action, pairs)| {
            let mut pairs: Vec<(String, String)> = pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            pairs.push(("Action".to_string(), action));
            pairs
        })
    }

    proptest! {
        /// Every handled request is exactly one of success or error
        #[test]
        fn outcome_is_exclusive(pairs in arb_request()) {
            let ctx = Context::default();
            let outcome = dispatch(&ctx, &RawParams::from_pairs(pairs)).unwrap();
            prop_assert_ne!(outcome.is_success(), outcome.is_error());
            match &outcome {
                Outcome::Success(_) => prop_assert!(outcome.error().is_none()),
                Outcome::Error(_) => prop_assert!(outcome.payload().is_none()),
            }
        }
    }
}
