//! Property-based tests for the in-memory query semantics shared by every
//! store backend.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use prosper_core::store::{format_timestamp, Query};
use serde_json::{json, Value};

fn arb_record() -> impl Strategy<Value = Value> {
    (0u8..3, 0i64..90 * 24 * 60, any::<bool>()).prop_map(|(owner, minutes, read)| {
        let base = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();
        json!({
            "created_by": format!("user{}@example.com", owner),
            "created_date": format_timestamp(base + Duration::minutes(minutes)),
            "read": read,
        })
    })
}

proptest! {
    /// Filtered results always satisfy the query, respect the limit and come
    /// back newest first.
    #[test]
    fn apply_filters_sorts_and_limits(
        records in prop::collection::vec(arb_record(), 0..40),
        limit in 1usize..15,
    ) {
        let query = Query::new()
            .owned_by("user1@example.com")
            .eq("read", false)
            .newest_first()
            .limit(limit);
        let out = query.apply(records.clone());

        prop_assert!(out.len() <= limit);
        for r in &out {
            prop_assert!(query.matches(r));
        }
        for w in out.windows(2) {
            let a = w[0]["created_date"].as_str().unwrap();
            let b = w[1]["created_date"].as_str().unwrap();
            prop_assert!(a >= b);
        }

        let expected = records.iter().filter(|r| query.matches(r)).count().min(limit);
        prop_assert_eq!(out.len(), expected);
    }

    /// Normalised timestamps sort lexicographically in chronological order.
    #[test]
    fn formatted_timestamps_order_chronologically(a in 0i64..10_000_000, b in 0i64..10_000_000) {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ta = base + Duration::milliseconds(a * 7);
        let tb = base + Duration::milliseconds(b * 7);
        prop_assert_eq!(ta.cmp(&tb), format_timestamp(ta).cmp(&format_timestamp(tb)));
    }
}
