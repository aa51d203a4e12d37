//! Property tests for aging cache visibility.

use lighthouse_core::{group_value, GroupKey, ManualClock, Record, Target, TIMESTAMP_FIELD};
use lighthouse_test_utils::{assertions, fixtures, generators};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::time::Duration;

const WINDOW_MS: u64 = 10_000;

fn strip_timestamp(record: &Record) -> Record {
    let mut body = record.clone();
    body.remove(TIMESTAMP_FIELD);
    body
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A grouped snapshot holds exactly the latest record of every group
    /// whose latest feed is still inside the window.
    #[test]
    fn prop_grouped_snapshot_is_latest_fresh_per_group(
        schedule in generators::arb_feed_schedule("node", 24),
        read_delay in 0u64..15_000,
    ) {
        let clock = ManualClock::at_epoch();
        let target = fixtures::grouped_target("nodes", "node", &clock);

        let mut now_ms = 0u64;
        let mut model: BTreeMap<GroupKey, (u64, Record)> = BTreeMap::new();
        for (delay, record) in schedule {
            now_ms += delay;
            clock.advance(Duration::from_millis(delay));
            let group = group_value(&record, "node").expect("generated with group");
            model.insert(group, (now_ms, record.clone()));
            target.feed(record).expect("feed");
        }

        clock.advance(Duration::from_millis(read_delay));
        let read_at = now_ms + read_delay;

        let expected: Vec<(&GroupKey, &Record)> = model
            .iter()
            .filter(|(_, (arrived, _))| read_at - arrived < WINDOW_MS)
            .map(|(group, (_, record))| (group, record))
            .collect();

        let snapshot = target.snapshot().expect("snapshot");
        let names: Vec<String> = expected.iter().map(|(g, _)| g.to_string()).collect();
        let groups: Vec<&str> = names.iter().map(String::as_str).collect();
        assertions::assert_groups(&snapshot, "node", &groups);

        for (seen, (_, want)) in snapshot.records().iter().zip(expected.iter()) {
            prop_assert_eq!(&strip_timestamp(seen), *want);
        }
    }

    /// An ungrouped target shows the last record fed, or nothing once it
    /// has aged out.
    #[test]
    fn prop_ungrouped_shows_last_write_until_expiry(
        records in prop::collection::vec(generators::arb_record(), 1..10),
        read_delay in 0u64..20_000,
    ) {
        let clock = ManualClock::at_epoch();
        let target = fixtures::ungrouped_target("cpu", &clock);

        for record in &records {
            clock.advance(Duration::from_millis(100));
            target.feed(record.clone()).expect("feed");
        }
        clock.advance(Duration::from_millis(read_delay));

        let snapshot = target.snapshot().expect("snapshot");
        let visible = snapshot.records();
        if read_delay < WINDOW_MS {
            prop_assert_eq!(visible.len(), 1);
            let last = records.last().expect("non-empty");
            prop_assert_eq!(&strip_timestamp(visible[0]), last);
        } else {
            prop_assert!(visible.is_empty());
        }
    }

    /// Reading never changes what is stored.
    #[test]
    fn prop_snapshots_are_read_only(
        schedule in generators::arb_feed_schedule("node", 12),
        reads in 1usize..5,
    ) {
        let clock = ManualClock::at_epoch();
        let target = fixtures::grouped_target("nodes", "node", &clock);
        for (delay, record) in schedule {
            clock.advance(Duration::from_millis(delay));
            target.feed(record).expect("feed");
        }

        let stored = target.len().expect("len");
        let first = target.snapshot().expect("snapshot");
        for _ in 0..reads {
            prop_assert_eq!(&target.snapshot().expect("snapshot"), &first);
        }
        prop_assert_eq!(target.len().expect("len"), stored);
    }
}
