//! Lighthouse Test Utilities
//!
//! Shared test infrastructure for the Lighthouse workspace:
//! - Mock sources and action handlers
//! - Proptest generators for records and feed schedules
//! - Fixtures for common targets and actions
//! - Assertions over snapshots and envelopes

pub use lighthouse_core::{
    Action, ActionHandler, ActionRegistry, AgingCacheTarget, ArgType, ArgValue, ArgumentMap,
    ArgumentSpec, CoreError, CoreResult, DispatchError, Envelope, HandlerCatalog, ManualClock,
    Record, Snapshot, Source, SourceError, Target, TIMESTAMP_FIELD,
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// MOCK SOURCES & TARGETS
// ============================================================================

/// Scripted source.
///
/// Clones share the same queue, so a test can keep one clone and push
/// while an adapter owns the other.
#[derive(Debug, Clone)]
pub struct MockSource {
    name: String,
    queue: Arc<Mutex<VecDeque<Result<Record, SourceError>>>>,
}

impl MockSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn with_records(name: impl Into<String>, records: Vec<Record>) -> Self {
        let source = Self::new(name);
        for record in records {
            source.push(record);
        }
        source
    }

    pub fn push(&self, record: Record) {
        self.lock().push_back(Ok(record));
    }

    /// Queue a malformed message.
    pub fn push_malformed(&self, reason: impl Into<String>) {
        let err = SourceError::Malformed {
            queue: self.name.clone(),
            reason: reason.into(),
        };
        self.lock().push_back(Err(err));
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Record, SourceError>>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Source for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_receive(&mut self) -> Result<Option<Record>, SourceError> {
        self.lock().pop_front().transpose()
    }
}

// ============================================================================
// MOCK HANDLERS
// ============================================================================

/// Handler returning a fixed value and remembering its calls.
#[derive(Debug)]
pub struct StaticHandler {
    arity: usize,
    response: Value,
    calls: Mutex<Vec<Vec<ArgValue>>>,
}

impl StaticHandler {
    pub fn new(arity: usize, response: Value) -> Self {
        Self {
            arity,
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ArgValue>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ActionHandler for StaticHandler {
    fn arity(&self) -> usize {
        self.arity
    }

    async fn call(&self, args: Vec<ArgValue>) -> Value {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(args);
        self.response.clone()
    }
}

/// Handler that always panics.
#[derive(Debug, Default)]
pub struct PanickingHandler {
    pub arity: usize,
}

#[async_trait]
impl ActionHandler for PanickingHandler {
    fn arity(&self) -> usize {
        self.arity
    }

    async fn call(&self, _args: Vec<ArgValue>) -> Value {
        panic!("PanickingHandler called");
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for records and feed schedules.

    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    /// A JSON scalar suitable as a record field value.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(|v| json!(v)),
            (-1.0e6f64..1.0e6).prop_map(|v| json!(v)),
            "[a-z0-9 ]{0,12}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    /// A record with a few arbitrary fields and no `timestamp`.
    pub fn arb_record() -> impl Strategy<Value = Record> {
        prop::collection::btree_map("[a-z_]{1,8}", arb_scalar(), 0..6).prop_map(|fields| {
            fields
                .into_iter()
                .filter(|(k, _)| k != TIMESTAMP_FIELD)
                .collect()
        })
    }

    /// A group name drawn from a small pool so groups repeat.
    pub fn arb_group() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(str::to_string)
    }

    /// A record carrying `group_key`.
    pub fn arb_grouped_record(group_key: &'static str) -> impl Strategy<Value = Record> {
        (arb_record(), arb_group()).prop_map(move |(mut record, group)| {
            record.insert(group_key.to_string(), Value::String(group));
            record
        })
    }

    /// `(delay_ms, record)` feed steps for schedules under a manual clock.
    pub fn arb_feed_schedule(
        group_key: &'static str,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<(u64, Record)>> {
        prop::collection::vec((0u64..5_000, arb_grouped_record(group_key)), 1..max_len)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;
    use std::time::Duration;

    /// Convert a `json!` object into a record.
    #[track_caller]
    pub fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {}", other),
        }
    }

    /// Ungrouped target with a 10 s window on a manual clock.
    pub fn ungrouped_target(topic: &str, clock: &ManualClock) -> AgingCacheTarget {
        AgingCacheTarget::with_clock(topic, None, Duration::from_secs(10), Arc::new(clock.clone()))
    }

    /// Target grouped by `group_key` with a 10 s window on a manual clock.
    pub fn grouped_target(topic: &str, group_key: &str, clock: &ManualClock) -> AgingCacheTarget {
        AgingCacheTarget::with_clock(
            topic,
            Some(group_key.to_string()),
            Duration::from_secs(10),
            Arc::new(clock.clone()),
        )
    }

    /// `power_on` taking one integer `node_number`.
    pub fn power_on_action() -> Action {
        Action::new(
            "power_on",
            "/power_on",
            "power_on",
            vec![ArgumentSpec::new("node_number", ArgType::Int)],
        )
    }

    /// Argument map from `(name, value)` pairs.
    pub fn args(pairs: &[(&str, ArgValue)]) -> ArgumentMap {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over snapshots and envelopes.

    use super::*;

    /// Assert the group values present in a snapshot, in output order.
    #[track_caller]
    pub fn assert_groups(snapshot: &Snapshot, group_key: &str, expected: &[&str]) {
        let groups: Vec<String> = snapshot
            .records()
            .iter()
            .filter_map(|record| lighthouse_core::group_value(record, group_key))
            .map(|group| group.to_string())
            .collect();
        assert_eq!(groups, expected, "visible groups mismatch");
    }

    #[track_caller]
    pub fn assert_success(envelope: &Envelope) {
        assert!(envelope.is_success(), "expected OK envelope, got {:?}", envelope);
    }

    #[track_caller]
    pub fn assert_application_error(envelope: &Envelope, expected: DispatchError) {
        assert_eq!(envelope, &Envelope::error(expected));
    }
}
