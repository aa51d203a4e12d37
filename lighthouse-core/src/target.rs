//! Aging topic caches.
//!
//! A target keeps the latest record (or the latest record per group) for one
//! topic and serves freshness-filtered copies of it. Expiry is passive:
//! stale records stay in storage until overwritten, but readers never see
//! them.
//!
//! Each target owns its own reader/writer lock. Any number of snapshots can
//! run together; a feed excludes readers and other writers for the duration
//! of the swap.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, CoreResult};
use crate::record::{self, GroupKey, Record};

// ============================================================================
// TARGET CAPABILITY
// ============================================================================

/// Something records can be fed into and snapshots read from.
pub trait Target: Send + Sync {
    /// Externally visible topic name.
    fn topic(&self) -> &str;

    /// Store a record, stamping it with its arrival time.
    fn feed(&self, record: Record) -> CoreResult<()>;

    /// Freshness-filtered copy of the stored state.
    fn snapshot(&self) -> CoreResult<Snapshot>;
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Read-side view of one topic.
///
/// Serializes as a single-entry object keyed by the topic name:
/// `{"cpu": {...}}`, `{"cpu": null}` or `{"nodes": [{...}, ...]}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Single {
        topic: String,
        record: Option<Record>,
    },
    Grouped {
        topic: String,
        records: Vec<Record>,
    },
}

impl Snapshot {
    pub fn topic(&self) -> &str {
        match self {
            Snapshot::Single { topic, .. } | Snapshot::Grouped { topic, .. } => topic,
        }
    }

    /// All visible records, in output order.
    pub fn records(&self) -> Vec<&Record> {
        match self {
            Snapshot::Single { record, .. } => record.iter().collect(),
            Snapshot::Grouped { records, .. } => records.iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn to_json(&self) -> Value {
        let body = match self {
            Snapshot::Single { record, .. } => record
                .clone()
                .map(Value::Object)
                .unwrap_or(Value::Null),
            Snapshot::Grouped { records, .. } => {
                Value::Array(records.iter().cloned().map(Value::Object).collect())
            }
        };
        let mut map = serde_json::Map::new();
        map.insert(self.topic().to_string(), body);
        Value::Object(map)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Snapshot::Single { topic, record } => map.serialize_entry(topic, record)?,
            Snapshot::Grouped { topic, records } => map.serialize_entry(topic, records)?,
        }
        map.end()
    }
}

// ============================================================================
// AGING CACHE TARGET
// ============================================================================

#[derive(Debug, Clone)]
struct StoredRecord {
    record: Record,
    arrived_at: DateTime<Utc>,
}

#[derive(Debug)]
enum Persisted {
    Single(Option<StoredRecord>),
    Grouped(HashMap<GroupKey, StoredRecord>),
}

/// Time-aged cache for one topic.
#[derive(Debug)]
pub struct AgingCacheTarget {
    topic: String,
    group_key: Option<String>,
    freshness_window: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<Persisted>,
}

impl AgingCacheTarget {
    /// Create a target using the wall clock.
    ///
    /// With a `group_key` the target keeps one record per distinct value of
    /// that field; without one it keeps a single record.
    pub fn new(
        topic: impl Into<String>,
        group_key: Option<String>,
        freshness_window: Duration,
    ) -> Self {
        Self::with_clock(topic, group_key, freshness_window, Arc::new(SystemClock))
    }

    pub fn with_clock(
        topic: impl Into<String>,
        group_key: Option<String>,
        freshness_window: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = match group_key {
            Some(_) => Persisted::Grouped(HashMap::new()),
            None => Persisted::Single(None),
        };
        Self {
            topic: topic.into(),
            group_key,
            freshness_window,
            clock,
            state: RwLock::new(state),
        }
    }

    pub fn group_key(&self) -> Option<&str> {
        self.group_key.as_deref()
    }

    pub fn is_grouped(&self) -> bool {
        self.group_key.is_some()
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    /// Number of stored records, stale ones included.
    pub fn len(&self) -> CoreResult<usize> {
        let state = self.read_state()?;
        Ok(match &*state {
            Persisted::Single(slot) => usize::from(slot.is_some()),
            Persisted::Grouped(groups) => groups.len(),
        })
    }

    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of records a snapshot taken now would include.
    pub fn fresh_count(&self) -> CoreResult<usize> {
        Ok(self.snapshot()?.records().len())
    }

    fn is_fresh(&self, arrived_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(arrived_at);
        match age.to_std() {
            Ok(age) => age < self.freshness_window,
            // Arrival in the future means the clock stepped back; treat as new.
            Err(_) => true,
        }
    }

    fn read_state(&self) -> CoreResult<std::sync::RwLockReadGuard<'_, Persisted>> {
        self.state.read().map_err(|_| CoreError::LockPoisoned {
            topic: self.topic.clone(),
        })
    }
}

impl Target for AgingCacheTarget {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn feed(&self, mut record: Record) -> CoreResult<()> {
        let group = match &self.group_key {
            Some(key) => Some(record::group_value(&record, key).ok_or_else(|| {
                CoreError::MissingGroupKey {
                    topic: self.topic.clone(),
                    group_key: key.clone(),
                }
            })?),
            None => None,
        };

        let arrived_at = self.clock.now();
        record::stamp(&mut record, arrived_at);
        let stored = StoredRecord { record, arrived_at };

        let mut state = self.state.write().map_err(|_| CoreError::LockPoisoned {
            topic: self.topic.clone(),
        })?;
        match (&mut *state, group) {
            (Persisted::Grouped(groups), Some(group)) => {
                groups.insert(group, stored);
            }
            (Persisted::Single(slot), _) => {
                *slot = Some(stored);
            }
            // Grouped targets always resolve a group above.
            (Persisted::Grouped(_), None) => {}
        }
        Ok(())
    }

    fn snapshot(&self) -> CoreResult<Snapshot> {
        let state = self.read_state()?;
        let now = self.clock.now();

        Ok(match &*state {
            Persisted::Single(slot) => Snapshot::Single {
                topic: self.topic.clone(),
                record: slot
                    .as_ref()
                    .filter(|stored| self.is_fresh(stored.arrived_at, now))
                    .map(|stored| stored.record.clone()),
            },
            Persisted::Grouped(groups) => {
                let mut fresh: Vec<(&GroupKey, &StoredRecord)> = groups
                    .iter()
                    .filter(|(_, stored)| self.is_fresh(stored.arrived_at, now))
                    .collect();
                fresh.sort_by(|a, b| a.0.cmp(b.0));
                Snapshot::Grouped {
                    topic: self.topic.clone(),
                    records: fresh
                        .into_iter()
                        .map(|(_, stored)| stored.record.clone())
                        .collect(),
                }
            }
        })
    }
}
