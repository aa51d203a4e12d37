//! Lighthouse Core - aggregation and dispatch engine
//!
//! Workers publish status records onto named queues. Adapters move those
//! records, one per tick, from a [`Source`] into an [`AgingCacheTarget`],
//! which keeps the latest record per topic (or per group within a topic)
//! and only shows records younger than its freshness window.
//!
//! Separately, the [`ActionRegistry`] maps declared actions onto handlers
//! from a static [`HandlerCatalog`] and wraps every outcome in an
//! [`Envelope`].
//!
//! This crate has no I/O of its own beyond the in-process
//! [`ChannelSource`]; sockets, HTTP and the collector task live in
//! `lighthouse-api`.

pub mod action;
pub mod adapter;
pub mod clock;
pub mod error;
pub mod record;
pub mod registry;
pub mod source;
pub mod target;

pub use action::{
    Action, ArgParseError, ArgType, ArgValue, ArgumentMap, ArgumentSpec, UnknownArgType,
};
pub use adapter::{Adapter, TickOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult, SourceError};
pub use record::{
    group_value, parse_record, stamp, GroupKey, Record, RecordParseError, TIMESTAMP_FIELD,
};
pub use registry::{
    handler_name_for_path, ActionHandler, ActionRegistry, DispatchError, Envelope, HandlerCatalog,
    STATUS_APPLICATION_ERROR, STATUS_OK,
};
pub use source::{ChannelSource, Source};
pub use target::{AgingCacheTarget, Snapshot, Target};
