//! Source → target bindings.

use std::fmt;
use std::sync::Arc;

use crate::error::CoreResult;
use crate::source::Source;
use crate::target::Target;

/// Result of a single adapter tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source had nothing ready.
    Empty,
    /// One record was moved into the target.
    Delivered,
}

/// Fixed pairing of one source with one target.
pub struct Adapter {
    name: String,
    source: Box<dyn Source>,
    target: Arc<dyn Target>,
}

impl Adapter {
    pub fn new(name: impl Into<String>, source: Box<dyn Source>, target: Arc<dyn Target>) -> Self {
        Self {
            name: name.into(),
            source,
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Arc<dyn Target> {
        &self.target
    }

    /// Move at most one record from the source into the target.
    ///
    /// Errors from either side are returned as-is; the caller decides how
    /// to report them. Nothing is retried or buffered.
    pub fn tick(&mut self) -> CoreResult<TickOutcome> {
        match self.source.try_receive()? {
            Some(record) => {
                self.target.feed(record)?;
                Ok(TickOutcome::Delivered)
            }
            None => Ok(TickOutcome::Empty),
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name)
            .field("source", &self.source.name())
            .field("topic", &self.target.topic())
            .finish()
    }
}
