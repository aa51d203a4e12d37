//! Record producers.
//!
//! A source hands out one record per receive call without ever blocking.
//! "Nothing available" is `Ok(None)`; a message that arrived but could not
//! be turned into a record is a [`SourceError`], after which the source is
//! still usable.

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::SourceError;
use crate::record::Record;

/// Non-blocking record producer.
pub trait Source: Send {
    /// Name used in logs (the queue name for IPC sources).
    fn name(&self) -> &str;

    /// Take the next record if one is ready.
    fn try_receive(&mut self) -> Result<Option<Record>, SourceError>;
}

/// In-process source backed by an unbounded channel.
///
/// Lets workers living in the same process publish without a socket. A
/// channel whose senders are all gone reads as permanently empty.
#[derive(Debug)]
pub struct ChannelSource {
    name: String,
    receiver: UnboundedReceiver<Record>,
}

impl ChannelSource {
    pub fn new(name: impl Into<String>, receiver: UnboundedReceiver<Record>) -> Self {
        Self {
            name: name.into(),
            receiver,
        }
    }
}

impl Source for ChannelSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_receive(&mut self) -> Result<Option<Record>, SourceError> {
        match self.receiver.try_recv() {
            Ok(record) => Ok(Some(record)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }
}
