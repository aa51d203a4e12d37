//! Queue sources backed by operating-system IPC.

pub mod ipc;

pub use ipc::{socket_path, validate_queue_name, IpcError, IpcQueuePublisher, IpcQueueSource};
