//! Tracker engine: job store access and the async session runner that drives
//! the core state machine.
mod decode;
mod http;
mod memory;
mod sse;
mod store;
mod tracker;
mod types;

pub use decode::{decode_notification, decode_snapshot, DecodeError};
pub use http::{HttpSnapshotStore, StoreSettings};
pub use memory::MemorySnapshotStore;
pub use store::{SnapshotStore, Subscription};
pub use tracker::JobTracker;
pub use types::{StoreError, TrackerError, TrackerSettings};
