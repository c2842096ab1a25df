//! Offline synchronization: durable mutation queue and remote seam.
//!
//! # Responsibility
//! - Record every server-bound mood mutation durably, survive restarts,
//!   and drain opportunistically when a remote is reachable.
//!
//! # Invariants
//! - The queue is append-only; items are acknowledged in place and only
//!   purged by explicit housekeeping.
//! - One item's failure never aborts the drain of the rest.

pub mod queue;
pub mod remote;

pub use queue::{DrainReport, OfflineSyncQueue, PendingChange, QueuedChange, MOOD_SYNC_PATH};
pub use remote::{RemoteApi, RemoteApiError, RemoteResult};
