//! Storage and persistence layer
//!
//! - Sync cursors per (account, chain)
//! - Tracked holdings per account
//! - File-backed (JSON) and in-memory implementations of both

mod file_system;
mod holdings;
mod sync_state;

pub use file_system::AccountFiles;
pub use holdings::{FileHoldingsStore, HoldingsStore, InMemoryHoldingsStore};
pub use sync_state::{FileSyncStateStore, InMemorySyncStateStore, SyncStateStore};
