//! Calculation history.
//!
//! A bounded most-recent-first list of past results, persisted through an
//! injected [`Storage`] port so the core never touches a global slot.

mod entry;
mod storage;
mod store;

pub use entry::HistoryEntry;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::{HISTORY_KEY, HistoryStore, MAX_ENTRIES};
