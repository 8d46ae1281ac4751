//! Non-secret records: maintenance, search cursors and the store they run
//! against.
//!
//! [`WalletRecords`] is the entry point. [`Cursor`] drives a single search
//! through its open, fetch and close steps, and the free functions
//! [`open_search`], [`fetch_next_records`] and [`close_search`] expose the
//! same steps on raw handles.

mod api;
mod cursor;
pub mod memory;
mod store;
mod types;

pub use api::WalletRecords;
pub use cursor::{close_search, fetch_next_records, open_search, Cursor};
pub use memory::MemoryRecordStore;
pub use store::RecordStore;
pub use types::{Batch, Record, SearchOptions, Tags};
