//! `vaultquery-core` searches the non-secret records of an encrypted, tagged
//! record store.
//!
//! Filters are written as [`Expression`] trees and compiled into the store's
//! query language. Searches run as cursors that are opened, fetched from in
//! batches and closed. The store itself is supplied by the embedding
//! application through the [`RecordStore`] trait; [`MemoryRecordStore`] is an
//! in-memory implementation for tests.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]

mod bridge;
pub use bridge::{invoke, CompletionSink};

mod codec;

mod config;
pub use config::{SearchConfig, DEFAULT_BATCH_SIZE};

mod error;
pub use error::*;

mod handle;
pub use handle::{SearchHandle, WalletHandle};

pub mod logger;

pub mod query;
pub use query::{compile, CompiledFilter, ComparisonOp, Expression};

pub mod records;
pub use records::{
    close_search, fetch_next_records, open_search, Batch, Cursor, MemoryRecordStore, Record,
    RecordStore, SearchOptions, Tags, WalletRecords,
};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("vaultquery_core");
