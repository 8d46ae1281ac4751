//! The record store collaborator.
//!
//! The store owns storage, encryption and indexing. This crate only talks to
//! it through [`RecordStore`], one callback-style method per native call.
//! Structured inputs travel as JSON strings, the same way the native engine
//! receives them.

use crate::bridge::CompletionSink;
use crate::handle::{SearchHandle, WalletHandle};

/// Callback-style access to an encrypted record store.
///
/// Every method must complete its sink exactly once, either before returning
/// or later from any thread. A sink completed with a non-zero code reports
/// the store's failure; see [`crate::ErrorKind::from_code`].
///
/// Tags whose names start with `~` are stored unencrypted and support every
/// query operator. All other tags are encrypted and only support exact
/// matching.
pub trait RecordStore: Send + Sync {
    /// Adds a new record. `tags_json` is a JSON object of tag names to values.
    fn add_record(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        value: &str,
        tags_json: &str,
        sink: CompletionSink<()>,
    );

    /// Replaces the value of an existing record.
    fn update_record_value(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        value: &str,
        sink: CompletionSink<()>,
    );

    /// Replaces all tags of an existing record.
    fn update_record_tags(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        tags_json: &str,
        sink: CompletionSink<()>,
    );

    /// Merges tags into an existing record, overwriting equally named ones.
    fn add_record_tags(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        tags_json: &str,
        sink: CompletionSink<()>,
    );

    /// Removes the named tags from an existing record. `tag_names_json` is a
    /// JSON list of names.
    fn delete_record_tags(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        tag_names_json: &str,
        sink: CompletionSink<()>,
    );

    /// Deletes a record.
    fn delete_record(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        sink: CompletionSink<()>,
    );

    /// Completes with the JSON encoding of one record, shaped by
    /// `options_json`.
    fn get_record(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        options_json: &str,
        sink: CompletionSink<String>,
    );

    /// Starts a search over the records of `record_type` matching
    /// `query_json` and completes with its handle.
    fn open_search(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        query_json: &str,
        options_json: &str,
        sink: CompletionSink<SearchHandle>,
    );

    /// Completes with the JSON encoding of the next batch of at most `count`
    /// records.
    fn fetch_next_records(
        &self,
        wallet: WalletHandle,
        search: SearchHandle,
        count: usize,
        sink: CompletionSink<String>,
    );

    /// Releases a search. The handle is invalid afterwards.
    fn close_search(&self, search: SearchHandle, sink: CompletionSink<()>);
}
