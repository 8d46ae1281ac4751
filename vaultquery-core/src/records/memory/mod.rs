//! In-memory record store.
//!
//! This implementation is NOT secure for production use: nothing is
//! encrypted and nothing is persisted. It honours the same wire contract as a
//! native store (filter language, tag classes, pagination, handle
//! invalidation) so searches can be exercised without one.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;

use crate::bridge::CompletionSink;
use crate::codec;
use crate::error::{CommonError, VaultQueryResult, WalletError};
use crate::handle::{SearchHandle, WalletHandle};

use super::store::RecordStore;
use super::types::{Batch, Record, SearchOptions, Tags};

mod matcher;

use matcher::TagQuery;

#[derive(Debug, Clone)]
struct StoredRecord {
    value: String,
    tags: Tags,
}

impl StoredRecord {
    fn project(&self, record_type: &str, id: &str, options: SearchOptions) -> Record {
        Record {
            id: id.to_owned(),
            record_type: options.include_type.then(|| record_type.to_owned()),
            value: options.include_value.then(|| self.value.clone()),
            tags: options.include_tags.then(|| self.tags.clone()),
        }
    }
}

/// Records of one wallet, by type then id.
type RecordsByType = BTreeMap<String, BTreeMap<String, StoredRecord>>;

/// A search snapshot taken when the search was opened.
struct OpenSearch {
    wallet: WalletHandle,
    total_count: usize,
    pending: VecDeque<Record>,
    options: SearchOptions,
}

#[derive(Default)]
struct State {
    last_handle: i32,
    wallets: HashMap<WalletHandle, RecordsByType>,
    searches: HashMap<SearchHandle, OpenSearch>,
}

impl State {
    fn next_handle(&mut self) -> i32 {
        self.last_handle += 1;
        self.last_handle
    }

    fn wallet(&self, wallet: WalletHandle) -> VaultQueryResult<&RecordsByType> {
        Ok(self.wallets.get(&wallet).ok_or(WalletError::InvalidHandle)?)
    }

    fn wallet_mut(&mut self, wallet: WalletHandle) -> VaultQueryResult<&mut RecordsByType> {
        Ok(self
            .wallets
            .get_mut(&wallet)
            .ok_or(WalletError::InvalidHandle)?)
    }

    fn record_mut(
        &mut self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
    ) -> VaultQueryResult<&mut StoredRecord> {
        Ok(self
            .wallet_mut(wallet)?
            .get_mut(record_type)
            .and_then(|records| records.get_mut(id))
            .ok_or(WalletError::ItemNotFound)?)
    }
}

/// Record store that keeps every wallet in memory.
///
/// Searches snapshot their matches when opened and return them ordered by
/// record id. Handles are never reused.
#[derive(Default)]
pub struct MemoryRecordStore {
    state: Mutex<State>,
}

impl MemoryRecordStore {
    /// Creates an empty store without wallets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new, empty wallet.
    #[must_use]
    pub fn open_wallet(&self) -> WalletHandle {
        let mut state = self.state();
        let wallet = WalletHandle::new(state.next_handle());
        state.wallets.insert(wallet, RecordsByType::new());
        log::debug!("opened in-memory {wallet}");
        wallet
    }

    /// Discards a wallet, its records and its open searches. Returns `false`
    /// if the wallet was not open.
    pub fn close_wallet(&self, wallet: WalletHandle) -> bool {
        let mut state = self.state();
        state.searches.retain(|_, search| search.wallet != wallet);
        state.wallets.remove(&wallet).is_some()
    }

    /// Number of searches currently open, across all wallets.
    #[must_use]
    pub fn open_search_count(&self) -> usize {
        self.state().searches.len()
    }

    // A panic while holding the lock cannot leave the maps half-updated.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        value: &str,
        tags_json: &str,
    ) -> VaultQueryResult<()> {
        let tags: Tags = parse(tags_json)?;
        let mut state = self.state();
        let records = state
            .wallet_mut(wallet)?
            .entry(record_type.to_owned())
            .or_default();
        if records.contains_key(id) {
            return Err(WalletError::ItemAlreadyExists.into());
        }
        records.insert(
            id.to_owned(),
            StoredRecord {
                value: value.to_owned(),
                tags,
            },
        );
        Ok(())
    }

    fn update(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        change: impl FnOnce(&mut StoredRecord),
    ) -> VaultQueryResult<()> {
        let mut state = self.state();
        change(state.record_mut(wallet, record_type, id)?);
        Ok(())
    }

    fn remove(&self, wallet: WalletHandle, record_type: &str, id: &str) -> VaultQueryResult<()> {
        let mut state = self.state();
        state
            .wallet_mut(wallet)?
            .get_mut(record_type)
            .and_then(|records| records.remove(id))
            .map(drop)
            .ok_or_else(|| WalletError::ItemNotFound.into())
    }

    fn get(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        options_json: &str,
    ) -> VaultQueryResult<String> {
        let options: SearchOptions = parse(options_json)?;
        let state = self.state();
        let record = state
            .wallet(wallet)?
            .get(record_type)
            .and_then(|records| records.get(id))
            .ok_or(WalletError::ItemNotFound)?
            .project(record_type, id, options);
        codec::encode(&record)
    }

    fn search(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        query_json: &str,
        options_json: &str,
    ) -> VaultQueryResult<SearchHandle> {
        let query = TagQuery::parse(query_json)?;
        let options: SearchOptions = parse(options_json)?;
        let mut state = self.state();
        let pending: VecDeque<Record> = state
            .wallet(wallet)?
            .get(record_type)
            .into_iter()
            .flatten()
            .filter(|(_, stored)| query.matches(&stored.tags))
            .map(|(id, stored)| stored.project(record_type, id, options))
            .collect();
        let search = SearchHandle::new(state.next_handle());
        state.searches.insert(
            search,
            OpenSearch {
                wallet,
                total_count: pending.len(),
                pending,
                options,
            },
        );
        Ok(search)
    }

    fn next_batch(
        &self,
        wallet: WalletHandle,
        search: SearchHandle,
        count: usize,
    ) -> VaultQueryResult<String> {
        let mut state = self.state();
        let open = state
            .searches
            .get_mut(&search)
            .filter(|open| open.wallet == wallet)
            .ok_or(WalletError::InvalidHandle)?;
        let take = count.min(open.pending.len());
        let page: Vec<Record> = open.pending.drain(..take).collect();
        let batch = Batch {
            total_count: open.options.include_count.then_some(open.total_count),
            records: (open.options.include_records && !page.is_empty()).then_some(page),
        };
        codec::encode(&batch)
    }

    fn release(&self, search: SearchHandle) -> VaultQueryResult<()> {
        self.state()
            .searches
            .remove(&search)
            .map(drop)
            .ok_or_else(|| WalletError::InvalidHandle.into())
    }
}

/// Parses a request payload the way the native engine does: malformed input
/// is an invalid structure.
fn parse<T: DeserializeOwned>(json: &str) -> VaultQueryResult<T> {
    codec::decode(json).map_err(|err| {
        log::debug!("rejecting request payload: {err}");
        CommonError::InvalidStructure.into()
    })
}

impl RecordStore for MemoryRecordStore {
    fn add_record(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        value: &str,
        tags_json: &str,
        sink: CompletionSink<()>,
    ) {
        sink.resolve(self.insert(wallet, record_type, id, value, tags_json));
    }

    fn update_record_value(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        value: &str,
        sink: CompletionSink<()>,
    ) {
        sink.resolve(self.update(wallet, record_type, id, |record| {
            value.clone_into(&mut record.value);
        }));
    }

    fn update_record_tags(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        tags_json: &str,
        sink: CompletionSink<()>,
    ) {
        let result = parse::<Tags>(tags_json)
            .and_then(|tags| self.update(wallet, record_type, id, |record| record.tags = tags));
        sink.resolve(result);
    }

    fn add_record_tags(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        tags_json: &str,
        sink: CompletionSink<()>,
    ) {
        let result = parse::<Tags>(tags_json).and_then(|tags| {
            self.update(wallet, record_type, id, |record| record.tags.extend(tags))
        });
        sink.resolve(result);
    }

    fn delete_record_tags(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        tag_names_json: &str,
        sink: CompletionSink<()>,
    ) {
        let result = parse::<Vec<String>>(tag_names_json).and_then(|names| {
            self.update(wallet, record_type, id, |record| {
                for name in &names {
                    record.tags.remove(name);
                }
            })
        });
        sink.resolve(result);
    }

    fn delete_record(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        sink: CompletionSink<()>,
    ) {
        sink.resolve(self.remove(wallet, record_type, id));
    }

    fn get_record(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        id: &str,
        options_json: &str,
        sink: CompletionSink<String>,
    ) {
        sink.resolve(self.get(wallet, record_type, id, options_json));
    }

    fn open_search(
        &self,
        wallet: WalletHandle,
        record_type: &str,
        query_json: &str,
        options_json: &str,
        sink: CompletionSink<SearchHandle>,
    ) {
        sink.resolve(self.search(wallet, record_type, query_json, options_json));
    }

    fn fetch_next_records(
        &self,
        wallet: WalletHandle,
        search: SearchHandle,
        count: usize,
        sink: CompletionSink<String>,
    ) {
        sink.resolve(self.next_batch(wallet, search, count));
    }

    fn close_search(&self, search: SearchHandle, sink: CompletionSink<()>) {
        sink.resolve(self.release(search));
    }
}
