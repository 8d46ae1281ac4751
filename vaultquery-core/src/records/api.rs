//! Record client bound to one wallet.

use std::sync::Arc;

use crate::bridge::invoke;
use crate::codec;
use crate::config::SearchConfig;
use crate::error::VaultQueryResult;
use crate::handle::WalletHandle;
use crate::query::Expression;

use super::cursor::Cursor;
use super::store::RecordStore;
use super::types::{Batch, Record, SearchOptions, Tags};

/// Reads, writes and searches the non-secret records of one wallet.
///
/// Every method is a single call to the store. Failures are the store's own,
/// unchanged, except for payloads that cannot be encoded or decoded.
///
/// ```
/// # tokio_test::block_on(async {
/// use std::sync::Arc;
/// use vaultquery_core::{Expression, MemoryRecordStore, SearchOptions, Tags, WalletRecords};
///
/// let store = Arc::new(MemoryRecordStore::new());
/// let records = WalletRecords::new(store.clone(), store.open_wallet());
///
/// let tags = Tags::from([("~status".to_string(), "active".to_string())]);
/// records.add("contact", "alice", "{}", &tags).await.unwrap();
///
/// let found = records
///     .search_all(
///         "contact",
///         &Expression::equal("~status", "active"),
///         SearchOptions::new(true, true, false, false, false),
///     )
///     .await
///     .unwrap();
/// assert_eq!(found.total_count, Some(1));
/// assert_eq!(found.records()[0].id, "alice");
/// # });
/// ```
#[derive(Clone)]
pub struct WalletRecords {
    store: Arc<dyn RecordStore>,
    wallet: WalletHandle,
    config: SearchConfig,
}

impl WalletRecords {
    /// Binds a client to `wallet` with the default [`SearchConfig`].
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, wallet: WalletHandle) -> Self {
        Self::with_config(store, wallet, SearchConfig::default())
    }

    /// Binds a client to `wallet`.
    #[must_use]
    pub fn with_config(
        store: Arc<dyn RecordStore>,
        wallet: WalletHandle,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            wallet,
            config,
        }
    }

    /// The wallet this client operates on.
    #[must_use]
    pub const fn wallet(&self) -> WalletHandle {
        self.wallet
    }

    /// Adds a record.
    ///
    /// # Errors
    ///
    /// `Wallet(ItemAlreadyExists)` if a record with this type and id exists.
    pub async fn add(
        &self,
        record_type: &str,
        id: &str,
        value: &str,
        tags: &Tags,
    ) -> VaultQueryResult<()> {
        let tags_json = codec::encode(tags)?;
        invoke(|sink| {
            self.store
                .add_record(self.wallet, record_type, id, value, &tags_json, sink);
        })
        .await
    }

    /// Replaces a record's value.
    ///
    /// # Errors
    ///
    /// `Wallet(ItemNotFound)` if the record does not exist.
    pub async fn update_value(
        &self,
        record_type: &str,
        id: &str,
        value: &str,
    ) -> VaultQueryResult<()> {
        invoke(|sink| {
            self.store
                .update_record_value(self.wallet, record_type, id, value, sink);
        })
        .await
    }

    /// Replaces all of a record's tags.
    ///
    /// # Errors
    ///
    /// `Wallet(ItemNotFound)` if the record does not exist.
    pub async fn update_tags(
        &self,
        record_type: &str,
        id: &str,
        tags: &Tags,
    ) -> VaultQueryResult<()> {
        let tags_json = codec::encode(tags)?;
        invoke(|sink| {
            self.store
                .update_record_tags(self.wallet, record_type, id, &tags_json, sink);
        })
        .await
    }

    /// Adds tags to a record, overwriting tags of the same name.
    ///
    /// # Errors
    ///
    /// `Wallet(ItemNotFound)` if the record does not exist.
    pub async fn add_tags(&self, record_type: &str, id: &str, tags: &Tags) -> VaultQueryResult<()> {
        let tags_json = codec::encode(tags)?;
        invoke(|sink| {
            self.store
                .add_record_tags(self.wallet, record_type, id, &tags_json, sink);
        })
        .await
    }

    /// Removes the named tags from a record. Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// `Wallet(ItemNotFound)` if the record does not exist.
    pub async fn delete_tags<S: AsRef<str> + Sync>(
        &self,
        record_type: &str,
        id: &str,
        tag_names: &[S],
    ) -> VaultQueryResult<()> {
        let names_json =
            codec::encode(&tag_names.iter().map(AsRef::as_ref).collect::<Vec<&str>>())?;
        invoke(|sink| {
            self.store
                .delete_record_tags(self.wallet, record_type, id, &names_json, sink);
        })
        .await
    }

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// `Wallet(ItemNotFound)` if the record does not exist.
    pub async fn delete(&self, record_type: &str, id: &str) -> VaultQueryResult<()> {
        invoke(|sink| self.store.delete_record(self.wallet, record_type, id, sink)).await
    }

    /// Reads one record. The record-only flags of `options` (records and
    /// count) are ignored.
    ///
    /// # Errors
    ///
    /// `Wallet(ItemNotFound)` if the record does not exist,
    /// [`crate::ErrorKind::Decoding`] if the store's payload is malformed.
    pub async fn get(
        &self,
        record_type: &str,
        id: &str,
        options: SearchOptions,
    ) -> VaultQueryResult<Record> {
        let options_json = codec::encode(&options)?;
        let payload = invoke(|sink| {
            self.store
                .get_record(self.wallet, record_type, id, &options_json, sink);
        })
        .await?;
        codec::decode(&payload)
    }

    /// Opens a search over the records of `record_type` matching `query`.
    /// The returned cursor must be closed.
    ///
    /// # Errors
    ///
    /// See [`Cursor::open`].
    pub async fn open_search(
        &self,
        record_type: &str,
        query: &Expression,
        options: SearchOptions,
    ) -> VaultQueryResult<Cursor> {
        Cursor::open(
            Arc::clone(&self.store),
            self.wallet,
            record_type,
            query,
            options,
        )
        .await
    }

    /// Runs a search to completion, fetching the configured batch size at a
    /// time. The search is closed whatever the outcome.
    ///
    /// # Errors
    ///
    /// See [`Cursor::open`] and [`Cursor::collect_all`].
    pub async fn search_all(
        &self,
        record_type: &str,
        query: &Expression,
        options: SearchOptions,
    ) -> VaultQueryResult<Batch> {
        self.open_search(record_type, query, options)
            .await?
            .collect_all(self.config.batch_size)
            .await
    }
}

impl std::fmt::Debug for WalletRecords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecords")
            .field("wallet", &self.wallet)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
