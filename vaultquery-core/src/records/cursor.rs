//! Search cursors: open, fetch batches, close.

use std::sync::Arc;

use crate::bridge::invoke;
use crate::codec;
use crate::error::{CommonError, VaultQueryResult};
use crate::handle::{SearchHandle, WalletHandle};
use crate::query::{compile, CompiledFilter, Expression};

use super::store::RecordStore;
use super::types::{Batch, Record, SearchOptions};

/// Position of the batch size among the native fetch call's parameters.
const FETCH_COUNT_PARAM: u8 = 4;

/// Opens a store-side search and returns its raw handle.
///
/// The caller owns the handle and must release it with [`close_search`].
/// Prefer [`Cursor::open`], which tracks this for you.
///
/// # Errors
///
/// - [`crate::ErrorKind::Encoding`] if `options` cannot be serialized;
/// - whatever the store reports, typically `Wallet(QueryError)` for a filter
///   it rejects or `Wallet(InvalidHandle)` for a closed wallet.
pub async fn open_search(
    store: &dyn RecordStore,
    wallet: WalletHandle,
    record_type: &str,
    filter: &CompiledFilter,
    options: SearchOptions,
) -> VaultQueryResult<SearchHandle> {
    let query_json = filter.to_json();
    let options_json = codec::encode(&options)?;
    let search = invoke(|sink| {
        store.open_search(wallet, record_type, &query_json, &options_json, sink);
    })
    .await?;
    log::debug!("opened {search} over `{record_type}` with filter {query_json}");
    Ok(search)
}

/// Fetches the next batch of at most `count` records from an open search.
///
/// # Errors
///
/// - `Common(InvalidParameter(4))` if `count` is zero, before the store is
///   called;
/// - [`crate::ErrorKind::Decoding`] if the store's payload is malformed;
/// - whatever the store reports, `Wallet(InvalidHandle)` for a closed search.
pub async fn fetch_next_records(
    store: &dyn RecordStore,
    wallet: WalletHandle,
    search: SearchHandle,
    count: usize,
) -> VaultQueryResult<Batch> {
    if count == 0 {
        return Err(CommonError::InvalidParameter(FETCH_COUNT_PARAM).into());
    }
    let payload = invoke(|sink| store.fetch_next_records(wallet, search, count, sink)).await?;
    codec::decode(&payload)
}

/// Releases a store-side search.
///
/// # Errors
///
/// Whatever the store reports, `Wallet(InvalidHandle)` for a handle that is
/// unknown or already closed.
pub async fn close_search(store: &dyn RecordStore, search: SearchHandle) -> VaultQueryResult<()> {
    invoke(|sink| store.close_search(search, sink)).await?;
    log::debug!("closed {search}");
    Ok(())
}

/// An open store-side search.
///
/// A cursor only exists while its search is open. [`Cursor::close`] consumes
/// it, so it cannot be fetched from after closing. Dropping a cursor without
/// closing it leaks the store-side search and logs a warning.
pub struct Cursor {
    store: Arc<dyn RecordStore>,
    wallet: WalletHandle,
    handle: SearchHandle,
    record_type: String,
    filter: CompiledFilter,
    options: SearchOptions,
    open: bool,
}

impl Cursor {
    /// Compiles `expression` and opens a search over the records of
    /// `record_type`. Nothing is left open when this fails.
    ///
    /// # Errors
    ///
    /// See [`open_search`].
    pub async fn open(
        store: Arc<dyn RecordStore>,
        wallet: WalletHandle,
        record_type: impl Into<String>,
        expression: &Expression,
        options: SearchOptions,
    ) -> VaultQueryResult<Self> {
        let record_type = record_type.into();
        let filter = compile(expression);
        let handle = open_search(store.as_ref(), wallet, &record_type, &filter, options).await?;
        Ok(Self {
            store,
            wallet,
            handle,
            record_type,
            filter,
            options,
            open: true,
        })
    }

    /// Fetches up to `count` more records. A batch with fewer records than
    /// requested, possibly none, means the search is exhausted.
    ///
    /// The cursor stays open when this fails.
    ///
    /// # Errors
    ///
    /// See [`fetch_next_records`].
    pub async fn fetch(&mut self, count: usize) -> VaultQueryResult<Batch> {
        fetch_next_records(self.store.as_ref(), self.wallet, self.handle, count).await
    }

    /// Closes the search.
    ///
    /// # Errors
    ///
    /// See [`close_search`]. The cursor is gone either way.
    pub async fn close(mut self) -> VaultQueryResult<()> {
        self.open = false;
        close_search(self.store.as_ref(), self.handle).await
    }

    /// Fetches batches of `batch_size` until the search is exhausted, then
    /// closes the cursor. The cursor is closed on every path, including a
    /// failed fetch.
    ///
    /// Returns the last total count the store reported together with every
    /// fetched record, in store order.
    ///
    /// # Errors
    ///
    /// The first fetch failure, or the close failure if every fetch
    /// succeeded.
    pub async fn collect_all(mut self, batch_size: usize) -> VaultQueryResult<Batch> {
        let drained = self.drain(batch_size).await;
        let closed = self.close().await;
        match (drained, closed) {
            (Ok(batch), Ok(())) => Ok(batch),
            (Ok(_), Err(error)) => Err(error),
            (Err(error), closed) => {
                if let Err(close_error) = closed {
                    log::warn!("closing search after a failed fetch also failed: {close_error}");
                }
                Err(error)
            }
        }
    }

    async fn drain(&mut self, batch_size: usize) -> VaultQueryResult<Batch> {
        let mut total_count = None;
        let mut records: Vec<Record> = Vec::new();
        loop {
            let batch = self.fetch(batch_size).await?;
            if batch.total_count.is_some() {
                total_count = batch.total_count;
            }
            match batch.records {
                Some(page) if !page.is_empty() => records.extend(page),
                _ => break,
            }
        }
        Ok(Batch {
            total_count,
            records: Some(records),
        })
    }

    /// Raw handle of the store-side search.
    #[must_use]
    pub const fn handle(&self) -> SearchHandle {
        self.handle
    }

    /// Wallet the search runs in.
    #[must_use]
    pub const fn wallet(&self) -> WalletHandle {
        self.wallet
    }

    /// Record type being searched.
    #[must_use]
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Filter the search was opened with.
    #[must_use]
    pub const fn filter(&self) -> &CompiledFilter {
        &self.filter
    }

    /// Options the search was opened with.
    #[must_use]
    pub const fn options(&self) -> SearchOptions {
        self.options
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("wallet", &self.wallet)
            .field("handle", &self.handle)
            .field("record_type", &self.record_type)
            .field("filter", &self.filter)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if self.open {
            log::warn!(
                "{} over `{}` dropped without being closed; the store-side search leaks",
                self.handle,
                self.record_type
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::bridge::CompletionSink;
    use crate::error::{ErrorKind, WalletError};

    const WALLET: WalletHandle = WalletHandle::new(1);
    const SEARCH: SearchHandle = SearchHandle::new(7);

    /// Serves scripted fetch payloads and counts calls.
    #[derive(Default)]
    struct ScriptedStore {
        pages: Mutex<Vec<Result<String, i32>>>,
        fetches: AtomicUsize,
        closes: AtomicUsize,
        close_code: i32,
        last_query: Mutex<Option<(String, String)>>,
    }

    impl ScriptedStore {
        fn with_pages(pages: Vec<Result<&str, i32>>) -> Self {
            let mut pages: Vec<_> = pages
                .into_iter()
                .map(|page| page.map(str::to_string))
                .collect();
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                ..Self::default()
            }
        }
    }

    impl RecordStore for ScriptedStore {
        fn add_record(
            &self,
            _: WalletHandle,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
            sink: CompletionSink<()>,
        ) {
            sink.finish(0);
        }

        fn update_record_value(
            &self,
            _: WalletHandle,
            _: &str,
            _: &str,
            _: &str,
            sink: CompletionSink<()>,
        ) {
            sink.finish(0);
        }

        fn update_record_tags(
            &self,
            _: WalletHandle,
            _: &str,
            _: &str,
            _: &str,
            sink: CompletionSink<()>,
        ) {
            sink.finish(0);
        }

        fn add_record_tags(
            &self,
            _: WalletHandle,
            _: &str,
            _: &str,
            _: &str,
            sink: CompletionSink<()>,
        ) {
            sink.finish(0);
        }

        fn delete_record_tags(
            &self,
            _: WalletHandle,
            _: &str,
            _: &str,
            _: &str,
            sink: CompletionSink<()>,
        ) {
            sink.finish(0);
        }

        fn delete_record(&self, _: WalletHandle, _: &str, _: &str, sink: CompletionSink<()>) {
            sink.finish(0);
        }

        fn get_record(
            &self,
            _: WalletHandle,
            _: &str,
            _: &str,
            _: &str,
            sink: CompletionSink<String>,
        ) {
            sink.fail(212);
        }

        fn open_search(
            &self,
            _: WalletHandle,
            _: &str,
            query_json: &str,
            options_json: &str,
            sink: CompletionSink<SearchHandle>,
        ) {
            *self.last_query.lock().unwrap() =
                Some((query_json.to_string(), options_json.to_string()));
            sink.succeed(SEARCH);
        }

        fn fetch_next_records(
            &self,
            _: WalletHandle,
            _: SearchHandle,
            _: usize,
            sink: CompletionSink<String>,
        ) {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.pages.lock().unwrap().pop() {
                Some(Ok(payload)) => sink.succeed(payload),
                Some(Err(code)) => sink.fail(code),
                None => sink.succeed("{}".to_string()),
            }
        }

        fn close_search(&self, _: SearchHandle, sink: CompletionSink<()>) {
            self.closes.fetch_add(1, Ordering::SeqCst);
            sink.finish(self.close_code);
        }
    }

    fn options() -> SearchOptions {
        SearchOptions::new(true, true, false, true, false)
    }

    #[tokio::test]
    async fn test_open_sends_compiled_filter_and_options() {
        let store = Arc::new(ScriptedStore::default());
        let cursor = Cursor::open(
            store.clone(),
            WALLET,
            "contact",
            &Expression::equal("~status", "active"),
            options(),
        )
        .await
        .unwrap();

        assert_eq!(cursor.handle(), SEARCH);
        assert_eq!(cursor.record_type(), "contact");
        assert_eq!(cursor.filter().to_json(), r#"{"~status":"active"}"#);
        let (query, options) = store.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query, r#"{"~status":"active"}"#);
        assert_eq!(
            options,
            r#"{"retrieveRecords":true,"retrieveTags":false,"retrieveTotalCount":true,"retrieveType":false,"retrieveValue":true}"#
        );
        cursor.close().await.unwrap();
        assert_eq!(store.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_count_is_rejected_before_the_store() {
        let store = Arc::new(ScriptedStore::default());
        let mut cursor = Cursor::open(store.clone(), WALLET, "t", &Expression::True, options())
            .await
            .unwrap();

        let result = cursor.fetch(0).await;
        assert_eq!(
            result,
            Err(ErrorKind::Common(CommonError::InvalidParameter(4)))
        );
        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
        cursor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cursor_usable() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            Err(210),
            Ok(r#"{"totalCount":1,"records":[{"id":"a"}]}"#),
        ]));
        let mut cursor = Cursor::open(store.clone(), WALLET, "t", &Expression::True, options())
            .await
            .unwrap();

        assert_eq!(
            cursor.fetch(5).await,
            Err(ErrorKind::Wallet(WalletError::Storage))
        );
        let batch = cursor.fetch(5).await.unwrap();
        assert_eq!(batch.total_count, Some(1));
        assert_eq!(batch.records()[0].id, "a");
        cursor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_batch_is_decoding_error() {
        let store = Arc::new(ScriptedStore::with_pages(vec![Ok("[1, 2]")]));
        let mut cursor = Cursor::open(store, WALLET, "t", &Expression::True, options())
            .await
            .unwrap();
        assert!(matches!(cursor.fetch(1).await, Err(ErrorKind::Decoding(_))));
        cursor.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_failure_is_surfaced() {
        let store = Arc::new(ScriptedStore {
            close_code: 200,
            ..ScriptedStore::default()
        });
        let cursor = Cursor::open(store, WALLET, "t", &Expression::True, options())
            .await
            .unwrap();
        assert_eq!(
            cursor.close().await,
            Err(ErrorKind::Wallet(WalletError::InvalidHandle))
        );
    }

    #[tokio::test]
    async fn test_collect_all_gathers_every_page() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            Ok(r#"{"totalCount":3,"records":[{"id":"a"},{"id":"b"}]}"#),
            Ok(r#"{"totalCount":3,"records":[{"id":"c"}]}"#),
            Ok(r#"{"totalCount":3,"records":null}"#),
        ]));
        let cursor = Cursor::open(store.clone(), WALLET, "t", &Expression::True, options())
            .await
            .unwrap();

        let batch = cursor.collect_all(2).await.unwrap();
        assert_eq!(batch.total_count, Some(3));
        let ids: Vec<_> = batch.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(store.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_collect_all_closes_after_fetch_failure() {
        let store = Arc::new(ScriptedStore::with_pages(vec![
            Ok(r#"{"records":[{"id":"a"}]}"#),
            Err(214),
        ]));
        let cursor = Cursor::open(store.clone(), WALLET, "t", &Expression::True, options())
            .await
            .unwrap();

        assert_eq!(
            cursor.collect_all(1).await,
            Err(ErrorKind::Wallet(WalletError::QueryError))
        );
        assert_eq!(store.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_collect_all_reports_close_failure() {
        let store = Arc::new(ScriptedStore {
            close_code: 200,
            ..ScriptedStore::default()
        });
        let cursor = Cursor::open(store, WALLET, "t", &Expression::True, options())
            .await
            .unwrap();
        assert_eq!(
            cursor.collect_all(10).await,
            Err(ErrorKind::Wallet(WalletError::InvalidHandle))
        );
    }

    #[tokio::test]
    async fn test_raw_primitives() {
        let store = ScriptedStore::with_pages(vec![Ok(r#"{"count":0}"#)]);
        let filter = compile(&Expression::True);
        let search = open_search(&store, WALLET, "t", &filter, options()).await.unwrap();
        let batch = fetch_next_records(&store, WALLET, search, 10).await.unwrap();
        assert_eq!(batch.total_count, Some(0));
        assert!(batch.is_empty());
        close_search(&store, search).await.unwrap();
        assert_eq!(
            fetch_next_records(&store, WALLET, search, 0).await,
            Err(ErrorKind::Common(CommonError::InvalidParameter(4)))
        );
    }
}
