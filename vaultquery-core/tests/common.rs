//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use vaultquery_core::logger::init_tracing;
use vaultquery_core::{MemoryRecordStore, Tags, WalletRecords};

/// Record type used by every fixture.
pub const CONTACT: &str = "contact";

/// A fresh store with one open wallet and a client bound to it.
pub fn setup() -> (Arc<MemoryRecordStore>, WalletRecords) {
    let _ = init_tracing("warn,vaultquery_core=debug");
    let store = Arc::new(MemoryRecordStore::new());
    let records = WalletRecords::new(store.clone(), store.open_wallet());
    (store, records)
}

/// Builds a tag map from name/value pairs.
pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect()
}

/// Adds `count` contacts with ids `c000`, `c001`, ... Even contacts are
/// `~status=active`, odd ones `~status=inactive`; `~score` is the index.
pub async fn add_contacts(records: &WalletRecords, count: usize) {
    for index in 0..count {
        let status = if index % 2 == 0 { "active" } else { "inactive" };
        let score = index.to_string();
        records
            .add(
                CONTACT,
                &format!("c{index:03}"),
                &format!("contact {index}"),
                &tags(&[("~status", status), ("~score", &score), ("region", "eu")]),
            )
            .await
            .expect("add contact");
    }
}
