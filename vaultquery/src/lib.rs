//! Structured search over the non-secret records of an encrypted wallet.
//!
//! Re-exports [`vaultquery_core`]. See [`WalletRecords`] to get started.

pub use vaultquery_core::*;

/// Result of every fallible operation in this crate.
pub type VaultQueryResult<T, E = ErrorKind> = std::result::Result<T, E>;
