//! Opaque handles issued by the record store.
//!
//! Wallet and search handles are both plain 32-bit integers on the wire. They
//! are wrapped in distinct types so one can never be passed where the other is
//! expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle of an open wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletHandle(i32);

impl WalletHandle {
    /// Wraps a raw handle issued by the store.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle for passing back to the store.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for WalletHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wallet#{}", self.0)
    }
}

/// Handle of an open search cursor.
///
/// Unique for as long as the search is open. A store never hands out a handle
/// that is still open, but may reuse one after it was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchHandle(i32);

impl SearchHandle {
    /// Wraps a raw handle issued by the store.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle for passing back to the store.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SearchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "search#{}", self.0)
    }
}
