//! Tunables for record searches.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{ErrorKind, VaultQueryResult};

/// Number of records requested per fetch when draining a search.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Search configuration.
///
/// Loaded from JSON with camelCase keys; missing keys take their defaults.
///
/// ```
/// use vaultquery_core::SearchConfig;
///
/// let config = SearchConfig::from_json(r#"{"batchSize": 25}"#).unwrap();
/// assert_eq!(config.batch_size, 25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    /// Records per fetch. Must be greater than zero.
    pub batch_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SearchConfig {
    /// Configuration fetching `batch_size` records at a time.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::Decoding`] if `batch_size` is zero.
    pub fn with_batch_size(batch_size: usize) -> VaultQueryResult<Self> {
        Self { batch_size }.validated()
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::Decoding`] if `json` is malformed or a value is out of
    /// range.
    pub fn from_json(json: &str) -> VaultQueryResult<Self> {
        codec::decode::<Self>(json)?.validated()
    }

    fn validated(self) -> VaultQueryResult<Self> {
        if self.batch_size == 0 {
            return Err(ErrorKind::Decoding(
                "batchSize must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}
