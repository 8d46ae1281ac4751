//! JSON payload encoding for store calls.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ErrorKind, VaultQueryResult};

/// Serializes a request payload.
pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> VaultQueryResult<String> {
    serde_json::to_string(value).map_err(|err| ErrorKind::Encoding(err.to_string()))
}

/// Parses a response payload.
pub(crate) fn decode<T: DeserializeOwned>(payload: &str) -> VaultQueryResult<T> {
    serde_json::from_str(payload).map_err(|err| ErrorKind::Decoding(err.to_string()))
}
