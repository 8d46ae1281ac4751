//! Wire types exchanged with the record store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag names mapped to tag values.
pub type Tags = BTreeMap<String, String>;

/// Selects which parts of matching records the store returns.
///
/// There are deliberately no defaults: stores fill in missing flags
/// differently, so every flag is always sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SearchOptions {
    /// Return the matching records. Only used by searches.
    #[serde(rename = "retrieveRecords")]
    pub include_records: bool,
    /// Return the tags of each record.
    #[serde(rename = "retrieveTags")]
    pub include_tags: bool,
    /// Return the total number of matches. Only used by searches.
    #[serde(rename = "retrieveTotalCount")]
    pub include_count: bool,
    /// Return the type of each record.
    #[serde(rename = "retrieveType")]
    pub include_type: bool,
    /// Return the value of each record.
    #[serde(rename = "retrieveValue")]
    pub include_value: bool,
}

impl SearchOptions {
    /// Builds options from all five flags.
    #[must_use]
    pub const fn new(
        include_records: bool,
        include_count: bool,
        include_type: bool,
        include_value: bool,
        include_tags: bool,
    ) -> Self {
        Self {
            include_records,
            include_tags,
            include_count,
            include_type,
            include_value,
        }
    }
}

/// A stored record. Which optional fields are present depends on the
/// [`SearchOptions`] of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record id, unique within its type.
    #[serde(alias = "referent")]
    pub id: String,
    /// Record type (collection).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    /// Record value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Record tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Batch {
    /// Total number of matches, when requested.
    #[serde(
        rename = "totalCount",
        alias = "count",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_count: Option<usize>,
    /// Records of this page, when requested. Empty or absent once the search
    /// is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,
}

impl Batch {
    /// Records of this page, empty when absent.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        self.records.as_deref().unwrap_or_default()
    }

    /// Number of records in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// `true` when the page carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}
