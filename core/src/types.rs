//! Public domain types returned by `TrancoClient`.
//!
//! # Design
//! These are the caller-facing shapes. They hold parsed `chrono` values and
//! carry no serde attributes; the JSON field names and string date formats
//! of the service live in the private `wire` module, which converts into
//! these types as soon as a response is decoded.

use chrono::{NaiveDate, NaiveDateTime};

/// Rank history of a single domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranks {
    pub domain: String,
    /// Entries in the order the service returned them (most recent first).
    /// Empty, never absent, when the domain has no history.
    pub ranks: Vec<RankEntry>,
}

/// A domain's rank on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankEntry {
    pub date: NaiveDate,
    pub rank: u64,
}

/// Metadata of a generated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMetadata {
    pub list_id: String,
    pub available: bool,
    pub failed: bool,
    pub download: String,
    pub created_on: NaiveDateTime,
    pub configuration: Configuration,
}

/// Parameters a list was (or should be) generated with.
///
/// The filter flags are free-form strings such as `"false"` or `"on"`, as
/// the service sends and accepts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub providers: Vec<String>,
    pub list_prefix: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filter_tld: String,
    pub filter_pld: String,
    pub combination_method: String,
    pub is_daily_list: bool,
}

/// Result of a list creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedList {
    pub list_id: String,
    /// Warnings the service attached to the request; empty when none.
    pub warnings: Vec<String>,
}
