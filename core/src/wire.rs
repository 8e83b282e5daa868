//! JSON shapes exchanged with the Tranco API and their mapping to the
//! public types.
//!
//! Field names follow the service exactly, which mixes snake_case and
//! camelCase. Dates stay as strings here and are parsed during conversion
//! so a malformed value can be reported by its wire field name.

use serde::{Deserialize, Serialize};

use crate::dates::{format_date, parse_date, parse_timestamp};
use crate::error::DecodeError;
use crate::types::{Configuration, CreatedList, ListMetadata, RankEntry, Ranks};

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRanks {
    pub domain: String,
    #[serde(default)]
    pub ranks: Option<Vec<ApiRankEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRankEntry {
    pub date: String,
    pub rank: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiListMetadata {
    pub list_id: String,
    pub available: bool,
    pub failed: bool,
    pub download: String,
    pub created_on: String,
    pub configuration: ApiConfiguration,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApiConfiguration {
    pub providers: Vec<String>,
    #[serde(rename = "listPrefix")]
    pub list_prefix: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    #[serde(rename = "filterTLD")]
    pub filter_tld: String,
    #[serde(rename = "filterPLD")]
    pub filter_pld: String,
    #[serde(rename = "combinationMethod")]
    pub combination_method: String,
    #[serde(rename = "isDailyList")]
    pub is_daily_list: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCreatedList {
    pub list_id: String,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// Error payload the service sends with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: i64,
    pub message: String,
}

impl TryFrom<ApiRanks> for Ranks {
    type Error = DecodeError;

    fn try_from(api: ApiRanks) -> Result<Self, Self::Error> {
        let ranks = api
            .ranks
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                Ok(RankEntry {
                    date: parse_date("date", &entry.date)?,
                    rank: entry.rank,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;
        Ok(Ranks {
            domain: api.domain,
            ranks,
        })
    }
}

impl TryFrom<ApiListMetadata> for ListMetadata {
    type Error = DecodeError;

    fn try_from(api: ApiListMetadata) -> Result<Self, Self::Error> {
        Ok(ListMetadata {
            list_id: api.list_id,
            available: api.available,
            failed: api.failed,
            download: api.download,
            created_on: parse_timestamp("created_on", &api.created_on)?,
            configuration: api.configuration.try_into()?,
        })
    }
}

impl TryFrom<ApiConfiguration> for Configuration {
    type Error = DecodeError;

    fn try_from(api: ApiConfiguration) -> Result<Self, Self::Error> {
        Ok(Configuration {
            providers: api.providers,
            list_prefix: api.list_prefix,
            start_date: parse_date("startDate", &api.start_date)?,
            end_date: parse_date("endDate", &api.end_date)?,
            filter_tld: api.filter_tld,
            filter_pld: api.filter_pld,
            combination_method: api.combination_method,
            is_daily_list: api.is_daily_list,
        })
    }
}

impl From<&Configuration> for ApiConfiguration {
    fn from(config: &Configuration) -> Self {
        ApiConfiguration {
            providers: config.providers.clone(),
            list_prefix: config.list_prefix.clone(),
            start_date: format_date(config.start_date),
            end_date: format_date(config.end_date),
            filter_tld: config.filter_tld.clone(),
            filter_pld: config.filter_pld.clone(),
            combination_method: config.combination_method.clone(),
            is_daily_list: config.is_daily_list,
        }
    }
}

impl From<ApiCreatedList> for CreatedList {
    fn from(api: ApiCreatedList) -> Self {
        CreatedList {
            list_id: api.list_id,
            warnings: api.warnings.unwrap_or_default(),
        }
    }
}
