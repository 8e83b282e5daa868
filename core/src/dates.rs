//! The two date formats used by the Tranco API.
//!
//! Rank entries and list configurations carry calendar dates
//! (`2023-08-24`), while list metadata carries a naive timestamp with
//! microsecond precision (`2022-12-11T22:00:09.199647`). The formats are not
//! interchangeable and neither accepts a partial or best-effort match.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::DecodeError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const LIST_DATE_FORMAT: &str = "%Y%m%d";

const DATE_EXPECTED: &str = "a date formatted as YYYY-MM-DD";
const TIMESTAMP_EXPECTED: &str = "a timestamp formatted as YYYY-MM-DDTHH:MM:SS.ffffff";

/// Parse a date-only wire value.
pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, DecodeError> {
    let malformed = || DecodeError::Field {
        field,
        value: value.to_string(),
        expected: DATE_EXPECTED,
    };
    if value.len() != 10 {
        return Err(malformed());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| malformed())
}

/// Parse a timestamp wire value. Exactly six fractional digits are required.
pub(crate) fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<NaiveDateTime, DecodeError> {
    let malformed = || DecodeError::Field {
        field,
        value: value.to_string(),
        expected: TIMESTAMP_EXPECTED,
    };
    let fraction_ok = value.split_once('.').is_some_and(|(head, frac)| {
        head.len() == 19 && frac.len() == 6 && frac.bytes().all(|b| b.is_ascii_digit())
    });
    if !fraction_ok {
        return Err(malformed());
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| malformed())
}

/// Render a date in the wire's date-only format.
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Render a date as the `YYYYMMDD` path segment of the list-by-date endpoint.
pub(crate) fn format_list_date(date: NaiveDate) -> String {
    date.format(LIST_DATE_FORMAT).to_string()
}
