//! Parsing of wire timestamps into instants.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::{Result, TrackError};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a wire timestamp.
///
/// Accepts RFC 3339 with any offset, naive date-times (taken as UTC) and bare
/// dates (midnight UTC).
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    let value = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(TrackError::MalformedTimestamp {
        value: raw.to_string(),
    })
}

/// Build the display offset from minutes east of UTC, falling back to UTC.
#[must_use]
pub fn display_offset(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(utc_offset)
}

#[must_use]
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}
