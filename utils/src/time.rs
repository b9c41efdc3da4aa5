//! Time formatting helpers.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use fraudgate_types::Timestamp;

/// RFC 3339 UTC timestamp with millisecond precision, e.g.
/// `2024-05-01T12:00:00.000Z`.
pub fn iso_timestamp(ts: Timestamp) -> String {
    let dt: DateTime<Utc> = Utc
        .timestamp_millis_opt(ts.as_millis() as i64)
        .single()
        .unwrap_or_default();
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// [`iso_timestamp`] for the current instant.
pub fn now_iso() -> String {
    iso_timestamp(Timestamp::now())
}
