//! Wall-clock time normalization.
//!
//! Converts local wall-clock time strings plus an IANA zone name into
//! absolute UTC instants. Event times arrive from clients as naive local
//! strings and are interpreted in the *owner's* stored timezone, never the
//! server's.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::TimeError;

/// Naive formats accepted from clients, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Interpret `local` as wall-clock time in `zone` and return the UTC instant.
///
/// Strings carrying an explicit UTC offset (RFC 3339) are honored as-is; the
/// zone name is still validated. Naive strings are resolved against the zone:
/// a DST-ambiguous time maps to the earlier instant, a nonexistent time
/// (spring-forward gap) is an error.
pub fn to_utc(local: &str, zone: &str) -> Result<DateTime<Utc>, TimeError> {
    let tz: Tz = zone
        .parse()
        .map_err(|_| TimeError::UnknownTimezone(zone.to_string()))?;

    // Explicit offset wins over the zone.
    if let Ok(dt) = DateTime::parse_from_rfc3339(local) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = parse_naive(local)?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _later) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => Err(TimeError::NonexistentLocalTime(format!(
            "{} in {}",
            local, zone
        ))),
    }
}

/// Check whether `zone` names a known IANA timezone.
pub fn is_valid_zone(zone: &str) -> bool {
    zone.parse::<Tz>().is_ok()
}

fn parse_naive(local: &str) -> Result<NaiveDateTime, TimeError> {
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(local, format) {
            return Ok(naive);
        }
    }
    Err(TimeError::InvalidTimeFormat(local.to_string()))
}
