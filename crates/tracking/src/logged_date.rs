//! Logged-date strings and the zone they were recorded in.

use crate::{TrackingError, TrackingResult};
use chrono::{DateTime, FixedOffset, Utc};
use datatrack_types::RecordedTimeZone;
use tracing::warn;

/// `yyyy-MM-dd'T'HH:mm:ss.SSSZZZZZ`
const LOGGED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Formats `date` as wall-clock time in `zone`.
pub(crate) fn format_in_zone(
    date: &DateTime<FixedOffset>,
    zone: &RecordedTimeZone,
) -> TrackingResult<String> {
    let local = zone.to_local(date.with_timezone(&Utc))?;
    Ok(local.format(LOGGED_DATE_FORMAT).to_string())
}

/// Formats `date` keeping its own offset.
pub(crate) fn format(date: &DateTime<FixedOffset>) -> String {
    date.format(LOGGED_DATE_FORMAT).to_string()
}

pub(crate) fn parse(raw: &str, path: &str) -> TrackingResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .or_else(|_| DateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|e| TrackingError::Translation(format!("invalid date '{raw}' at {path}: {e}")))
}

pub(crate) fn parse_optional(
    raw: Option<&str>,
    path: &str,
) -> TrackingResult<Option<DateTime<FixedOffset>>> {
    raw.map(|raw| parse(raw, path)).transpose()
}

/// Resolves the zone a value was recorded in.
///
/// An explicit identifier wins. Without one, a fixed-offset zone is inferred from the logged
/// date's offset, and failing that the caller's current zone is used.
pub(crate) fn recorded_zone(
    identifier: Option<&str>,
    logged_date: Option<&DateTime<FixedOffset>>,
    current: &RecordedTimeZone,
) -> RecordedTimeZone {
    if let Some(identifier) = identifier {
        match RecordedTimeZone::parse(identifier) {
            Ok(zone) => return zone,
            Err(e) => warn!("ignoring unrecognised time zone: {e}"),
        }
    }
    match logged_date {
        Some(date) => RecordedTimeZone::fixed(*date.offset()),
        None => current.clone(),
    }
}

/// The current instant as wall-clock time in `zone`.
pub(crate) fn now_in(zone: &RecordedTimeZone) -> DateTime<FixedOffset> {
    let now = Utc::now();
    zone.to_local(now)
        .unwrap_or_else(|_| DateTime::<FixedOffset>::from(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_in_the_recorded_zone() {
        let date = parse("2019-06-04T10:00:00.000-04:00", "$").expect("valid");
        let denver = RecordedTimeZone::parse("America/Denver").expect("zone");
        assert_eq!(
            format_in_zone(&date, &denver).expect("format"),
            "2019-06-04T08:00:00.000-06:00"
        );
        assert_eq!(format(&date), "2019-06-04T10:00:00.000-04:00");
    }

    #[test]
    fn accepts_compact_offsets() {
        let date = parse("2019-06-04T08:00:00.000-0600", "$").expect("valid");
        assert_eq!(date.offset().local_minus_utc(), -6 * 3600);
        let err = parse("yesterday", "$.loggedDate").expect_err("not a date");
        assert!(matches!(err, TrackingError::Translation(msg) if msg.contains("$.loggedDate")));
    }

    #[test]
    fn zone_resolution_order() {
        let current = RecordedTimeZone::utc();
        let date = parse("2019-06-04T08:00:00.000-06:00", "$").expect("valid");

        let explicit = recorded_zone(Some("America/Denver"), Some(&date), &current);
        assert_eq!(explicit.identifier(), "America/Denver");

        let inferred = recorded_zone(None, Some(&date), &current);
        assert_eq!(inferred.identifier(), "GMT-0600");

        let unknown = recorded_zone(Some("Mars/Olympus"), Some(&date), &current);
        assert_eq!(unknown.identifier(), "GMT-0600");

        assert_eq!(recorded_zone(None, None, &current), current);
    }
}
