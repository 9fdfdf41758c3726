use crate::{TypesError, TypesResult};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone as _, Timelike, Utc};
use jiff::tz::{Offset, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The zone a value was recorded in.
///
/// Stored values identify their zone either by IANA name (`America/Denver`) or by a fixed
/// offset label (`GMT-0600`). The identifier is kept exactly as recorded so it can be written
/// back unchanged; the rules behind it are resolved from the bundled tz database.
///
/// Two zones compare equal when their identifiers match, even if the rules would currently
/// yield the same offset.
#[derive(Clone, Debug)]
pub struct RecordedTimeZone {
    identifier: String,
    zone: TimeZone,
}

impl RecordedTimeZone {
    /// Parses a zone identifier.
    ///
    /// Accepts `UTC`, `GMT`, fixed offsets of the form `GMT-0600`, `GMT+05:30` or `UTC+1`,
    /// and any IANA name known to the bundled tz database.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidTimeZone`] if the identifier is empty or unknown.
    pub fn parse(raw: &str) -> TypesResult<Self> {
        let identifier = raw.trim();
        if identifier.is_empty() {
            return Err(TypesError::InvalidTimeZone(raw.to_string()));
        }

        if matches!(identifier, "UTC" | "GMT" | "Z") {
            return Ok(Self {
                identifier: identifier.to_string(),
                zone: TimeZone::UTC,
            });
        }

        let fixed_suffix = identifier
            .strip_prefix("GMT")
            .or_else(|| identifier.strip_prefix("UTC"));
        if let Some(suffix) = fixed_suffix {
            let seconds = parse_offset_suffix(suffix)
                .ok_or_else(|| TypesError::InvalidTimeZone(raw.to_string()))?;
            let offset = Offset::from_seconds(seconds)
                .map_err(|e| TypesError::InvalidTimeZone(format!("{raw}: {e}")))?;
            return Ok(Self {
                identifier: identifier.to_string(),
                zone: TimeZone::fixed(offset),
            });
        }

        let zone = TimeZone::get(identifier)
            .map_err(|e| TypesError::InvalidTimeZone(format!("{raw}: {e}")))?;
        Ok(Self {
            identifier: identifier.to_string(),
            zone,
        })
    }

    /// A fixed-offset zone labelled the way legacy records label them (`GMT-0600`).
    pub fn fixed(offset: FixedOffset) -> Self {
        let seconds = offset.local_minus_utc();
        let identifier = if seconds == 0 {
            "GMT".to_string()
        } else {
            let sign = if seconds < 0 { '-' } else { '+' };
            let minutes = seconds.abs() / 60;
            format!("GMT{sign}{:02}{:02}", minutes / 60, minutes % 60)
        };
        let zone = Offset::from_seconds(seconds)
            .map(TimeZone::fixed)
            .unwrap_or(TimeZone::UTC);
        Self { identifier, zone }
    }

    pub fn utc() -> Self {
        Self {
            identifier: "UTC".to_string(),
            zone: TimeZone::UTC,
        }
    }

    /// The host's zone, or UTC when the host zone has no IANA name.
    pub fn system() -> Self {
        let zone = TimeZone::system();
        match zone.iana_name().map(str::to_string) {
            Some(identifier) => Self { identifier, zone },
            None => Self::utc(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The UTC offset this zone observes at `instant`.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::OutOfRange`] if the instant falls outside the supported range.
    pub fn offset_at(&self, instant: DateTime<Utc>) -> TypesResult<FixedOffset> {
        let timestamp = jiff::Timestamp::from_second(instant.timestamp())
            .map_err(|e| TypesError::OutOfRange(e.to_string()))?;
        fixed_offset(self.zone.to_offset(timestamp))
    }

    /// Expresses `instant` in this zone's wall-clock time.
    pub fn to_local(&self, instant: DateTime<Utc>) -> TypesResult<DateTime<FixedOffset>> {
        let offset = self.offset_at(instant)?;
        Ok(instant.with_timezone(&offset))
    }

    /// Interprets a wall-clock time in this zone.
    ///
    /// Times skipped by a daylight-saving gap move forward past the gap; repeated times take
    /// their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::OutOfRange`] if the date cannot be represented.
    pub fn localize(&self, local: NaiveDateTime) -> TypesResult<DateTime<FixedOffset>> {
        let out_of_range = || TypesError::OutOfRange(local.to_string());
        let civil = jiff::civil::DateTime::new(
            i16::try_from(local.year()).map_err(|_| out_of_range())?,
            i8::try_from(local.month()).map_err(|_| out_of_range())?,
            i8::try_from(local.day()).map_err(|_| out_of_range())?,
            i8::try_from(local.hour()).map_err(|_| out_of_range())?,
            i8::try_from(local.minute()).map_err(|_| out_of_range())?,
            i8::try_from(local.second()).map_err(|_| out_of_range())?,
            i32::try_from(local.nanosecond() % 1_000_000_000).map_err(|_| out_of_range())?,
        )
        .map_err(|e| TypesError::OutOfRange(e.to_string()))?;

        let zoned = civil
            .to_zoned(self.zone.clone())
            .map_err(|e| TypesError::OutOfRange(e.to_string()))?;
        let offset = fixed_offset(zoned.offset())?;
        offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(out_of_range)
    }

    /// The calendar day `instant` falls on in this zone.
    pub fn calendar_day(&self, instant: &DateTime<FixedOffset>) -> TypesResult<NaiveDate> {
        Ok(self.to_local(instant.with_timezone(&Utc))?.date_naive())
    }
}

fn fixed_offset(offset: Offset) -> TypesResult<FixedOffset> {
    FixedOffset::east_opt(offset.seconds())
        .ok_or_else(|| TypesError::OutOfRange(format!("offset {offset}")))
}

/// Parses `-0600`, `+05:30`, `-6` style suffixes into seconds east of UTC.
fn parse_offset_suffix(suffix: &str) -> Option<i32> {
    let (sign, digits) = match suffix.as_bytes().first()? {
        b'+' => (1, &suffix[1..]),
        b'-' => (-1, &suffix[1..]),
        _ => return None,
    };
    let compact: String = digits.chars().filter(|c| *c != ':').collect();
    if compact.is_empty() || compact.len() > 4 || !compact.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match compact.len() {
        1 | 2 => (compact.parse::<i32>().ok()?, 0),
        3 => (compact[..1].parse::<i32>().ok()?, compact[1..].parse::<i32>().ok()?),
        _ => (compact[..2].parse::<i32>().ok()?, compact[2..].parse::<i32>().ok()?),
    };
    if hours > 18 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

impl PartialEq for RecordedTimeZone {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for RecordedTimeZone {}

impl Hash for RecordedTimeZone {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl fmt::Display for RecordedTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

impl Serialize for RecordedTimeZone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.identifier)
    }
}

impl<'de> Deserialize<'de> for RecordedTimeZone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
