use crate::{TypesError, TypesResult};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A clock time in strict 24-hour `HH:mm` form.
///
/// Schedules store the time a dose is due as a wall-clock string rather than an instant, so
/// "08:00" means eight in the morning wherever the participant happens to be. Only the exact
/// two-digit form is accepted; `8:00`, `08:00:00` and labels such as `morning` are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Creates a time of day from components.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidTimeOfDay`] if `hour > 23` or `minute > 59`.
    pub fn new(hour: u8, minute: u8) -> TypesResult<Self> {
        if hour > 23 || minute > 59 {
            return Err(TypesError::InvalidTimeOfDay(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    /// Parses a strict `HH:mm` string.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidTimeOfDay`] if `raw` is not exactly five characters of the
    /// form `HH:mm` with an hour in `00..=23` and a minute in `00..=59`.
    pub fn parse(raw: &str) -> TypesResult<Self> {
        let bytes = raw.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
        if !well_formed {
            return Err(TypesError::InvalidTimeOfDay(raw.to_string()));
        }

        let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
        Self::new(hour, minute).map_err(|_| TypesError::InvalidTimeOfDay(raw.to_string()))
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        // Components are range-checked at construction.
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
