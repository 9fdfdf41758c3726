use crate::{TypesError, TypesResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// A day of the week, numbered the way stored schedules number them (Sunday = 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

/// An ordered set of weekdays (iterates Sunday through Saturday).
pub type WeekdaySet = BTreeSet<Weekday>;

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// The full set of days.
    pub fn all() -> WeekdaySet {
        Self::ALL.into_iter().collect()
    }

    /// # Errors
    ///
    /// Returns [`TypesError::InvalidWeekday`] for numbers outside `1..=7`.
    pub fn from_number(number: i64) -> TypesResult<Self> {
        usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| TypesError::InvalidWeekday(number.to_string()))
    }

    /// Parses an English day name, either in full or as a three-letter abbreviation.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidWeekday`] if the name is not recognised.
    pub fn from_name(name: &str) -> TypesResult<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| {
                let full = day.name().to_ascii_lowercase();
                lowered == full || (lowered.len() == 3 && full.starts_with(&lowered))
            })
            .ok_or_else(|| TypesError::InvalidWeekday(name.to_string()))
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => Weekday::Sunday,
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Weekday {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// Stored schedules carry either the day number or the day name.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrName {
    Number(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrName::deserialize(deserializer)? {
            NumberOrName::Number(n) => Self::from_number(n),
            NumberOrName::Name(name) => Self::from_name(&name),
        }
        .map_err(serde::de::Error::custom)
    }
}
