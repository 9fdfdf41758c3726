//! Validated primitives shared by the answer codec and the tracked-item model.
//!
//! Each type here guarantees its invariant once constructed, so the wire layers can
//! translate raw strings into these types at the boundary and never re-check them:
//! - [`NonEmptyText`]: trimmed, non-empty text (catalog identifiers).
//! - [`TimeOfDay`]: a strict 24-hour `HH:mm` clock time.
//! - [`Weekday`]: a day of the week numbered Sunday = 1 through Saturday = 7.
//! - [`RecordedTimeZone`]: the zone a value was recorded in, either an IANA zone or a
//!   fixed offset such as `GMT-0600`.

mod time_of_day;
mod time_zone;
mod weekday;

pub use time_of_day::TimeOfDay;
pub use time_zone::RecordedTimeZone;
pub use weekday::{Weekday, WeekdaySet};

/// Errors that can occur when creating validated primitive types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    #[error("invalid time of day '{0}' (expected HH:mm)")]
    InvalidTimeOfDay(String),

    #[error("invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),

    #[error("date out of supported range: {0}")]
    OutOfRange(String),
}

/// Type alias for Results that can fail with a [`TypesError`].
pub type TypesResult<T> = Result<T, TypesError>;

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> TypesResult<Self> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NonEmptyText {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NonEmptyText {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}
