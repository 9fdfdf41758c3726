//! Constants used throughout the datatrack core crate.
//!
//! Environment variable names and the defaults applied when they are unset.

/// Environment variable holding the device time zone (IANA id or `GMT-0600` style offset).
pub const TIME_ZONE_ENV: &str = "DATATRACK_TIME_ZONE";

/// Environment variable holding the default locale for formatted dates.
pub const DATE_LOCALE_ENV: &str = "DATATRACK_DATE_LOCALE";

/// Environment variable holding the client-data key of the tracked-items collection.
pub const CLIENT_DATA_KEY_ENV: &str = "DATATRACK_CLIENT_DATA_KEY";

/// Default locale for formatted dates. Fixed so stored dates never depend on the device.
pub const DEFAULT_DATE_LOCALE: &str = "en_US_POSIX";
