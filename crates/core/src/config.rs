//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Nothing below the CLI reads the environment or the host time
//! zone while an operation is running, so results never depend on when the process looked.

use crate::constants::DEFAULT_DATE_LOCALE;
use crate::{CoreError, CoreResult};
use datatrack_types::RecordedTimeZone;
use tracking::TRACKED_ITEMS_KEY;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct TrackingConfig {
    time_zone: RecordedTimeZone,
    date_locale: String,
    client_data_key: String,
}

impl TrackingConfig {
    /// Create a new `TrackingConfig`.
    pub fn new(
        time_zone: RecordedTimeZone,
        date_locale: String,
        client_data_key: String,
    ) -> CoreResult<Self> {
        if date_locale.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "date_locale cannot be empty".into(),
            ));
        }
        if client_data_key.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "client_data_key cannot be empty".into(),
            ));
        }

        Ok(Self {
            time_zone,
            date_locale,
            client_data_key,
        })
    }

    /// Resolve configuration from raw environment values.
    ///
    /// Missing or blank values take their defaults: the host zone (UTC when it has no IANA
    /// name), [`DEFAULT_DATE_LOCALE`] and [`TRACKED_ITEMS_KEY`].
    pub fn from_env_values(
        time_zone: Option<String>,
        date_locale: Option<String>,
        client_data_key: Option<String>,
    ) -> CoreResult<Self> {
        let time_zone = match non_blank(time_zone) {
            Some(raw) => RecordedTimeZone::parse(&raw).map_err(|e| {
                CoreError::InvalidConfig(format!("time zone '{raw}' is not recognised: {e}"))
            })?,
            None => RecordedTimeZone::system(),
        };

        Self::new(
            time_zone,
            non_blank(date_locale).unwrap_or_else(|| DEFAULT_DATE_LOCALE.to_string()),
            non_blank(client_data_key).unwrap_or_else(|| TRACKED_ITEMS_KEY.to_string()),
        )
    }

    /// The zone treated as the device's current zone.
    pub fn time_zone(&self) -> &RecordedTimeZone {
        &self.time_zone
    }

    pub fn date_locale(&self) -> &str {
        &self.date_locale
    }

    pub fn client_data_key(&self) -> &str {
        &self.client_data_key
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
