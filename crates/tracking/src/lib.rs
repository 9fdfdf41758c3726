//! Tracked-item results for medication, symptom and trigger logging.
//!
//! This crate provides the **domain model** and the **wire translation** for the results a
//! participant builds up while selecting and logging tracked items:
//! - a catalog of [`TrackedItem`]s to select from
//! - medication answers with dosages, schedules and logged timestamps
//! - logging results for symptoms and triggers
//! - collection results that reconcile a new selection, merge submitted details and reload
//!   the previous session's client data
//!
//! Medication collections are stored in two historical shapes. Reading accepts both (see
//! [`WireFormat`]); writing always produces the current revision.
//!
//! Nothing here reads the clock's time zone or the environment. The zone treated as "current"
//! is passed in by the caller.

pub mod client_data;
pub mod collection;
pub mod item;
pub mod logging;
pub mod medication;
pub mod medication_result;

mod logged_date;
mod medication_wire;

// Re-export public domain-level types
pub use collection::{SubmittedResult, TrackedItemsCollection};
pub use item::{TrackedCatalog, TrackedItem, TrackedItemAnswer, TrackedSection};
pub use logging::{
    LoggingCollectionResult, LoggingKind, MedicationTiming, SymptomDuration, SymptomSeverity,
    TrackedLoggingResult,
};
pub use medication::{Dosage, MedicationAnswer, MedicationTimestamp, ScheduleItem};
pub use medication_result::{MedicationTrackingResult, MEDICATION_REMINDERS_IDENTIFIER};
pub use medication_wire::{WireFormat, CURRENT_REVISION};

use answers::AnswerError;
use datatrack_types::TypesError;

/// Identifier of the collection result whose JSON is persisted as client data, and the key
/// under which it may be nested inside a larger report.
pub const TRACKED_ITEMS_KEY: &str = "trackedItems";

/// Errors returned by the `tracking` crate.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid client data: {0}")]
    InvalidClientData(String),

    /// A collection was handed a result it cannot merge. This indicates a bug at the call
    /// site rather than bad user input.
    #[error("invalid selection state: {0}")]
    InvalidSelectionState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Types(#[from] TypesError),
}

/// Type alias for Results that can fail with a [`TrackingError`].
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Deserializes `value` into a wire struct, reporting the failing path on mismatch.
///
/// `what` names the document in the error message and `prefix` is prepended to the path when
/// `value` is itself nested inside a larger document.
pub(crate) fn parse_wire<T>(value: &serde_json::Value, what: &str, prefix: &str) -> TrackingResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = match (prefix.is_empty(), path.is_empty() || path == ".") {
            (true, true) => "<root>".to_string(),
            (true, false) => path,
            (false, true) => prefix.to_string(),
            (false, false) if path.starts_with('[') => format!("{prefix}{path}"),
            (false, false) => format!("{prefix}.{path}"),
        };
        TrackingError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}
