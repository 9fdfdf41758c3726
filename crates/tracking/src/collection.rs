//! The operations shared by every tracked-items collection result.

use crate::item::{TrackedItem, TrackedItemAnswer};
use crate::logging::{LoggingCollectionResult, TrackedLoggingResult};
use crate::medication_result::MedicationTrackingResult;
use crate::TrackingResult;
use answers::AnswerResult;
use serde_json::Value;

/// A result handed to [`TrackedItemsCollection::update_details`] after the participant
/// finished a step.
#[derive(Clone, Debug)]
pub enum SubmittedResult {
    /// One item logged or edited on its own.
    LoggedItem(TrackedLoggingResult),
    /// A full replacement for a logging collection.
    LoggingCollection(LoggingCollectionResult),
    /// A full replacement for a medication collection.
    Medications(MedicationTrackingResult),
    /// A plain answer, such as the reminder offsets chosen for medications.
    Answer(AnswerResult),
}

impl SubmittedResult {
    pub fn identifier(&self) -> &str {
        match self {
            Self::LoggedItem(result) => &result.identifier,
            Self::LoggingCollection(result) => &result.identifier,
            Self::Medications(result) => &result.identifier,
            Self::Answer(result) => &result.identifier,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoggedItem(_) => "logged item",
            Self::LoggingCollection(_) => "logging collection",
            Self::Medications(_) => "medication collection",
            Self::Answer(_) => "answer",
        }
    }
}

/// A collection of answers, one per selected tracked item.
///
/// The collection is rebuilt on every editing pass: the selection is reconciled first, then
/// submitted details are merged in. Between sessions the collection is persisted as client
/// data and reloaded for the next day.
pub trait TrackedItemsCollection {
    fn identifier(&self) -> &str;

    /// The answers in selection order.
    fn selected_answers(&self) -> Vec<&dyn TrackedItemAnswer>;

    /// Replaces the answers so they match `selected_identifiers` exactly, in that order.
    ///
    /// Answers that are still selected keep their data. Newly selected items start empty,
    /// taking their display fields from `catalog`. Deselected answers are discarded.
    fn update_selected(&mut self, selected_identifiers: &[String], catalog: &[TrackedItem]);

    /// Merges a submitted result into the collection.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TrackingError::InvalidSelectionState`] if the collection cannot
    /// accept `submitted`.
    fn update_details(&mut self, submitted: SubmittedResult) -> TrackingResult<()>;

    /// The JSON to persist for the next session, if this collection persists anything.
    fn client_data(&self) -> TrackingResult<Option<Value>>;

    /// Restores the selection from a previous session's client data.
    fn update_selected_from_client_data(
        &mut self,
        client_data: &Value,
        catalog: &[TrackedItem],
    ) -> TrackingResult<()>;

    /// The full result as JSON.
    fn to_json(&self) -> TrackingResult<Value>;

    fn selected_identifiers(&self) -> Vec<&str> {
        self.selected_answers()
            .into_iter()
            .map(|answer| answer.identifier())
            .collect()
    }

    /// Whether every selected answer is complete.
    fn is_complete(&self) -> bool {
        self.selected_answers()
            .iter()
            .all(|answer| answer.has_required_values())
    }
}
