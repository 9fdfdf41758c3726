//! The operations the CLI (or any host) drives: answer encoding, reloading a collection
//! from stored client data and finalizing edited medications.

use crate::{CoreResult, TrackingConfig};
use answers::{AnswerCodec, AnswerType, DynamicValue};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracking::{
    LoggingCollectionResult, LoggingKind, MedicationTrackingResult, TrackedItem,
    TrackedItemsCollection,
};

/// Answer and tracked-item operations bound to one [`TrackingConfig`].
#[derive(Clone, Debug)]
pub struct TrackingService {
    config: TrackingConfig,
    codec: AnswerCodec,
}

impl TrackingService {
    pub fn new(config: TrackingConfig) -> Self {
        let codec = AnswerCodec::new(config.time_zone().clone());
        Self { config, codec }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn codec(&self) -> &AnswerCodec {
        &self.codec
    }

    /// Encodes `value` as stored JSON for `answer_type`.
    ///
    /// Types without a locale take the configured one.
    pub fn encode_answer(
        &self,
        answer_type: &AnswerType,
        value: Option<&DynamicValue>,
    ) -> CoreResult<Value> {
        let answer_type = self.with_default_locale(answer_type);
        Ok(self.codec.encode(&answer_type, value)?)
    }

    /// Decodes stored JSON for `answer_type`. `null` decodes to `None`.
    pub fn decode_answer(
        &self,
        answer_type: &AnswerType,
        json: &Value,
    ) -> CoreResult<Option<DynamicValue>> {
        let answer_type = self.with_default_locale(answer_type);
        Ok(self.codec.decode(&answer_type, json)?)
    }

    /// An empty medication collection started now in the configured zone.
    pub fn medication_result(&self) -> MedicationTrackingResult {
        MedicationTrackingResult::new(self.config.client_data_key(), self.config.time_zone().clone())
    }

    /// An empty logging collection started now in the configured zone.
    pub fn logging_collection(&self, kind: LoggingKind) -> LoggingCollectionResult {
        LoggingCollectionResult::new(
            self.config.client_data_key(),
            kind,
            self.config.time_zone().clone(),
        )
        .with_client_data_key(self.config.client_data_key())
    }

    /// Starts a medication collection at `start_date` (default now) and reloads the
    /// previous session from `client_data`.
    pub fn reconcile_medications(
        &self,
        client_data: &Value,
        start_date: Option<DateTime<FixedOffset>>,
        catalog: &[TrackedItem],
    ) -> CoreResult<MedicationTrackingResult> {
        let mut result = self.medication_result();
        if let Some(start_date) = start_date {
            result.start_date = start_date;
            result.end_date = start_date;
        }
        result.update_selected_from_client_data(client_data, catalog)?;
        tracing::debug!(
            medications = result.medications.len(),
            start_date = %result.start_date,
            "reconciled medication collection"
        );
        Ok(result)
    }

    /// Starts a logging collection at `start_date` (default now) and reloads the previous
    /// session's selection from `client_data`.
    pub fn reconcile_logging(
        &self,
        client_data: &Value,
        kind: LoggingKind,
        start_date: Option<DateTime<FixedOffset>>,
        catalog: &[TrackedItem],
    ) -> CoreResult<LoggingCollectionResult> {
        let mut result = self.logging_collection(kind);
        if let Some(start_date) = start_date {
            result.start_date = start_date;
            result.end_date = start_date;
        }
        result.update_selected_from_client_data(client_data, catalog)?;
        tracing::debug!(
            items = result.items.len(),
            kind = kind.collection_type(),
            "reconciled logging collection"
        );
        Ok(result)
    }

    /// Reads a stored medication collection in either revision, finalizes every answer and
    /// returns it in the current revision.
    pub fn finalize_medications(&self, json: &Value) -> CoreResult<Value> {
        let mut result = MedicationTrackingResult::from_json(json, self.config.time_zone())?;
        for medication in &mut result.medications {
            medication.finalize_editing();
        }
        Ok(result.to_json()?)
    }

    fn with_default_locale(&self, answer_type: &AnswerType) -> AnswerType {
        match answer_type.declared_date_locale() {
            Some(_) => answer_type.clone(),
            None => answer_type
                .clone()
                .with_date_locale(self.config.date_locale()),
        }
    }
}
