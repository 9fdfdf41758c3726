//! The medication collection result: selected medications, their dosages and the reminder
//! offsets chosen for them.

use crate::client_data::latest_report;
use crate::collection::{SubmittedResult, TrackedItemsCollection};
use crate::item::{TrackedItem, TrackedItemAnswer};
use crate::logged_date;
use crate::medication::{MedicationAnswer, MedicationTimestamp};
use crate::medication_wire::{encode_answers, MedicationData, CURRENT_REVISION};
use crate::{parse_wire, TrackingError, TrackingResult};
use answers::DynamicValue;
use chrono::{DateTime, FixedOffset, NaiveDate};
use datatrack_types::RecordedTimeZone;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error};

/// Identifier of the answer holding reminder offsets, in minutes before each dose.
pub const MEDICATION_REMINDERS_IDENTIFIER: &str = "medicationReminders";

const RESULT_TYPE: &str = "medication";
const DEFAULT_IDENTIFIER: &str = "logging";

/// The medications a participant takes, as edited over one session.
#[derive(Clone, Debug, PartialEq)]
pub struct MedicationTrackingResult {
    pub identifier: String,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub medications: Vec<MedicationAnswer>,
    pub reminders: Option<Vec<u32>>,
    /// The zone "today" is evaluated in.
    time_zone: RecordedTimeZone,
}

impl MedicationTrackingResult {
    pub fn new(identifier: impl Into<String>, time_zone: RecordedTimeZone) -> Self {
        let now = logged_date::now_in(&time_zone);
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
            medications: Vec::new(),
            reminders: None,
            time_zone,
        }
    }

    pub fn time_zone(&self) -> &RecordedTimeZone {
        &self.time_zone
    }

    /// Reads a stored result in either wire revision.
    ///
    /// The result's zone is taken from `timeZone` when present, else from the offset of
    /// `startDate`, else `current`. Missing dates default to now.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Translation`] naming the failing path.
    pub fn from_json(json: &Value, current: &RecordedTimeZone) -> TrackingResult<Self> {
        let header: HeaderWire = parse_wire(json, "Medication result", "")?;
        let start_date = logged_date::parse_optional(header.start_date.as_deref(), "startDate")?;
        let end_date = logged_date::parse_optional(header.end_date.as_deref(), "endDate")?;
        let time_zone =
            logged_date::recorded_zone(header.time_zone.as_deref(), start_date.as_ref(), current);
        let start_date = start_date.unwrap_or_else(|| logged_date::now_in(&time_zone));
        let data = MedicationData::decode(json, current)?;

        Ok(Self {
            identifier: header
                .identifier
                .unwrap_or_else(|| DEFAULT_IDENTIFIER.to_string()),
            start_date,
            end_date: end_date.unwrap_or(start_date),
            medications: data.medications,
            reminders: data.reminders,
            time_zone,
        })
    }

    /// Serializes the result in the current revision.
    pub fn to_json(&self) -> TrackingResult<Value> {
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        map.insert("type".into(), Value::String(RESULT_TYPE.to_string()));
        map.insert(
            "startDate".into(),
            Value::String(logged_date::format(&self.start_date)),
        );
        map.insert(
            "endDate".into(),
            Value::String(logged_date::format(&self.end_date)),
        );
        map.insert("revision".into(), json!(CURRENT_REVISION));
        map.insert("items".into(), encode_answers(&self.medications)?);
        if let Some(reminders) = &self.reminders {
            map.insert("reminders".into(), json!(reminders));
        }
        map.insert(
            "timeZone".into(),
            Value::String(self.time_zone.identifier().to_string()),
        );
        Ok(Value::Object(map))
    }

    /// Marks a dose as taken, or clears it when `logged_date` is `None`.
    ///
    /// `timing_identifier` is the uuid of the timestamp being logged. When no timestamp has
    /// that uuid the dose is logged against the medication's anytime dosage. Clearing an
    /// anytime dose removes its timestamp; clearing a scheduled one keeps the slot.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::InvalidSelectionState`] if the medication is not selected, or
    /// has neither a matching timestamp nor an anytime dosage.
    pub fn update_logging(
        &mut self,
        item_identifier: &str,
        timing_identifier: &str,
        logged_date: Option<DateTime<FixedOffset>>,
    ) -> TrackingResult<()> {
        let zone = self.time_zone.clone();
        let Some(medication) = self
            .medications
            .iter_mut()
            .find(|medication| medication.identifier == item_identifier)
        else {
            error!(item = item_identifier, "logged dose for a medication that is not selected");
            return Err(TrackingError::InvalidSelectionState(format!(
                "medication '{item_identifier}' is not selected"
            )));
        };

        let dosages = medication.dosage_items.as_deref_mut().unwrap_or_default();
        let located = dosages
            .iter()
            .enumerate()
            .find_map(|(d, dosage)| {
                dosage
                    .timestamps
                    .as_ref()?
                    .iter()
                    .position(|timestamp| timestamp.uuid == timing_identifier)
                    .map(|t| (d, Some(t)))
            })
            .or_else(|| {
                dosages
                    .iter()
                    .position(|dosage| dosage.is_anytime == Some(true))
                    .map(|d| (d, None))
            });
        let Some((dose_index, timestamp_index)) = located else {
            error!(
                item = item_identifier,
                timing = timing_identifier,
                "no dose to attach the logged date to"
            );
            return Err(TrackingError::InvalidSelectionState(format!(
                "medication '{item_identifier}' has no timestamp '{timing_identifier}' and no anytime dosage"
            )));
        };

        let dosage = &mut dosages[dose_index];
        let is_anytime = dosage.is_anytime == Some(true);
        match (timestamp_index, logged_date) {
            (Some(index), None) if is_anytime => {
                if let Some(timestamps) = dosage.timestamps.as_mut() {
                    timestamps.remove(index);
                }
            }
            (Some(index), date) => {
                if let Some(timestamp) = dosage
                    .timestamps
                    .as_mut()
                    .and_then(|timestamps| timestamps.get_mut(index))
                {
                    timestamp.logged_date = date;
                    if date.is_some() {
                        timestamp.time_zone = zone;
                    }
                }
            }
            (None, Some(date)) => {
                let mut timestamp = MedicationTimestamp::logged(date, zone);
                timestamp.uuid = timing_identifier.to_string();
                dosage.timestamps.get_or_insert_with(Vec::new).push(timestamp);
            }
            (None, None) => {
                debug!(item = item_identifier, "nothing to clear on anytime dosage");
            }
        }
        Ok(())
    }

    fn update_reminders(&mut self, value: Option<&DynamicValue>) {
        let offset = |value: &DynamicValue| match value {
            DynamicValue::Integer(minutes) => u32::try_from(*minutes).ok(),
            _ => None,
        };
        self.reminders = Some(match value {
            Some(DynamicValue::List(items)) => items.iter().filter_map(offset).collect(),
            Some(single) => offset(single).into_iter().collect(),
            None => Vec::new(),
        });
    }

    /// Applies the catalog's continuous-injection flag where the answer has none.
    fn fill_from_catalog(medication: &mut MedicationAnswer, catalog: &[TrackedItem]) {
        if medication.is_continuous_injection.is_some() {
            return;
        }
        medication.is_continuous_injection = catalog
            .iter()
            .find(|item| item.identifier == medication.identifier.as_str())
            .and_then(|item| item.is_continuous_injection);
    }
}

impl TrackedItemsCollection for MedicationTrackingResult {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn selected_answers(&self) -> Vec<&dyn TrackedItemAnswer> {
        self.medications
            .iter()
            .map(|medication| medication as &dyn TrackedItemAnswer)
            .collect()
    }

    fn update_selected(&mut self, selected_identifiers: &[String], catalog: &[TrackedItem]) {
        let medications: Vec<MedicationAnswer> = selected_identifiers
            .iter()
            .map(|identifier| {
                let mut medication = self
                    .medications
                    .iter()
                    .find(|medication| &medication.identifier == identifier)
                    .cloned()
                    .unwrap_or_else(|| MedicationAnswer::new(identifier.as_str()));
                Self::fill_from_catalog(&mut medication, catalog);
                medication
            })
            .collect();
        self.medications = medications;
    }

    fn update_details(&mut self, submitted: SubmittedResult) -> TrackingResult<()> {
        match submitted {
            SubmittedResult::Medications(result) => {
                self.medications = result.medications;
                Ok(())
            }
            SubmittedResult::LoggedItem(logged) => {
                let (Some(item), Some(timing)) = (&logged.item_identifier, &logged.timing_identifier)
                else {
                    error!(identifier = %logged.identifier, "logged item without item and timing identifiers");
                    return Err(TrackingError::InvalidSelectionState(format!(
                        "logged item '{}' names no medication dose",
                        logged.identifier
                    )));
                };
                self.update_logging(item, timing, logged.logged_date)
            }
            SubmittedResult::Answer(answer) if answer.identifier == MEDICATION_REMINDERS_IDENTIFIER => {
                self.update_reminders(answer.value.as_ref());
                Ok(())
            }
            other => {
                error!(
                    collection = %self.identifier,
                    submitted = %other.identifier(),
                    "medication collection cannot merge a {}",
                    other.kind()
                );
                Err(TrackingError::InvalidSelectionState(format!(
                    "medication collection '{}' cannot merge a {} result ('{}')",
                    self.identifier,
                    other.kind(),
                    other.identifier()
                )))
            }
        }
    }

    /// The start date, revision, answers and reminders.
    fn client_data(&self) -> TrackingResult<Option<Value>> {
        let mut map = Map::new();
        map.insert(
            "startDate".into(),
            Value::String(logged_date::format(&self.start_date)),
        );
        map.insert("revision".into(), json!(CURRENT_REVISION));
        map.insert("items".into(), encode_answers(&self.medications)?);
        if let Some(reminders) = &self.reminders {
            map.insert("reminders".into(), json!(reminders));
        }
        Ok(Some(Value::Object(map)))
    }

    /// Restores the previous session's medications for a new session starting at
    /// `start_date`.
    ///
    /// Doses logged on the same calendar day (each in the zone it was logged in) are kept.
    /// Older logs on a scheduled slot are cleared but the slot stays; older unscheduled logs
    /// are dropped.
    fn update_selected_from_client_data(
        &mut self,
        client_data: &Value,
        catalog: &[TrackedItem],
    ) -> TrackingResult<()> {
        let report = latest_report(client_data)?;
        let data = MedicationData::decode(report, &self.time_zone)?;
        let today = self.time_zone.calendar_day(&self.start_date)?;
        debug!(%today, medications = data.medications.len(), "reconciling stored medications");

        let mut medications = data.medications;
        for medication in &mut medications {
            for dosage in medication.dosage_items.iter_mut().flatten() {
                let Some(timestamps) = dosage.timestamps.take() else {
                    continue;
                };
                let kept = timestamps
                    .into_iter()
                    .map(|timestamp| carry_over(timestamp, today, &self.time_zone))
                    .collect::<TrackingResult<Vec<_>>>()?
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>();
                dosage.timestamps = (!kept.is_empty()).then_some(kept);
            }
            Self::fill_from_catalog(medication, catalog);
        }

        self.reminders = data.reminders;
        self.medications = medications;
        Ok(())
    }

    fn to_json(&self) -> TrackingResult<Value> {
        MedicationTrackingResult::to_json(self)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeaderWire {
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    time_zone: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// What survives of a stored timestamp on `today`.
///
/// A stale scheduled slot comes back unlogged with quantity 1, as a freshly scheduled slot would.
fn carry_over(
    timestamp: MedicationTimestamp,
    today: NaiveDate,
    zone: &RecordedTimeZone,
) -> TrackingResult<Option<MedicationTimestamp>> {
    let Some(logged) = &timestamp.logged_date else {
        return Ok(Some(timestamp));
    };
    if timestamp.time_zone.calendar_day(logged)? == today {
        return Ok(Some(timestamp));
    }
    Ok(timestamp
        .time_of_day
        .map(|time| MedicationTimestamp::scheduled(time, zone.clone())))
}
