//! Wire models for stored medication answers.
//!
//! Two shapes exist:
//! - V1 (revision absent or `1`): one dosage label per medication, a shared list of
//!   `{timeOfDay, daysOfWeek}` schedule items and a flat list of timestamps.
//! - V2 (revision `2`): a list of dosages, each with its own weekdays and timestamps.
//!
//! The shape is resolved once per document into a [`WireFormat`]. V1 answers are rebuilt
//! into the current model by [`v1_to_domain`]; nothing downstream looks at the revision.

use crate::logged_date;
use crate::medication::{Dosage, MedicationAnswer, MedicationTimestamp};
use crate::{parse_wire, TrackingError, TrackingResult};
use datatrack_types::{RecordedTimeZone, TimeOfDay, Weekday, WeekdaySet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

/// The revision written by this crate.
pub const CURRENT_REVISION: i64 = 2;

/// The stored shape of a medication collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    V1,
    V2,
}

impl WireFormat {
    pub fn from_revision(revision: Option<i64>) -> Self {
        match revision {
            Some(revision) if revision > 1 => Self::V2,
            _ => Self::V1,
        }
    }

    pub fn revision(self) -> i64 {
        match self {
            Self::V1 => 1,
            Self::V2 => CURRENT_REVISION,
        }
    }
}

/// The medication part of a stored collection: its answers and reminder offsets.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MedicationData {
    pub reminders: Option<Vec<u32>>,
    pub medications: Vec<MedicationAnswer>,
}

impl MedicationData {
    /// Reads `items`, `reminders` and `revision` from a stored collection object.
    pub fn decode(json: &Value, current: &RecordedTimeZone) -> TrackingResult<Self> {
        let wire: MedicationDataWire = parse_wire(json, "Medication data", "")?;
        let format = WireFormat::from_revision(wire.revision);
        debug!(?format, "decoding medication answers");
        let medications = decode_answers(&wire.items, format, current, "items")?;
        Ok(Self {
            reminders: wire.reminders,
            medications,
        })
    }
}

/// Decodes a JSON array of medication answers stored in `format`.
pub(crate) fn decode_answers(
    items: &Value,
    format: WireFormat,
    current: &RecordedTimeZone,
    path: &str,
) -> TrackingResult<Vec<MedicationAnswer>> {
    match format {
        WireFormat::V2 => {
            let wires: Vec<MedicationAnswerWire> = parse_wire(items, "Medication answer", path)?;
            wires
                .into_iter()
                .enumerate()
                .map(|(i, wire)| answer_wire_to_domain(wire, current, &format!("{path}[{i}]")))
                .collect()
        }
        WireFormat::V1 => {
            let wires: Vec<MedicationAnswerV1Wire> = parse_wire(items, "Medication answer", path)?;
            wires
                .into_iter()
                .enumerate()
                .map(|(i, wire)| v1_to_domain(wire, current, &format!("{path}[{i}]")))
                .collect()
        }
    }
}

/// Decodes a single current-revision answer.
pub(crate) fn decode_answer(
    json: &Value,
    current: &RecordedTimeZone,
) -> TrackingResult<MedicationAnswer> {
    let wire: MedicationAnswerWire = parse_wire(json, "Medication answer", "")?;
    answer_wire_to_domain(wire, current, "$")
}

/// Encodes answers in the current revision.
pub(crate) fn encode_answers(medications: &[MedicationAnswer]) -> TrackingResult<Value> {
    let wires = medications
        .iter()
        .map(answer_domain_to_wire)
        .collect::<TrackingResult<Vec<_>>>()?;
    serde_json::to_value(wires)
        .map_err(|e| TrackingError::Translation(format!("Failed to serialize medications: {e}")))
}

pub(crate) fn encode_answer(answer: &MedicationAnswer) -> TrackingResult<Value> {
    serde_json::to_value(answer_domain_to_wire(answer)?)
        .map_err(|e| TrackingError::Translation(format!("Failed to serialize medication: {e}")))
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct MedicationDataWire {
    #[serde(default)]
    revision: Option<i64>,
    #[serde(default)]
    reminders: Option<Vec<u32>>,
    items: Value,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimestampWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logged_date: Option<String>,
    #[serde(default = "default_quantity")]
    quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct DosageWire {
    dosage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days_of_week: Option<Vec<Weekday>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamps: Option<Vec<TimestampWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_anytime: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct MedicationAnswerWire {
    identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dosage_items: Option<Vec<DosageWire>>,
    #[serde(rename = "injection", default, skip_serializing_if = "Option::is_none")]
    is_continuous_injection: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleItemV1Wire {
    #[serde(default)]
    time_of_day: Option<String>,
    #[serde(default)]
    days_of_week: Option<Vec<Weekday>>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MedicationAnswerV1Wire {
    identifier: String,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default)]
    schedule_items: Option<Vec<ScheduleItemV1Wire>>,
    #[serde(rename = "injection", default)]
    is_continuous_injection: Option<bool>,
    #[serde(default)]
    timestamps: Option<Vec<TimestampWire>>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Parses a stored time of day, discarding (with a warning) anything that is not `HH:mm`.
fn lenient_time_of_day(raw: Option<&str>, path: &str) -> Option<TimeOfDay> {
    let raw = raw?;
    match TimeOfDay::parse(raw) {
        Ok(time) => Some(time),
        Err(e) => {
            warn!("discarding time of day at {path}: {e}");
            None
        }
    }
}

fn timestamp_wire_to_domain(
    wire: TimestampWire,
    current: &RecordedTimeZone,
    path: &str,
) -> TrackingResult<MedicationTimestamp> {
    let time_of_day = lenient_time_of_day(wire.time_of_day.as_deref(), path);
    let logged_date =
        logged_date::parse_optional(wire.logged_date.as_deref(), &format!("{path}.loggedDate"))?;
    if time_of_day.is_none() && logged_date.is_none() {
        return Err(TrackingError::Translation(format!(
            "Timestamp at {path} has neither a valid timeOfDay nor a loggedDate"
        )));
    }
    let time_zone =
        logged_date::recorded_zone(wire.time_zone.as_deref(), logged_date.as_ref(), current);
    Ok(MedicationTimestamp {
        uuid: Uuid::new_v4().to_string(),
        time_of_day,
        logged_date,
        quantity: wire.quantity,
        time_zone,
    })
}

fn timestamp_domain_to_wire(timestamp: &MedicationTimestamp) -> TrackingResult<TimestampWire> {
    let (logged_date, time_zone) = match &timestamp.logged_date {
        Some(date) => (
            Some(logged_date::format_in_zone(date, &timestamp.time_zone)?),
            Some(timestamp.time_zone.identifier().to_string()),
        ),
        None => (None, None),
    };
    Ok(TimestampWire {
        time_of_day: timestamp.time_of_day.map(|time| time.to_string()),
        logged_date,
        quantity: timestamp.quantity,
        time_zone,
    })
}

fn timestamps_wire_to_domain(
    wires: Option<Vec<TimestampWire>>,
    current: &RecordedTimeZone,
    path: &str,
) -> TrackingResult<Option<Vec<MedicationTimestamp>>> {
    wires
        .map(|wires| {
            wires
                .into_iter()
                .enumerate()
                .map(|(i, wire)| timestamp_wire_to_domain(wire, current, &format!("{path}[{i}]")))
                .collect()
        })
        .transpose()
}

fn dosage_wire_to_domain(
    wire: DosageWire,
    current: &RecordedTimeZone,
    path: &str,
) -> TrackingResult<Dosage> {
    let timestamps =
        timestamps_wire_to_domain(wire.timestamps, current, &format!("{path}.timestamps"))?;
    let mut dosage = Dosage {
        label: Some(wire.dosage),
        days_of_week: None,
        timestamps,
        is_anytime: None,
    };
    // Weekdays only mean something for a dosage with at least one scheduled time.
    let scheduled = wire.days_of_week.is_some() && dosage.has_scheduled_time();
    let is_anytime = wire.is_anytime.unwrap_or(!scheduled);
    if !is_anytime {
        dosage.days_of_week = wire.days_of_week.map(|days| days.into_iter().collect());
    }
    dosage.is_anytime = Some(is_anytime);
    Ok(dosage)
}

fn dosage_domain_to_wire(dosage: &Dosage) -> TrackingResult<DosageWire> {
    let timestamps = dosage
        .timestamps
        .as_ref()
        .map(|timestamps| {
            timestamps
                .iter()
                .map(timestamp_domain_to_wire)
                .collect::<TrackingResult<Vec<_>>>()
        })
        .transpose()?;
    Ok(DosageWire {
        dosage: dosage.label.clone().unwrap_or_default(),
        days_of_week: dosage
            .days_of_week
            .as_ref()
            .map(|days| days.iter().copied().collect()),
        timestamps,
        is_anytime: dosage.is_anytime,
    })
}

fn answer_wire_to_domain(
    wire: MedicationAnswerWire,
    current: &RecordedTimeZone,
    path: &str,
) -> TrackingResult<MedicationAnswer> {
    let dosage_items = wire
        .dosage_items
        .map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    dosage_wire_to_domain(item, current, &format!("{path}.dosageItems[{i}]"))
                })
                .collect::<TrackingResult<Vec<_>>>()
        })
        .transpose()?;
    Ok(MedicationAnswer {
        identifier: wire.identifier,
        dosage_items,
        is_continuous_injection: wire.is_continuous_injection,
    })
}

fn answer_domain_to_wire(answer: &MedicationAnswer) -> TrackingResult<MedicationAnswerWire> {
    let dosage_items = answer
        .dosage_items
        .as_ref()
        .map(|items| {
            items
                .iter()
                .map(dosage_domain_to_wire)
                .collect::<TrackingResult<Vec<_>>>()
        })
        .transpose()?;
    Ok(MedicationAnswerWire {
        identifier: answer.identifier.clone(),
        dosage_items,
        is_continuous_injection: answer.is_continuous_injection,
    })
}

/// Rebuilds a V1 answer as the current model.
///
/// Each schedule item becomes a dosage with the shared label:
/// - an item without a time of day is an anytime dosage holding every unscheduled timestamp;
/// - an item with a time of day takes the first timestamp logged for that time, or an
///   unlogged slot at that time if none was logged.
///
/// Without a label the dosages are left undecided and dropped by
/// [`MedicationAnswer::finalize_editing`], which runs last and merges the per-time dosages
/// back together by weekdays.
fn v1_to_domain(
    wire: MedicationAnswerV1Wire,
    current: &RecordedTimeZone,
    path: &str,
) -> TrackingResult<MedicationAnswer> {
    let logged =
        timestamps_wire_to_domain(wire.timestamps, current, &format!("{path}.timestamps"))?
            .unwrap_or_default();

    let mut schedule_items = wire.schedule_items.unwrap_or_default();
    if schedule_items.is_empty() && wire.dosage.is_some() {
        schedule_items.push(ScheduleItemV1Wire {
            time_of_day: None,
            days_of_week: None,
        });
    }

    let mut dosage_items = Vec::with_capacity(schedule_items.len());
    for (i, schedule) in schedule_items.into_iter().enumerate() {
        let time_of_day = lenient_time_of_day(
            schedule.time_of_day.as_deref(),
            &format!("{path}.scheduleItems[{i}].timeOfDay"),
        );
        let is_anytime = wire.dosage.as_ref().map(|_| time_of_day.is_none());
        let timestamps = match (is_anytime, time_of_day) {
            (None, _) => None,
            (Some(true), _) | (Some(false), None) => Some(
                logged
                    .iter()
                    .filter(|timestamp| timestamp.time_of_day.is_none())
                    .cloned()
                    .collect(),
            ),
            (Some(false), Some(time)) => Some(vec![logged
                .iter()
                .find(|timestamp| timestamp.time_of_day == Some(time))
                .cloned()
                .unwrap_or_else(|| MedicationTimestamp::scheduled(time, current.clone()))]),
        };
        let days_of_week: Option<WeekdaySet> = time_of_day
            .and(schedule.days_of_week)
            .map(|days| days.into_iter().collect());
        dosage_items.push(Dosage {
            label: wire.dosage.clone(),
            days_of_week,
            timestamps,
            is_anytime,
        });
    }

    let mut answer = MedicationAnswer {
        identifier: wire.identifier,
        dosage_items: Some(dosage_items),
        is_continuous_injection: wire.is_continuous_injection,
    };
    answer.finalize_editing();
    debug!(
        identifier = %answer.identifier,
        dosages = answer.dosage_items.as_ref().map_or(0, Vec::len),
        "converted V1 medication answer"
    );
    Ok(answer)
}
