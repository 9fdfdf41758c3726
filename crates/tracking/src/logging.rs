//! Logging results for symptoms, triggers and other tracked items.
//!
//! A logged item stores its typed answers (severity, duration, medication timing, notes) as
//! child [`AnswerResult`]s in memory. On the wire those children are flattened into the
//! item object as sibling keys, so decoding has to pick them back out of the remaining keys.

use crate::client_data::{latest_report, nested_collection};
use crate::collection::{SubmittedResult, TrackedItemsCollection};
use crate::item::{TrackedItem, TrackedItemAnswer};
use crate::logged_date;
use crate::{parse_wire, TrackingError, TrackingResult, TRACKED_ITEMS_KEY};
use answers::{AnswerCodec, AnswerError, AnswerResult, AnswerType, DynamicValue};
use chrono::{DateTime, FixedOffset};
use datatrack_types::RecordedTimeZone;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

pub const SEVERITY_IDENTIFIER: &str = "severity";
pub const DURATION_IDENTIFIER: &str = "duration";
pub const MEDICATION_TIMING_IDENTIFIER: &str = "medicationTiming";
pub const NOTES_IDENTIFIER: &str = "notes";

/// Keys written by the item itself; a child answer may not shadow them.
const RESERVED_KEYS: [&str; 8] = [
    "identifier",
    "type",
    "itemIdentifier",
    "timingIdentifier",
    "text",
    "detail",
    "loggedDate",
    "timeZone",
];

// ============================================================================
// Public domain-level types
// ============================================================================

/// What a logging result records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoggingKind {
    /// A plain "I did this" log, such as a dose taken.
    Logging,
    Symptom,
    Trigger,
}

impl LoggingKind {
    pub fn item_type(self) -> &'static str {
        match self {
            Self::Logging => "loggingItem",
            Self::Symptom => "symptom",
            Self::Trigger => "trigger",
        }
    }

    pub fn collection_type(self) -> &'static str {
        match self {
            Self::Logging => "loggingCollection",
            Self::Symptom => "symptomCollection",
            Self::Trigger => "triggerCollection",
        }
    }

    pub fn from_collection_type(raw: &str) -> Option<Self> {
        [Self::Logging, Self::Symptom, Self::Trigger]
            .into_iter()
            .find(|kind| kind.collection_type() == raw)
    }

    /// Generic logging items are written without a `type` key.
    fn encoded_item_type(self) -> Option<&'static str> {
        match self {
            Self::Logging => None,
            Self::Symptom | Self::Trigger => Some(self.item_type()),
        }
    }
}

/// How bad a symptom was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymptomSeverity {
    None = 0,
    Mild = 1,
    Moderate = 2,
    Severe = 3,
}

impl SymptomSeverity {
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Mild),
            2 => Some(Self::Moderate),
            3 => Some(Self::Severe),
            _ => None,
        }
    }

    pub fn value(self) -> i64 {
        self as i64
    }
}

/// How long a symptom lasted, as offered by the duration picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymptomDuration {
    Now,
    ShortPeriod,
    AWhile,
    Morning,
    Afternoon,
    Evening,
    HalfDay,
    HalfNight,
    AllDay,
    AllNight,
}

impl SymptomDuration {
    const ALL: [Self; 10] = [
        Self::Now,
        Self::ShortPeriod,
        Self::AWhile,
        Self::Morning,
        Self::Afternoon,
        Self::Evening,
        Self::HalfDay,
        Self::HalfNight,
        Self::AllDay,
        Self::AllNight,
    ];

    /// The stored choice key, e.g. `DURATION_CHOICE_NOW`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Now => "DURATION_CHOICE_NOW",
            Self::ShortPeriod => "DURATION_CHOICE_SHORT_PERIOD",
            Self::AWhile => "DURATION_CHOICE_A_WHILE",
            Self::Morning => "DURATION_CHOICE_MORNING",
            Self::Afternoon => "DURATION_CHOICE_AFTERNOON",
            Self::Evening => "DURATION_CHOICE_EVENING",
            Self::HalfDay => "DURATION_CHOICE_HALF_DAY",
            Self::HalfNight => "DURATION_CHOICE_HALF_NIGHT",
            Self::AllDay => "DURATION_CHOICE_ALL_DAY",
            Self::AllNight => "DURATION_CHOICE_ALL_NIGHT",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|duration| duration.key() == key)
    }

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Coarse length: the three short choices rank by position, then part of a day,
    /// half a day or night, and a whole day or night.
    pub fn level(self) -> u8 {
        match self {
            Self::Now => 0,
            Self::ShortPeriod => 1,
            Self::AWhile => 2,
            Self::Morning | Self::Afternoon | Self::Evening => 3,
            Self::HalfDay | Self::HalfNight => 4,
            Self::AllDay | Self::AllNight => 5,
        }
    }
}

/// When a symptom happened relative to the participant's medication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MedicationTiming {
    PreMedication,
    PostMedication,
}

impl MedicationTiming {
    pub fn key(self) -> &'static str {
        match self {
            Self::PreMedication => "pre-medication",
            Self::PostMedication => "post-medication",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "pre-medication" => Some(Self::PreMedication),
            "post-medication" => Some(Self::PostMedication),
            _ => None,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::PreMedication),
            1 => Some(Self::PostMedication),
            _ => None,
        }
    }
}

/// One logged item.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedLoggingResult {
    pub identifier: String,
    pub kind: LoggingKind,
    /// The catalog item this log refers to, when it differs from `identifier`.
    pub item_identifier: Option<String>,
    /// Medication logs: the uuid of the timestamp being logged.
    pub timing_identifier: Option<String>,
    pub text: Option<String>,
    pub detail: Option<String>,
    pub logged_date: Option<DateTime<FixedOffset>>,
    /// The zone `logged_date` was recorded in.
    pub time_zone: RecordedTimeZone,
    pub children: Vec<AnswerResult>,
}

impl TrackedLoggingResult {
    pub fn new(identifier: impl Into<String>, kind: LoggingKind, time_zone: RecordedTimeZone) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            item_identifier: None,
            timing_identifier: None,
            text: None,
            detail: None,
            logged_date: None,
            time_zone,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn answer(&self, identifier: &str) -> Option<&AnswerResult> {
        self.children
            .iter()
            .find(|child| child.identifier == identifier)
    }

    /// Adds `answer`, replacing any child with the same identifier.
    pub fn set_answer(&mut self, answer: AnswerResult) {
        match self
            .children
            .iter_mut()
            .find(|child| child.identifier == answer.identifier)
        {
            Some(existing) => *existing = answer,
            None => self.children.push(answer),
        }
    }

    pub fn remove_answer(&mut self, identifier: &str) {
        self.children.retain(|child| child.identifier != identifier);
    }

    pub fn severity(&self) -> Option<SymptomSeverity> {
        match self.answer(SEVERITY_IDENTIFIER)?.value {
            Some(DynamicValue::Integer(value)) => SymptomSeverity::from_value(value),
            _ => None,
        }
    }

    /// Setting a severity on an unlogged item also logs it now.
    pub fn set_severity(&mut self, severity: Option<SymptomSeverity>) {
        let value = severity.map(|severity| DynamicValue::Integer(severity.value()));
        self.set_child(SEVERITY_IDENTIFIER, AnswerType::integer(), value);
        if severity.is_some() && self.logged_date.is_none() {
            self.logged_date = Some(logged_date::now_in(&self.time_zone));
        }
    }

    pub fn duration(&self) -> Option<SymptomDuration> {
        match &self.answer(DURATION_IDENTIFIER)?.value {
            Some(DynamicValue::String(key)) => SymptomDuration::from_key(key),
            Some(DynamicValue::Integer(index)) => SymptomDuration::from_index(*index),
            _ => None,
        }
    }

    pub fn set_duration(&mut self, duration: Option<SymptomDuration>) {
        let value = duration.map(|duration| DynamicValue::from(duration.key()));
        self.set_child(DURATION_IDENTIFIER, AnswerType::string(), value);
    }

    pub fn medication_timing(&self) -> Option<MedicationTiming> {
        match &self.answer(MEDICATION_TIMING_IDENTIFIER)?.value {
            Some(DynamicValue::String(key)) => MedicationTiming::from_key(key),
            Some(DynamicValue::Integer(index)) => MedicationTiming::from_index(*index),
            _ => None,
        }
    }

    pub fn set_medication_timing(&mut self, timing: Option<MedicationTiming>) {
        let value = timing.map(|timing| DynamicValue::from(timing.key()));
        self.set_child(MEDICATION_TIMING_IDENTIFIER, AnswerType::string(), value);
    }

    pub fn notes(&self) -> Option<&str> {
        match &self.answer(NOTES_IDENTIFIER)?.value {
            Some(DynamicValue::String(notes)) => Some(notes),
            _ => None,
        }
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        let value = notes.map(DynamicValue::String);
        self.set_child(NOTES_IDENTIFIER, AnswerType::string(), value);
    }

    fn set_child(&mut self, identifier: &str, answer_type: AnswerType, value: Option<DynamicValue>) {
        match value {
            Some(value) => self.set_answer(AnswerResult::new(identifier, answer_type).with_value(value)),
            None => self.remove_answer(identifier),
        }
    }

    /// Serializes the item with its children flattened in.
    ///
    /// # Errors
    ///
    /// Returns an error if the logged date cannot be expressed in the recorded zone or a
    /// child value does not match its answer type.
    pub fn to_json(&self) -> TrackingResult<Value> {
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        if let Some(item_type) = self.kind.encoded_item_type() {
            map.insert("type".into(), Value::String(item_type.to_string()));
        }
        if self.kind != LoggingKind::Trigger {
            insert_optional(&mut map, "itemIdentifier", self.item_identifier.as_deref());
            insert_optional(&mut map, "timingIdentifier", self.timing_identifier.as_deref());
        }
        let text = match self.kind {
            LoggingKind::Symptom => Some(self.text.as_deref().unwrap_or(&self.identifier)),
            _ => self.text.as_deref(),
        };
        insert_optional(&mut map, "text", text);
        insert_optional(&mut map, "detail", self.detail.as_deref());

        if let Some(date) = &self.logged_date {
            let formatted = logged_date::format_in_zone(date, &self.time_zone)?;
            map.insert("loggedDate".into(), Value::String(formatted));
            map.insert(
                "timeZone".into(),
                Value::String(self.time_zone.identifier().to_string()),
            );
        }

        // Symptom answers stand on their own; other children only mean something once logged.
        if self.logged_date.is_some() || self.kind == LoggingKind::Symptom {
            let codec = AnswerCodec::new(self.time_zone.clone());
            for child in self.children.iter().filter(|child| child.value.is_some()) {
                if RESERVED_KEYS.contains(&child.identifier.as_str()) {
                    warn!(identifier = %child.identifier, "skipping child answer that shadows an item key");
                    continue;
                }
                map.insert(child.identifier.clone(), child.json_value(&codec)?);
            }
        }
        Ok(Value::Object(map))
    }

    /// Reads a stored item.
    ///
    /// Sibling keys other than the item's own become child answers. A legacy empty object in
    /// place of a typed answer is read as "no value".
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Translation`] naming the failing path when the item does not
    /// match the schema or its logged date cannot be parsed.
    pub fn from_json(
        json: &Value,
        kind: LoggingKind,
        current: &RecordedTimeZone,
    ) -> TrackingResult<Self> {
        let wire: LoggingItemWire = parse_wire(json, "Logging item", "")?;
        item_wire_to_domain(wire, kind, current, "$")
    }
}

impl TrackedItemAnswer for TrackedLoggingResult {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn has_required_values(&self) -> bool {
        match self.kind {
            LoggingKind::Symptom => self
                .answer(SEVERITY_IDENTIFIER)
                .is_some_and(|answer| answer.value.is_some()),
            LoggingKind::Logging | LoggingKind::Trigger => self.logged_date.is_some(),
        }
    }
}

/// The logged items for one step, in selection order.
#[derive(Clone, Debug, PartialEq)]
pub struct LoggingCollectionResult {
    pub identifier: String,
    pub kind: LoggingKind,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub items: Vec<TrackedLoggingResult>,
    time_zone: RecordedTimeZone,
    client_data_key: String,
}

impl LoggingCollectionResult {
    pub fn new(identifier: impl Into<String>, kind: LoggingKind, time_zone: RecordedTimeZone) -> Self {
        let now = logged_date::now_in(&time_zone);
        Self {
            identifier: identifier.into(),
            kind,
            start_date: now,
            end_date: now,
            items: Vec::new(),
            time_zone,
            client_data_key: TRACKED_ITEMS_KEY.to_string(),
        }
    }

    /// Overrides the identifier that marks the collection persisted as client data.
    pub fn with_client_data_key(mut self, key: impl Into<String>) -> Self {
        self.client_data_key = key.into();
        self
    }

    /// The zone new items are logged in.
    pub fn time_zone(&self) -> &RecordedTimeZone {
        &self.time_zone
    }

    /// Reads a stored collection. `current` is used for items without a recorded zone.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Translation`] naming the failing path.
    pub fn from_json(
        json: &Value,
        kind: LoggingKind,
        current: &RecordedTimeZone,
    ) -> TrackingResult<Self> {
        let wire: LoggingCollectionWire = parse_wire(json, "Logging collection", "")?;
        let now = logged_date::now_in(current);
        let start_date = logged_date::parse_optional(wire.start_date.as_deref(), "startDate")?;
        let end_date = logged_date::parse_optional(wire.end_date.as_deref(), "endDate")?;
        let items = wire
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("items[{i}]");
                let wire: LoggingItemWire = parse_wire(item, "Logging item", &path)?;
                item_wire_to_domain(wire, kind, current, &path)
            })
            .collect::<TrackingResult<Vec<_>>>()?;

        Ok(Self {
            identifier: wire.identifier,
            kind,
            start_date: start_date.unwrap_or(now),
            end_date: end_date.unwrap_or(now),
            items,
            time_zone: current.clone(),
            client_data_key: TRACKED_ITEMS_KEY.to_string(),
        })
    }

    pub fn to_json(&self) -> TrackingResult<Value> {
        let items = self
            .items
            .iter()
            .map(TrackedLoggingResult::to_json)
            .collect::<TrackingResult<Vec<_>>>()?;
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        map.insert(
            "type".into(),
            Value::String(self.kind.collection_type().to_string()),
        );
        map.insert(
            "startDate".into(),
            Value::String(logged_date::format(&self.start_date)),
        );
        map.insert(
            "endDate".into(),
            Value::String(logged_date::format(&self.end_date)),
        );
        map.insert("items".into(), Value::Array(items));
        Ok(Value::Object(map))
    }

    fn new_item(&self, identifier: &str, catalog: &[TrackedItem]) -> TrackedLoggingResult {
        let mut item = TrackedLoggingResult::new(identifier, self.kind, self.time_zone.clone());
        if let Some(entry) = catalog.iter().find(|entry| entry.identifier == identifier) {
            item.text = Some(entry.text().to_string());
            item.detail = entry.detail.clone();
        }
        item
    }
}

impl TrackedItemsCollection for LoggingCollectionResult {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn selected_answers(&self) -> Vec<&dyn TrackedItemAnswer> {
        self.items
            .iter()
            .map(|item| item as &dyn TrackedItemAnswer)
            .collect()
    }

    fn update_selected(&mut self, selected_identifiers: &[String], catalog: &[TrackedItem]) {
        let items: Vec<TrackedLoggingResult> = selected_identifiers
            .iter()
            .map(|identifier| {
                self.items
                    .iter()
                    .find(|item| &item.identifier == identifier)
                    .cloned()
                    .unwrap_or_else(|| self.new_item(identifier, catalog))
            })
            .collect();
        self.items = items;
    }

    fn update_details(&mut self, submitted: SubmittedResult) -> TrackingResult<()> {
        match submitted {
            SubmittedResult::LoggedItem(logged) => {
                match self
                    .items
                    .iter_mut()
                    .find(|item| item.identifier == logged.identifier)
                {
                    Some(existing) => *existing = logged,
                    None => self.items.push(logged),
                }
                Ok(())
            }
            SubmittedResult::LoggingCollection(collection) => {
                self.items = collection.items;
                Ok(())
            }
            other => {
                error!(
                    collection = %self.identifier,
                    submitted = %other.identifier(),
                    "logging collection cannot merge a {}",
                    other.kind()
                );
                Err(TrackingError::InvalidSelectionState(format!(
                    "logging collection '{}' cannot merge a {} result ('{}')",
                    self.identifier,
                    other.kind(),
                    other.identifier()
                )))
            }
        }
    }

    fn client_data(&self) -> TrackingResult<Option<Value>> {
        if self.identifier != self.client_data_key {
            return Ok(None);
        }
        self.to_json().map(Some)
    }

    /// Keeps the previous session's items but starts them unlogged: logged dates, answers and
    /// zones are reset.
    fn update_selected_from_client_data(
        &mut self,
        client_data: &Value,
        catalog: &[TrackedItem],
    ) -> TrackingResult<()> {
        let report = latest_report(client_data)?;
        let stored = nested_collection(report, &self.client_data_key, self.kind.collection_type());
        let previous = Self::from_json(stored, self.kind, &self.time_zone)?;
        debug!(
            collection = %self.identifier,
            items = previous.items.len(),
            "restoring logging selection from client data"
        );

        self.items = previous
            .items
            .into_iter()
            .map(|item| {
                let mut fresh = self.new_item(&item.identifier, catalog);
                if item.text.is_some() {
                    fresh.text = item.text;
                }
                if item.detail.is_some() {
                    fresh.detail = item.detail;
                }
                fresh
            })
            .collect();
        Ok(())
    }

    fn to_json(&self) -> TrackingResult<Value> {
        LoggingCollectionResult::to_json(self)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoggingItemWire {
    identifier: String,
    #[serde(rename = "type", default)]
    _item_type: Option<String>,
    #[serde(default)]
    item_identifier: Option<String>,
    #[serde(default)]
    timing_identifier: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    logged_date: Option<String>,
    #[serde(default)]
    time_zone: Option<String>,
    #[serde(flatten)]
    answers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoggingCollectionWire {
    identifier: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn insert_optional(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn item_wire_to_domain(
    wire: LoggingItemWire,
    kind: LoggingKind,
    current: &RecordedTimeZone,
    path: &str,
) -> TrackingResult<TrackedLoggingResult> {
    let logged_date =
        logged_date::parse_optional(wire.logged_date.as_deref(), &format!("{path}.loggedDate"))?;
    let time_zone =
        logged_date::recorded_zone(wire.time_zone.as_deref(), logged_date.as_ref(), current);
    let codec = AnswerCodec::new(time_zone.clone());

    let mut children = Vec::new();
    for (key, json) in &wire.answers {
        let child_path = format!("{path}.{key}");
        let Some(answer_type) = child_answer_type(key, json) else {
            debug!(path = %child_path, "skipping child answer without a scalar value");
            continue;
        };
        let json = normalize_choice(key, json);
        match codec.decode(&answer_type, &json) {
            Ok(Some(value)) => {
                children.push(AnswerResult::new(key.as_str(), answer_type).with_value(value));
            }
            Ok(None) => {}
            Err(AnswerError::TypeMismatch { .. }) => {
                debug!(path = %child_path, "ignoring legacy placeholder for child answer");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(TrackedLoggingResult {
        identifier: wire.identifier,
        kind,
        item_identifier: wire.item_identifier,
        timing_identifier: wire.timing_identifier,
        text: wire.text,
        detail: wire.detail,
        logged_date,
        time_zone,
        children,
    })
}

/// The answer type a flattened child is read as. Typed children have a fixed type; other
/// keys take the type of their JSON value.
fn child_answer_type(key: &str, json: &Value) -> Option<AnswerType> {
    match key {
        SEVERITY_IDENTIFIER => Some(AnswerType::integer()),
        DURATION_IDENTIFIER | MEDICATION_TIMING_IDENTIFIER | NOTES_IDENTIFIER => {
            Some(AnswerType::string())
        }
        _ => match json {
            Value::Bool(_) => Some(AnswerType::boolean()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(AnswerType::integer()),
            Value::Number(_) => Some(AnswerType::decimal()),
            Value::String(_) => Some(AnswerType::string()),
            Value::Object(_) => Some(AnswerType::codable()),
            Value::Null | Value::Array(_) => None,
        },
    }
}

/// Choice answers were once stored by index; map those to their keys.
fn normalize_choice(key: &str, json: &Value) -> Value {
    let key_for_index = |index: i64| match key {
        DURATION_IDENTIFIER => SymptomDuration::from_index(index).map(SymptomDuration::key),
        MEDICATION_TIMING_IDENTIFIER => MedicationTiming::from_index(index).map(MedicationTiming::key),
        _ => None,
    };
    json.as_i64()
        .and_then(key_for_index)
        .map_or_else(|| json.clone(), |choice| Value::String(choice.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn denver() -> RecordedTimeZone {
        RecordedTimeZone::parse("America/Denver").expect("known zone")
    }

    fn date(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).expect("valid date")
    }

    fn symptom_report() -> Value {
        json!({
            "logging": {
                "Hallucinations": {
                    "severity": 2,
                    "duration": "DURATION_CHOICE_NOW",
                    "medicationTiming": "pre-medication"
                },
                "Anger": 3
            },
            "trackedItems": {
                "startDate": "2019-07-29T14:15:43.776-06:00",
                "endDate": "2019-07-29T14:15:43.776-06:00",
                "type": "loggingCollection",
                "identifier": "trackedItems",
                "items": [
                    {"text": "Amnesia", "identifier": "Amnesia", "severity": {}, "duration": {}},
                    {
                        "loggedDate": "2019-07-29T14:16:24.561-06:00",
                        "severity": 3,
                        "text": "Anger",
                        "identifier": "Anger"
                    },
                    {
                        "loggedDate": "2019-07-29T14:16:14.711-06:00",
                        "identifier": "Hallucinations",
                        "duration": "DURATION_CHOICE_NOW",
                        "text": "Hallucinations",
                        "medicationTiming": "pre-medication",
                        "severity": 2
                    }
                ]
            }
        })
    }

    #[test]
    fn decodes_symptoms_and_encodes_with_type() {
        let report = symptom_report();
        let symptoms =
            LoggingCollectionResult::from_json(&report["trackedItems"], LoggingKind::Symptom, &denver())
                .expect("decode");
        assert_eq!(symptoms.items.len(), 3);

        let amnesia = &symptoms.items[0];
        assert_eq!(amnesia.identifier, "Amnesia");
        assert!(amnesia.logged_date.is_none());
        assert!(amnesia.severity().is_none());
        assert!(amnesia.duration().is_none());

        let anger = &symptoms.items[1];
        assert!(anger.logged_date.is_some());
        assert_eq!(anger.time_zone.identifier(), "GMT-0600");
        assert_eq!(anger.severity(), Some(SymptomSeverity::Severe));

        let hallucinations = &symptoms.items[2];
        assert_eq!(hallucinations.severity(), Some(SymptomSeverity::Moderate));
        assert_eq!(hallucinations.duration(), Some(SymptomDuration::Now));
        assert_eq!(
            hallucinations.medication_timing(),
            Some(MedicationTiming::PreMedication)
        );

        let encoded = symptoms.to_json().expect("encode");
        assert_eq!(encoded["type"], "symptomCollection");
        assert_eq!(
            encoded["items"],
            json!([
                {"text": "Amnesia", "identifier": "Amnesia", "type": "symptom"},
                {
                    "loggedDate": "2019-07-29T14:16:24.561-06:00",
                    "timeZone": "GMT-0600",
                    "severity": 3,
                    "text": "Anger",
                    "identifier": "Anger",
                    "type": "symptom"
                },
                {
                    "loggedDate": "2019-07-29T14:16:14.711-06:00",
                    "timeZone": "GMT-0600",
                    "identifier": "Hallucinations",
                    "duration": "DURATION_CHOICE_NOW",
                    "text": "Hallucinations",
                    "medicationTiming": "pre-medication",
                    "severity": 2,
                    "type": "symptom"
                }
            ])
        );
    }

    #[test]
    fn reload_from_report_starts_unlogged() {
        let current = RecordedTimeZone::utc();
        let mut result = LoggingCollectionResult::new("logging", LoggingKind::Logging, current.clone());
        result
            .update_selected_from_client_data(&symptom_report(), &[])
            .expect("reload");

        assert_eq!(result.selected_identifiers(), vec!["Amnesia", "Anger", "Hallucinations"]);
        for item in &result.items {
            assert_eq!(item.text.as_deref(), Some(item.identifier.as_str()));
            assert!(item.logged_date.is_none());
            assert!(item.children.is_empty());
            assert_eq!(item.time_zone, current);
        }
    }

    #[test]
    fn generic_items_only_write_children_once_logged() {
        let mut collection =
            LoggingCollectionResult::new("trackedItems", LoggingKind::Logging, denver());

        let amnesia = TrackedLoggingResult::new("Amnesia", LoggingKind::Logging, denver())
            .with_text("Amnesia");

        let mut anger = TrackedLoggingResult::new("Anger", LoggingKind::Logging, denver())
            .with_text("Anger");
        anger.logged_date = Some(date("2019-07-29T14:16:24.561-06:00"));
        anger.set_answer(AnswerResult::new("severity", AnswerType::integer()).with_value(3_i64));

        let mut nightmares = TrackedLoggingResult::new("Nightmares", LoggingKind::Logging, denver())
            .with_text("Nightmares");
        nightmares.set_medication_timing(Some(MedicationTiming::PreMedication));

        collection.items = vec![amnesia, anger, nightmares];
        let encoded = collection.to_json().expect("encode");
        assert_eq!(
            encoded["items"],
            json!([
                {"text": "Amnesia", "identifier": "Amnesia"},
                {
                    "loggedDate": "2019-07-29T14:16:24.561-06:00",
                    "timeZone": "America/Denver",
                    "severity": 3,
                    "text": "Anger",
                    "identifier": "Anger"
                },
                {"text": "Nightmares", "identifier": "Nightmares"}
            ])
        );
        assert!(collection.client_data().expect("client data").is_some());
    }

    #[test]
    fn triggers_omit_item_and_timing_identifiers() {
        let stored = json!({
            "items": [
                {
                    "timingIdentifier": "",
                    "text": "Humidity",
                    "loggedDate": "2019-10-03T15:26:57.679-06:00",
                    "timeZone": "America/Denver",
                    "identifier": "Humidity",
                    "itemIdentifier": "Humidity"
                },
                {"identifier": "Cold", "text": "Cold"}
            ],
            "endDate": "2019-10-03T15:26:47.284-06:00",
            "type": "loggingCollection",
            "identifier": "trackedItems",
            "startDate": "2019-10-03T15:26:47.284-06:00"
        });

        let triggers = LoggingCollectionResult::from_json(&stored, LoggingKind::Trigger, &RecordedTimeZone::utc())
            .expect("decode");
        assert_eq!(triggers.items[0].time_zone.identifier(), "America/Denver");
        assert!(triggers.items[1].logged_date.is_none());

        let encoded = triggers.to_json().expect("encode");
        assert_eq!(
            encoded["items"],
            json!([
                {
                    "loggedDate": "2019-10-03T15:26:57.679-06:00",
                    "timeZone": "America/Denver",
                    "identifier": "Humidity",
                    "text": "Humidity",
                    "type": "trigger"
                },
                {"text": "Cold", "identifier": "Cold", "type": "trigger"}
            ])
        );

        let mut reloaded = LoggingCollectionResult::new("logging", LoggingKind::Logging, denver());
        reloaded
            .update_selected_from_client_data(&stored, &[])
            .expect("reload");
        assert_eq!(reloaded.selected_identifiers(), vec!["Humidity", "Cold"]);
        assert!(reloaded.items.iter().all(|item| item.logged_date.is_none()));
        assert!(reloaded.items.iter().all(|item| item.time_zone == denver()));
    }

    #[test]
    fn logged_item_flattens_children() {
        let mut result = TrackedLoggingResult::new("foo", LoggingKind::Logging, denver());
        result.item_identifier = Some("bah".into());
        result.timing_identifier = Some("09:00".into());
        result.text = Some("Text string".into());
        result.detail = Some("Detail string".into());
        result.logged_date = Some(date("2019-06-04T08:00:00-06:00"));
        for (identifier, value) in [("a", 1_i64), ("b", 2), ("c", 3)] {
            result.set_answer(AnswerResult::new(identifier, AnswerType::integer()).with_value(value));
        }

        let json = result.to_json().expect("encode");
        assert_eq!(json["identifier"], "foo");
        assert_eq!(json["itemIdentifier"], "bah");
        assert_eq!(json["timingIdentifier"], "09:00");
        assert_eq!(json["text"], "Text string");
        assert_eq!(json["detail"], "Detail string");
        assert_eq!(json["loggedDate"], "2019-06-04T08:00:00.000-06:00");
        assert_eq!((json["a"].clone(), json["b"].clone(), json["c"].clone()), (json!(1), json!(2), json!(3)));

        let decoded = TrackedLoggingResult::from_json(&json, LoggingKind::Logging, &denver())
            .expect("decode");
        assert_eq!(decoded.children.len(), 3);
        assert_eq!(
            decoded.answer("b").and_then(|answer| answer.value.clone()),
            Some(DynamicValue::Integer(2))
        );
    }

    #[test]
    fn choices_stored_by_index_decode_to_keys() {
        let json = json!({"identifier": "Tremor", "duration": 6, "medicationTiming": 1, "severity": 1});
        let symptom = TrackedLoggingResult::from_json(&json, LoggingKind::Symptom, &denver())
            .expect("decode");
        assert_eq!(symptom.duration(), Some(SymptomDuration::HalfDay));
        assert_eq!(symptom.medication_timing(), Some(MedicationTiming::PostMedication));
        assert_eq!(symptom.severity(), Some(SymptomSeverity::Mild));
    }

    #[test]
    fn required_values_depend_on_kind() {
        let mut symptom = TrackedLoggingResult::new("Tremor", LoggingKind::Symptom, denver());
        assert!(!symptom.has_required_values());
        symptom.set_severity(Some(SymptomSeverity::Mild));
        assert!(symptom.has_required_values());
        assert!(symptom.logged_date.is_some());

        let mut trigger = TrackedLoggingResult::new("Cold", LoggingKind::Trigger, denver());
        assert!(!trigger.has_required_values());
        trigger.logged_date = Some(date("2019-10-03T15:26:57-06:00"));
        assert!(trigger.has_required_values());
    }

    #[test]
    fn duration_levels() {
        assert_eq!(SymptomDuration::from_key("DURATION_CHOICE_A_WHILE"), Some(SymptomDuration::AWhile));
        assert_eq!(SymptomDuration::AWhile.level(), 2);
        assert_eq!(SymptomDuration::Evening.level(), 3);
        assert_eq!(SymptomDuration::HalfNight.level(), 4);
        assert_eq!(SymptomDuration::AllDay.level(), 5);
        assert_eq!(SymptomDuration::AllNight.index(), 9);
        assert_eq!(SymptomDuration::from_index(10), None);
    }

    #[test]
    fn selection_keeps_existing_items_in_new_order() {
        let catalog: Vec<TrackedItem> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|id| {
                let mut item = TrackedItem::new(datatrack_types::NonEmptyText::new(id).expect("id"));
                item.title = Some(format!("Title {id}"));
                item
            })
            .collect();
        let mut collection = LoggingCollectionResult::new("logging", LoggingKind::Trigger, denver());
        let selected = |ids: &[&str]| ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();

        collection.update_selected(&selected(&["A", "B", "C"]), &catalog);
        collection.items[0].logged_date = Some(date("2019-10-03T15:26:57-06:00"));
        collection.items[2].logged_date = Some(date("2019-10-03T16:26:57-06:00"));

        collection.update_selected(&selected(&["B", "C", "D"]), &catalog);
        assert_eq!(collection.selected_identifiers(), vec!["B", "C", "D"]);
        assert!(collection.items[0].logged_date.is_none());
        assert!(collection.items[1].logged_date.is_some());
        assert_eq!(collection.items[2].text.as_deref(), Some("Title D"));
        assert!(!collection.is_complete());
    }

    #[test]
    fn update_details_merges_items_and_rejects_other_results() {
        let mut collection = LoggingCollectionResult::new("logging", LoggingKind::Trigger, denver());
        collection.update_selected(&["Cold".to_string()], &[]);

        let mut cold = TrackedLoggingResult::new("Cold", LoggingKind::Trigger, denver());
        cold.logged_date = Some(date("2019-10-03T15:26:57-06:00"));
        collection
            .update_details(SubmittedResult::LoggedItem(cold))
            .expect("merge item");
        let heat = TrackedLoggingResult::new("Heat", LoggingKind::Trigger, denver());
        collection
            .update_details(SubmittedResult::LoggedItem(heat))
            .expect("append item");
        assert_eq!(collection.selected_identifiers(), vec!["Cold", "Heat"]);
        assert!(collection.items[0].logged_date.is_some());

        let answer = AnswerResult::new("reminders", AnswerType::integer());
        let err = collection
            .update_details(SubmittedResult::Answer(answer))
            .expect_err("answers cannot be merged");
        assert!(matches!(err, TrackingError::InvalidSelectionState(_)));
        assert!(collection.client_data().expect("client data").is_none());
    }

    #[test]
    fn collection_type_names() {
        assert_eq!(
            LoggingKind::from_collection_type("triggerCollection"),
            Some(LoggingKind::Trigger)
        );
        assert_eq!(LoggingKind::from_collection_type("medication"), None);
    }
}
