use crate::answer_type::AnswerType;
use crate::codec::{parse_iso_date, AnswerCodec};
use crate::value::{DynamicValue, ISO_DATE_FORMAT};
use crate::{AnswerError, AnswersResult};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const RESULT_TYPE: &str = "answer";

/// A single answer: the value a participant entered for one field, typed by its
/// [`AnswerType`].
#[derive(Clone, Debug, PartialEq)]
pub struct AnswerResult {
    pub identifier: String,
    pub answer_type: AnswerType,
    pub value: Option<DynamicValue>,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub question_text: Option<String>,
}

impl AnswerResult {
    /// Creates an empty answer stamped with the current time.
    pub fn new(identifier: impl Into<String>, answer_type: AnswerType) -> Self {
        let now = DateTime::<FixedOffset>::from(Utc::now());
        Self {
            identifier: identifier.into(),
            answer_type,
            value: None,
            start_date: now,
            end_date: now,
            question_text: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<DynamicValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// The value encoded as JSON for its answer type.
    ///
    /// # Errors
    ///
    /// Propagates encoding failures from the codec.
    pub fn json_value(&self, codec: &AnswerCodec) -> AnswersResult<Value> {
        codec.encode(&self.answer_type, self.value.as_ref())
    }

    /// Replaces the value with `json` decoded as this answer's type.
    ///
    /// # Errors
    ///
    /// Propagates decoding failures from the codec; the current value is left untouched.
    pub fn set_json_value(&mut self, codec: &AnswerCodec, json: &Value) -> AnswersResult<()> {
        self.value = codec.decode(&self.answer_type, json)?;
        Ok(())
    }

    /// Serializes the whole result.
    ///
    /// # Errors
    ///
    /// Propagates encoding failures for the value.
    pub fn to_json(&self, codec: &AnswerCodec) -> AnswersResult<Value> {
        let value = match &self.value {
            Some(_) => Some(self.json_value(codec)?),
            None => None,
        };
        let wire = AnswerResultWire {
            identifier: self.identifier.clone(),
            result_type: RESULT_TYPE.to_string(),
            start_date: self.start_date.format(ISO_DATE_FORMAT).to_string(),
            end_date: self.end_date.format(ISO_DATE_FORMAT).to_string(),
            question_text: self.question_text.clone(),
            answer_type: self.answer_type.clone(),
            value,
        };
        Ok(serde_json::to_value(wire)?)
    }

    /// Reads a serialized result, decoding its value with `codec`.
    ///
    /// # Errors
    ///
    /// Returns [`AnswerError::TypeMismatch`] naming the failing field when the envelope does not
    /// match, or a codec error for the value.
    pub fn from_json(codec: &AnswerCodec, json: &Value) -> AnswersResult<Self> {
        let wire: AnswerResultWire =
            serde_path_to_error::deserialize(json).map_err(|e| AnswerError::TypeMismatch {
                path: format!("$.{}", e.path()),
                expected: e.inner().to_string(),
            })?;

        let parse_date = |raw: &str, field: &str| {
            parse_iso_date(raw, codec.time_zone()).ok_or_else(|| AnswerError::DateParseError {
                path: format!("$.{field}"),
                value: raw.to_string(),
                format: "ISO 8601".to_string(),
            })
        };
        let start_date = parse_date(&wire.start_date, "startDate")?;
        let end_date = parse_date(&wire.end_date, "endDate")?;
        let value = match &wire.value {
            Some(json) => codec.decode(&wire.answer_type, json)?,
            None => None,
        };

        Ok(Self {
            identifier: wire.identifier,
            answer_type: wire.answer_type,
            value,
            start_date,
            end_date,
            question_text: wire.question_text,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerResultWire {
    identifier: String,
    #[serde(rename = "type", default = "default_result_type")]
    result_type: String,
    start_date: String,
    end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question_text: Option<String>,
    answer_type: AnswerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

fn default_result_type() -> String {
    RESULT_TYPE.to_string()
}
