//! Input-field data types and their resolution into [`AnswerType`]s.

use crate::answer_type::{AnswerType, BaseType, SequenceType};
use crate::{AnswerError, AnswersResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The value kind an input field collects, before any collection wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormBaseType {
    Boolean,
    String,
    Date,
    Decimal,
    Integer,
    Fraction,
    Duration,
    Year,
    Codable,
}

impl FormBaseType {
    const ALL: [FormBaseType; 9] = [
        FormBaseType::Boolean,
        FormBaseType::String,
        FormBaseType::Date,
        FormBaseType::Decimal,
        FormBaseType::Integer,
        FormBaseType::Fraction,
        FormBaseType::Duration,
        FormBaseType::Year,
        FormBaseType::Codable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormBaseType::Boolean => "boolean",
            FormBaseType::String => "string",
            FormBaseType::Date => "date",
            FormBaseType::Decimal => "decimal",
            FormBaseType::Integer => "integer",
            FormBaseType::Fraction => "fraction",
            FormBaseType::Duration => "duration",
            FormBaseType::Year => "year",
            FormBaseType::Codable => "codable",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|base| base.as_str() == raw)
    }

    /// The stored base type for values of this kind.
    pub fn answer_base_type(self) -> BaseType {
        match self {
            FormBaseType::Boolean => BaseType::Boolean,
            FormBaseType::String => BaseType::String,
            FormBaseType::Date => BaseType::Date,
            FormBaseType::Decimal | FormBaseType::Duration | FormBaseType::Fraction => {
                BaseType::Decimal
            }
            FormBaseType::Integer | FormBaseType::Year => BaseType::Integer,
            FormBaseType::Codable => BaseType::Codable,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    SingleChoice,
    MultipleChoice,
    MultipleComponent,
}

impl CollectionKind {
    fn as_str(self) -> &'static str {
        match self {
            CollectionKind::SingleChoice => "singleChoice",
            CollectionKind::MultipleChoice => "multipleChoice",
            CollectionKind::MultipleComponent => "multipleComponent",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    Height,
    Weight,
    BloodPressure,
}

impl MeasurementKind {
    fn as_str(self) -> &'static str {
        match self {
            MeasurementKind::Height => "height",
            MeasurementKind::Weight => "weight",
            MeasurementKind::BloodPressure => "bloodPressure",
        }
    }
}

/// The data type declared by an input field, written as a dotted string on the wire
/// (`integer`, `multipleChoice.string`, `measurement.bloodPressure`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormDataType {
    Base(FormBaseType),
    Collection(CollectionKind, FormBaseType),
    Measurement(MeasurementKind),
}

impl FormDataType {
    /// # Errors
    ///
    /// Returns [`AnswerError::InvalidAnswerType`] for unknown data types.
    pub fn parse(raw: &str) -> AnswersResult<Self> {
        let unknown = || AnswerError::InvalidAnswerType(format!("unknown form data type '{raw}'"));
        let (head, tail) = match raw.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (raw, None),
        };

        let collection = match head {
            "singleChoice" => Some(CollectionKind::SingleChoice),
            "multipleChoice" => Some(CollectionKind::MultipleChoice),
            "multipleComponent" => Some(CollectionKind::MultipleComponent),
            _ => None,
        };
        if let Some(kind) = collection {
            let base = match tail {
                Some(tail) => FormBaseType::parse(tail).ok_or_else(unknown)?,
                None => FormBaseType::String,
            };
            return Ok(FormDataType::Collection(kind, base));
        }

        if head == "measurement" {
            let kind = match tail {
                Some("height") => MeasurementKind::Height,
                Some("weight") => MeasurementKind::Weight,
                Some("bloodPressure") => MeasurementKind::BloodPressure,
                _ => return Err(unknown()),
            };
            return Ok(FormDataType::Measurement(kind));
        }

        match tail {
            None => FormBaseType::parse(head).map(FormDataType::Base).ok_or_else(unknown),
            Some(_) => Err(unknown()),
        }
    }

    /// The declared value kind, with measurements mapped to their numeric kind.
    pub fn base_type(&self) -> FormBaseType {
        match self {
            FormDataType::Base(base) | FormDataType::Collection(_, base) => *base,
            FormDataType::Measurement(MeasurementKind::BloodPressure) => FormBaseType::Integer,
            FormDataType::Measurement(_) => FormBaseType::Decimal,
        }
    }

    pub fn answer_base_type(&self) -> BaseType {
        self.base_type().answer_base_type()
    }
}

impl fmt::Display for FormDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormDataType::Base(base) => f.write_str(base.as_str()),
            FormDataType::Collection(kind, base) => write!(f, "{}.{}", kind.as_str(), base.as_str()),
            FormDataType::Measurement(kind) => write!(f, "measurement.{}", kind.as_str()),
        }
    }
}

impl Serialize for FormDataType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FormDataType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Field-level settings that refine the resolved answer type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldOptions {
    pub date_coding_format: Option<String>,
    pub sequence_separator: Option<String>,
    pub unit: Option<String>,
}

/// Resolves the [`AnswerType`] for an input field.
#[derive(Clone, Debug)]
pub struct AnswerTypeFactory {
    default_separator: String,
}

impl Default for AnswerTypeFactory {
    fn default() -> Self {
        Self {
            default_separator: ",".to_string(),
        }
    }
}

impl AnswerTypeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `separator` for multiple-component fields that do not declare one.
    pub fn with_default_separator(mut self, separator: impl Into<String>) -> Self {
        self.default_separator = separator.into();
        self
    }

    pub fn answer_type(&self, data_type: FormDataType, options: &FieldOptions) -> AnswerType {
        let base_type = data_type.answer_base_type();
        let answer_type = match data_type {
            FormDataType::Base(_) | FormDataType::Collection(CollectionKind::SingleChoice, _) => {
                scalar(base_type, options)
            }
            FormDataType::Collection(CollectionKind::MultipleChoice, _) => {
                scalar(base_type, options).with_sequence_type(SequenceType::Array)
            }
            FormDataType::Collection(CollectionKind::MultipleComponent, _) => {
                let separator = options
                    .sequence_separator
                    .clone()
                    .unwrap_or_else(|| self.default_separator.clone());
                scalar(base_type, options)
                    .with_sequence_type(SequenceType::Array)
                    .with_sequence_separator(separator)
            }
            FormDataType::Measurement(MeasurementKind::Height) => {
                AnswerType::decimal().with_unit(options.unit.as_deref().unwrap_or("cm"))
            }
            FormDataType::Measurement(MeasurementKind::Weight) => {
                AnswerType::decimal().with_unit(options.unit.as_deref().unwrap_or("kg"))
            }
            FormDataType::Measurement(MeasurementKind::BloodPressure) => AnswerType::integer()
                .with_sequence_type(SequenceType::Array)
                .with_sequence_separator("/")
                .with_unit(options.unit.as_deref().unwrap_or("mmHg")),
        };
        answer_type.with_form_data_type(data_type)
    }
}

fn scalar(base_type: BaseType, options: &FieldOptions) -> AnswerType {
    let mut answer_type = AnswerType::new(base_type);
    match base_type {
        BaseType::Date => {
            if let Some(format) = &options.date_coding_format {
                answer_type = answer_type.with_date_format(format.clone());
            }
        }
        BaseType::Decimal | BaseType::Integer => {
            if let Some(unit) = &options.unit {
                answer_type = answer_type.with_unit(unit.clone());
            }
        }
        _ => {}
    }
    answer_type
}
