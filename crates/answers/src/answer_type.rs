use crate::date_format::DateFormat;
use crate::form_data_type::{FormBaseType, FormDataType};
use crate::AnswersResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Locale assumed for formatted dates when none is declared.
pub const DEFAULT_DATE_LOCALE: &str = "en_US_POSIX";

/// The scalar kind an answer is stored as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Boolean,
    Data,
    Date,
    Decimal,
    Integer,
    String,
    Codable,
}

impl BaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            BaseType::Boolean => "boolean",
            BaseType::Data => "data",
            BaseType::Date => "date",
            BaseType::Decimal => "decimal",
            BaseType::Integer => "integer",
            BaseType::String => "string",
            BaseType::Codable => "codable",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrapping applied around the base type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceType {
    Array,
    Dictionary,
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SequenceType::Array => "array",
            SequenceType::Dictionary => "dictionary",
        })
    }
}

/// The outward shape an answer type presents, selected in priority order: sequence, then
/// unit, then date, then the plain base type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerShape {
    Array {
        base_type: BaseType,
        separator: Option<String>,
    },
    Object,
    Measurement {
        unit: String,
    },
    DateTime {
        coding_format: Option<String>,
    },
    Base(BaseType),
}

/// Describes how an answer value is stored.
///
/// Equality and hashing ignore `formDataType` and `dateLocaleIdentifier`: both are hints for
/// presentation and parsing, not part of the stored shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerType {
    base_type: BaseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sequence_type: Option<SequenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    form_data_type: Option<FormDataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_format: Option<String>,
    #[serde(
        default,
        rename = "dateLocaleIdentifier",
        skip_serializing_if = "Option::is_none"
    )]
    date_locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sequence_separator: Option<String>,
}

impl AnswerType {
    pub fn new(base_type: BaseType) -> Self {
        Self {
            base_type,
            sequence_type: None,
            form_data_type: None,
            date_format: None,
            date_locale: None,
            unit: None,
            sequence_separator: None,
        }
    }

    pub fn boolean() -> Self {
        Self::new(BaseType::Boolean)
    }

    pub fn data() -> Self {
        Self::new(BaseType::Data)
    }

    pub fn date() -> Self {
        Self::new(BaseType::Date)
    }

    pub fn decimal() -> Self {
        Self::new(BaseType::Decimal)
    }

    pub fn integer() -> Self {
        Self::new(BaseType::Integer)
    }

    pub fn string() -> Self {
        Self::new(BaseType::String)
    }

    pub fn codable() -> Self {
        Self::new(BaseType::Codable)
    }

    pub fn with_sequence_type(mut self, sequence_type: SequenceType) -> Self {
        self.sequence_type = Some(sequence_type);
        self
    }

    pub fn with_form_data_type(mut self, form_data_type: FormDataType) -> Self {
        self.form_data_type = Some(form_data_type);
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    pub fn with_date_locale(mut self, locale: impl Into<String>) -> Self {
        self.date_locale = Some(locale.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_sequence_separator(mut self, separator: impl Into<String>) -> Self {
        self.sequence_separator = Some(separator.into());
        self
    }

    pub fn base_type(&self) -> BaseType {
        self.base_type
    }

    pub fn sequence_type(&self) -> Option<SequenceType> {
        self.sequence_type
    }

    pub fn form_data_type(&self) -> Option<&FormDataType> {
        self.form_data_type.as_ref()
    }

    pub fn date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn sequence_separator(&self) -> Option<&str> {
        self.sequence_separator.as_deref()
    }

    /// The locale formatted dates are read and written in.
    ///
    /// `None` unless a date format is declared; a declared format without a locale uses
    /// [`DEFAULT_DATE_LOCALE`].
    pub fn date_locale(&self) -> Option<&str> {
        self.date_format.as_ref()?;
        Some(self.date_locale.as_deref().unwrap_or(DEFAULT_DATE_LOCALE))
    }

    /// The locale declared on this type, without the default applied.
    pub fn declared_date_locale(&self) -> Option<&str> {
        self.date_locale.as_deref()
    }

    /// Whether decoded scalars are post-processed into fractions.
    pub fn is_fraction(&self) -> bool {
        self.form_data_type
            .as_ref()
            .is_some_and(|data_type| data_type.base_type() == FormBaseType::Fraction)
    }

    /// The compiled date format, if one is declared.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::InvalidAnswerType` if the declared pattern uses a field this
    /// codec does not support, or the locale is unknown.
    pub fn date_format_spec(&self) -> AnswersResult<Option<DateFormat>> {
        let Some(pattern) = self.date_format.as_deref() else {
            return Ok(None);
        };
        let locale = self.date_locale().unwrap_or(DEFAULT_DATE_LOCALE);
        DateFormat::compile(pattern)?.with_locale(locale).map(Some)
    }

    pub fn shape(&self) -> AnswerShape {
        match (self.sequence_type, &self.unit) {
            (Some(SequenceType::Array), _) => AnswerShape::Array {
                base_type: self.base_type,
                separator: self.sequence_separator.clone(),
            },
            (Some(SequenceType::Dictionary), _) => AnswerShape::Object,
            (None, Some(unit)) => AnswerShape::Measurement { unit: unit.clone() },
            (None, None) if self.base_type == BaseType::Date => AnswerShape::DateTime {
                coding_format: self.date_format.clone(),
            },
            (None, None) => AnswerShape::Base(self.base_type),
        }
    }
}

impl PartialEq for AnswerType {
    fn eq(&self, other: &Self) -> bool {
        self.base_type == other.base_type
            && self.sequence_type == other.sequence_type
            && self.date_format == other.date_format
            && self.unit == other.unit
            && self.sequence_separator == other.sequence_separator
    }
}

impl Eq for AnswerType {}

impl Hash for AnswerType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base_type.hash(state);
        self.sequence_type.hash(state);
        self.date_format.hash(state);
        self.unit.hash(state);
        self.sequence_separator.hash(state);
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: Option<T>) -> String {
            value.map_or_else(|| "nil".to_string(), |v| v.to_string())
        }
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.base_type,
            opt(self.sequence_type),
            opt(self.date_format.as_deref()),
            opt(self.unit.as_deref()),
            opt(self.sequence_separator.as_deref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_form_data_type_and_locale() {
        let plain = AnswerType::integer().with_sequence_type(SequenceType::Array);
        let hinted = plain
            .clone()
            .with_form_data_type(FormDataType::parse("multipleChoice.integer").expect("valid"))
            .with_date_locale("fr_FR");
        assert_eq!(plain, hinted);

        let mut set = HashSet::new();
        set.insert(plain);
        assert!(set.contains(&hinted));
    }

    #[test]
    fn equality_respects_stored_shape() {
        assert_ne!(AnswerType::decimal(), AnswerType::decimal().with_unit("kg"));
        assert_ne!(
            AnswerType::date().with_date_format("yyyy-MM"),
            AnswerType::date().with_date_format("yyyy")
        );
    }

    #[test]
    fn shape_follows_priority_order() {
        let array = AnswerType::integer()
            .with_sequence_type(SequenceType::Array)
            .with_unit("mmHg")
            .with_sequence_separator("/");
        assert_eq!(
            array.shape(),
            AnswerShape::Array {
                base_type: BaseType::Integer,
                separator: Some("/".into())
            }
        );
        assert_eq!(
            AnswerType::decimal().with_unit("cm").shape(),
            AnswerShape::Measurement { unit: "cm".into() }
        );
        assert_eq!(
            AnswerType::date().with_date_format("yyyy").shape(),
            AnswerShape::DateTime {
                coding_format: Some("yyyy".into())
            }
        );
        assert_eq!(
            AnswerType::string().with_sequence_type(SequenceType::Dictionary).shape(),
            AnswerShape::Object
        );
        assert_eq!(AnswerType::boolean().shape(), AnswerShape::Base(BaseType::Boolean));
    }

    #[test]
    fn reads_camel_case_wire_fields() {
        let json = r#"{
            "baseType": "date",
            "dateFormat": "yyyy-MM-dd",
            "dateLocaleIdentifier": "en_GB",
            "formDataType": "date"
        }"#;
        let answer_type: AnswerType = serde_json::from_str(json).expect("decode answer type");
        assert_eq!(answer_type.base_type(), BaseType::Date);
        assert_eq!(answer_type.date_format(), Some("yyyy-MM-dd"));
        assert_eq!(answer_type.date_locale(), Some("en_GB"));

        let encoded = serde_json::to_value(&answer_type).expect("encode answer type");
        assert_eq!(encoded["dateLocaleIdentifier"], "en_GB");
        assert!(encoded.get("unit").is_none());
    }

    #[test]
    fn date_locale_defaults_only_with_a_format() {
        assert_eq!(AnswerType::date().date_locale(), None);
        assert_eq!(
            AnswerType::date().with_date_format("HH:mm").date_locale(),
            Some(DEFAULT_DATE_LOCALE)
        );
    }

    #[test]
    fn display_lists_descriptor_fields() {
        let answer_type = AnswerType::integer()
            .with_sequence_type(SequenceType::Array)
            .with_sequence_separator("/");
        assert_eq!(answer_type.to_string(), "integer|array|nil|nil|/");
    }
}
