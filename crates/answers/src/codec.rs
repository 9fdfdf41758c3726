//! Encoding and decoding of answer values against an [`AnswerType`].

use crate::answer_type::{AnswerType, BaseType, SequenceType};
use crate::date_format::DateFormat;
use crate::value::{DynamicValue, Fraction, ISO_DATE_FORMAT};
use crate::{AnswerError, AnswersResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use datatrack_types::RecordedTimeZone;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Converts answer values to and from JSON.
///
/// The codec holds the time zone formatted dates are written and read in. It carries no other
/// state, so callers can build one per configuration and share it freely.
#[derive(Clone, Debug)]
pub struct AnswerCodec {
    time_zone: RecordedTimeZone,
}

impl AnswerCodec {
    pub fn new(time_zone: RecordedTimeZone) -> Self {
        Self { time_zone }
    }

    pub fn time_zone(&self) -> &RecordedTimeZone {
        &self.time_zone
    }

    /// Encodes `value` for storage as `answer_type`.
    ///
    /// A missing value encodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns [`AnswerError::EncodingMismatch`] when the value cannot be represented by the
    /// declared type, and [`AnswerError::InvalidAnswerType`] when its date format is invalid.
    pub fn encode(
        &self,
        answer_type: &AnswerType,
        value: Option<&DynamicValue>,
    ) -> AnswersResult<Value> {
        let Some(value) = value else {
            return Ok(Value::Null);
        };
        let format = answer_type.date_format_spec()?;
        let ctx = Context {
            codec: self,
            answer_type,
            format: format.as_ref(),
        };

        match answer_type.sequence_type() {
            Some(SequenceType::Array) => {
                let items: Vec<&DynamicValue> = match value {
                    DynamicValue::List(items) => items.iter().collect(),
                    scalar => vec![scalar],
                };
                match answer_type.sequence_separator() {
                    Some(separator) => {
                        let pieces = items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| ctx.encodable_string(item, &index_path("$", i)))
                            .collect::<AnswersResult<Vec<_>>>()?;
                        Ok(Value::String(pieces.join(separator)))
                    }
                    None => items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| ctx.encode_scalar(item, &index_path("$", i)))
                        .collect::<AnswersResult<Vec<_>>>()
                        .map(Value::Array),
                }
            }
            Some(SequenceType::Dictionary) => {
                let DynamicValue::Map(entries) = value else {
                    return Err(ctx.mismatch(value, "$"));
                };
                entries
                    .iter()
                    .map(|(key, item)| {
                        ctx.encode_scalar(item, &key_path("$", key))
                            .map(|encoded| (key.clone(), encoded))
                    })
                    .collect::<AnswersResult<Map<_, _>>>()
                    .map(Value::Object)
            }
            None => ctx.encode_scalar(value, "$"),
        }
    }

    /// Decodes stored JSON as `answer_type`.
    ///
    /// JSON `null` decodes to `None`. For arrays with a declared separator, a single
    /// delimited string is accepted in place of a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`AnswerError::TypeMismatch`] when the JSON kind does not match the declared
    /// type, [`AnswerError::InvalidEncoding`] for corrupt content (bad base64, unparseable
    /// fractions) and [`AnswerError::DateParseError`] for dates that do not match.
    pub fn decode(
        &self,
        answer_type: &AnswerType,
        json: &Value,
    ) -> AnswersResult<Option<DynamicValue>> {
        if json.is_null() {
            return Ok(None);
        }
        let format = answer_type.date_format_spec()?;
        let ctx = Context {
            codec: self,
            answer_type,
            format: format.as_ref(),
        };

        let decoded = match answer_type.sequence_type() {
            Some(SequenceType::Array) => match (json, answer_type.sequence_separator()) {
                (Value::Array(items), _) => DynamicValue::List(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| ctx.decode_single(item, &index_path("$", i)))
                        .collect::<AnswersResult<_>>()?,
                ),
                (Value::String(joined), Some(separator)) => {
                    tracing::debug!(separator, "decoding delimited string as array");
                    DynamicValue::List(
                        joined
                            .split(separator)
                            .enumerate()
                            .map(|(i, piece)| ctx.decode_string(piece, &index_path("$", i)))
                            .collect::<AnswersResult<_>>()?,
                    )
                }
                (_, Some(_)) => return Err(type_mismatch("$", "array or delimited string")),
                (_, None) => return Err(type_mismatch("$", "array")),
            },
            Some(SequenceType::Dictionary) => {
                let Value::Object(entries) = json else {
                    return Err(type_mismatch("$", "object"));
                };
                DynamicValue::Map(
                    entries
                        .iter()
                        .map(|(key, item)| {
                            ctx.decode_single(item, &key_path("$", key))
                                .map(|decoded| (key.clone(), decoded))
                        })
                        .collect::<AnswersResult<BTreeMap<_, _>>>()?,
                )
            }
            None => ctx.decode_single(json, "$")?,
        };
        Ok(Some(decoded))
    }
}

struct Context<'a> {
    codec: &'a AnswerCodec,
    answer_type: &'a AnswerType,
    format: Option<&'a DateFormat>,
}

impl Context<'_> {
    fn base_type(&self) -> BaseType {
        self.answer_type.base_type()
    }

    fn mismatch(&self, value: &DynamicValue, path: &str) -> AnswerError {
        AnswerError::EncodingMismatch {
            path: path.to_string(),
            value: value.describe(),
            base_type: self.base_type(),
        }
    }

    /// Dates may only be stored as dates or strings.
    fn check_date_target(&self, value: &DynamicValue, path: &str) -> AnswersResult<()> {
        match self.base_type() {
            BaseType::Date | BaseType::String => Ok(()),
            _ => Err(self.mismatch(value, path)),
        }
    }

    fn date_string(&self, date: &DateTime<FixedOffset>) -> String {
        match self.format {
            Some(format) => format.format(date, &self.codec.time_zone),
            None => date.format(ISO_DATE_FORMAT).to_string(),
        }
    }

    /// Text form of one element of a delimited array.
    fn encodable_string(&self, value: &DynamicValue, path: &str) -> AnswersResult<String> {
        match value {
            DynamicValue::Date(date) => {
                self.check_date_target(value, path)?;
                Ok(self.date_string(date))
            }
            other => other.natural_string().ok_or_else(|| self.mismatch(value, path)),
        }
    }

    fn encode_scalar(&self, value: &DynamicValue, path: &str) -> AnswersResult<Value> {
        let base_type = self.base_type();
        if base_type == BaseType::Codable {
            return match value {
                DynamicValue::Structured(_) | DynamicValue::Map(_) | DynamicValue::List(_) => {
                    Ok(value.to_json())
                }
                _ => Err(self.mismatch(value, path)),
            };
        }

        match value {
            DynamicValue::Data(bytes) => match base_type {
                BaseType::Data | BaseType::String => Ok(Value::String(STANDARD.encode(bytes))),
                _ => Err(self.mismatch(value, path)),
            },
            DynamicValue::Fraction(fraction) => match base_type {
                BaseType::Decimal => self.number(fraction.to_f64(), value, path),
                BaseType::String => Ok(Value::String(fraction.to_string())),
                _ => Err(self.mismatch(value, path)),
            },
            DynamicValue::Bool(b) => self.encode_number(f64::from(u8::from(*b)), None, value, path),
            DynamicValue::Integer(i) => self.encode_number(*i as f64, Some(*i), value, path),
            DynamicValue::Double(d) => self.encode_number(*d, None, value, path),
            DynamicValue::String(text) => match base_type {
                BaseType::Boolean => parse_bool(text)
                    .map(Value::Bool)
                    .ok_or_else(|| self.mismatch(value, path)),
                BaseType::Decimal => match text.trim().parse::<f64>() {
                    Ok(number) => self.number(number, value, path),
                    Err(_) => Err(self.mismatch(value, path)),
                },
                BaseType::Integer => text
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| self.mismatch(value, path)),
                BaseType::Date => {
                    let zone = &self.codec.time_zone;
                    parse_iso_date(text, zone)
                        .or_else(|| self.format.and_then(|format| format.parse(text, zone)))
                        .map(|date| Value::String(self.date_string(&date)))
                        .ok_or_else(|| self.mismatch(value, path))
                }
                BaseType::Data => match STANDARD.decode(text) {
                    Ok(_) => Ok(Value::String(text.clone())),
                    Err(_) => Err(self.mismatch(value, path)),
                },
                _ => Ok(Value::String(text.clone())),
            },
            DynamicValue::Date(date) => {
                self.check_date_target(value, path)?;
                Ok(Value::String(self.date_string(date)))
            }
            DynamicValue::List(_) | DynamicValue::Map(_) | DynamicValue::Structured(_) => {
                Err(self.mismatch(value, path))
            }
        }
    }

    /// Booleans and numbers convert freely between the numeric base types.
    fn encode_number(
        &self,
        numeric: f64,
        exact: Option<i64>,
        value: &DynamicValue,
        path: &str,
    ) -> AnswersResult<Value> {
        match self.base_type() {
            BaseType::Boolean => Ok(Value::Bool(numeric != 0.0)),
            BaseType::Decimal => self.number(numeric, value, path),
            BaseType::Integer => match exact {
                Some(i) => Ok(Value::from(i)),
                None => whole_i64(numeric.trunc())
                    .map(Value::from)
                    .ok_or_else(|| self.mismatch(value, path)),
            },
            BaseType::String => value
                .natural_string()
                .map(Value::String)
                .ok_or_else(|| self.mismatch(value, path)),
            _ => Err(self.mismatch(value, path)),
        }
    }

    fn number(&self, number: f64, value: &DynamicValue, path: &str) -> AnswersResult<Value> {
        Number::from_f64(number)
            .map(Value::Number)
            .ok_or_else(|| self.mismatch(value, path))
    }

    fn decode_single(&self, json: &Value, path: &str) -> AnswersResult<DynamicValue> {
        let value = self.decode_base(json, path)?;
        self.post_process(value, path)
    }

    fn decode_base(&self, json: &Value, path: &str) -> AnswersResult<DynamicValue> {
        match self.base_type() {
            BaseType::Codable => match json {
                Value::Object(map) => Ok(DynamicValue::Structured(map.clone())),
                _ => Err(type_mismatch(path, "object")),
            },
            BaseType::Boolean => json
                .as_bool()
                .map(DynamicValue::Bool)
                .ok_or_else(|| type_mismatch(path, "boolean")),
            BaseType::Decimal => json
                .as_f64()
                .map(DynamicValue::Double)
                .ok_or_else(|| type_mismatch(path, "number")),
            BaseType::Integer => json
                .as_i64()
                .or_else(|| json.as_f64().and_then(whole_i64))
                .map(DynamicValue::Integer)
                .ok_or_else(|| type_mismatch(path, "integer")),
            BaseType::String => json
                .as_str()
                .map(|s| DynamicValue::String(s.to_string()))
                .ok_or_else(|| type_mismatch(path, "string")),
            BaseType::Data => {
                let text = json.as_str().ok_or_else(|| type_mismatch(path, "base64 string"))?;
                self.decode_data(text, path)
            }
            BaseType::Date => {
                let text = json.as_str().ok_or_else(|| type_mismatch(path, "date string"))?;
                self.decode_date(text, path)
            }
        }
    }

    /// Decodes one piece of a delimited array.
    fn decode_string(&self, piece: &str, path: &str) -> AnswersResult<DynamicValue> {
        let invalid = |what: &str| AnswerError::InvalidEncoding {
            path: path.to_string(),
            reason: format!("'{piece}' is not a valid {what}"),
        };
        let value = match self.base_type() {
            BaseType::Boolean => {
                DynamicValue::Bool(parse_bool(piece).ok_or_else(|| invalid("boolean"))?)
            }
            BaseType::Decimal => DynamicValue::Double(
                piece.trim().parse().map_err(|_| invalid("decimal"))?,
            ),
            BaseType::Integer => DynamicValue::Integer(
                piece.trim().parse().map_err(|_| invalid("integer"))?,
            ),
            BaseType::Data => self.decode_data(piece, path)?,
            BaseType::Date => self.decode_date(piece, path)?,
            BaseType::String | BaseType::Codable => DynamicValue::String(piece.to_string()),
        };
        self.post_process(value, path)
    }

    fn decode_data(&self, text: &str, path: &str) -> AnswersResult<DynamicValue> {
        STANDARD
            .decode(text)
            .map(DynamicValue::Data)
            .map_err(|e| AnswerError::InvalidEncoding {
                path: path.to_string(),
                reason: format!("invalid base64: {e}"),
            })
    }

    fn decode_date(&self, text: &str, path: &str) -> AnswersResult<DynamicValue> {
        let parsed = match self.format {
            Some(format) => format.parse(text, &self.codec.time_zone),
            None => parse_iso_date(text, &self.codec.time_zone),
        };
        parsed.map(DynamicValue::Date).ok_or_else(|| AnswerError::DateParseError {
            path: path.to_string(),
            value: text.to_string(),
            format: self
                .format
                .map_or_else(|| "ISO 8601".to_string(), |f| f.pattern().to_string()),
        })
    }

    fn post_process(&self, value: DynamicValue, path: &str) -> AnswersResult<DynamicValue> {
        if !self.answer_type.is_fraction() {
            return Ok(value);
        }
        let fraction = match &value {
            DynamicValue::String(text) => Fraction::parse(text),
            DynamicValue::Integer(i) => Fraction::new(*i, 1),
            DynamicValue::Double(d) => Fraction::from_f64(*d),
            DynamicValue::Fraction(f) => Some(*f),
            _ => return Err(type_mismatch(path, "fraction string or number")),
        };
        fraction
            .map(DynamicValue::Fraction)
            .ok_or_else(|| AnswerError::InvalidEncoding {
                path: path.to_string(),
                reason: format!("{} cannot be read as a fraction", value.describe()),
            })
    }
}

/// `number` as an `i64` when it is whole and in range.
fn whole_i64(number: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    let in_range = number >= i64::MIN as f64 && number < i64::MAX as f64;
    (number.fract() == 0.0 && in_range).then(|| number as i64)
}

/// Reads the default date token: RFC 3339 with or without fractional seconds, a `+hhmm`
/// offset, or a bare `yyyy-MM-dd` date taken as local midnight.
pub(crate) fn parse_iso_date(text: &str, zone: &RecordedTimeZone) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .or_else(|| {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
            zone.localize(date.and_time(NaiveTime::MIN)).ok()
        })
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn type_mismatch(path: &str, expected: &str) -> AnswerError {
    AnswerError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

fn key_path(parent: &str, key: &str) -> String {
    format!("{parent}.{key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form_data_type::FormDataType;
    use serde_json::json;

    fn codec() -> AnswerCodec {
        AnswerCodec::new(RecordedTimeZone::parse("America/Denver").expect("known zone"))
    }

    fn date(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).expect("valid date")
    }

    fn blood_pressure() -> AnswerType {
        AnswerType::integer()
            .with_sequence_type(SequenceType::Array)
            .with_sequence_separator("/")
    }

    #[test]
    fn null_round_trips() {
        let codec = codec();
        assert_eq!(codec.encode(&AnswerType::integer(), None).expect("encode"), Value::Null);
        assert_eq!(codec.decode(&AnswerType::integer(), &Value::Null).expect("decode"), None);
    }

    #[test]
    fn separator_array_encodes_as_joined_string() {
        let codec = codec();
        let value = DynamicValue::List(vec![DynamicValue::Integer(1), DynamicValue::Integer(2)]);
        let encoded = codec.encode(&blood_pressure(), Some(&value)).expect("encode");
        assert_eq!(encoded, json!("1/2"));
        let decoded = codec.decode(&blood_pressure(), &encoded).expect("decode");
        assert_eq!(decoded, Some(value));
    }

    #[test]
    fn separator_array_still_decodes_json_arrays() {
        let decoded = codec().decode(&blood_pressure(), &json!([120, 80])).expect("decode");
        assert_eq!(decoded, Some(DynamicValue::List(vec![DynamicValue::Integer(120), DynamicValue::Integer(80)])));
    }

    #[test]
    fn array_without_separator_rejects_strings() {
        let answer_type = AnswerType::integer().with_sequence_type(SequenceType::Array);
        let err = codec().decode(&answer_type, &json!("1/2")).expect_err("needs array");
        assert!(matches!(err, AnswerError::TypeMismatch { expected, .. } if expected == "array"));
    }

    #[test]
    fn array_wraps_scalar_values() {
        let answer_type = AnswerType::string().with_sequence_type(SequenceType::Array);
        let encoded = codec()
            .encode(&answer_type, Some(&"a".into()))
            .expect("encode");
        assert_eq!(encoded, json!(["a"]));
    }

    #[test]
    fn array_element_errors_name_their_index() {
        let answer_type = AnswerType::integer().with_sequence_type(SequenceType::Array);
        let err = codec()
            .decode(&answer_type, &json!([1, "two"]))
            .expect_err("second element is not an integer");
        assert!(matches!(err, AnswerError::TypeMismatch { path, .. } if path == "$[1]"));
    }

    #[test]
    fn dictionary_round_trips() {
        let answer_type = AnswerType::decimal().with_sequence_type(SequenceType::Dictionary);
        let value = DynamicValue::Map(BTreeMap::from([
            ("left".to_string(), DynamicValue::Double(1.5)),
            ("right".to_string(), DynamicValue::Double(2.0)),
        ]));
        let encoded = codec().encode(&answer_type, Some(&value)).expect("encode");
        assert_eq!(encoded, json!({"left": 1.5, "right": 2.0}));
        assert_eq!(codec().decode(&answer_type, &encoded).expect("decode"), Some(value));

        let err = codec()
            .encode(&answer_type, Some(&DynamicValue::Double(1.5)))
            .expect_err("dictionary needs a map");
        assert!(matches!(err, AnswerError::EncodingMismatch { .. }));
    }

    #[test]
    fn date_value_cannot_target_integer() {
        let value = DynamicValue::Date(date("2019-06-04T08:00:00-06:00"));
        let err = codec()
            .encode(&AnswerType::integer(), Some(&value))
            .expect_err("dates are not integers");
        assert!(matches!(
            err,
            AnswerError::EncodingMismatch { base_type: BaseType::Integer, ref path, .. } if path == "$"
        ));
    }

    #[test]
    fn date_without_format_uses_iso_token() {
        let value = DynamicValue::Date(date("2019-06-04T08:00:00-06:00"));
        let encoded = codec().encode(&AnswerType::date(), Some(&value)).expect("encode");
        assert_eq!(encoded, json!("2019-06-04T08:00:00.000-06:00"));
        assert_eq!(codec().decode(&AnswerType::date(), &encoded).expect("decode"), Some(value));
    }

    #[test]
    fn date_as_string_target_is_formatted() {
        let value = DynamicValue::Date(date("2019-06-04T14:00:00Z"));
        let answer_type = AnswerType::string().with_date_format("yyyy-MM-dd HH:mm");
        let encoded = codec().encode(&answer_type, Some(&value)).expect("encode");
        assert_eq!(encoded, json!("2019-06-04 08:00"));
    }

    #[test]
    fn formatted_date_round_trips_in_codec_zone() {
        let answer_type = AnswerType::date().with_date_format("yyyy-MM-dd");
        let decoded = codec()
            .decode(&answer_type, &json!("2019-06-04"))
            .expect("decode")
            .expect("non-null");
        assert_eq!(decoded, DynamicValue::Date(date("2019-06-04T00:00:00-06:00")));
        let encoded = codec().encode(&answer_type, Some(&decoded)).expect("encode");
        assert_eq!(encoded, json!("2019-06-04"));
    }

    #[test]
    fn unparseable_date_reports_format() {
        let answer_type = AnswerType::date().with_date_format("yyyy-MM-dd");
        let err = codec()
            .decode(&answer_type, &json!("04/06/2019"))
            .expect_err("wrong layout");
        assert!(matches!(err, AnswerError::DateParseError { format, .. } if format == "yyyy-MM-dd"));
    }

    #[test]
    fn data_round_trips_as_base64() {
        let value = DynamicValue::Data(vec![0, 1, 2, 250]);
        let encoded = codec().encode(&AnswerType::data(), Some(&value)).expect("encode");
        assert_eq!(encoded, json!("AAEC+g=="));
        assert_eq!(codec().decode(&AnswerType::data(), &encoded).expect("decode"), Some(value));

        let err = codec()
            .decode(&AnswerType::data(), &json!("not base64!"))
            .expect_err("corrupt data");
        assert!(matches!(err, AnswerError::InvalidEncoding { .. }));
    }

    #[test]
    fn numbers_follow_declared_base_type() {
        let codec = codec();
        assert_eq!(codec.encode(&AnswerType::decimal(), Some(&DynamicValue::Integer(3))).expect("encode"), json!(3.0));
        assert_eq!(codec.encode(&AnswerType::integer(), Some(&DynamicValue::Double(3.7))).expect("encode"), json!(3));
        assert_eq!(codec.encode(&AnswerType::boolean(), Some(&DynamicValue::Integer(0))).expect("encode"), json!(false));
        assert_eq!(codec.encode(&AnswerType::string(), Some(&DynamicValue::Integer(42))).expect("encode"), json!("42"));
        assert_eq!(codec.decode(&AnswerType::integer(), &json!(4.0)).expect("decode"), Some(DynamicValue::Integer(4)));
    }

    #[test]
    fn out_of_range_integers_are_rejected() {
        let codec = codec();
        for stored in [json!(18446744073709551615u64), json!(1e300), json!(9.3e18)] {
            let err = codec
                .decode(&AnswerType::integer(), &stored)
                .expect_err("outside i64");
            assert!(matches!(err, AnswerError::TypeMismatch { expected, .. } if expected == "integer"));
        }
        assert_eq!(
            codec.decode(&AnswerType::integer(), &json!(-9.0e18)).expect("decode"),
            Some(DynamicValue::Integer(-9_000_000_000_000_000_000))
        );

        let err = codec
            .encode(&AnswerType::integer(), Some(&DynamicValue::Double(1e300)))
            .expect_err("outside i64");
        assert!(matches!(err, AnswerError::EncodingMismatch { .. }));
        let err = codec
            .encode(&AnswerType::integer(), Some(&DynamicValue::Double(f64::NAN)))
            .expect_err("not a number");
        assert!(matches!(err, AnswerError::EncodingMismatch { .. }));
    }

    #[test]
    fn date_text_is_validated_and_reformatted() {
        let codec = codec();
        let answer_type = AnswerType::date().with_date_format("yyyy-MM-dd HH:mm");
        let encoded = codec
            .encode(&answer_type, Some(&"2019-06-04T14:00:00Z".into()))
            .expect("encode");
        assert_eq!(encoded, json!("2019-06-04 08:00"));

        let encoded = codec
            .encode(&answer_type, Some(&"2019-06-04 08:00".into()))
            .expect("already formatted");
        assert_eq!(encoded, json!("2019-06-04 08:00"));

        let err = codec
            .encode(&answer_type, Some(&"not a date".into()))
            .expect_err("not a date");
        assert!(matches!(err, AnswerError::EncodingMismatch { base_type: BaseType::Date, .. }));

        let encoded = codec
            .encode(&AnswerType::date(), Some(&"2019-06-04T14:00:00Z".into()))
            .expect("encode");
        assert_eq!(encoded, json!("2019-06-04T14:00:00.000+00:00"));
    }

    #[test]
    fn data_text_must_be_base64() {
        let codec = codec();
        let encoded = codec
            .encode(&AnswerType::data(), Some(&"AAEC+g==".into()))
            .expect("valid base64");
        assert_eq!(encoded, json!("AAEC+g=="));
        let err = codec
            .encode(&AnswerType::data(), Some(&"not base64!".into()))
            .expect_err("corrupt data");
        assert!(matches!(err, AnswerError::EncodingMismatch { base_type: BaseType::Data, .. }));
    }

    #[test]
    fn strings_convert_strictly_to_numbers() {
        let codec = codec();
        assert_eq!(
            codec.encode(&AnswerType::integer(), Some(&" 12 ".into())).expect("encode"),
            json!(12)
        );
        assert_eq!(
            codec.encode(&AnswerType::boolean(), Some(&"Yes".into())).expect("encode"),
            json!(true)
        );
        let err = codec
            .encode(&AnswerType::integer(), Some(&"twelve".into()))
            .expect_err("not a number");
        assert!(matches!(err, AnswerError::EncodingMismatch { .. }));
    }

    #[test]
    fn fraction_encodes_as_decimal_or_text() {
        let half = DynamicValue::Fraction(Fraction::new(1, 2).expect("valid"));
        let codec = codec();
        assert_eq!(codec.encode(&AnswerType::decimal(), Some(&half)).expect("encode"), json!(0.5));
        assert_eq!(codec.encode(&AnswerType::string(), Some(&half)).expect("encode"), json!("1/2"));
        let err = codec
            .encode(&AnswerType::integer(), Some(&half))
            .expect_err("fractions are not integers");
        assert!(matches!(err, AnswerError::EncodingMismatch { .. }));
    }

    #[test]
    fn fraction_form_type_post_processes_decoded_values() {
        let fraction = FormDataType::parse("fraction").expect("known");
        let decimal = AnswerType::decimal().with_form_data_type(fraction);
        let decoded = codec().decode(&decimal, &json!(0.25)).expect("decode");
        assert_eq!(decoded, Some(DynamicValue::Fraction(Fraction::new(1, 4).expect("valid"))));

        let text = AnswerType::string().with_form_data_type(fraction);
        let decoded = codec().decode(&text, &json!("3/8")).expect("decode");
        assert_eq!(decoded, Some(DynamicValue::Fraction(Fraction::new(3, 8).expect("valid"))));

        let err = codec().decode(&text, &json!("most")).expect_err("not a fraction");
        assert!(matches!(err, AnswerError::InvalidEncoding { .. }));
    }

    #[test]
    fn fraction_with_unrepresentable_sign_is_invalid() {
        let fraction = FormDataType::parse("fraction").expect("known");
        let text = AnswerType::string().with_form_data_type(fraction);
        let err = codec()
            .decode(&text, &json!("-9223372036854775808/-1"))
            .expect_err("sign flip overflows");
        assert!(matches!(err, AnswerError::InvalidEncoding { .. }));
    }

    #[test]
    fn fraction_round_trip_preserves_value() {
        let fraction = FormDataType::parse("fraction").expect("known");
        let answer_type = AnswerType::decimal().with_form_data_type(fraction);
        let value = DynamicValue::Fraction(Fraction::new(2, 3).expect("valid"));
        let encoded = codec().encode(&answer_type, Some(&value)).expect("encode");
        assert_eq!(codec().decode(&answer_type, &encoded).expect("decode"), Some(value));
    }

    #[test]
    fn codable_requires_structured_values() {
        let structured = json!({"name": "ibuprofen", "count": 2});
        let decoded = codec()
            .decode(&AnswerType::codable(), &structured)
            .expect("decode")
            .expect("non-null");
        assert!(matches!(decoded, DynamicValue::Structured(_)));
        let encoded = codec()
            .encode(&AnswerType::codable(), Some(&decoded))
            .expect("encode");
        assert_eq!(encoded, structured);

        let err = codec()
            .encode(&AnswerType::codable(), Some(&"plain".into()))
            .expect_err("scalars are not codable");
        assert!(matches!(err, AnswerError::EncodingMismatch { .. }));
        let err = codec()
            .decode(&AnswerType::codable(), &json!("plain"))
            .expect_err("expects an object");
        assert!(matches!(err, AnswerError::TypeMismatch { .. }));
    }

    #[test]
    fn delimited_pieces_are_validated() {
        let err = codec()
            .decode(&blood_pressure(), &json!("120/high"))
            .expect_err("second piece is not an integer");
        assert!(matches!(err, AnswerError::InvalidEncoding { path, .. } if path == "$[1]"));
    }

    #[test]
    fn delimited_dates_use_declared_format() {
        let answer_type = AnswerType::date()
            .with_sequence_type(SequenceType::Array)
            .with_sequence_separator(",")
            .with_date_format("yyyy");
        let value = DynamicValue::List(vec![
            date("2018-01-01T00:00:00-07:00").into(),
            date("2019-01-01T00:00:00-07:00").into(),
        ]);
        let encoded = codec().encode(&answer_type, Some(&value)).expect("encode");
        assert_eq!(encoded, json!("2018,2019"));
        assert_eq!(codec().decode(&answer_type, &encoded).expect("decode"), Some(value));
    }

    #[test]
    fn iso_parser_accepts_common_layouts() {
        let zone = RecordedTimeZone::parse("America/Denver").expect("known zone");
        let expected = date("2019-06-04T08:00:00-06:00");
        for raw in [
            "2019-06-04T08:00:00.000-06:00",
            "2019-06-04T08:00:00-06:00",
            "2019-06-04T14:00:00Z",
            "2019-06-04T08:00:00.000-0600",
        ] {
            assert_eq!(parse_iso_date(raw, &zone), Some(expected), "{raw}");
        }
        assert_eq!(
            parse_iso_date("2019-06-04", &zone),
            Some(date("2019-06-04T00:00:00-06:00"))
        );
        assert_eq!(parse_iso_date("yesterday", &zone), None);
    }
}
