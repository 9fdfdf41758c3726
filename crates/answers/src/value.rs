use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Default ISO 8601 token for dates without a declared format.
pub(crate) const ISO_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// A dynamically typed answer value.
#[derive(Clone, Debug, PartialEq)]
pub enum DynamicValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Date(DateTime<FixedOffset>),
    Data(Vec<u8>),
    Fraction(Fraction),
    List(Vec<DynamicValue>),
    Map(BTreeMap<String, DynamicValue>),
    /// An opaque structured object kept as JSON.
    Structured(Map<String, Value>),
}

impl DynamicValue {
    /// Reads a generic JSON value using its natural kind.
    ///
    /// Returns `None` for `null`; nulls nested inside arrays and objects are skipped.
    pub fn from_json(json: &Value) -> Option<Self> {
        match json {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Double)),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(items) => Some(Self::List(items.iter().filter_map(Self::from_json).collect())),
            Value::Object(map) => Some(Self::Map(
                map.iter()
                    .filter_map(|(key, value)| Self::from_json(value).map(|v| (key.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// The natural JSON form of this value, independent of any answer type.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Date(date) => Value::String(date.format(ISO_DATE_FORMAT).to_string()),
            Self::Data(bytes) => Value::String(STANDARD.encode(bytes)),
            Self::Fraction(fraction) => {
                Number::from_f64(fraction.to_f64()).map_or(Value::Null, Value::Number)
            }
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Self::Structured(map) => Value::Object(map.clone()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Data(_) => "data",
            Self::Fraction(_) => "fraction",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Structured(_) => "structured object",
        }
    }

    /// The plain text form of a scalar value; `None` for collections.
    pub fn natural_string(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Double(d) => Some(d.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Date(date) => Some(date.format(ISO_DATE_FORMAT).to_string()),
            Self::Data(bytes) => Some(STANDARD.encode(bytes)),
            Self::Fraction(fraction) => Some(fraction.to_string()),
            Self::List(_) | Self::Map(_) | Self::Structured(_) => None,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self.natural_string() {
            Some(text) => format!("{} '{}'", self.kind(), text),
            None => self.kind().to_string(),
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<FixedOffset>> for DynamicValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Date(value)
    }
}

impl From<Fraction> for DynamicValue {
    fn from(value: Fraction) -> Self {
        Self::Fraction(value)
    }
}

/// A rational number kept in lowest terms with a positive denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    const MAX_DENOMINATOR: i64 = 1_000_000;

    /// Returns `None` when `denominator` is zero or the reduced sign flip overflows.
    pub fn new(numerator: i64, denominator: i64) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()).max(1);
        let divisor = i64::try_from(divisor).ok()?;
        let numerator = numerator.checked_div(divisor)?;
        let denominator = denominator.checked_div(divisor)?;
        if denominator < 0 {
            return Some(Self {
                numerator: numerator.checked_neg()?,
                denominator: denominator.checked_neg()?,
            });
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    /// Approximates a finite double by continued fractions.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > i64::MAX as f64 {
            return None;
        }

        let (mut prev_num, mut num) = (0_i64, 1_i64);
        let (mut prev_den, mut den) = (1_i64, 0_i64);
        let mut remainder = value;
        for _ in 0..64 {
            let whole = remainder.floor();
            let term = whole as i64;
            let next_num = term.checked_mul(num)?.checked_add(prev_num)?;
            let next_den = term.checked_mul(den)?.checked_add(prev_den)?;
            if next_den > Self::MAX_DENOMINATOR {
                break;
            }
            (prev_num, num) = (num, next_num);
            (prev_den, den) = (den, next_den);

            let fractional = remainder - whole;
            if fractional.abs() < 1e-12 || (num as f64 / den as f64 - value).abs() < 1e-12 {
                break;
            }
            remainder = 1.0 / fractional;
        }
        Self::new(num, den)
    }

    /// Parses `"3/4"`, `"-1 / 2"` or a plain decimal such as `"0.75"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.split_once('/') {
            Some((numerator, denominator)) => Self::new(
                numerator.trim().parse().ok()?,
                denominator.trim().parse().ok()?,
            ),
            None => Self::from_f64(raw.parse().ok()?),
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
