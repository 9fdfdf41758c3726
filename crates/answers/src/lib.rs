//! Answer descriptors and the answer value codec.
//!
//! A form field declares what kind of value it collects. This crate turns that declaration
//! into an [`AnswerType`] and uses it to move values between their dynamic in-memory form
//! ([`DynamicValue`]) and the JSON stored in results and client data.
//!
//! The codec is an explicit value ([`AnswerCodec`]) carrying the time zone used for
//! formatted dates; there is no process-wide registry.

mod answer_type;
mod codec;
mod date_format;
mod form_data_type;
mod result;
mod value;

pub use answer_type::{AnswerShape, AnswerType, BaseType, SequenceType};
pub use codec::AnswerCodec;
pub use date_format::DateFormat;
pub use form_data_type::{
    AnswerTypeFactory, CollectionKind, FieldOptions, FormBaseType, FormDataType, MeasurementKind,
};
pub use result::AnswerResult;
pub use value::{DynamicValue, Fraction};

use thiserror::Error;

/// Errors returned while resolving, encoding or decoding answers.
///
/// Every value-level variant names the JSON path (`$`, `$[2]`, `$.systolic`) at which the
/// problem was found.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The runtime value cannot be represented by the declared answer type.
    #[error("cannot encode {value} as {base_type} at {path}")]
    EncodingMismatch {
        path: String,
        value: String,
        base_type: BaseType,
    },

    /// The stored JSON is structurally right but its content is corrupt.
    #[error("invalid encoding at {path}: {reason}")]
    InvalidEncoding { path: String, reason: String },

    #[error("could not parse date '{value}' at {path} using {format}")]
    DateParseError {
        path: String,
        value: String,
        format: String,
    },

    #[error("type mismatch at {path}: expected {expected}")]
    TypeMismatch { path: String, expected: String },

    #[error("invalid answer type: {0}")]
    InvalidAnswerType(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AnswersResult<T> = Result<T, AnswerError>;
