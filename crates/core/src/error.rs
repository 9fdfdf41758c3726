use answers::AnswerError;
use datatrack_types::TypesError;
use tracking::TrackingError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("answer error: {0}")]
    Answer(#[from] AnswerError),

    #[error("tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("invalid value: {0}")]
    Types(#[from] TypesError),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
