//! Error types for CropSense

/// Result type alias using CropSense's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for CropSense operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-range input record
    #[error("validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// A model artifact is missing or incompatible
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Invalid evaluation parameter (e.g. zero runs)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// One evaluation axis failed while the others completed
    #[error("partial evaluation: {axis} axis failed: {message}")]
    PartialEvaluation { axis: String, message: String },

    /// Model inference errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new validation error for a named field
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a new model-unavailable error
    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new invalid-parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new partial-evaluation error
    pub fn partial(axis: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::PartialEvaluation {
            axis: axis.into(),
            message: msg.into(),
        }
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::PartialEvaluation { .. } => "partial_evaluation",
            Self::Classifier(_) => "classifier_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
            Self::Timeout => "timeout",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller supplied bad input (4xx-equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidParameter(_))
    }
}
