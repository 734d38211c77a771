use thiserror::Error;

/// Problems with the uploaded document itself, detected before any filtering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("The uploaded file is empty or invalid")]
    EmptyOrInvalid,

    #[error("\"{0}\" column not found in the file")]
    MissingColumn(String),

    #[error("Invalid numeric value '{value}' at row {row}")]
    InvalidValue { row: usize, value: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Input series is empty")]
    EmptySeries,

    #[error("Input series contains a non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error(
        "Insufficient data for requested wavelet depth: {len} samples support at most level {max_level} with {wavelet}, requested {level}"
    )]
    Decomposition {
        len: usize,
        level: usize,
        max_level: usize,
        wavelet: String,
    },

    #[error("Invalid filter configuration: {0}")]
    Configuration(String),

    #[error("Series length {len} is too short for zero-phase filtering, need at least {min} samples")]
    InsufficientLength { len: usize, min: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used at the request boundary to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Decomposition,
    Configuration,
    InsufficientLength,
    Internal,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Input(_) | PipelineError::EmptySeries | PipelineError::NonFinite { .. } => {
                ErrorKind::Input
            }
            PipelineError::Decomposition { .. } => ErrorKind::Decomposition,
            PipelineError::Configuration(_) => ErrorKind::Configuration,
            PipelineError::InsufficientLength { .. } => ErrorKind::InsufficientLength,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure was caused by the caller's data rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Configuration | ErrorKind::Internal)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
