use thiserror::Error;

use crate::validation::data::ValidationError;

/// Result type for the fallible edges of the crate (config, JSON input)
pub type RdfResult<T> = Result<T, RdfError>;

/// Errors raised outside the numeric core.
///
/// The generator and solver never fail; these cover configuration files,
/// externally supplied JSON and registry-style updates.
#[derive(Debug, Error)]
pub enum RdfError {
    #[error("failed to read or write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid parameter {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("invalid station: {0}")]
    InvalidStation(#[from] ValidationError),
    #[error("unknown station {0}")]
    UnknownStation(u32),
    #[error("duplicate station id {0}")]
    DuplicateStation(u32),
}

impl RdfError {
    pub fn invalid_parameter(parameter: &str, value: impl ToString, reason: &str) -> Self {
        RdfError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether retrying with different input can succeed
    pub fn is_input_error(&self) -> bool {
        !matches!(self, RdfError::Io { .. })
    }
}
