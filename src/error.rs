use thiserror::Error;

use crate::domain::SeriesName;

/// Binary-level error: a message plus the process exit code it maps to.
///
/// Exit codes:
/// - `2`: configuration/usage (missing API keys, missing series columns, bad paths)
/// - `3`: no data to display
/// - `4`: runtime failures (network, terminal, agent)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures of the reshaping operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReshapeError {
    /// A requested series has no column in the wide table.
    #[error("Missing series column: `{missing}` ({})", missing.fred_id())]
    Schema { missing: SeriesName },

    /// Nothing to derive an axis range from.
    #[error("No data to display.")]
    InsufficientData,

    /// The wide table itself is malformed.
    #[error("Malformed series table: {reason}")]
    Shape { reason: String },
}

impl From<ReshapeError> for AppError {
    fn from(err: ReshapeError) -> Self {
        let exit_code = match err {
            ReshapeError::Schema { .. } | ReshapeError::Shape { .. } => 2,
            ReshapeError::InsufficientData => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}
