use thiserror::Error;

/// Failures raised by the date layer and the day generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// A date string is not `YYYY-MM-DD` or names a day that does not exist.
    #[error("invalid date {input:?}: {reason}")]
    Format { input: String, reason: String },

    /// The calendar cannot be built from the supplied configuration.
    #[error("invalid calendar configuration: {0}")]
    Configuration(String),
}

impl CalendarError {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CalendarError>;
