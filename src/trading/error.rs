use thiserror::Error;

/// Error code the Trading API returns once the daily call allowance is used up
const CALL_LIMIT_ERROR_CODE: &str = "518";

const RATE_LIMIT_PHRASES: &[&str] = &["rate limit", "call limit", "usage limit", "too many requests"];

/// One `<Errors>` entry from a response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorEntry {
    pub code: String,
    pub severity: String,
    pub short_message: String,
    pub long_message: String,
}

impl ErrorEntry {
    fn is_rate_limited(&self) -> bool {
        if self.code == CALL_LIMIT_ERROR_CODE {
            return true;
        }
        let text = format!("{} {}", self.short_message, self.long_message).to_lowercase();
        RATE_LIMIT_PHRASES.iter().any(|phrase| text.contains(phrase))
    }
}

/// Failures talking to the selling API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("API error {code}: {short_message} ({long_message})")]
    Api {
        code: String,
        short_message: String,
        long_message: String,
        /// Every entry the response carried, warnings included
        entries: Vec<ErrorEntry>,
    },
}

impl ApiError {
    pub fn api(
        code: impl Into<String>,
        short_message: impl Into<String>,
        long_message: impl Into<String>,
    ) -> Self {
        let entry = ErrorEntry {
            code: code.into(),
            severity: "Error".to_string(),
            short_message: short_message.into(),
            long_message: long_message.into(),
        };
        Self::from_entries(vec![entry])
    }

    /// Report the first `Error`-severity entry, or the first entry when none is marked so
    pub fn from_entries(entries: Vec<ErrorEntry>) -> Self {
        let primary = entries
            .iter()
            .find(|e| e.severity.eq_ignore_ascii_case("Error"))
            .or_else(|| entries.first())
            .cloned()
            .unwrap_or_default();
        ApiError::Api {
            code: primary.code,
            short_message: primary.short_message,
            long_message: primary.long_message,
            entries,
        }
    }

    /// True when the API reported that the caller is being throttled, in any of its entries
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::Api { entries, .. } => entries.iter().any(ErrorEntry::is_rate_limited),
            ApiError::Status(status) => *status == reqwest::StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }

    /// Transport and HTTP status failures are always retried, API failures only when throttled
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Status(_) => true,
            ApiError::Api { .. } => self.is_rate_limited(),
            ApiError::Malformed(_) => false,
        }
    }
}
