//! Error types for the candidate screener.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default number of characters kept when quoting offending input.
pub const DEFAULT_EXCERPT_CHARS: usize = 200;

/// Main error type for the candidate screener.
///
/// Classification, filtering and sorting have no variants here: they only
/// consume normalized, nullable values and cannot fail.
#[derive(Error, Debug)]
pub enum Error {
    /// A named resource could not be retrieved.
    #[error("Fetch failed for {resource}: {reason}")]
    Fetch { resource: String, reason: String },

    /// Structured input was malformed beyond best-effort recovery.
    #[error("Parse error in {what}: {message} (near: {excerpt:?})")]
    Parse {
        what: String,
        message: String,
        excerpt: String,
    },

    /// A universe's stats source was unavailable; its records stay unenriched.
    #[error("Missing join source for universe {0}")]
    MissingJoinSource(String),

    /// A gate preset name did not resolve; callers fall back to "off".
    #[error("Unknown gate preset: {0}")]
    InvalidGatePreset(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch(resource: impl Into<String>, reason: impl ToString) -> Self {
        Error::Fetch {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a parse error quoting at most `max_chars` of the input.
    pub fn parse(
        what: impl Into<String>,
        message: impl ToString,
        input: &str,
        max_chars: usize,
    ) -> Self {
        Error::Parse {
            what: what.into(),
            message: message.to_string(),
            excerpt: excerpt(input, max_chars),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

/// Leading slice of `input`, cut on a char boundary, with an ellipsis when truncated.
pub fn excerpt(input: &str, max_chars: usize) -> String {
    let mut chars = input.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}
