use thiserror::Error;

/// Rejections produced while parsing or constructing domain values.
///
/// Every variant names the offending token so callers can point the user at
/// the exact piece of input that failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid card `{token}`: {reason}")]
    InvalidCard { token: String, reason: String },
    #[error("invalid board `{input}`: {reason}")]
    InvalidBoard { input: String, reason: String },
    #[error("invalid range token `{token}`: {reason}")]
    InvalidRange { token: String, reason: String },
    #[error("invalid bet sizing `{key}`: {reason}")]
    InvalidBetSizing { key: String, reason: String },
    #[error("invalid position `{0}` (expected `oop` or `ip`)")]
    InvalidPosition(String),
}

impl DomainError {
    pub(crate) fn card(token: &str, reason: impl Into<String>) -> Self {
        DomainError::InvalidCard {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn board(input: &str, reason: impl Into<String>) -> Self {
        DomainError::InvalidBoard {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn range(token: &str, reason: impl Into<String>) -> Self {
        DomainError::InvalidRange {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn bet_sizing(key: &str, reason: impl Into<String>) -> Self {
        DomainError::InvalidBetSizing {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
