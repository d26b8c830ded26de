//! Error type shared by all subcommands.

use solvegate_web::{ConfigError, ServerError, SolveError};
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    /// I/O error (request file, stdout/stderr writes, runtime setup)
    Io(std::io::Error),

    /// Invalid user input or command-line arguments
    InvalidInput(String),

    Config(ConfigError),

    Server(ServerError),

    /// The solve pipeline failed; carries the full diagnostic.
    Solve(SolveError),

    /// Diagnostics found a problem; the report has already been printed.
    Unhealthy(String),

    /// Operation was interrupted (e.g., by user with Ctrl+C)
    Interrupted(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Server(e) => write!(f, "Server error: {}", e),
            CliError::Solve(e) => write!(f, "Solve failed: {}", e),
            CliError::Unhealthy(msg) => write!(f, "{}", msg),
            CliError::Interrupted(msg) => write!(f, "Interrupted: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Server(e) => Some(e),
            CliError::Solve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::Config(error)
    }
}

impl From<ServerError> for CliError {
    fn from(error: ServerError) -> Self {
        CliError::Server(error)
    }
}

impl From<SolveError> for CliError {
    fn from(error: SolveError) -> Self {
        CliError::Solve(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_prefixes_by_kind() {
        let err = CliError::InvalidInput("--board is required".into());
        assert_eq!(err.to_string(), "Invalid input: --board is required");

        let err = CliError::from(std::io::Error::other("disk full"));
        assert!(err.to_string().starts_with("I/O error"));
        assert!(err.source().is_some());
    }
}
