use crate::betting::BetSizing;
use crate::board::Board;
use crate::errors::DomainError;
use crate::range::Range;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which side the solve is run for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Out of position
    Oop,
    /// In position
    Ip,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Oop => "oop",
            Position::Ip => "ip",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oop" => Ok(Position::Oop),
            "ip" => Ok(Position::Ip),
            _ => Err(DomainError::InvalidPosition(s.to_string())),
        }
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverTuning {
    /// Target exploitability, in percent of the pot.
    pub accuracy: f64,
    pub max_iterations: u32,
    pub thread_count: u32,
    pub use_isomorphism: bool,
}

impl SolverTuning {
    pub const DEFAULT_ACCURACY: f64 = 0.3;
    pub const DEFAULT_MAX_ITERATIONS: u32 = 200;
    pub const DEFAULT_THREAD_COUNT: u32 = 4;

    pub const MAX_ACCURACY: f64 = 100.0;
    pub const MAX_ITERATIONS: u32 = 100_000;
    pub const MAX_THREADS: u32 = 256;
}

impl Default for SolverTuning {
    fn default() -> Self {
        Self {
            accuracy: Self::DEFAULT_ACCURACY,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            thread_count: Self::DEFAULT_THREAD_COUNT,
            use_isomorphism: true,
        }
    }
}

/// A fully validated solve request.
///
/// Instances come out of request validation and are never modified
/// afterwards; the invoker consumes them by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct HandDescriptor {
    pub board: Board,
    pub oop_range: Range,
    pub ip_range: Range,
    pub pot_size: f64,
    pub effective_stack: f64,
    pub position: Position,
    pub bet_sizing: Option<BetSizing>,
    pub tuning: SolverTuning,
    /// Caller-requested time budget; `None` means the service default.
    pub time_budget: Option<Duration>,
}

impl HandDescriptor {
    pub const DEFAULT_POT_SIZE: f64 = 10.0;
    pub const DEFAULT_EFFECTIVE_STACK: f64 = 95.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_parses_case_insensitively() {
        assert_eq!("OOP".parse::<Position>().unwrap(), Position::Oop);
        assert_eq!(" ip ".parse::<Position>().unwrap(), Position::Ip);
        assert_eq!(
            "btn".parse::<Position>().unwrap_err(),
            DomainError::InvalidPosition("btn".into())
        );
    }

    #[test]
    fn tuning_defaults() {
        let tuning = SolverTuning::default();
        assert_eq!(tuning.accuracy, 0.3);
        assert_eq!(tuning.max_iterations, 200);
        assert_eq!(tuning.thread_count, 4);
        assert!(tuning.use_isomorphism);
    }
}
