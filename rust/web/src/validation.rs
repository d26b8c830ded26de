use serde::{Deserialize, Serialize};
use solvegate_core::{
    parse_board, parse_range, BetSizing, Board, HandDescriptor, Position, Range, SolverTuning,
};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Inbound body of `POST /solve`, exactly as the caller sent it.
///
/// Everything is optional at this layer so that a missing field is reported
/// by the validator with its name instead of as an opaque decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub oop_range: Option<String>,
    #[serde(default)]
    pub ip_range: Option<String>,
    #[serde(default)]
    pub pot_size: Option<f64>,
    #[serde(default)]
    pub effective_stack: Option<f64>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub bet_sizes: Option<BTreeMap<String, Vec<f64>>>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub max_iterations: Option<i64>,
    #[serde(default)]
    pub thread_count: Option<i64>,
    #[serde(default)]
    pub use_isomorphism: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
}

impl SolveRequest {
    pub fn new(
        board: impl Into<String>,
        oop_range: impl Into<String>,
        ip_range: impl Into<String>,
    ) -> Self {
        Self {
            board: Some(board.into()),
            oop_range: Some(oop_range.into()),
            ip_range: Some(ip_range.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Turns a [`SolveRequest`] into a [`HandDescriptor`].
///
/// Rules run in a fixed order and the first failure is returned: board,
/// ranges (including board overlap), pot and stack, position, bet sizing,
/// tuning. Out-of-bounds tuning values are rejected, never clamped.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    max_time_budget: Duration,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

impl RequestValidator {
    pub fn new(max_time_budget: Duration) -> Self {
        Self { max_time_budget }
    }

    pub fn max_time_budget(&self) -> Duration {
        self.max_time_budget
    }

    pub fn validate(&self, request: &SolveRequest) -> Result<HandDescriptor, ValidationError> {
        let board = validate_board(request.board.as_deref())?;
        let oop_range = validate_range("oop_range", request.oop_range.as_deref(), &board)?;
        let ip_range = validate_range("ip_range", request.ip_range.as_deref(), &board)?;

        let pot_size = positive(
            "pot_size",
            request.pot_size.unwrap_or(HandDescriptor::DEFAULT_POT_SIZE),
        )?;
        let effective_stack = positive(
            "effective_stack",
            request
                .effective_stack
                .unwrap_or(HandDescriptor::DEFAULT_EFFECTIVE_STACK),
        )?;

        let position = match request.position.as_deref() {
            None => Position::Oop,
            Some(text) => text
                .parse::<Position>()
                .map_err(|err| ValidationError::new("position", err.to_string()))?,
        };

        let bet_sizing = match &request.bet_sizes {
            None => None,
            Some(raw) => Some(
                BetSizing::new(raw.iter().map(|(k, v)| (k.as_str(), v.clone())))
                    .map_err(|err| ValidationError::new("bet_sizes", err.to_string()))?,
            ),
        };

        let tuning = validate_tuning(request)?;
        let time_budget = self.validate_budget(request.timeout_secs)?;

        Ok(HandDescriptor {
            board,
            oop_range,
            ip_range,
            pot_size,
            effective_stack,
            position,
            bet_sizing,
            tuning,
            time_budget,
        })
    }

    fn validate_budget(&self, secs: Option<f64>) -> Result<Option<Duration>, ValidationError> {
        let Some(secs) = secs else {
            return Ok(None);
        };
        let max = self.max_time_budget.as_secs_f64();
        if !secs.is_finite() || secs < 1.0 || secs > max {
            return Err(ValidationError::new(
                "timeout_secs",
                format!("must be between 1 and {max} seconds"),
            ));
        }
        Ok(Some(Duration::from_secs_f64(secs)))
    }
}

/// Validates with the default limits.
pub fn validate(request: &SolveRequest) -> Result<HandDescriptor, ValidationError> {
    RequestValidator::default().validate(request)
}

fn validate_board(raw: Option<&str>) -> Result<Board, ValidationError> {
    let raw = required("board", raw)?;
    parse_board(raw).map_err(|err| ValidationError::new("board", err.to_string()))
}

fn validate_range(
    field: &'static str,
    raw: Option<&str>,
    board: &Board,
) -> Result<Range, ValidationError> {
    let raw = required(field, raw)?;
    let range = parse_range(raw).map_err(|err| ValidationError::new(field, err.to_string()))?;
    if !range.has_weight() {
        return Err(ValidationError::new(field, "range carries no weight"));
    }
    if let Some(label) = range.first_unreachable(board) {
        return Err(ValidationError::new(
            field,
            format!("combo {label} overlaps the board {board}"),
        ));
    }
    Ok(range)
}

fn required<'a>(field: &'static str, raw: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match raw {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ValidationError::new(field, format!("{field} is required"))),
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::new(
            field,
            format!("must be a positive number, got {value}"),
        ))
    }
}

fn validate_tuning(request: &SolveRequest) -> Result<SolverTuning, ValidationError> {
    let defaults = SolverTuning::default();

    let accuracy = request.accuracy.unwrap_or(defaults.accuracy);
    if !accuracy.is_finite() || accuracy <= 0.0 || accuracy > SolverTuning::MAX_ACCURACY {
        return Err(ValidationError::new(
            "accuracy",
            format!(
                "must be greater than 0 and at most {}",
                SolverTuning::MAX_ACCURACY
            ),
        ));
    }

    let max_iterations = bounded_count(
        "max_iterations",
        request.max_iterations,
        defaults.max_iterations,
        SolverTuning::MAX_ITERATIONS,
    )?;
    let thread_count = bounded_count(
        "thread_count",
        request.thread_count,
        defaults.thread_count,
        SolverTuning::MAX_THREADS,
    )?;

    Ok(SolverTuning {
        accuracy,
        max_iterations,
        thread_count,
        use_isomorphism: request.use_isomorphism.unwrap_or(defaults.use_isomorphism),
    })
}

fn bounded_count(
    field: &'static str,
    raw: Option<i64>,
    default: u32,
    max: u32,
) -> Result<u32, ValidationError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match u32::try_from(value) {
        Ok(v) if (1..=max).contains(&v) => Ok(v),
        _ => Err(ValidationError::new(
            field,
            format!("must be between 1 and {max}, got {value}"),
        )),
    }
}
