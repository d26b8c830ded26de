//! Process exit codes.

pub const SUCCESS: i32 = 0;

/// Any failure: bad arguments, invalid configuration, or a failed solve.
pub const ERROR: i32 = 2;

/// Interrupted by Ctrl+C before the command finished.
pub const INTERRUPTED: i32 = 130;
