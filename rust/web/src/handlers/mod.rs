pub mod health;
pub mod solve;

pub use health::{health, metrics, reresolve, root, HealthBody};
pub use solve::{solve, SolveResponse};
