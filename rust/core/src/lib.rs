//! # solvegate-core: Poker Hand Descriptor Model
//!
//! Pure data types and parsers for describing a postflop spot to an external
//! solving engine. Nothing in this crate performs I/O.
//!
//! ## Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and `<rank><suit>` parsing
//! - [`board`] - Flop/turn/river boards of 3-5 unique cards
//! - [`range`] - Weighted hand ranges and combo labels
//! - [`betting`] - Bet sizing per street and action
//! - [`descriptor`] - Position, tuning parameters and the validated [`descriptor::HandDescriptor`]
//! - [`errors`] - Parse and construction errors
//!
//! ## Quick Start
//!
//! ```rust
//! use solvegate_core::board::parse_board;
//! use solvegate_core::range::parse_range;
//!
//! let board = parse_board("Qs,Jh,2h").unwrap();
//! assert_eq!(board.to_string(), "Qs,Jh,2h");
//!
//! let range = parse_range("AA,KK,QQ:0.5,AKs").unwrap();
//! assert!(range.first_unreachable(&board).is_none());
//! ```

pub mod betting;
pub mod board;
pub mod cards;
pub mod descriptor;
pub mod errors;
pub mod range;

pub use betting::{BetAction, BetKey, BetSizing};
pub use board::{parse_board, Board, Street};
pub use cards::{parse_card, Card, Rank, Suit};
pub use descriptor::{HandDescriptor, Position, SolverTuning};
pub use errors::DomainError;
pub use range::{parse_range, ComboLabel, Range, RangeEntry};
