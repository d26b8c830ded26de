use crate::cards::{parse_card, Card};
use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Betting round implied by the number of community cards.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Flop,
    Turn,
    River,
}

impl Street {
    pub fn as_str(self) -> &'static str {
        match self {
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
        }
    }
}

/// Community cards: 3 (flop), 4 (turn) or 5 (river) unique cards, kept in
/// the order they were given.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Board {
    cards: Vec<Card>,
}

impl Board {
    pub const MIN_CARDS: usize = 3;
    pub const MAX_CARDS: usize = 5;

    pub fn new(cards: Vec<Card>) -> Result<Self, DomainError> {
        let input = cards
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Self::checked(cards, &input)
    }

    fn checked(cards: Vec<Card>, input: &str) -> Result<Self, DomainError> {
        if !(Self::MIN_CARDS..=Self::MAX_CARDS).contains(&cards.len()) {
            return Err(DomainError::board(
                input,
                format!("board must have 3-5 cards, got {}", cards.len()),
            ));
        }
        for (i, card) in cards.iter().enumerate() {
            if cards[..i].contains(card) {
                return Err(DomainError::board(input, format!("duplicate card {card}")));
            }
        }
        Ok(Self { cards })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    pub fn street(&self) -> Street {
        match self.cards.len() {
            3 => Street::Flop,
            4 => Street::Turn,
            _ => Street::River,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{card}")?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_board(s)
    }
}

impl TryFrom<String> for Board {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_board(&value)
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}

/// Parses a comma-separated board such as `Qs,Jh,2h`.
///
/// Whitespace around each card is ignored; empty tokens are not.
pub fn parse_board(input: &str) -> Result<Board, DomainError> {
    if input.trim().is_empty() {
        return Err(DomainError::board(input, "board is empty"));
    }
    let cards = input
        .split(',')
        .map(|token| {
            parse_card(token.trim()).map_err(|err| DomainError::board(input, err.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Board::checked(cards, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    #[test]
    fn street_follows_card_count() {
        assert_eq!(parse_board("Qs,Jh,2h").unwrap().street(), Street::Flop);
        assert_eq!(parse_board("Qs,Jh,2h,8c").unwrap().street(), Street::Turn);
        assert_eq!(
            parse_board("Qs,Jh,2h,8c,3d").unwrap().street(),
            Street::River
        );
    }

    #[test]
    fn tolerates_whitespace_between_cards() {
        let board = parse_board(" Qs , jh,2H ").expect("parse");
        assert_eq!(board.to_string(), "Qs,Jh,2h");
        assert!(board.contains(&Card::new(Rank::Jack, Suit::Hearts)));
    }

    #[test]
    fn rejects_wrong_lengths_and_duplicates() {
        assert!(parse_board("").is_err());
        assert!(parse_board("Qs,Jh").is_err());
        assert!(parse_board("Qs,Jh,2h,8c,3d,4d").is_err());
        assert!(parse_board("Qs,Jh,Qs").is_err());
        assert!(parse_board("Qs,,2h").is_err());
    }

    #[test]
    fn serde_uses_the_canonical_string() {
        let board = parse_board("Kh,7s,2d").unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, "\"Kh,7s,2d\"");
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }
}
