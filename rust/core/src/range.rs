use crate::board::Board;
use crate::cards::{all_suits, parse_card, Card, Rank};
use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A two-card starting-hand descriptor.
///
/// Class labels (`QQ`, `AKs`, `AKo`, `AK`) are stored high rank first, so
/// `KA` and `AK` are the same label. A specific combo (`KhKs`) is stored
/// with the higher card first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComboLabel {
    Pair(Rank),
    Suited(Rank, Rank),
    Offsuit(Rank, Rank),
    Any(Rank, Rank),
    Specific(Card, Card),
}

impl ComboLabel {
    /// Every concrete card pair this label stands for.
    pub fn combos(&self) -> Vec<(Card, Card)> {
        let suits = all_suits();
        let mut out = Vec::new();
        match *self {
            ComboLabel::Pair(rank) => {
                for (i, &a) in suits.iter().enumerate() {
                    for &b in &suits[i + 1..] {
                        out.push((Card::new(rank, b), Card::new(rank, a)));
                    }
                }
            }
            ComboLabel::Suited(high, low) => {
                for &s in &suits {
                    out.push((Card::new(high, s), Card::new(low, s)));
                }
            }
            ComboLabel::Offsuit(high, low) => {
                for &a in &suits {
                    for &b in &suits {
                        if a != b {
                            out.push((Card::new(high, a), Card::new(low, b)));
                        }
                    }
                }
            }
            ComboLabel::Any(high, low) => {
                out.extend(ComboLabel::Suited(high, low).combos());
                out.extend(ComboLabel::Offsuit(high, low).combos());
            }
            ComboLabel::Specific(a, b) => out.push((a, b)),
        }
        out
    }

    /// True when at least one combo of the label avoids every board card.
    pub fn is_reachable(&self, board: &Board) -> bool {
        self.combos()
            .iter()
            .any(|(a, b)| !board.contains(a) && !board.contains(b))
    }
}

impl fmt::Display for ComboLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComboLabel::Pair(r) => write!(f, "{0}{0}", r.to_char()),
            ComboLabel::Suited(h, l) => write!(f, "{}{}s", h.to_char(), l.to_char()),
            ComboLabel::Offsuit(h, l) => write!(f, "{}{}o", h.to_char(), l.to_char()),
            ComboLabel::Any(h, l) => write!(f, "{}{}", h.to_char(), l.to_char()),
            ComboLabel::Specific(a, b) => write!(f, "{a}{b}"),
        }
    }
}

impl FromStr for ComboLabel {
    type Err = DomainError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        parse_label(token)
    }
}

impl TryFrom<String> for ComboLabel {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_label(&value)
    }
}

impl From<ComboLabel> for String {
    fn from(label: ComboLabel) -> Self {
        label.to_string()
    }
}

fn parse_label(token: &str) -> Result<ComboLabel, DomainError> {
    let chars: Vec<char> = token.chars().collect();
    match chars.as_slice() {
        [a, b] => {
            let (high, low) = two_ranks(token, *a, *b)?;
            if high == low {
                Ok(ComboLabel::Pair(high))
            } else {
                Ok(ComboLabel::Any(high, low))
            }
        }
        [a, b, suffix] => {
            let (high, low) = two_ranks(token, *a, *b)?;
            if high == low {
                return Err(DomainError::range(
                    token,
                    "pairs cannot be suited or offsuit",
                ));
            }
            match suffix {
                's' | 'S' => Ok(ComboLabel::Suited(high, low)),
                'o' | 'O' => Ok(ComboLabel::Offsuit(high, low)),
                other => Err(DomainError::range(
                    token,
                    format!("unknown suffix `{other}` (expected `s` or `o`)"),
                )),
            }
        }
        [r1, s1, r2, s2] => {
            let first: String = [*r1, *s1].iter().collect();
            let second: String = [*r2, *s2].iter().collect();
            let a = parse_card(&first).map_err(|e| DomainError::range(token, e.to_string()))?;
            let b = parse_card(&second).map_err(|e| DomainError::range(token, e.to_string()))?;
            if a == b {
                return Err(DomainError::range(token, "combo repeats the same card"));
            }
            let (high, low) = if (a.rank, a.suit) >= (b.rank, b.suit) {
                (a, b)
            } else {
                (b, a)
            };
            Ok(ComboLabel::Specific(high, low))
        }
        _ => Err(DomainError::range(
            token,
            "expected a combo such as `AA`, `AKs`, `AKo`, `AK` or `AhKd`",
        )),
    }
}

fn two_ranks(token: &str, a: char, b: char) -> Result<(Rank, Rank), DomainError> {
    let first = Rank::from_char(a)
        .ok_or_else(|| DomainError::range(token, format!("unknown rank `{a}`")))?;
    let second = Rank::from_char(b)
        .ok_or_else(|| DomainError::range(token, format!("unknown rank `{b}`")))?;
    Ok(if first >= second {
        (first, second)
    } else {
        (second, first)
    })
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub label: ComboLabel,
    pub weight: f64,
}

/// A weighted set of starting hands, in the order they were written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Range {
    entries: Vec<RangeEntry>,
}

impl Range {
    pub fn entries(&self) -> &[RangeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn weight_of(&self, label: &ComboLabel) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| &entry.label == label)
            .map(|entry| entry.weight)
    }

    /// False when every entry carries a zero weight.
    pub fn has_weight(&self) -> bool {
        self.entries.iter().any(|entry| entry.weight > 0.0)
    }

    /// Total number of concrete card pairs named by the range.
    pub fn combo_count(&self) -> usize {
        self.entries.iter().map(|e| e.label.combos().len()).sum()
    }

    /// First label that no longer has a live combo on `board`.
    pub fn first_unreachable(&self, board: &Board) -> Option<ComboLabel> {
        self.entries
            .iter()
            .map(|entry| entry.label)
            .find(|label| !label.is_reachable(board))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if entry.weight == 1.0 {
                write!(f, "{}", entry.label)?;
            } else {
                write!(f, "{}:{}", entry.label, entry.weight)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Range {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_range(s)
    }
}

impl TryFrom<String> for Range {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_range(&value)
    }
}

impl From<Range> for String {
    fn from(range: Range) -> Self {
        range.to_string()
    }
}

/// Parses a range string such as `AA,KK,QQ:0.5,AKs`.
///
/// A bare label has weight 1. Weights outside `[0, 1]` are rejected rather
/// than clamped, as are duplicate labels.
pub fn parse_range(input: &str) -> Result<Range, DomainError> {
    if input.trim().is_empty() {
        return Err(DomainError::range(input, "range is empty"));
    }

    let mut entries: Vec<RangeEntry> = Vec::new();
    for raw in input.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            return Err(DomainError::range(raw, "empty entry"));
        }

        let (label_text, weight) = match token.split_once(':') {
            Some((label, weight)) => (label.trim(), parse_weight(token, weight.trim())?),
            None => (token, 1.0),
        };
        let label = parse_label(label_text).map_err(|err| match err {
            DomainError::InvalidRange { reason, .. } => DomainError::range(token, reason),
            other => other,
        })?;

        if entries.iter().any(|entry| entry.label == label) {
            return Err(DomainError::range(
                token,
                format!("duplicate label {label}"),
            ));
        }
        entries.push(RangeEntry { label, weight });
    }

    Ok(Range { entries })
}

fn parse_weight(token: &str, text: &str) -> Result<f64, DomainError> {
    let weight: f64 = text
        .parse()
        .map_err(|_| DomainError::range(token, format!("weight `{text}` is not a number")))?;
    if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
        return Err(DomainError::range(token, "weight must be within [0, 1]"));
    }
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::parse_board;
    use crate::cards::Suit;

    #[test]
    fn label_kinds_enumerate_expected_combo_counts() {
        assert_eq!("QQ".parse::<ComboLabel>().unwrap().combos().len(), 6);
        assert_eq!("AKs".parse::<ComboLabel>().unwrap().combos().len(), 4);
        assert_eq!("AKo".parse::<ComboLabel>().unwrap().combos().len(), 12);
        assert_eq!("AK".parse::<ComboLabel>().unwrap().combos().len(), 16);
        assert_eq!("AhKd".parse::<ComboLabel>().unwrap().combos().len(), 1);
    }

    #[test]
    fn class_labels_normalize_high_rank_first() {
        let label: ComboLabel = "ka".parse().unwrap();
        assert_eq!(label, ComboLabel::Any(Rank::Ace, Rank::King));
        assert_eq!(label.to_string(), "AK");
        let label: ComboLabel = "TJs".parse().unwrap();
        assert_eq!(label.to_string(), "JTs");
    }

    #[test]
    fn specific_combo_orders_cards() {
        let label: ComboLabel = "KhKs".parse().unwrap();
        assert_eq!(
            label,
            ComboLabel::Specific(
                Card::new(Rank::King, Suit::Spades),
                Card::new(Rank::King, Suit::Hearts)
            )
        );
        assert_eq!(label.to_string(), "KsKh");
    }

    #[test]
    fn rejects_bad_labels() {
        for bad in ["A", "AAs", "AKx", "AhAh", "XK", "AKso", "Zz9z"] {
            assert!(bad.parse::<ComboLabel>().is_err(), "{bad}");
        }
    }

    #[test]
    fn bare_labels_weigh_one_and_explicit_weights_stick() {
        let range = parse_range("AA, KK,QQ:0.5,AK").unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(range.weight_of(&ComboLabel::Pair(Rank::Ace)), Some(1.0));
        assert_eq!(range.weight_of(&ComboLabel::Pair(Rank::Queen)), Some(0.5));
        assert_eq!(range.to_string(), "AA,KK,QQ:0.5,AK");
        assert_eq!(range.combo_count(), 6 + 6 + 6 + 16);
    }

    #[test]
    fn out_of_range_weight_names_the_token() {
        let err = parse_range("KK,AA:1.5").unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidRange {
                token: "AA:1.5".into(),
                reason: "weight must be within [0, 1]".into(),
            }
        );
        assert!(parse_range("AA:-0.1").is_err());
        assert!(parse_range("AA:abc").is_err());
        assert!(parse_range("AA:NaN").is_err());
    }

    #[test]
    fn rejects_empty_entries_and_duplicates() {
        assert!(parse_range("").is_err());
        assert!(parse_range("AA,,KK").is_err());
        assert!(parse_range("AK,KA").is_err());
    }

    #[test]
    fn reachability_accounts_for_board_cards() {
        let board = parse_board("Kh,7s,2d").unwrap();
        let blocked: ComboLabel = "KhKs".parse().unwrap();
        assert!(!blocked.is_reachable(&board));
        let pair: ComboLabel = "KK".parse().unwrap();
        assert!(pair.is_reachable(&board));

        let trips = parse_board("Kh,Ks,Kd").unwrap();
        assert!(!pair.is_reachable(&trips));

        let range = parse_range("AA,KhKs").unwrap();
        assert_eq!(range.first_unreachable(&board), Some(blocked));
    }
}
