use crate::board::Street;
use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetAction {
    Bet,
    Raise,
    /// Out-of-position lead into the previous street's aggressor.
    Donk,
}

impl BetAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BetAction::Bet => "bet",
            BetAction::Raise => "raise",
            BetAction::Donk => "donk",
        }
    }
}

/// A `<street>-<action>` key such as `flop-bet` or `turn-raise`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BetKey {
    pub street: Street,
    pub action: BetAction,
}

impl fmt::Display for BetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.street.as_str(), self.action.as_str())
    }
}

impl FromStr for BetKey {
    type Err = DomainError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let normalized = key.trim().to_ascii_lowercase();
        let Some((street, action)) = normalized.split_once('-') else {
            return Err(DomainError::bet_sizing(
                key,
                "expected `<street>-<action>`, e.g. `flop-bet`",
            ));
        };
        let street = match street {
            "flop" => Street::Flop,
            "turn" => Street::Turn,
            "river" => Street::River,
            other => {
                return Err(DomainError::bet_sizing(
                    key,
                    format!("unknown street `{other}`"),
                ))
            }
        };
        let action = match action {
            "bet" => BetAction::Bet,
            "raise" => BetAction::Raise,
            "donk" => BetAction::Donk,
            other => {
                return Err(DomainError::bet_sizing(
                    key,
                    format!("unknown action `{other}`"),
                ))
            }
        };
        if street == Street::Flop && action == BetAction::Donk {
            return Err(DomainError::bet_sizing(key, "donk bets start on the turn"));
        }
        Ok(BetKey { street, action })
    }
}

/// Bet sizes per street and action, as fractions of the pot.
///
/// Keys iterate in a fixed order (street, then action) so the engine always
/// receives the same argument vector for the same configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BetSizing {
    sizes: BTreeMap<BetKey, Vec<f64>>,
}

impl BetSizing {
    pub fn new<I, K>(raw: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (K, Vec<f64>)>,
        K: AsRef<str>,
    {
        let mut sizes = BTreeMap::new();
        for (key_text, fractions) in raw {
            let key_text = key_text.as_ref();
            let key: BetKey = key_text.parse()?;
            if fractions.is_empty() {
                return Err(DomainError::bet_sizing(key_text, "at least one size is required"));
            }
            if let Some(bad) = fractions.iter().find(|f| !f.is_finite() || **f <= 0.0) {
                return Err(DomainError::bet_sizing(
                    key_text,
                    format!("size {bad} must be a positive fraction of the pot"),
                ));
            }
            if sizes.insert(key, fractions).is_some() {
                return Err(DomainError::bet_sizing(key_text, "key given more than once"));
            }
        }
        Ok(Self { sizes })
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn get(&self, key: &BetKey) -> Option<&[f64]> {
        self.sizes.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BetKey, &[f64])> {
        self.sizes.iter().map(|(k, v)| (k, v.as_slice()))
    }
}
