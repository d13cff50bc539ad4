//! Game rules: defaults, bracketed `rules[key]="value"` file loading, validation.

use crate::piece::Ball;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Tunable parameters of a session. Defaults reproduce the reference 6x6 game.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub rows: usize,
    pub cols: usize,
    /// Move budget at session start.
    pub moves: u32,
    /// Probability that a freshly generated piece is a blocker.
    pub blocker_chance: f64,
    /// Number of ball kinds in play (taken from the front of `Ball::ALL`).
    pub kinds: usize,
    pub points_per_piece: u32,
    /// Re-roll budget for building a match-free starting board.
    pub max_init_rerolls: usize,
    /// Safety cap on clear/refill passes per swap.
    pub max_cascade_passes: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 6,
            moves: 64,
            blocker_chance: 0.10,
            kinds: Ball::ALL.len(),
            points_per_piece: 10,
            max_init_rerolls: 10_000,
            max_cascade_passes: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown rule: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("{0}")]
    OutOfRange(String),
    #[error("line {line}: malformed rule {text:?}")]
    Malformed { line: usize, text: String },
}

impl Rules {
    /// Load rules from a file of `rules[key]="value"` lines. Missing path → defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, RulesError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = std::fs::read_to_string(path)?;
        let rules = Self::from_map(&parse_rules_file(&s)?)?;
        rules.validate()?;
        Ok(rules)
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, RulesError> {
        let mut rules = Self::default();
        for (key, value) in map {
            let bad = || RulesError::InvalidValue {
                key: key.clone(),
                value: value.clone(),
            };
            match key.as_str() {
                "rows" => rules.rows = value.parse().map_err(|_| bad())?,
                "cols" => rules.cols = value.parse().map_err(|_| bad())?,
                "moves" => rules.moves = value.parse().map_err(|_| bad())?,
                "blocker_chance" => rules.blocker_chance = value.parse().map_err(|_| bad())?,
                "kinds" => rules.kinds = value.parse().map_err(|_| bad())?,
                "points_per_piece" => rules.points_per_piece = value.parse().map_err(|_| bad())?,
                "max_init_rerolls" => rules.max_init_rerolls = value.parse().map_err(|_| bad())?,
                "max_cascade_passes" => {
                    rules.max_cascade_passes = value.parse().map_err(|_| bad())?;
                }
                _ => return Err(RulesError::UnknownKey(key.clone())),
            }
        }
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(RulesError::OutOfRange(format!(
                "board must have at least one cell, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !(0.0..1.0).contains(&self.blocker_chance) {
            return Err(RulesError::OutOfRange(format!(
                "blocker_chance must be in [0, 1), got {}",
                self.blocker_chance
            )));
        }
        if self.kinds == 0 || self.kinds > Ball::ALL.len() {
            return Err(RulesError::OutOfRange(format!(
                "kinds must be 1..={}, got {}",
                Ball::ALL.len(),
                self.kinds
            )));
        }
        if self.max_init_rerolls == 0 || self.max_cascade_passes == 0 {
            return Err(RulesError::OutOfRange(
                "re-roll and cascade caps must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Ball kinds in play.
    pub fn palette(&self) -> &'static [Ball] {
        &Ball::ALL[..self.kinds.clamp(1, Ball::ALL.len())]
    }
}

/// Parse `rules[key]="value"` lines into key -> value. Quotes are optional; lines not
/// starting with `rules[` are ignored, but a `rules[` line must be complete.
fn parse_rules_file(s: &str) -> Result<HashMap<String, String>, RulesError> {
    let mut map = HashMap::new();
    for (i, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("rules[") else {
            continue;
        };
        let malformed = || RulesError::Malformed {
            line: i + 1,
            text: line.to_string(),
        };
        let end = stripped.find(']').ok_or_else(malformed)?;
        let key = stripped[..end].trim();
        let value = stripped[end + 1..]
            .trim()
            .strip_prefix('=')
            .ok_or_else(malformed)?
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .trim();
        if key.is_empty() || value.is_empty() {
            return Err(malformed());
        }
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}
