//! Password generator over a configurable union of character classes.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

pub const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,./<>?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    Upper,
    Lower,
    Digit,
    Symbol,
}

impl CharClass {
    pub const ALL: [CharClass; 4] = [CharClass::Upper, CharClass::Lower, CharClass::Digit, CharClass::Symbol];

    pub fn charset(self) -> &'static str {
        match self {
            CharClass::Upper => UPPER,
            CharClass::Lower => LOWER,
            CharClass::Digit => DIGITS,
            CharClass::Symbol => SYMBOLS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CharClass::Upper => "Uppercase (A-Z)",
            CharClass::Lower => "Lowercase (a-z)",
            CharClass::Digit => "Numbers (0-9)",
            CharClass::Symbol => "Symbols (!@#$)",
        }
    }
}

/// Desired length plus enabled classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub length: usize,
    upper: bool,
    lower: bool,
    digit: bool,
    symbol: bool,
}

impl PasswordPolicy {
    /// All classes enabled.
    pub fn new(length: usize) -> Self {
        Self { length, upper: true, lower: true, digit: true, symbol: true }
    }

    /// No class enabled; add some with [`with_class`](Self::with_class).
    pub fn empty(length: usize) -> Self {
        Self { length, upper: false, lower: false, digit: false, symbol: false }
    }

    pub fn with_class(mut self, class: CharClass) -> Self {
        self.set(class, true);
        self
    }

    pub fn is_enabled(&self, class: CharClass) -> bool {
        match class {
            CharClass::Upper => self.upper,
            CharClass::Lower => self.lower,
            CharClass::Digit => self.digit,
            CharClass::Symbol => self.symbol,
        }
    }

    pub fn set(&mut self, class: CharClass, enabled: bool) {
        match class {
            CharClass::Upper => self.upper = enabled,
            CharClass::Lower => self.lower = enabled,
            CharClass::Digit => self.digit = enabled,
            CharClass::Symbol => self.symbol = enabled,
        }
    }

    pub fn toggle(&mut self, class: CharClass) {
        let enabled = self.is_enabled(class);
        self.set(class, !enabled);
    }

    /// Concatenation of the enabled classes, in fixed class order.
    pub fn charset(&self) -> Vec<char> {
        CharClass::ALL
            .iter()
            .filter(|c| self.is_enabled(**c))
            .flat_map(|c| c.charset().chars())
            .collect()
    }
}

/// Build a password by drawing each position uniformly from the full charset.
///
/// Individual classes are not guaranteed to appear.
pub fn generate_password<R: Rng + ?Sized>(policy: &PasswordPolicy, rng: &mut R) -> GridResult<String> {
    let charset = policy.charset();
    if charset.is_empty() {
        return Err(GridError::EmptyCharset);
    }
    Ok((0..policy.length)
        .map(|_| charset[rng.gen_range(0..charset.len())])
        .collect())
}
