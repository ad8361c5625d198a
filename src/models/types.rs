//! Coded values carried by employee records.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::schema::{PERF_RANK_MAX, PERF_RANK_MIN};

/// Why a coded value could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeParseError {
    /// The value is empty
    #[error("value is empty")]
    Empty,
    /// The value has the wrong number of characters
    #[error("expected {expected} characters, found {found}")]
    Length {
        /// Required length
        expected: usize,
        /// Actual length
        found: usize,
    },
    /// A character that must be a letter is not
    #[error("'{0}' is not a letter")]
    NotAlphabetic(char),
    /// A character that must be a digit is not
    #[error("'{0}' is not a digit")]
    NotDigit(char),
    /// A number outside its allowed range
    #[error("{value} is outside {min}-{max}")]
    OutOfRange {
        /// Parsed value
        value: u8,
        /// Lowest allowed value
        min: u8,
        /// Highest allowed value
        max: u8,
    },
}

/// Job level code: a role letter followed by a single rank digit, e.g. `M3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JobLevel {
    /// Role category
    pub role: char,
    /// Rank within the role
    pub rank: u8,
}

impl FromStr for JobLevel {
    type Err = CodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        match chars.as_slice() {
            [] => Err(CodeParseError::Empty),
            [role, rank] => {
                if !role.is_alphabetic() {
                    return Err(CodeParseError::NotAlphabetic(*role));
                }
                let rank = rank
                    .to_digit(10)
                    .and_then(|digit| u8::try_from(digit).ok())
                    .ok_or(CodeParseError::NotDigit(*rank))?;
                Ok(Self { role: *role, rank })
            }
            other => Err(CodeParseError::Length {
                expected: 2,
                found: other.len(),
            }),
        }
    }
}

impl fmt::Display for JobLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.role, self.rank)
    }
}

/// Performance rank parsed from the leading digit of a rating such as `3 - Meets`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PerfRank(u8);

impl PerfRank {
    /// Numeric rank
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PerfRank {
    type Error = CodeParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (PERF_RANK_MIN..=PERF_RANK_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CodeParseError::OutOfRange {
                value,
                min: PERF_RANK_MIN,
                max: PERF_RANK_MAX,
            })
        }
    }
}

impl FromStr for PerfRank {
    type Err = CodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s.chars().next().ok_or(CodeParseError::Empty)?;
        let digit = first
            .to_digit(10)
            .and_then(|digit| u8::try_from(digit).ok())
            .ok_or(CodeParseError::NotDigit(first))?;
        Self::try_from(digit)
    }
}
