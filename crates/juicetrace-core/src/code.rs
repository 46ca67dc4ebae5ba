//! Package code parsing.
//!
//! A package code is two whitespace-separated tokens:
//!
//! ```text
//! L<line>T<tank> <month>/<day>/<yy>
//! ```
//!
//! e.g. `L1T5 2/26/26` is line 1, tank 5, expiring 2026-02-26. Month and day
//! take one or two digits, the year exactly two and is read as `20YY`.
//!
//! # Example
//!
//! ```
//! use juicetrace_core::code::parse;
//!
//! let parsed = parse("L1T5 2/26/26").unwrap();
//! assert_eq!(parsed.line, 1);
//! assert_eq!(parsed.tank, 5);
//! assert_eq!(parsed.expiration_date.to_string(), "2026-02-26");
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::model::ParsedCode;

/// Why a package code could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The code is not exactly two tokens.
    #[error("Invalid code format")]
    InvalidFormat,

    /// The first token is not `L<digits>T<digits>`.
    #[error("Invalid line/tank format: expected L<line>T<tank>, got '{0}'")]
    InvalidLineTank(String),

    /// The second token is not `M/D/YY`.
    #[error("Invalid date format: expected M/D/YY, got '{0}'")]
    InvalidDateFormat(String),

    /// The date token names a day that does not exist.
    #[error("Invalid calendar date: '{0}'")]
    InvalidDate(String),
}

const CENTURY: i32 = 2000;

/// Parse a package code into its line, tank and expiration date.
///
/// # Errors
///
/// Each malformed part is reported with its own [`ParseError`] kind.
pub fn parse(code: &str) -> Result<ParsedCode, ParseError> {
    let mut tokens = code.split_whitespace();
    let (Some(line_tank), Some(date), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ParseError::InvalidFormat);
    };

    let (line, tank) = parse_line_tank(line_tank)?;
    let expiration_date = parse_date(date)?;

    Ok(ParsedCode {
        line,
        tank,
        expiration_date,
    })
}

fn parse_line_tank(token: &str) -> Result<(u32, u32), ParseError> {
    let invalid = || ParseError::InvalidLineTank(token.to_string());

    let rest = token.strip_prefix('L').ok_or_else(invalid)?;
    let (line, tank) = rest.split_once('T').ok_or_else(invalid)?;
    let line = parse_digits(line, 1..=usize::MAX).ok_or_else(invalid)?;
    let tank = parse_digits(tank, 1..=usize::MAX).ok_or_else(invalid)?;

    Ok((line, tank))
}

fn parse_date(token: &str) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::InvalidDateFormat(token.to_string());

    let mut parts = token.split('/');
    let (Some(month), Some(day), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let month = parse_digits(month, 1..=2).ok_or_else(invalid)?;
    let day = parse_digits(day, 1..=2).ok_or_else(invalid)?;
    let year = parse_digits(year, 2..=2).ok_or_else(invalid)?;

    // year < 100 here, so the cast is lossless.
    NaiveDate::from_ymd_opt(CENTURY + year as i32, month, day)
        .ok_or_else(|| ParseError::InvalidDate(token.to_string()))
}

/// ASCII digits only, with a length in `len`. `u32::from_str` alone would
/// also accept a leading `+`.
fn parse_digits(s: &str, len: RangeInclusive<usize>) -> Option<u32> {
    if !len.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for ParsedCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for ParsedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L{}T{} {}/{}/{:02}",
            self.line,
            self.tank,
            self.expiration_date.month(),
            self.expiration_date.day(),
            self.expiration_date.year().rem_euclid(100)
        )
    }
}
