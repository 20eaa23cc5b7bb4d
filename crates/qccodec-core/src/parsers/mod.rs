//! Extraction functions for each supported program.

pub mod crest;
pub mod terachem;

use regex::{Captures, Regex};

use crate::error::ParseError;
use crate::registry::ParseResult;

/// First match of `regex` in `text`, or [`ParseError::NoMatch`].
pub fn re_search<'t>(regex: &Regex, text: &'t str) -> ParseResult<Captures<'t>> {
    regex
        .captures(text)
        .ok_or_else(|| ParseError::no_match(regex.as_str()))
}

/// Every match of `regex` in `text`, or [`ParseError::NoMatch`] when there is none.
pub fn re_find_all<'t>(regex: &Regex, text: &'t str) -> ParseResult<Vec<Captures<'t>>> {
    let all: Vec<_> = regex.captures_iter(text).collect();
    if all.is_empty() {
        return Err(ParseError::no_match(regex.as_str()));
    }
    Ok(all)
}

/// Parse a float token.
pub(crate) fn parse_f64(token: &str) -> ParseResult<f64> {
    token
        .trim()
        .parse()
        .map_err(|_| ParseError::Malformed(format!("'{}' is not a number", token.trim())))
}

/// Parse an unsigned integer token.
pub(crate) fn parse_u64(token: &str) -> ParseResult<u64> {
    token
        .trim()
        .parse()
        .map_err(|_| ParseError::Malformed(format!("'{}' is not an integer", token.trim())))
}

/// Parse every whitespace separated float in `text`.
pub(crate) fn parse_floats(text: &str) -> ParseResult<Vec<f64>> {
    text.split_whitespace().map(parse_f64).collect()
}

/// Group a flat list of values into rows of three (x, y, z).
pub(crate) fn chunk_xyz(values: &[f64]) -> ParseResult<Vec<Vec<f64>>> {
    if values.len() % 3 != 0 {
        return Err(ParseError::Malformed(format!(
            "{} values cannot be grouped into xyz rows",
            values.len()
        )));
    }
    Ok(values.chunks(3).map(<[f64]>::to_vec).collect())
}
