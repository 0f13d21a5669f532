//! Selection tokens carried in search-menu buttons.
//!
//! A token is the movie id behind a namespace prefix, so it resolves without any
//! stored state. Other callback payloads sharing the channel must use a different
//! prefix.

use thiserror::Error;

use crate::models::{MovieSummary, SelectionToken};

pub const SELECTION_PREFIX: &str = "movie:";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid selection token: {0:?}")]
pub struct InvalidToken(pub String);

pub fn register(results: &[MovieSummary]) -> Vec<SelectionToken> {
    results
        .iter()
        .map(|movie| SelectionToken {
            token: format!("{SELECTION_PREFIX}{}", movie.id),
            movie_id: movie.id,
        })
        .collect()
}

pub fn resolve(token: &str) -> Result<u64, InvalidToken> {
    let invalid = || InvalidToken(token.to_string());
    let raw_id = token.strip_prefix(SELECTION_PREFIX).ok_or_else(invalid)?;
    if raw_id.is_empty() || !raw_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    match raw_id.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid()),
    }
}
