//! Error types for the cigartools core library.

use std::convert::Infallible;
use thiserror::Error;

/// Errors that can occur while parsing or manipulating CIGAR alignments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CigarError {
    /// A value could not be converted into a CIGAR.
    #[error("Cannot coerce to a CIGAR: {0}")]
    Coercion(String),

    /// Input text does not follow the CIGAR or positioned-hit grammar.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An operation letter, ordinal or run count is not a valid CIGAR
    /// operation.
    #[error("Invalid CIGAR operation: {0}")]
    InvalidOperation(String),

    /// A sequence is too short for the alignment it should render, or the
    /// two rows of a multiple sequence alignment differ in length.
    #[error("MSA length error: {0}")]
    MSALength(String),

    /// Hit endpoints disagree with the lengths derived from the CIGAR.
    #[error("CIGAR hit range error: {0}")]
    CigarHitRange(String),

    /// `connect` was called on overlapping hits.
    #[error("Cannot connect CIGAR hits: {0}")]
    CigarConnect(String),

    /// Concatenation was attempted on hits that do not touch.
    #[error("Cannot add CIGAR hits: {0}")]
    CigarAdd(String),

    /// A cut point is not fractional or lies outside the hit.
    #[error("Cannot cut CIGAR hit: {0}")]
    CigarCut(String),

    /// An empty list of hits was given where at least one is required.
    #[error("Expected a non-empty list of CIGAR hits")]
    EmptyCigarHitList,
}

impl From<Infallible> for CigarError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

pub type CigarResult<T> = Result<T, CigarError>;

/// Truncates an offending input for inclusion in an error message.
pub(crate) fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
