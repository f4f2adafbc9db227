//! CIGAR operation kinds.
//!
//! The nine operations defined on page 8 of the SAM specification
//! <https://samtools.github.io/hts-specs/SAMv1.pdf>.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{CigarError, CigarResult};

/// A single CIGAR operation kind.
///
/// The discriminants follow the SAM specification and are stable, so an
/// `Action` can round-trip through its ordinal with [`Action::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Alignment match (can be a sequence match or mismatch)
    Match = 0,
    /// Insertion to the reference
    Insert = 1,
    /// Deletion from the reference
    Delete = 2,
    /// Skipped region from the reference
    Skipped = 3,
    /// Soft clip on the read (not aligned but present in the read)
    SoftClipped = 4,
    /// Hard clip on the read (not present in the read)
    HardClipped = 5,
    /// Padding (silent deletion from padded reference)
    Padding = 6,
    /// Sequence match
    SeqMatch = 7,
    /// Sequence mismatch
    Mismatch = 8,
}

impl Action {
    /// All operations, in ordinal order.
    pub const ALL: [Action; 9] = [
        Action::Match,
        Action::Insert,
        Action::Delete,
        Action::Skipped,
        Action::SoftClipped,
        Action::HardClipped,
        Action::Padding,
        Action::SeqMatch,
        Action::Mismatch,
    ];

    /// Parses a single-letter CIGAR operation code.
    pub fn parse(letter: char) -> CigarResult<Action> {
        match letter {
            'M' => Ok(Action::Match),
            'I' => Ok(Action::Insert),
            'D' => Ok(Action::Delete),
            'N' => Ok(Action::Skipped),
            'S' => Ok(Action::SoftClipped),
            'H' => Ok(Action::HardClipped),
            'P' => Ok(Action::Padding),
            '=' => Ok(Action::SeqMatch),
            'X' => Ok(Action::Mismatch),
            _ => Err(CigarError::InvalidOperation(format!(
                "Unexpected CIGAR action: {letter:?}."
            ))),
        }
    }

    /// The single-letter code used in textual CIGARs.
    pub fn code(&self) -> char {
        match self {
            Action::Match => 'M',
            Action::Insert => 'I',
            Action::Delete => 'D',
            Action::Skipped => 'N',
            Action::SoftClipped => 'S',
            Action::HardClipped => 'H',
            Action::Padding => 'P',
            Action::SeqMatch => '=',
            Action::Mismatch => 'X',
        }
    }

    /// Whether the operation advances the reference coordinate.
    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            Action::Match | Action::Delete | Action::Skipped | Action::SeqMatch | Action::Mismatch
        )
    }

    /// Whether the operation advances the query coordinate.
    pub fn consumes_query(&self) -> bool {
        matches!(
            self,
            Action::Match
                | Action::Insert
                | Action::SoftClipped
                | Action::SeqMatch
                | Action::Mismatch
        )
    }

    /// Collapses the sequence match/mismatch distinction into [`Action::Match`].
    pub fn relax(&self) -> Action {
        match self {
            Action::SeqMatch | Action::Mismatch => Action::Match,
            other => *other,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = CigarError;

    fn try_from(ordinal: u8) -> CigarResult<Action> {
        Action::ALL
            .get(ordinal as usize)
            .copied()
            .ok_or_else(|| {
                CigarError::InvalidOperation(format!("Unexpected CIGAR action: {ordinal}."))
            })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
