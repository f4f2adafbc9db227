//! cigartools core library
//!
//! Parsing, coordinate mapping, and algebraic manipulation of CIGAR-encoded
//! sequence alignments: normalized [`Cigar`] sequences, positioned
//! [`CigarHit`] alignments with cutting/stripping/gap enumeration, and
//! combinators for reassembling fragmented hits.

pub mod actions;
pub mod chain;
pub mod cigar;
pub mod coords;
pub mod errors;
pub mod hit;
pub mod int_map;

// Re-export commonly used types and functions
pub use actions::Action;
pub use chain::{connect_nonoverlapping, drop_overlapping};
pub use cigar::Cigar;
pub use coords::{CoordinateMapping, CoordinateMappingBuilder};
pub use errors::{CigarError, CigarResult};
pub use hit::CigarHit;
pub use int_map::{IntMap, IntMapBuilder};

/// Version information for the cigartools core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
