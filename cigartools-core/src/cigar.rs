//! Run-length-encoded CIGAR operation sequences.
//!
//! A CIGAR string describes an alignment between a query sequence and a
//! reference sequence as a series of operation codes ('M', 'I', 'D', ...),
//! each preceded by the number of bases it applies to. CIGAR strings are
//! defined in the SAM specification
//! <https://samtools.github.io/hts-specs/SAMv1.pdf>.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::coords::{CoordinateMapping, CoordinateMappingBuilder};
use crate::errors::{truncate, CigarError, CigarResult};

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]+)([^0-9])").expect("hard-coded regex"))
}

/// A canonically normalized run-length-encoded sequence of CIGAR operations.
///
/// Every `Cigar` is normalized at construction: zero-count runs are dropped
/// and adjacent runs with the same operation are coalesced, so equality is a
/// plain structural compare. The empty sequence is a valid value and the
/// identity for concatenation.
///
/// Instances are usually created through [`Cigar::coerce`]:
///
/// ```
/// use cigartools_core::{Action, Cigar};
///
/// let parsed = Cigar::coerce("10M1I").unwrap();
/// let built = Cigar::coerce(vec![(10, Action::Match), (1, Action::Insert)]).unwrap();
/// let same = Cigar::coerce(parsed.clone()).unwrap();
/// assert_eq!(parsed, built);
/// assert_eq!(parsed, same);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cigar {
    data: Vec<(u32, Action)>,
    op_length: u64,
    ref_length: u64,
    query_length: u64,
    mapping: OnceLock<CoordinateMapping>,
}

impl Cigar {
    /// Builds a `Cigar` from `(count, action)` run pairs, normalizing as it
    /// goes.
    pub fn new(data: impl IntoIterator<Item = (u32, Action)>) -> Cigar {
        let data = Self::normalize(data);

        let mut op_length = 0u64;
        let mut ref_length = 0u64;
        let mut query_length = 0u64;
        for &(count, op) in &data {
            op_length += u64::from(count);
            if op.consumes_reference() {
                ref_length += u64::from(count);
            }
            if op.consumes_query() {
                query_length += u64::from(count);
            }
        }

        Cigar {
            data,
            op_length,
            ref_length,
            query_length,
            mapping: OnceLock::new(),
        }
    }

    /// The empty CIGAR, identity for concatenation.
    pub fn empty() -> Cigar {
        Cigar::new([])
    }

    /// Converts anything CIGAR-like into a `Cigar`: a textual CIGAR, a
    /// sequence of run pairs, or an existing value.
    pub fn coerce<T>(value: T) -> CigarResult<Cigar>
    where
        T: TryInto<Cigar>,
        T::Error: Into<CigarError>,
    {
        value.try_into().map_err(Into::into)
    }

    /// Parses a textual CIGAR of the form `(\d+[MIDNSHP=X])+`. The empty
    /// string parses to the empty CIGAR.
    pub fn parse(string: &str) -> CigarResult<Cigar> {
        let mut rest = string;
        let mut data = Vec::new();

        while !rest.is_empty() {
            let captures = token_regex().captures(rest).ok_or_else(|| {
                CigarError::Parse(format!(
                    "Invalid CIGAR string. Invalid part: {:?}.",
                    truncate(rest, 20)
                ))
            })?;
            let count: u32 = captures[1].parse().map_err(|_| {
                CigarError::InvalidOperation(format!(
                    "Invalid CIGAR run count: {:?}.",
                    &captures[1]
                ))
            })?;
            let letter = captures[2]
                .chars()
                .next()
                .ok_or_else(|| CigarError::Parse("Empty CIGAR operation.".to_string()))?;
            data.push((count, Action::parse(letter)?));
            rest = &rest[captures[0].len()..];
        }

        Ok(Cigar::new(data))
    }

    fn normalize(data: impl IntoIterator<Item = (u32, Action)>) -> Vec<(u32, Action)> {
        let mut out: Vec<(u32, Action)> = Vec::new();

        for (count, op) in data {
            if count == 0 {
                continue;
            }
            match out.last_mut() {
                Some((last_count, last_op)) if *last_op == op => *last_count += count,
                _ => out.push((count, op)),
            }
        }

        out
    }

    /// The normalized `(count, action)` runs.
    pub fn runs(&self) -> &[(u32, Action)] {
        &self.data
    }

    /// Total number of decoded operations.
    pub fn op_length(&self) -> u64 {
        self.op_length
    }

    /// Number of reference positions the alignment covers.
    pub fn ref_length(&self) -> u64 {
        self.ref_length
    }

    /// Number of query positions the alignment covers.
    pub fn query_length(&self) -> u64 {
        self.query_length
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Yields each operation of the decoded (run-length-expanded) stream.
    pub fn iterate_operations(&self) -> impl Iterator<Item = Action> + '_ {
        self.data
            .iter()
            .flat_map(|&(count, op)| std::iter::repeat(op).take(count as usize))
    }

    /// Decoded operation stream annotated with the zero-based reference and
    /// query positions each operation touches.
    ///
    /// For `1M1I1M` this yields `(Match, Some(0), Some(0))`,
    /// `(Insert, None, Some(1))`, `(Match, Some(1), Some(2))`. A pointer is
    /// `None` when the operation does not consume that axis.
    pub fn iterate_with_pointers(
        &self,
    ) -> impl Iterator<Item = (Action, Option<i64>, Option<i64>)> + '_ {
        let mut ref_pointer = 0i64;
        let mut query_pointer = 0i64;

        self.iterate_operations().map(move |op| {
            match (op.consumes_reference(), op.consumes_query()) {
                (true, true) => {
                    let pointers = (op, Some(ref_pointer), Some(query_pointer));
                    ref_pointer += 1;
                    query_pointer += 1;
                    pointers
                }
                (false, true) => {
                    let pointers = (op, None, Some(query_pointer));
                    query_pointer += 1;
                    pointers
                }
                (true, false) => {
                    let pointers = (op, Some(ref_pointer), None);
                    ref_pointer += 1;
                    pointers
                }
                (false, false) => (op, None, None),
            }
        })
    }

    /// A new `Cigar` restricted to the decoded operations in
    /// `[start, end)`. Slicing happens at the level of individual
    /// operations, not whole runs: `10M5D5M` sliced from 2 to 11 gives
    /// `8M1D`. Out-of-range bounds saturate.
    pub fn slice_operations(&self, start: usize, end: usize) -> Cigar {
        let end = end.min(self.op_length as usize);
        let start = start.min(end);
        Cigar::new(
            self.iterate_operations()
                .skip(start)
                .take(end - start)
                .map(|op| (1, op)),
        )
    }

    /// A copy with leading unaligned query operations removed.
    ///
    /// Everything before the first operation that maps a reference position
    /// to a query position is dropped, except operations that consume the
    /// reference.
    pub fn lstrip_query(&self) -> Cigar {
        let mapping = self.coordinate_mapping();
        let min_op = mapping
            .ref_to_query()
            .keys()
            .next()
            .and_then(|min_r| mapping.ref_to_op().get(min_r));

        self.filter_operations(|index, _ref_pointer, query_pointer| {
            query_pointer.is_none() || min_op.map_or(false, |min_op| index >= min_op)
        })
    }

    /// A copy with trailing unaligned query operations removed.
    pub fn rstrip_query(&self) -> Cigar {
        let mapping = self.coordinate_mapping();
        let max_op = mapping
            .ref_to_query()
            .keys()
            .next_back()
            .and_then(|max_r| mapping.ref_to_op().get(max_r));

        self.filter_operations(|index, _ref_pointer, query_pointer| {
            query_pointer.is_none() || max_op.map_or(false, |max_op| index <= max_op)
        })
    }

    /// A copy with leading unaligned reference operations removed.
    pub fn lstrip_reference(&self) -> Cigar {
        let mapping = self.coordinate_mapping();
        let min_op = mapping
            .query_to_ref()
            .keys()
            .next()
            .and_then(|min_q| mapping.query_to_op().get(min_q));

        self.filter_operations(|index, ref_pointer, _query_pointer| {
            ref_pointer.is_none() || min_op.map_or(false, |min_op| index >= min_op)
        })
    }

    /// A copy with trailing unaligned reference operations removed.
    pub fn rstrip_reference(&self) -> Cigar {
        let mapping = self.coordinate_mapping();
        let max_op = mapping
            .query_to_ref()
            .keys()
            .next_back()
            .and_then(|max_q| mapping.query_to_op().get(max_q));

        self.filter_operations(|index, ref_pointer, _query_pointer| {
            ref_pointer.is_none() || max_op.map_or(false, |max_op| index <= max_op)
        })
    }

    fn filter_operations(
        &self,
        mut keep: impl FnMut(i64, Option<i64>, Option<i64>) -> bool,
    ) -> Cigar {
        Cigar::new(
            self.iterate_with_pointers()
                .enumerate()
                .filter(|(index, (_op, ref_pointer, query_pointer))| {
                    keep(*index as i64, *ref_pointer, *query_pointer)
                })
                .map(|(_index, (op, _ref_pointer, _query_pointer))| (1, op)),
        )
    }

    /// The coordinate mapping derived from the operation stream. Built on
    /// first access and cached.
    pub fn coordinate_mapping(&self) -> &CoordinateMapping {
        self.mapping.get_or_init(|| {
            let mut builder = CoordinateMappingBuilder::new();
            for (op_pointer, (_op, ref_pointer, query_pointer)) in
                self.iterate_with_pointers().enumerate()
            {
                builder.extend(ref_pointer, query_pointer, op_pointer as i64);
            }
            builder.freeze()
        })
    }

    /// Renders the alignment as a pair of equal-length rows, introducing
    /// `'-'` gaps where one side does not consume. Operations that consume
    /// neither side are skipped.
    pub fn to_msa(&self, reference_seq: &str, query_seq: &str) -> CigarResult<(String, String)> {
        let reference: Vec<char> = reference_seq.chars().collect();
        let query: Vec<char> = query_seq.chars().collect();
        let mut reference_msa = String::new();
        let mut query_msa = String::new();

        let overrun = || {
            CigarError::MSALength(
                "CIGAR string corresponds to a larger match than either reference or query."
                    .to_string(),
            )
        };

        for (_op, ref_pointer, query_pointer) in self.iterate_with_pointers() {
            if ref_pointer.is_none() && query_pointer.is_none() {
                continue;
            }

            match ref_pointer {
                Some(pointer) => {
                    reference_msa.push(*reference.get(pointer as usize).ok_or_else(overrun)?)
                }
                None => reference_msa.push('-'),
            }

            match query_pointer {
                Some(pointer) => query_msa.push(*query.get(pointer as usize).ok_or_else(overrun)?),
                None => query_msa.push('-'),
            }
        }

        Ok((reference_msa, query_msa))
    }

    /// Converts a multiple sequence alignment of a reference and a query row
    /// back into a `Cigar`. Both rows must have the same length and use
    /// `'-'` for gaps. Matching and mismatching columns both become
    /// [`Action::Match`].
    pub fn from_msa(reference: &str, query: &str) -> CigarResult<Cigar> {
        if reference.chars().count() != query.chars().count() {
            return Err(CigarError::Parse(
                "Reference and query sequences must be of the same length.".to_string(),
            ));
        }

        Ok(Cigar::new(reference.chars().zip(query.chars()).filter_map(
            |(ref_base, query_base)| match (ref_base, query_base) {
                ('-', '-') => None,
                ('-', _) => Some((1, Action::Insert)),
                (_, '-') => Some((1, Action::Delete)),
                _ => Some((1, Action::Match)),
            },
        )))
    }

    /// A copy with every sequence match/mismatch collapsed into
    /// [`Action::Match`].
    pub fn relax(&self) -> Cigar {
        Cigar::new(self.data.iter().map(|&(count, op)| (count, op.relax())))
    }
}

impl PartialEq for Cigar {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Cigar {}

impl Add for &Cigar {
    type Output = Cigar;

    fn add(self, other: &Cigar) -> Cigar {
        Cigar::new(self.data.iter().chain(other.data.iter()).copied())
    }
}

impl Add for Cigar {
    type Output = Cigar;

    fn add(self, other: Cigar) -> Cigar {
        &self + &other
    }
}

impl FromStr for Cigar {
    type Err = CigarError;

    fn from_str(string: &str) -> CigarResult<Cigar> {
        Cigar::parse(string)
    }
}

impl TryFrom<&str> for Cigar {
    type Error = CigarError;

    fn try_from(string: &str) -> CigarResult<Cigar> {
        Cigar::parse(string)
    }
}

impl TryFrom<String> for Cigar {
    type Error = CigarError;

    fn try_from(string: String) -> CigarResult<Cigar> {
        Cigar::parse(&string)
    }
}

impl From<Vec<(u32, Action)>> for Cigar {
    fn from(data: Vec<(u32, Action)>) -> Cigar {
        Cigar::new(data)
    }
}

impl From<&[(u32, Action)]> for Cigar {
    fn from(data: &[(u32, Action)]) -> Cigar {
        Cigar::new(data.iter().copied())
    }
}

impl TryFrom<Vec<(u32, u8)>> for Cigar {
    type Error = CigarError;

    fn try_from(data: Vec<(u32, u8)>) -> CigarResult<Cigar> {
        let mut runs = Vec::with_capacity(data.len());
        for (count, ordinal) in data {
            runs.push((count, Action::try_from(ordinal)?));
        }
        Ok(Cigar::new(runs))
    }
}

impl From<Cigar> for String {
    fn from(cigar: Cigar) -> String {
        cigar.to_string()
    }
}

/// Inverse of [`Cigar::parse`].
impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &(count, op) in &self.data {
            write!(f, "{count}{op}")?;
        }
        Ok(())
    }
}
