//! Positioned CIGAR alignments.
//!
//! A [`CigarHit`] pairs a [`Cigar`] with the absolute reference and query
//! intervals it covers, and implements the alignment surgery that is
//! conceptually simple but easy to get wrong ad hoc: cutting an alignment in
//! two at any reference position, stripping unaligned ends, enumerating
//! gaps, and stitching neighboring hits back together.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use num_rational::Ratio;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::cigar::Cigar;
use crate::coords::CoordinateMapping;
use crate::errors::{truncate, CigarError, CigarResult};

/// Check if two inclusive intervals `[x0, x1]` and `[y0, y1]` overlap.
fn intervals_overlap(x: (i64, i64), y: (i64, i64)) -> bool {
    x.0 <= y.1 && x.1 >= y.0
}

fn long_form_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<cigar>.*)@\[(?P<q_st>-?\d+),(?P<q_ei>-?\d+)\]->\[(?P<r_st>-?\d+),(?P<r_ei>-?\d+)\]$",
        )
        .expect("hard-coded regex")
    })
}

fn short_form_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<cigar>.*)@(?P<q_st>-?\d+)->(?P<r_st>-?\d+)$").expect("hard-coded regex")
    })
}

/// A [`Cigar`] positioned at absolute coordinates: the inclusive reference
/// interval `[r_st, r_ei]` and query interval `[q_st, q_ei]` it covers.
///
/// Both intervals must agree with the lengths derived from the CIGAR; this
/// is enforced at construction. Empty intervals are encoded as
/// `st == ei + 1` and pair with a zero consumed length on that axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CigarHit {
    cigar: Cigar,
    r_st: i64,
    r_ei: i64,
    q_st: i64,
    q_ei: i64,
    mapping: OnceLock<CoordinateMapping>,
}

impl CigarHit {
    /// Creates a hit after checking that the interval lengths match the
    /// lengths consumed by the CIGAR.
    pub fn new(cigar: Cigar, r_st: i64, r_ei: i64, q_st: i64, q_ei: i64) -> CigarResult<CigarHit> {
        let hit = CigarHit {
            cigar,
            r_st,
            r_ei,
            q_st,
            q_ei,
            mapping: OnceLock::new(),
        };

        if hit.ref_length() != hit.cigar.ref_length() as i64 {
            return Err(CigarError::CigarHitRange(format!(
                "CIGAR string maps {} reference positions, but CIGAR hit range is {}.",
                hit.cigar.ref_length(),
                hit.ref_length(),
            )));
        }

        if hit.query_length() != hit.cigar.query_length() as i64 {
            return Err(CigarError::CigarHitRange(format!(
                "CIGAR string maps {} query positions, but CIGAR hit range is {}.",
                hit.cigar.query_length(),
                hit.query_length(),
            )));
        }

        Ok(hit)
    }

    /// A hit covering the given intervals with only deletions on the
    /// reference side followed by only insertions on the query side. Empty
    /// intervals (`ei < st`) contribute no operations.
    pub fn from_default_alignment(
        r_st: i64,
        r_ei: i64,
        q_st: i64,
        q_ei: i64,
    ) -> CigarResult<CigarHit> {
        let ref_length = (r_ei - r_st + 1).max(0) as u32;
        let query_length = (q_ei - q_st + 1).max(0) as u32;
        let cigar = Cigar::new([(ref_length, Action::Delete), (query_length, Action::Insert)]);

        CigarHit::new(cigar, r_st, r_ei, q_st, q_ei)
    }

    pub fn cigar(&self) -> &Cigar {
        &self.cigar
    }

    /// Inclusive reference start.
    pub fn r_st(&self) -> i64 {
        self.r_st
    }

    /// Inclusive reference end.
    pub fn r_ei(&self) -> i64 {
        self.r_ei
    }

    /// Inclusive query start.
    pub fn q_st(&self) -> i64 {
        self.q_st
    }

    /// Inclusive query end.
    pub fn q_ei(&self) -> i64 {
        self.q_ei
    }

    /// Exclusive reference end.
    pub fn r_en(&self) -> i64 {
        self.r_ei + 1
    }

    /// Exclusive query end.
    pub fn q_en(&self) -> i64 {
        self.q_ei + 1
    }

    pub fn ref_length(&self) -> i64 {
        self.r_en() - self.r_st
    }

    pub fn query_length(&self) -> i64 {
        self.q_en() - self.q_st
    }

    pub fn overlaps_in_query(&self, other: &CigarHit) -> bool {
        intervals_overlap((self.q_st, self.q_ei), (other.q_st, other.q_ei))
    }

    pub fn overlaps_in_reference(&self, other: &CigarHit) -> bool {
        intervals_overlap((self.r_st, self.r_ei), (other.r_st, other.r_ei))
    }

    /// Whether this hit's query end is immediately adjacent to `other`'s
    /// query start.
    pub fn touches_in_query(&self, other: &CigarHit) -> bool {
        self.q_ei + 1 == other.q_st
    }

    /// Whether this hit's reference end is immediately adjacent to `other`'s
    /// reference start.
    pub fn touches_in_reference(&self, other: &CigarHit) -> bool {
        self.r_ei + 1 == other.r_st
    }

    /// Concatenates two hits that touch in both query and reference
    /// coordinates: the CIGARs are joined and the intervals fused.
    pub fn checked_add(&self, other: &CigarHit) -> CigarResult<CigarHit> {
        if !(self.touches_in_query(other) && self.touches_in_reference(other)) {
            return Err(CigarError::CigarAdd(
                "Cannot combine CIGAR hits that do not touch in both reference and query coordinates."
                    .to_string(),
            ));
        }

        CigarHit::new(
            &self.cigar + &other.cigar,
            self.r_st,
            other.r_ei,
            self.q_st,
            other.q_ei,
        )
    }

    /// Joins two non-overlapping hits by filling the space between them
    /// with deletions and insertions, then concatenating. Hits that are out
    /// of order on an axis make the filler's intervals inconsistent, which
    /// surfaces as [`CigarError::CigarHitRange`].
    pub fn connect(&self, other: &CigarHit) -> CigarResult<CigarHit> {
        if self.overlaps_in_query(other) || self.overlaps_in_reference(other) {
            return Err(CigarError::CigarConnect(
                "Cannot combine overlapping CIGAR hits.".to_string(),
            ));
        }

        let filler = CigarHit::from_default_alignment(
            self.r_ei + 1,
            other.r_st - 1,
            self.q_ei + 1,
            other.q_st - 1,
        )?;
        self.checked_add(&filler)?.checked_add(other)
    }

    /// Tie-break offset for [`CigarHit::cut_reference`], small enough that
    /// adding it can never cross the next operation index.
    pub fn epsilon(&self) -> Ratio<i64> {
        Ratio::new(1, self.cigar.op_length() as i64 * 3 + 1)
    }

    fn ref_cut_to_op_cut(&self, cut_point: Ratio<i64>) -> Ratio<i64> {
        let mapping = self.coordinate_mapping();

        let left_op_cut_point = mapping
            .ref_to_op()
            .left_max(cut_point.floor().to_integer())
            .unwrap_or(-1);
        let right_op_cut_point = mapping
            .ref_to_op()
            .right_min(cut_point.ceil().to_integer())
            .unwrap_or(self.cigar.op_length() as i64);

        fn lerp(start: i64, end: i64, t: Ratio<i64>) -> Ratio<i64> {
            (Ratio::from_integer(1) - t) * Ratio::from_integer(start)
                + t * Ratio::from_integer(end)
        }

        let mut op_cut_point = lerp(
            left_op_cut_point,
            right_op_cut_point,
            cut_point - cut_point.floor(),
        );

        if op_cut_point.is_integer() {
            // Disambiguate to the right.
            op_cut_point += self.epsilon();
        }

        op_cut_point
    }

    fn slice(&self, r_st: i64, q_st: i64, o_st: i64, o_ei: i64) -> CigarResult<CigarHit> {
        let start = o_st.max(0) as usize;
        let end = (o_ei + 1).max(0) as usize;
        let cigar = self.cigar.slice_operations(start, end);
        let r_ei = r_st + cigar.ref_length() as i64 - 1;
        let q_ei = q_st + cigar.query_length() as i64 - 1;

        CigarHit::new(cigar, r_st, r_ei, q_st, q_ei)
    }

    /// Splits this hit into two touching, non-overlapping parts at a
    /// fractional reference position. No operation is lost or duplicated:
    /// re-concatenating the parts always reproduces the original hit.
    ///
    /// The cut point must not be an integer and must lie strictly between
    /// `r_st - 1` and `r_ei + 1`; otherwise [`CigarError::CigarCut`] is
    /// returned. The arithmetic is exact, so cut points that land between
    /// gap operations resolve deterministically, with ties attaching
    /// insertion runs to the left part.
    pub fn cut_reference(&self, cut_point: Ratio<i64>) -> CigarResult<(CigarHit, CigarHit)> {
        if cut_point.is_integer() {
            return Err(CigarError::CigarCut(
                "Cut accepts fractions, not integers.".to_string(),
            ));
        }

        if self.ref_length() == 0
            || cut_point <= Ratio::from_integer(self.r_st - 1)
            || cut_point >= Ratio::from_integer(self.r_ei + 1)
        {
            return Err(CigarError::CigarCut(
                "Cut point out of reference bounds.".to_string(),
            ));
        }

        let op_cut_point = self.ref_cut_to_op_cut(cut_point);
        let left = self.slice(self.r_st, self.q_st, 0, op_cut_point.floor().to_integer())?;
        let right = self.slice(
            left.r_ei + 1,
            left.q_ei + 1,
            op_cut_point.ceil().to_integer(),
            self.cigar.op_length() as i64,
        )?;

        Ok((left, right))
    }

    /// A copy with leading unaligned query elements removed. The interval
    /// is re-anchored at the far end, so an empty result collapses onto
    /// `r_ei`/`q_ei`.
    pub fn lstrip_query(&self) -> CigarResult<CigarHit> {
        let cigar = self.cigar.lstrip_query();
        let r_st = self.r_ei - cigar.ref_length() as i64 + 1;
        let q_st = self.q_ei - cigar.query_length() as i64 + 1;
        CigarHit::new(cigar, r_st, self.r_ei, q_st, self.q_ei)
    }

    /// A copy with trailing unaligned query elements removed.
    pub fn rstrip_query(&self) -> CigarResult<CigarHit> {
        let cigar = self.cigar.rstrip_query();
        let r_ei = self.r_st + cigar.ref_length() as i64 - 1;
        let q_ei = self.q_st + cigar.query_length() as i64 - 1;
        CigarHit::new(cigar, self.r_st, r_ei, self.q_st, q_ei)
    }

    /// A copy with leading unaligned reference elements removed.
    pub fn lstrip_reference(&self) -> CigarResult<CigarHit> {
        let cigar = self.cigar.lstrip_reference();
        let r_st = self.r_ei - cigar.ref_length() as i64 + 1;
        let q_st = self.q_ei - cigar.query_length() as i64 + 1;
        CigarHit::new(cigar, r_st, self.r_ei, q_st, self.q_ei)
    }

    /// A copy with trailing unaligned reference elements removed.
    pub fn rstrip_reference(&self) -> CigarResult<CigarHit> {
        let cigar = self.cigar.rstrip_reference();
        let r_ei = self.r_st + cigar.ref_length() as i64 - 1;
        let q_ei = self.q_st + cigar.query_length() as i64 - 1;
        CigarHit::new(cigar, self.r_st, r_ei, self.q_st, q_ei)
    }

    fn gaps(&self, is_deletions: bool) -> CigarResult<Vec<CigarHit>> {
        let mapping = self.coordinate_mapping();
        let op_to_ref: BTreeMap<i64, i64> = mapping
            .ref_to_op()
            .iter()
            .map(|(coordinate, op_index)| (op_index, coordinate))
            .collect();
        let op_to_query: BTreeMap<i64, i64> = mapping
            .query_to_op()
            .iter()
            .map(|(coordinate, op_index)| (op_index, coordinate))
            .collect();
        let (present, missing) = if is_deletions {
            (&op_to_ref, &op_to_query)
        } else {
            (&op_to_query, &op_to_ref)
        };

        let op_length = self.cigar.op_length() as i64;
        let mut out = Vec::new();
        let mut last_query_index = self.q_st;
        let mut last_ref_index = self.r_st;
        let mut gap_start: Option<i64> = None;

        // `op_length` acts as an end sentinel so a trailing run closes too.
        for op_index in 0..=op_length {
            let in_gap = op_index < op_length
                && present.contains_key(&op_index)
                && !missing.contains_key(&op_index);

            if in_gap {
                if gap_start.is_none() {
                    gap_start = Some(op_index);
                }
            } else if let Some(start) = gap_start.take() {
                let cigar = self.cigar.slice_operations(start as usize, op_index as usize);
                let (r_st, q_st) = if is_deletions {
                    (present[&start], last_query_index)
                } else {
                    (last_ref_index, present[&start])
                };
                let r_ei = r_st + cigar.ref_length() as i64 - 1;
                let q_ei = q_st + cigar.query_length() as i64 - 1;
                out.push(CigarHit::new(cigar, r_st, r_ei, q_st, q_ei)?);
            }

            if let Some(&query_index) = op_to_query.get(&op_index) {
                last_query_index = query_index;
            }
            if let Some(&ref_index) = op_to_ref.get(&op_index) {
                last_ref_index = ref_index;
            }
        }

        Ok(out)
    }

    /// Maximal runs of operations that consume only the reference (`D`/`N`),
    /// as sub-hits with an empty query interval.
    pub fn deletions(&self) -> CigarResult<Vec<CigarHit>> {
        self.gaps(true)
    }

    /// Maximal runs of operations that consume only the query (`I`/`S`),
    /// as sub-hits with an empty reference interval.
    pub fn insertions(&self) -> CigarResult<Vec<CigarHit>> {
        self.gaps(false)
    }

    /// A copy shifted by the given reference and query deltas; the CIGAR is
    /// unchanged.
    pub fn translate(&self, reference_delta: i64, query_delta: i64) -> CigarHit {
        CigarHit {
            cigar: self.cigar.clone(),
            r_st: self.r_st + reference_delta,
            r_ei: self.r_ei + reference_delta,
            q_st: self.q_st + query_delta,
            q_ei: self.q_ei + query_delta,
            mapping: OnceLock::new(),
        }
    }

    /// The alignment's coordinate mapping placed at this hit's absolute
    /// coordinates. Built on first access and cached.
    pub fn coordinate_mapping(&self) -> &CoordinateMapping {
        self.mapping.get_or_init(|| {
            self.cigar
                .coordinate_mapping()
                .translate(self.r_st, self.q_st)
        })
    }

    /// Renders the aligned slice of the given sequences as a pair of
    /// equal-length rows with `'-'` gaps. Coordinates are treated as
    /// 1-based and inclusive, matching the hit's intervals.
    pub fn to_msa(&self, reference_seq: &str, query_seq: &str) -> CigarResult<(String, String)> {
        let reference = slice_by_coordinates(reference_seq, self.r_st, self.r_ei);
        let query = slice_by_coordinates(query_seq, self.q_st, self.q_ei);
        self.cigar.to_msa(&reference, &query)
    }

    /// Parses the canonical form `"<cigar>@[q_st,q_ei]->[r_st,r_ei]"`, or
    /// leniently the shorter `"<cigar>@<q_st>-><r_st>"` with the ends
    /// derived from the CIGAR's lengths. Inverse of the `Display` impl.
    pub fn parse(string: &str) -> CigarResult<CigarHit> {
        if let Some(captures) = long_form_regex().captures(string) {
            let q_st = parse_coordinate(&captures["q_st"], string)?;
            let q_ei = parse_coordinate(&captures["q_ei"], string)?;
            let r_st = parse_coordinate(&captures["r_st"], string)?;
            let r_ei = parse_coordinate(&captures["r_ei"], string)?;

            if q_st > q_ei + 1 {
                return Err(CigarError::Parse(format!(
                    "Query start index ({q_st}) greater than end index ({q_ei} + 1) in: {:?}.",
                    truncate(string, 50),
                )));
            }
            if r_st > r_ei + 1 {
                return Err(CigarError::Parse(format!(
                    "Reference start index ({r_st}) greater than end index ({r_ei} + 1) in: {:?}.",
                    truncate(string, 50),
                )));
            }

            let cigar = Cigar::parse(&captures["cigar"])?;
            return CigarHit::new(cigar, r_st, r_ei, q_st, q_ei);
        }

        if let Some(captures) = short_form_regex().captures(string) {
            let q_st = parse_coordinate(&captures["q_st"], string)?;
            let r_st = parse_coordinate(&captures["r_st"], string)?;
            let cigar = Cigar::parse(&captures["cigar"])?;
            let r_ei = r_st + cigar.ref_length() as i64 - 1;
            let q_ei = q_st + cigar.query_length() as i64 - 1;
            return CigarHit::new(cigar, r_st, r_ei, q_st, q_ei);
        }

        Err(CigarError::Parse(format!(
            "Invalid CigarHit string format: {:?}.",
            truncate(string, 50),
        )))
    }
}

fn parse_coordinate(text: &str, whole: &str) -> CigarResult<i64> {
    text.parse().map_err(|_| {
        CigarError::Parse(format!(
            "Invalid coordinate {:?} in: {:?}.",
            text,
            truncate(whole, 50),
        ))
    })
}

/// Slices a sequence by 1-based inclusive coordinates, clamping to the
/// sequence bounds the way the MSA renderer expects.
fn slice_by_coordinates(seq: &str, st: i64, ei: i64) -> String {
    let chars: Vec<char> = seq.chars().collect();
    let start = (st - 1).clamp(0, chars.len() as i64) as usize;
    let end = ei.clamp(0, chars.len() as i64) as usize;
    if start >= end {
        String::new()
    } else {
        chars[start..end].iter().collect()
    }
}

impl PartialEq for CigarHit {
    fn eq(&self, other: &Self) -> bool {
        (&self.cigar, self.r_st, self.r_ei, self.q_st, self.q_ei)
            == (
                &other.cigar,
                other.r_st,
                other.r_ei,
                other.q_st,
                other.q_ei,
            )
    }
}

impl Eq for CigarHit {}

impl FromStr for CigarHit {
    type Err = CigarError;

    fn from_str(string: &str) -> CigarResult<CigarHit> {
        CigarHit::parse(string)
    }
}

impl TryFrom<&str> for CigarHit {
    type Error = CigarError;

    fn try_from(string: &str) -> CigarResult<CigarHit> {
        CigarHit::parse(string)
    }
}

impl TryFrom<String> for CigarHit {
    type Error = CigarError;

    fn try_from(string: String) -> CigarResult<CigarHit> {
        CigarHit::parse(&string)
    }
}

impl From<CigarHit> for String {
    fn from(hit: CigarHit) -> String {
        hit.to_string()
    }
}

impl fmt::Display for CigarHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@[{},{}]->[{},{}]",
            self.cigar, self.q_st, self.q_ei, self.r_st, self.r_ei
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(text: &str) -> CigarHit {
        CigarHit::parse(text).unwrap()
    }

    #[test]
    fn test_new_validates_interval_lengths() {
        let cigar = Cigar::parse("4M").unwrap();
        assert!(CigarHit::new(cigar.clone(), 0, 3, 0, 3).is_ok());
        assert!(matches!(
            CigarHit::new(cigar.clone(), 0, 3, 0, 2),
            Err(CigarError::CigarHitRange(_))
        ));
        assert!(matches!(
            CigarHit::new(cigar, 0, 4, 0, 3),
            Err(CigarError::CigarHitRange(_))
        ));
    }

    #[test]
    fn test_from_default_alignment() {
        let filler = CigarHit::from_default_alignment(5, 9, 3, 4).unwrap();
        assert_eq!(filler, hit("5D2I@[3,4]->[5,9]"));

        // Empty sides contribute no operations.
        let empty_ref = CigarHit::from_default_alignment(5, 4, 3, 4).unwrap();
        assert_eq!(empty_ref.cigar(), &Cigar::parse("2I").unwrap());
        let empty_both = CigarHit::from_default_alignment(5, 4, 3, 2).unwrap();
        assert!(empty_both.cigar().is_empty());
    }

    #[test]
    fn test_touches_and_overlaps() {
        let a = hit("4M@1->1");
        let b = hit("4M@5->5");
        let c = hit("4M@3->3");
        assert!(a.touches_in_query(&b));
        assert!(a.touches_in_reference(&b));
        assert!(!a.overlaps_in_query(&b));
        assert!(a.overlaps_in_query(&c));
        assert!(a.overlaps_in_reference(&c));
    }

    #[test]
    fn test_checked_add_requires_touching() {
        let a = hit("4M@1->1");
        assert_eq!(a.checked_add(&hit("4M@5->5")).unwrap(), hit("8M@1->1"));
        assert!(matches!(
            a.checked_add(&hit("4M@9->9")),
            Err(CigarError::CigarAdd(_))
        ));
        assert!(matches!(
            a.checked_add(&hit("4M@5->9")),
            Err(CigarError::CigarAdd(_))
        ));
    }

    #[test]
    fn test_connect_out_of_order_fails_on_filler() {
        let a = hit("4M@10->10");
        let b = hit("4M@1->1");
        assert!(matches!(
            a.connect(&b),
            Err(CigarError::CigarHitRange(_))
        ));
    }

    #[test]
    fn test_translate() {
        let translated = hit("3M@1->1").translate(3, 5);
        assert_eq!(translated, hit("3M@6->4"));
        assert_ne!(translated, hit("3M@1->1"));
    }

    #[test]
    fn test_serialization_forms() {
        assert_eq!(hit("3M@1->1").to_string(), "3M@[1,3]->[1,3]");
        assert_eq!(hit("3M2I3D2M@1->1").to_string(), "3M2I3D2M@[1,7]->[1,8]");

        // Empty hits round-trip through the signed long form.
        let empty = CigarHit::new(Cigar::empty(), 0, -1, 0, -1).unwrap();
        assert_eq!(empty.to_string(), "@[0,-1]->[0,-1]");
        assert_eq!(CigarHit::parse(&empty.to_string()).unwrap(), empty);
    }

    #[test]
    fn test_parse_rejects_inverted_intervals() {
        assert!(matches!(
            CigarHit::parse("3M@[30,10]->[1,5]"),
            Err(CigarError::Parse(_))
        ));
        assert!(matches!(
            CigarHit::parse("3M@[3,10]->[20,5]"),
            Err(CigarError::Parse(_))
        ));
        assert!(matches!(
            CigarHit::parse("whatever"),
            Err(CigarError::Parse(_))
        ));
    }
}
