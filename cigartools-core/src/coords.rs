//! Bidirectional reference/query/operation coordinate mappings.

use std::fmt;

use crate::int_map::{IntMap, IntMapBuilder};

/// Mutable builder for a [`CoordinateMapping`], extended once per decoded
/// CIGAR operation.
#[derive(Debug, Clone, Default)]
pub struct CoordinateMappingBuilder {
    ref_to_query: IntMapBuilder,
    query_to_ref: IntMapBuilder,
    ref_to_op: IntMapBuilder,
    query_to_op: IntMapBuilder,
}

impl CoordinateMappingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one operation. The operation index is always known; the
    /// reference and query indices are present only when the operation
    /// consumes that axis.
    pub fn extend(&mut self, ref_index: Option<i64>, query_index: Option<i64>, op_index: i64) {
        self.ref_to_query.extend(ref_index, query_index);
        self.query_to_ref.extend(query_index, ref_index);
        self.ref_to_op.extend(ref_index, Some(op_index));
        self.query_to_op.extend(query_index, Some(op_index));
    }

    pub fn freeze(self) -> CoordinateMapping {
        CoordinateMapping {
            ref_to_query: self.ref_to_query.freeze(),
            query_to_ref: self.query_to_ref.freeze(),
            ref_to_op: self.ref_to_op.freeze(),
            query_to_op: self.query_to_op.freeze(),
        }
    }
}

/// Four correlated [`IntMap`]s tying reference positions, query positions
/// and operation indices of one alignment together.
///
/// `ref_to_query` and `query_to_ref` are bijective inverses of each other;
/// `ref_to_op` and `query_to_op` are injections into the operation-index
/// space. Two mappings are equal when their op-indexed maps are equal (the
/// query/reference maps are functions of those).
#[derive(Debug, Clone, Default)]
pub struct CoordinateMapping {
    ref_to_query: IntMap,
    query_to_ref: IntMap,
    ref_to_op: IntMap,
    query_to_op: IntMap,
}

impl CoordinateMapping {
    pub fn ref_to_query(&self) -> &IntMap {
        &self.ref_to_query
    }

    pub fn query_to_ref(&self) -> &IntMap {
        &self.query_to_ref
    }

    pub fn ref_to_op(&self) -> &IntMap {
        &self.ref_to_op
    }

    pub fn query_to_op(&self) -> &IntMap {
        &self.query_to_op
    }

    /// A copy with reference keys shifted by `reference_delta` and query
    /// keys by `query_delta`; operation indices stay fixed. Used to place an
    /// alignment-local mapping at absolute hit coordinates.
    pub fn translate(&self, reference_delta: i64, query_delta: i64) -> CoordinateMapping {
        CoordinateMapping {
            ref_to_query: self.ref_to_query.translate(reference_delta, query_delta),
            query_to_ref: self.query_to_ref.translate(query_delta, reference_delta),
            ref_to_op: self.ref_to_op.translate(reference_delta, 0),
            query_to_op: self.query_to_op.translate(query_delta, 0),
        }
    }
}

impl PartialEq for CoordinateMapping {
    fn eq(&self, other: &Self) -> bool {
        (&self.ref_to_op, &self.query_to_op) == (&other.ref_to_op, &other.query_to_op)
    }
}

impl Eq for CoordinateMapping {}

impl fmt::Display for CoordinateMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CoordinateMapping({}, {})",
            self.ref_to_op, self.query_to_op
        )
    }
}
