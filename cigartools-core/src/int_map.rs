//! Integer-to-integer partial mappings with domain and codomain tracking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Mutable builder for an [`IntMap`], used while walking an operation
/// stream. [`IntMapBuilder::freeze`] produces the immutable view.
#[derive(Debug, Clone, Default)]
pub struct IntMapBuilder {
    map: BTreeMap<i64, i64>,
    domain: BTreeSet<i64>,
    codomain: BTreeSet<i64>,
}

impl IntMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key/value pair where either side may be absent. Present
    /// sides are always added to the domain/codomain supersets; the mapping
    /// itself is extended only when both sides are present.
    pub fn extend(&mut self, key: Option<i64>, value: Option<i64>) {
        if let (Some(key), Some(value)) = (key, value) {
            self.map.insert(key, value);
        }

        if let Some(key) = key {
            self.domain.insert(key);
        }

        if let Some(value) = value {
            self.codomain.insert(value);
        }
    }

    pub fn freeze(self) -> IntMap {
        IntMap {
            map: self.map,
            domain: self.domain,
            codomain: self.codomain,
        }
    }
}

/// An immutable partial mapping from integers to integers.
///
/// Besides the key/value pairs, an `IntMap` tracks a `domain` and a
/// `codomain`: supersets of the keys and values that include integers which
/// are within the range of interest but not mapped to anything. Equality is
/// structural over the mapping and both supersets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntMap {
    map: BTreeMap<i64, i64>,
    domain: BTreeSet<i64>,
    codomain: BTreeSet<i64>,
}

impl IntMap {
    /// Exact lookup.
    pub fn get(&self, key: i64) -> Option<i64> {
        self.map.get(&key).copied()
    }

    pub fn contains_key(&self, key: i64) -> bool {
        self.map.contains_key(&key)
    }

    /// The value at the closest mapped key at or below `index`.
    pub fn left_max(&self, index: i64) -> Option<i64> {
        self.map.range(..=index).next_back().map(|(_, value)| *value)
    }

    /// The value at the closest mapped key at or above `index`.
    pub fn right_min(&self, index: i64) -> Option<i64> {
        self.map.range(index..).next().map(|(_, value)| *value)
    }

    /// A copy of the mapping with keys shifted by `domain_delta` and values
    /// by `codomain_delta`. The supersets shift along with the mapping, so
    /// relative spacing is preserved.
    pub fn translate(&self, domain_delta: i64, codomain_delta: i64) -> IntMap {
        IntMap {
            map: self
                .map
                .iter()
                .map(|(key, value)| (key + domain_delta, value + codomain_delta))
                .collect(),
            domain: self.domain.iter().map(|key| key + domain_delta).collect(),
            codomain: self
                .codomain
                .iter()
                .map(|value| value + codomain_delta)
                .collect(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = i64> + '_ {
        self.map.keys().copied()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = i64> + '_ {
        self.map.values().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i64, i64)> + '_ {
        self.map.iter().map(|(key, value)| (*key, *value))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Superset of the mapped keys.
    pub fn domain(&self) -> &BTreeSet<i64> {
        &self.domain
    }

    /// Superset of the mapped values.
    pub fn codomain(&self) -> &BTreeSet<i64> {
        &self.codomain
    }
}

impl fmt::Display for IntMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs = Vec::new();

        for key in &self.domain {
            match self.map.get(key) {
                Some(value) => pairs.push(format!("{key}: {value}")),
                None => pairs.push(format!("{key}: None")),
            }
        }

        let values: BTreeSet<i64> = self.map.values().copied().collect();
        for value in &self.codomain {
            if !values.contains(value) {
                pairs.push(format!("None: {value}"));
            }
        }

        write!(f, "{{ {} }}", pairs.join(", "))
    }
}
