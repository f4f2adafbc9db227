//! Combinators for assembling scattered alignment hits.
//!
//! Aligners do not always bridge big gaps: an alignment interrupted by a
//! long deletion can come back as two separate hits. These combinators
//! rebuild consistent alignments out of such fragments, and resolve
//! competing hits that cover the same query region.

use log::debug;

use crate::errors::CigarResult;
use crate::hit::CigarHit;

/// Assembles hits into non-overlapping groups and connects each group into
/// a single hit, filling the gaps with deletions and insertions.
///
/// Input order matters: a hit that overlaps an earlier hit in query space is
/// ignored. The surviving hits are ordered by reference start and chained
/// greedily; a hit joins an existing group only when it continues the group
/// in query space and overlaps none of its members in reference space,
/// otherwise it starts a group of its own. One connected hit per group is
/// returned, in group creation order. An empty input yields an empty output.
pub fn connect_nonoverlapping(hits: &[CigarHit]) -> CigarResult<Vec<CigarHit>> {
    // Collect non-overlapping parts. Earlier hits have priority over ones
    // that come after.
    let mut accumulator: Vec<&CigarHit> = Vec::new();
    for hit in hits {
        if accumulator
            .iter()
            .any(|earlier| earlier.overlaps_in_query(hit))
        {
            debug!("ignoring hit overlapping an earlier one in query space: {hit}");
            continue;
        }
        accumulator.push(hit);
    }

    accumulator.sort_by_key(|hit| hit.r_st());

    // Segregate independent chains.
    let mut groups: Vec<Vec<&CigarHit>> = Vec::new();
    for hit in accumulator {
        let group = groups.iter_mut().find(|group| {
            group.last().map_or(false, |last| hit.q_st() > last.q_ei())
                && group.iter().all(|other| !hit.overlaps_in_reference(other))
        });
        match group {
            Some(group) => group.push(hit),
            None => groups.push(vec![hit]),
        }
    }
    debug!("{} hits settled into {} groups", hits.len(), groups.len());

    let mut connected = Vec::with_capacity(groups.len());
    for group in groups {
        let mut members = group.into_iter();
        if let Some(first) = members.next() {
            let mut accumulated = first.clone();
            for member in members {
                accumulated = accumulated.connect(member)?;
            }
            connected.push(accumulated);
        }
    }

    Ok(connected)
}

/// Filters hits down to a set that does not overlap in query space, keeping
/// the higher-quality hit wherever two compete.
///
/// Hits are considered in input order. A candidate is dropped when an
/// already-kept hit overlaps it in query space with greater or equal
/// quality; otherwise it is kept and evicts every previously kept hit of
/// strictly lower quality that it overlaps. The kept hits are returned in
/// their original input order.
pub fn drop_overlapping<Q, F>(hits: &[CigarHit], quality: F) -> Vec<CigarHit>
where
    F: Fn(&CigarHit) -> Q,
    Q: PartialOrd,
{
    let mut kept: Vec<usize> = Vec::new();

    for (index, hit) in hits.iter().enumerate() {
        let hit_quality = quality(hit);
        let beaten = kept.iter().any(|&earlier| {
            hits[earlier].overlaps_in_query(hit) && quality(&hits[earlier]) >= hit_quality
        });
        if beaten {
            debug!("dropping hit beaten by an overlapping earlier one: {hit}");
            continue;
        }

        kept.retain(|&earlier| {
            !(hits[earlier].overlaps_in_query(hit) && quality(&hits[earlier]) < hit_quality)
        });
        kept.push(index);
    }

    // `kept` holds indices in increasing order, which is the input order.
    kept.into_iter().map(|index| hits[index].clone()).collect()
}
