//! Partitioning a domain into disjoint sub-domains for parallel search
//!
//! Workers (processes or machines) each get their own sub-domain and run a
//! completely independent enumerator over it; nothing is shared, and because
//! checkpoint identities derive from the axis ranges, the narrowed sub-domains
//! automatically persist under distinct keys.
//!
//! The split always cuts the single widest axis into contiguous chunks whose
//! sizes differ by at most one. When more workers are requested than the
//! widest axis has values, each chunk absorbs a share of the remaining worker
//! count by splitting again along its own widest axis.

use crate::domain::{AxisRange, CoefficientDomain, DomainError, Series};

/// Split `domain` into at most `instances` disjoint sub-domains whose union
/// is exactly the original.
pub fn split_domain(
    domain: &CoefficientDomain,
    instances: usize,
) -> Result<Vec<CoefficientDomain>, DomainError> {
    assert!(instances > 0, "cannot split into zero instances");

    let (series, index, widest) = widest_axis(domain);
    if widest.size() == 1 {
        // Every axis is a single value; nothing left to divide.
        return Ok(vec![domain.clone()]);
    }

    let chunk_count = instances.min(widest.size() as usize);
    let mut sub_domains = Vec::with_capacity(chunk_count);
    for chunk in split_range(widest, chunk_count) {
        sub_domains.push(domain.with_axis_override(series, index, chunk)?);
    }

    if (widest.size() as usize) < instances {
        // Spread the requested instance count over the chunks and recurse.
        let mut smaller = Vec::new();
        for (i, sub_domain) in sub_domains.iter().enumerate() {
            let share = even_share(instances, sub_domains.len(), i);
            smaller.extend(split_domain(sub_domain, share)?);
        }
        return Ok(smaller);
    }

    Ok(sub_domains)
}

fn widest_axis(domain: &CoefficientDomain) -> (Series, usize, AxisRange) {
    let mut best = (Series::A, 0, domain.axis_ranges(Series::A)[0]);
    for series in [Series::A, Series::B] {
        for (index, &axis) in domain.axis_ranges(series).iter().enumerate() {
            if axis.size() > best.2.size() {
                best = (series, index, axis);
            }
        }
    }
    best
}

/// Cut an inclusive range into `parts` contiguous chunks, the leading chunks
/// one longer when the length does not divide evenly.
fn split_range(range: AxisRange, parts: usize) -> Vec<AxisRange> {
    let len = range.size();
    let base = len / parts as u64;
    let remainder = (len % parts as u64) as usize;

    let mut chunks = Vec::with_capacity(parts);
    let mut lo = range.lo;
    for i in 0..parts {
        let chunk_len = base + u64::from(i < remainder);
        let hi = lo + chunk_len as i64 - 1;
        chunks.push(AxisRange::new(lo, hi));
        lo = hi + 1;
    }
    debug_assert_eq!(lo, range.hi + 1);
    chunks
}

/// Size of the `i`-th of `parts` near-equal groups of `total` items.
fn even_share(total: usize, parts: usize, i: usize) -> usize {
    total / parts + usize::from(i < total % parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointKey;
    use std::collections::HashSet;

    fn sub_sizes(subs: &[CoefficientDomain]) -> u128 {
        subs.iter().map(CoefficientDomain::total_size).sum()
    }

    #[test]
    fn worked_example_four_workers() {
        // a of degree 1 over [-3,3] with positive lead, b of degree 0 over
        // [-5,5]: 3 * 7 * 11 pairs, split across 4 workers.
        let domain = CoefficientDomain::new(1, (-3, 3), 0, (-5, 5), true).unwrap();
        let subs = split_domain(&domain, 4).unwrap();

        assert_eq!(subs.len(), 4);
        assert_eq!(sub_sizes(&subs), 231);

        // The widest axis is b's [-5,5]; chunks are near-equal.
        let b_chunks: Vec<AxisRange> = subs
            .iter()
            .map(|sub| sub.axis_ranges(Series::B)[0])
            .collect();
        assert_eq!(
            b_chunks,
            vec![
                AxisRange::new(-5, -3),
                AxisRange::new(-2, 0),
                AxisRange::new(1, 3),
                AxisRange::new(4, 5),
            ]
        );
    }

    #[test]
    fn chunk_sizes_differ_by_at_most_one() {
        let chunks = split_range(AxisRange::new(0, 10), 4);
        let sizes: Vec<u64> = chunks.iter().map(AxisRange::size).collect();
        assert_eq!(sizes, vec![3, 3, 3, 2]);
        assert_eq!(chunks.first().unwrap().lo, 0);
        assert_eq!(chunks.last().unwrap().hi, 10);
    }

    #[test]
    fn recursive_split_when_workers_exceed_widest_axis() {
        let domain = CoefficientDomain::new(1, (-3, 3), 0, (-5, 5), true).unwrap();
        let subs = split_domain(&domain, 50).unwrap();

        assert_eq!(sub_sizes(&subs), 231);
        assert!(subs.len() <= 50);
        assert!(subs.len() > 11, "the 11-wide axis alone cannot feed 50 workers");
    }

    #[test]
    fn sub_domains_are_disjoint_and_cover_everything() {
        let domain = CoefficientDomain::new(1, (-2, 2), 0, (-2, 2), true).unwrap();
        let subs = split_domain(&domain, 7).unwrap();
        assert_eq!(sub_sizes(&subs), domain.total_size());

        let mut seen: HashSet<(Vec<i64>, Vec<i64>)> = HashSet::new();
        for sub in &subs {
            for a in tuples(&sub.expand(Series::A)) {
                for b in tuples(&sub.expand(Series::B)) {
                    assert!(
                        seen.insert((a.clone(), b.clone())),
                        "pair emitted by two sub-domains: {a:?} {b:?}"
                    );
                }
            }
        }
        assert_eq!(seen.len() as u128, domain.total_size());
    }

    #[test]
    fn sub_domains_have_distinct_checkpoint_identities() {
        let domain = CoefficientDomain::new(1, (-3, 3), 0, (-5, 5), true).unwrap();
        let subs = split_domain(&domain, 4).unwrap();
        let keys: HashSet<CheckpointKey> =
            subs.iter().map(CheckpointKey::for_domain).collect();
        assert_eq!(keys.len(), subs.len());
    }

    #[test]
    fn single_instance_split_is_the_whole_domain() {
        let domain = CoefficientDomain::new(1, (-3, 3), 0, (-5, 5), true).unwrap();
        let subs = split_domain(&domain, 1).unwrap();
        assert_eq!(subs, vec![domain]);
    }

    #[test]
    fn unsplittable_domain_yields_itself() {
        let domain = CoefficientDomain::new(0, (1, 1), 0, (2, 2), false).unwrap();
        let subs = split_domain(&domain, 8).unwrap();
        assert_eq!(subs, vec![domain]);
    }

    fn tuples(axes: &[Vec<i64>]) -> Vec<Vec<i64>> {
        let mut out: Vec<Vec<i64>> = vec![Vec::new()];
        for axis in axes {
            let mut next = Vec::new();
            for prefix in &out {
                for &value in axis {
                    let mut tuple = prefix.clone();
                    tuple.push(value);
                    next.push(tuple);
                }
            }
            out = next;
        }
        out
    }
}
