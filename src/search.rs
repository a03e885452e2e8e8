//! The two-pass search: FR screening, then precision refinement + PSLQ
//!
//! Pass one walks every candidate pair of the domain through the FR detector
//! and keeps the survivors as [`Match`]es. Pass two recomputes each survivor
//! to high precision and hunts for an integer relation between the value and
//! the configured target constants.
//!
//! Every failure in pass two is contained at the candidate boundary: a
//! degenerate evaluation or a relation-search error logs the offending
//! candidate and moves on. Only storage failures from the checkpoint layer
//! abort the enumeration, because continuing without resumability would turn
//! the next crash into silent data loss.

use std::collections::HashSet;
use std::path::PathBuf;

use log::{error, info, warn};
use rug::ops::Pow;
use rug::{Float, Integer};

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::constants::TargetConstant;
use crate::domain::{compact_degree, CoefficientDomain, DomainError, Series};
use crate::enumerate::{DomainEnumerator, CHECKPOINT_DUMP_SIZE};
use crate::fr::{check_for_fr, FrOptions, FIRST_ENUMERATION_MAX_DEPTH};
use crate::gcf::{evaluate_with_escalation, EvalOptions, GcfEval};
use crate::relation::{find_integer_relation, reduce_fraction, RelationOptions};
use crate::series::poly_terms;

/// A candidate that passed the FR screen. Carries no numeric value yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub a: Vec<i64>,
    pub b: Vec<i64>,
    /// Step at which the FR verdict was reached.
    pub depth: usize,
}

/// An integer relation between a refined value and one target constant,
/// reduced to canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub constant: TargetConstant,
    pub numerator: Vec<Integer>,
    pub denominator: Vec<Integer>,
}

/// A match with its refined value and relation-search outcome. `relation` is
/// `None` when no relation was found, which is an informative result in its
/// own right.
#[derive(Debug, Clone)]
pub struct RefinedMatch {
    pub a: Vec<i64>,
    pub b: Vec<i64>,
    pub value: Float,
    pub relation: Option<Relation>,
    /// Significant digits the value is good to.
    pub precision: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Everything tunable about one search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Outer-loop series; pick the one whose terms the consumer caches.
    pub primary: Series,
    /// Term-stream depth of the FR pass.
    pub max_depth: u64,
    pub fr: FrOptions,
    pub checkpoint_dir: PathBuf,
    pub checkpoint_every: usize,
    pub eval: EvalOptions,
    pub relation: RelationOptions,
    /// Constants to test refined values against, in order.
    pub constants: Vec<TargetConstant>,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            primary: Series::A,
            max_depth: FIRST_ENUMERATION_MAX_DEPTH,
            fr: FrOptions::default(),
            checkpoint_dir: PathBuf::from("."),
            checkpoint_every: CHECKPOINT_DUMP_SIZE,
            eval: EvalOptions::default(),
            relation: RelationOptions::default(),
            constants: vec![TargetConstant::Zeta3],
        }
    }
}

/// A search over one domain (or one split sub-domain, on a worker).
#[derive(Debug)]
pub struct FrSearch {
    domain: CoefficientDomain,
    config: SearchConfig,
}

impl FrSearch {
    pub fn new(domain: CoefficientDomain, config: SearchConfig) -> FrSearch {
        FrSearch { domain, config }
    }

    /// The FR pass: enumerate the whole domain (resuming if a checkpoint is
    /// present) and collect the candidates showing factorial reduction.
    ///
    /// Matches are deduplicated by coefficient pair, so the one coordinate a
    /// resumed run re-tests can never surface as a second discovery.
    pub fn enumerate_matches(&self) -> Result<Vec<Match>, SearchError> {
        let store = CheckpointStore::new(&self.config.checkpoint_dir)?;
        let enumerator = DomainEnumerator::with_dump_size(
            &self.domain,
            self.config.primary,
            store,
            self.config.checkpoint_every,
        );

        let mut seen: HashSet<(Vec<i64>, Vec<i64>)> = HashSet::new();
        let mut matches = Vec::new();
        let mut tested = 0u64;

        for item in enumerator {
            let (a, b) = item?;
            tested += 1;

            let report = check_for_fr(
                poly_terms(&a, self.config.max_depth),
                poly_terms(&b, self.config.max_depth),
                compact_degree(&a),
                self.config.fr,
            );
            if report.has_fr {
                if !seen.insert((a.clone(), b.clone())) {
                    continue;
                }
                info!("found a GCF with FR: a={:?} b={:?} at step {}", a, b, report.depth);
                matches.push(Match {
                    a,
                    b,
                    depth: report.depth,
                });
            }
        }

        info!(
            "first enumeration finished: {} candidates tested, {} with FR",
            tested,
            matches.len()
        );
        Ok(matches)
    }

    /// The refinement pass: recompute each match to high precision and run
    /// the relation search against every configured constant, stopping at
    /// the first that yields a relation.
    pub fn refine(&self, matches: &[Match]) -> Vec<RefinedMatch> {
        let prec = self.config.eval.precision_bits;
        let constants: Vec<(TargetConstant, Float)> = self
            .config
            .constants
            .iter()
            .map(|&c| (c, c.value(prec)))
            .collect();

        let mut refined = Vec::new();
        'candidates: for m in matches {
            let (value, precision) =
                match evaluate_with_escalation(&m.a, &m.b, &self.config.eval) {
                    GcfEval::Value { value, precision } => (value, precision),
                    GcfEval::Degenerate { step } => {
                        warn!(
                            "match a={:?} b={:?} degenerates at step {} under refinement, skipping",
                            m.a, m.b, step
                        );
                        continue;
                    }
                };

            let tolerance = Float::with_val(prec, 10).pow(1 - precision as i32);
            let mut relation = None;
            for (constant, c) in &constants {
                let xs = relation_basis(c, &value, prec);
                match find_integer_relation(&xs, &tolerance, &self.config.relation) {
                    Ok(Some(coefs)) => {
                        let (numerator, denominator) =
                            reduce_fraction(&coefs[..3], &coefs[3..]);
                        info!(
                            "relation against {} for a={:?} b={:?}: {:?} / {:?}",
                            constant, m.a, m.b, numerator, denominator
                        );
                        relation = Some(Relation {
                            constant: *constant,
                            numerator,
                            denominator,
                        });
                        break;
                    }
                    Ok(None) => {}
                    Err(err) => {
                        // One candidate's numerical failure must not end the
                        // batch.
                        error!(
                            "relation search failed for a={:?} b={:?} value={} constant={}: {}",
                            m.a, m.b, value, constant, err
                        );
                        continue 'candidates;
                    }
                }
            }

            refined.push(RefinedMatch {
                a: m.a.clone(),
                b: m.b.clone(),
                value,
                relation,
                precision,
            });
        }
        refined
    }

    /// Run both passes.
    pub fn run(&self) -> Result<Vec<RefinedMatch>, SearchError> {
        let matches = self.enumerate_matches()?;
        Ok(self.refine(&matches))
    }
}

/// The vector handed to PSLQ: `[1, c, c^2, -v, -c*v, -c^2*v]`. A relation
/// over it expresses `v` as a ratio of quadratics in `c`.
fn relation_basis(c: &Float, v: &Float, prec: u32) -> Vec<Float> {
    let c2 = Float::with_val(prec, c * c);
    vec![
        Float::with_val(prec, 1),
        c.clone(),
        c2.clone(),
        Float::with_val(prec, -v),
        -Float::with_val(prec, c * v),
        -Float::with_val(prec, &c2 * v),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_basis_has_expected_shape() {
        let c = Float::with_val(64, 2);
        let v = Float::with_val(64, 3);
        let xs = relation_basis(&c, &v, 64);
        let as_f64: Vec<f64> = xs.iter().map(Float::to_f64).collect();
        assert_eq!(as_f64, vec![1.0, 2.0, 4.0, -3.0, -6.0, -12.0]);
    }

    #[test]
    fn default_config_matches_search_constants() {
        let config = SearchConfig::default();
        assert_eq!(config.max_depth, 1_000);
        assert_eq!(config.checkpoint_every, 5_000);
        assert_eq!(config.fr.burst_number, 200);
    }
}
