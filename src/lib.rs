//! # gcf-search
//!
//! A resumable enumeration engine for generalized continued fractions whose
//! partial numerators and denominators are integer polynomials in the depth.
//!
//! The search runs in two passes. The first walks a Cartesian product of
//! coefficient ranges (a [`CoefficientDomain`]) and screens every pair of
//! polynomials with a cheap factorial-reduction test; progress is
//! checkpointed to disk so an interrupted run resumes where it stopped, and
//! a domain can be split across worker processes with [`split_domain`]. The
//! second pass re-evaluates each surviving candidate to high precision and
//! searches for an integer relation tying its value to a configured
//! mathematical constant via PSLQ.
//!
//! [`FrSearch`] drives both passes; the individual stages are public for
//! callers that want to run them separately.

pub mod checkpoint;
pub mod constants;
pub mod domain;
pub mod enumerate;
pub mod fr;
pub mod gcf;
pub mod relation;
pub mod search;
pub mod series;
pub mod split;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointKey, CheckpointStore};
pub use constants::TargetConstant;
pub use domain::{AxisRange, CoefficientDomain, DomainError, Series};
pub use enumerate::{DomainEnumerator, CHECKPOINT_DUMP_SIZE};
pub use fr::{check_for_fr, FrOptions, FrReport};
pub use gcf::{evaluate_with_escalation, EvalOptions, GcfEval};
pub use relation::{find_integer_relation, RelationError, RelationOptions};
pub use search::{FrSearch, Match, RefinedMatch, Relation, SearchConfig, SearchError};
pub use split::split_domain;
