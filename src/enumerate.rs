//! Resumable enumeration of a domain's candidate pairs
//!
//! The enumerator walks the full Cartesian product of the two coefficient
//! series in a deterministic nested-loop order: the caller picks one series as
//! *primary* (the outer loop, chosen to match whatever term caching the
//! consumer does) and the other series cycles fastest. Progress is persisted
//! through a [`CheckpointStore`] every [`CHECKPOINT_DUMP_SIZE`] pairs and the
//! checkpoint is deleted exactly once, on exhaustion.
//!
//! Suspension is an explicit cursor rather than generator state: the whole
//! walk is a struct holding two odometers and a counter, so resuming is just
//! rebuilding the struct from the persisted coordinate. On resume the
//! checkpointed pair itself is yielded again. The checkpoint may have been
//! taken mid-computation, so redoing that one coordinate is the price of
//! never skipping work; consumers must tolerate a single duplicate.

use log::{debug, info, warn};

use crate::checkpoint::{Checkpoint, CheckpointError, CheckpointKey, CheckpointStore};
use crate::domain::{CoefficientDomain, Series};

/// How many emitted pairs between checkpoint writes. A crash loses at most
/// this many completed-but-unrecorded candidates.
pub const CHECKPOINT_DUMP_SIZE: usize = 5_000;

/// Odometer over the Cartesian product of explicit axis value lists, last
/// axis fastest.
#[derive(Debug, Clone)]
struct TupleCursor {
    axes: Vec<Vec<i64>>,
    indices: Vec<usize>,
    exhausted: bool,
}

impl TupleCursor {
    fn new(axes: Vec<Vec<i64>>) -> TupleCursor {
        let exhausted = axes.iter().any(Vec::is_empty);
        let indices = vec![0; axes.len()];
        TupleCursor {
            axes,
            indices,
            exhausted,
        }
    }

    fn current(&self) -> Vec<i64> {
        self.axes
            .iter()
            .zip(&self.indices)
            .map(|(values, &i)| values[i])
            .collect()
    }

    fn advance(&mut self) {
        for axis in (0..self.axes.len()).rev() {
            self.indices[axis] += 1;
            if self.indices[axis] < self.axes[axis].len() {
                return;
            }
            self.indices[axis] = 0;
        }
        self.exhausted = true;
    }

    fn next_tuple(&mut self) -> Option<Vec<i64>> {
        if self.exhausted {
            return None;
        }
        let tuple = self.current();
        self.advance();
        Some(tuple)
    }

    /// Discard tuples up to and including `target`. Returns false when the
    /// target is not part of this cursor's product.
    fn fast_forward_to(&mut self, target: &[i64]) -> bool {
        while let Some(tuple) = self.next_tuple() {
            if tuple == target {
                return true;
            }
        }
        false
    }
}

/// Checkpoint-aware iterator over every `(a, b)` coefficient pair of a
/// domain.
///
/// For an uninterrupted run each pair is produced exactly once, in
/// primary-major order. Across an interruption and resume, each pair is
/// produced at least once, with at most the checkpointed pair duplicated.
#[derive(Debug)]
pub struct DomainEnumerator {
    primary: Series,
    store: CheckpointStore,
    key: CheckpointKey,
    secondary_axes: Vec<Vec<i64>>,
    primary_cursor: TupleCursor,
    secondary_cursor: TupleCursor,
    primary_current: Vec<i64>,
    /// The resume coordinate, emitted before the cursors take over.
    pending: Option<(Vec<i64>, Vec<i64>)>,
    emitted: usize,
    dump_every: usize,
    finished: bool,
}

impl DomainEnumerator {
    pub fn new(
        domain: &CoefficientDomain,
        primary: Series,
        store: CheckpointStore,
    ) -> DomainEnumerator {
        DomainEnumerator::with_dump_size(domain, primary, store, CHECKPOINT_DUMP_SIZE)
    }

    /// As [`DomainEnumerator::new`] with an explicit checkpoint cadence.
    pub fn with_dump_size(
        domain: &CoefficientDomain,
        primary: Series,
        store: CheckpointStore,
        dump_every: usize,
    ) -> DomainEnumerator {
        assert!(dump_every > 0, "checkpoint cadence must be positive");
        let key = CheckpointKey::for_domain(domain);
        let checkpoint = store.load(&key, domain);
        let (primary_target, secondary_target) = match primary {
            Series::A => (checkpoint.a, checkpoint.b),
            Series::B => (checkpoint.b, checkpoint.a),
        };

        let primary_axes = domain.expand(primary);
        let secondary_axes = domain.expand(primary.other());
        let mut primary_cursor = TupleCursor::new(primary_axes.clone());
        let mut secondary_cursor = TupleCursor::new(secondary_axes.clone());

        let on_track = primary_cursor.fast_forward_to(&primary_target)
            && secondary_cursor.fast_forward_to(&secondary_target);
        let (primary_current, pending) = if on_track {
            (
                primary_target.clone(),
                Some((primary_target, secondary_target)),
            )
        } else {
            // The file parsed but its coordinate is not in this domain. That
            // only happens for a hand-edited or colliding file; treat it like
            // corruption and restart from the origin.
            warn!(
                "checkpoint {} does not match the domain shape, restarting from origin",
                key.as_hex()
            );
            primary_cursor = TupleCursor::new(primary_axes);
            secondary_cursor = TupleCursor::new(secondary_axes.clone());
            let origin_primary = primary_cursor
                .next_tuple()
                .expect("domain axes are non-empty");
            let origin_secondary = secondary_cursor
                .next_tuple()
                .expect("domain axes are non-empty");
            (origin_primary.clone(), Some((origin_primary, origin_secondary)))
        };

        DomainEnumerator {
            primary,
            store,
            key,
            secondary_axes,
            primary_cursor,
            secondary_cursor,
            primary_current,
            pending,
            emitted: 0,
            dump_every,
            finished: false,
        }
    }

    /// The checkpoint identity this enumerator persists under.
    pub fn checkpoint_key(&self) -> &CheckpointKey {
        &self.key
    }

    fn as_pair(&self, secondary: Vec<i64>) -> (Vec<i64>, Vec<i64>) {
        match self.primary {
            Series::A => (self.primary_current.clone(), secondary),
            Series::B => (secondary, self.primary_current.clone()),
        }
    }

    fn checkpoint_for(&self, pair: &(Vec<i64>, Vec<i64>)) -> Checkpoint {
        Checkpoint {
            a: pair.0.clone(),
            b: pair.1.clone(),
        }
    }
}

impl Iterator for DomainEnumerator {
    type Item = Result<(Vec<i64>, Vec<i64>), CheckpointError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let pair = if let Some(pending) = self.pending.take() {
            pending
        } else {
            loop {
                if let Some(secondary) = self.secondary_cursor.next_tuple() {
                    break self.as_pair(secondary);
                }
                match self.primary_cursor.next_tuple() {
                    Some(primary) => {
                        // Fresh full inner loop under the next outer value.
                        self.primary_current = primary;
                        self.secondary_cursor = TupleCursor::new(self.secondary_axes.clone());
                    }
                    None => {
                        self.finished = true;
                        info!(
                            "domain {} enumerated completely, removing checkpoint",
                            self.key.as_hex()
                        );
                        return match self.store.delete(&self.key) {
                            Ok(()) => None,
                            Err(err) => Some(Err(err)),
                        };
                    }
                }
            }
        };

        self.emitted += 1;
        if self.emitted % self.dump_every == 0 {
            let checkpoint = self.checkpoint_for(&pair);
            if let Err(err) = self.store.save(&self.key, &checkpoint) {
                // A checkpoint that cannot be written means resumability is
                // already lost; stop and surface it instead of searching on.
                self.finished = true;
                return Some(Err(err));
            }
            debug!("checkpointed after {} pairs", self.emitted);
        }

        Some(Ok(pair))
    }
}
