//! Checkpoint persistence for resumable enumeration
//!
//! A long search must survive interruption without losing completed work. The
//! store keeps one small JSON file per domain *shape*: the file records the
//! last coordinate pair handed out by the enumerator, and the file name is a
//! SHA-256 fingerprint of the domain's axis ranges. Two different domains (or
//! two sub-domains produced by splitting) can therefore never read each
//! other's checkpoints, and a stale file from a differently-shaped search is
//! simply never looked up.
//!
//! Recovery policy: a checkpoint that fails to parse is quarantined by
//! renaming it with a `.corrupted` suffix and enumeration restarts from the
//! domain origin. Corrupt data is never silently deleted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{CoefficientDomain, Series};

/// The last-visited coordinate pair of an enumeration, one coefficient tuple
/// per series. This is the unit persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub a: Vec<i64>,
    pub b: Vec<i64>,
}

impl Checkpoint {
    /// The sentinel "start of domain" checkpoint: the first value of every
    /// axis in both series.
    pub fn origin(domain: &CoefficientDomain) -> Checkpoint {
        Checkpoint {
            a: domain.origin(Series::A),
            b: domain.origin(Series::B),
        }
    }
}

/// Deterministic fingerprint of a domain's axis ranges, used as the
/// checkpoint's storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey(String);

impl CheckpointKey {
    pub fn for_domain(domain: &CoefficientDomain) -> CheckpointKey {
        let mut hasher = Sha256::new();
        for series in [Series::A, Series::B] {
            for axis in domain.axis_ranges(series) {
                hasher.update(axis.lo.to_le_bytes());
                hasher.update(axis.hi.to_le_bytes());
            }
            // Separator so the a/b boundary contributes to the hash.
            hasher.update([0xff]);
        }
        CheckpointKey(hex::encode(hasher.finalize()))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint io error: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-backed checkpoint storage, one file per domain shape.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<CheckpointStore, CheckpointError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(CheckpointStore { dir })
    }

    fn path(&self, key: &CheckpointKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_hex()))
    }

    /// Load the checkpoint for `key`, falling back to the domain origin when
    /// no usable checkpoint exists.
    ///
    /// An unreadable or unparsable file is renamed with a `.corrupted` suffix
    /// before the fallback is returned, so a bad file never shadows a later
    /// good save and the broken bytes stay available for inspection.
    pub fn load(&self, key: &CheckpointKey, domain: &CoefficientDomain) -> Checkpoint {
        let path = self.path(key);
        if !path.exists() {
            return Checkpoint::origin(domain);
        }
        let parsed = fs::read(&path)
            .map_err(CheckpointError::from)
            .and_then(|bytes| Ok(serde_json::from_slice::<Checkpoint>(&bytes)?));
        match parsed {
            Ok(checkpoint) => {
                debug!(
                    "loaded checkpoint {} at a={:?} b={:?}",
                    key.as_hex(),
                    checkpoint.a,
                    checkpoint.b
                );
                checkpoint
            }
            Err(err) => {
                let quarantine = path.with_extension("json.corrupted");
                warn!(
                    "checkpoint {} unreadable ({}), quarantining to {} and restarting from origin",
                    path.display(),
                    err,
                    quarantine.display()
                );
                if let Err(rename_err) = fs::rename(&path, &quarantine) {
                    warn!(
                        "could not quarantine corrupt checkpoint {}: {}",
                        path.display(),
                        rename_err
                    );
                }
                Checkpoint::origin(domain)
            }
        }
    }

    /// Overwrite the stored checkpoint via a temp file and rename, so a crash
    /// mid-write leaves the previous checkpoint intact.
    pub fn save(&self, key: &CheckpointKey, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(checkpoint)?)?;
        fs::rename(&tmp, &path)?;
        debug!(
            "saved checkpoint {} at a={:?} b={:?}",
            key.as_hex(),
            checkpoint.a,
            checkpoint.b
        );
        Ok(())
    }

    /// Remove the checkpoint. Already-absent counts as success, so completion
    /// and small never-checkpointed domains behave the same.
    pub fn delete(&self, key: &CheckpointKey) -> Result<(), CheckpointError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CheckpointError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AxisRange;

    fn small_domain() -> CoefficientDomain {
        CoefficientDomain::new(1, (-2, 2), 0, (-1, 1), true).unwrap()
    }

    #[test]
    fn missing_checkpoint_loads_as_origin() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        let domain = small_domain();
        let key = CheckpointKey::for_domain(&domain);
        assert_eq!(store.load(&key, &domain), Checkpoint::origin(&domain));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        let domain = small_domain();
        let key = CheckpointKey::for_domain(&domain);

        let checkpoint = Checkpoint {
            a: vec![2, -1],
            b: vec![0],
        };
        store.save(&key, &checkpoint).unwrap();
        assert_eq!(store.load(&key, &domain), checkpoint);
    }

    #[test]
    fn corrupt_checkpoint_is_quarantined_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        let domain = small_domain();
        let key = CheckpointKey::for_domain(&domain);

        let path = dir.path().join(format!("{}.json", key.as_hex()));
        fs::write(&path, b"definitely not json").unwrap();

        assert_eq!(store.load(&key, &domain), Checkpoint::origin(&domain));
        assert!(!path.exists());
        let quarantined = path.with_extension("json.corrupted");
        assert!(quarantined.exists());
        assert_eq!(fs::read(&quarantined).unwrap(), b"definitely not json");
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path()).unwrap();
        let domain = small_domain();
        let key = CheckpointKey::for_domain(&domain);

        store.delete(&key).unwrap();
        store.save(&key, &Checkpoint::origin(&domain)).unwrap();
        store.delete(&key).unwrap();
        store.delete(&key).unwrap();
        assert_eq!(store.load(&key, &domain), Checkpoint::origin(&domain));
    }

    #[test]
    fn different_domain_shapes_get_different_keys() {
        let domain = small_domain();
        let narrowed = domain
            .with_axis_override(Series::B, 0, AxisRange::new(-1, 0))
            .unwrap();
        assert_ne!(
            CheckpointKey::for_domain(&domain),
            CheckpointKey::for_domain(&narrowed)
        );
    }
}
