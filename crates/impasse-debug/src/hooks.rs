//! Hooks invoked when the narrow phase sees a zero time of impact.
//!
//! Hooks are shared across rayon workers, so they take `&self` and must
//! be `Send + Sync`. A hook never fails the query that triggered it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::snapshot::ImpactSnapshot;

/// Receiver for zero time-of-impact anomalies.
pub trait ImpactHook: Send + Sync {
    /// Called once per colliding candidate whose time of impact is zero.
    fn on_zero_toi(&self, snapshot: &ImpactSnapshot);

    /// Returns the hook's name for logging.
    fn name(&self) -> &str;
}

/// Writes each snapshot to `ccd-test-NNN.json` in a directory.
///
/// The file counter is shared by all callers of this hook. Write
/// failures are logged and otherwise ignored.
pub struct JsonDumpHook {
    dir: PathBuf,
    counter: AtomicUsize,
}

impl JsonDumpHook {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicUsize::new(0),
        }
    }

    /// Directory dumps are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of dump files attempted so far.
    pub fn count(&self) -> usize {
        self.counter.load(Ordering::Relaxed)
    }

    /// Path of the `index`-th dump file.
    pub fn dump_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("ccd-test-{index:03}.json"))
    }
}

impl ImpactHook for JsonDumpHook {
    fn on_zero_toi(&self, snapshot: &ImpactSnapshot) {
        let index = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = self.dump_path(index);
        let written = snapshot
            .to_json()
            .and_then(|json| fs::write(&path, json).map_err(Into::into));
        match written {
            Ok(()) => tracing::debug!(path = %path.display(), "Wrote zero-TOI snapshot"),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to write zero-TOI snapshot"
                )
            }
        }
    }

    fn name(&self) -> &str {
        "json_dump_hook"
    }
}

/// Keeps snapshots in memory.
#[derive(Default)]
pub struct CollectingHook {
    snapshots: Mutex<Vec<ImpactSnapshot>>,
}

impl CollectingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out all snapshots received so far.
    pub fn snapshots(&self) -> Vec<ImpactSnapshot> {
        self.snapshots
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.snapshots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImpactHook for CollectingHook {
    fn on_zero_toi(&self, snapshot: &ImpactSnapshot) {
        let mut guard = self.snapshots.lock().unwrap_or_else(|p| p.into_inner());
        guard.push(snapshot.clone());
    }

    fn name(&self) -> &str {
        "collecting_hook"
    }
}
