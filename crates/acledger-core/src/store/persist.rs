//! JSON file store with all-or-nothing changes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// A value persisted as a single JSON file.
///
/// The store keeps a working copy, which callers mutate, and the snapshot
/// last written to disk. [`AtomicStore::atomic_change`] either commits
/// every edit made in its scope or none of them.
///
/// The file is read once, on [`AtomicStore::load`]. Writers in other
/// processes are not detected; the last commit wins.
#[derive(Debug)]
pub struct AtomicStore<T> {
    path: PathBuf,
    working: T,
    committed: T,
}

impl<T> AtomicStore<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Default,
{
    /// Loads the value from `path`; a missing file yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let value = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            debug!("No config at {}, starting empty", path.display());
            T::default()
        };

        Ok(Self {
            path,
            committed: value.clone(),
            working: value,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current (working) value.
    #[must_use]
    pub const fn get(&self) -> &T {
        &self.working
    }

    /// Runs `change` against the working copy and commits the result.
    ///
    /// If `change` fails, or the commit itself fails, the working copy is
    /// restored from the last committed snapshot and the error is returned.
    /// Nothing is written when the value did not change.
    ///
    /// # Errors
    ///
    /// Returns the error from `change`, or an I/O or serialization error
    /// from writing the file.
    pub fn atomic_change<R>(&mut self, change: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        let outcome = change(&mut self.working).and_then(|value| {
            self.commit()?;
            Ok(value)
        });

        if let Err(e) = &outcome {
            warn!("Rolling back change to {}: {e}", self.path.display());
            self.working = self.committed.clone();
        }
        outcome
    }

    /// Drops both the working copy and the snapshot, without touching disk.
    pub fn reset(&mut self) {
        self.working = T::default();
        self.committed = T::default();
    }

    /// Writes the working copy if it differs from the snapshot.
    ///
    /// Returns whether anything was written.
    fn commit(&mut self) -> Result<bool> {
        if self.working == self.committed {
            debug!("No changes to commit for {}", self.path.display());
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.working)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;

        self.committed = self.working.clone();
        debug!("Committed {}", self.path.display());
        Ok(true)
    }
}
