//! Session snapshot persistence with file locking.
//!
//! This module handles saving and loading the serialized exercise
//! session state with proper file locking to prevent concurrent access
//! issues. Emission is the engine's job (the `StateChanged` effect);
//! this is the host side that actually writes it.

use crate::{Error, ExerciseSessionState, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl ExerciseSessionState {
    /// Load a session snapshot from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No snapshot file found, using empty session state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open snapshot file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock snapshot file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read snapshot file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<ExerciseSessionState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded session snapshot from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse snapshot file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save a session snapshot to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "snapshot path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old snapshot file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved session snapshot to {:?}", path);
        Ok(())
    }
}
