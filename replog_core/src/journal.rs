//! Append-only snapshot journal.
//!
//! Every `StateChanged` emission the host chooses to record is appended
//! to a JSONL (JSON Lines) file with file locking to ensure safe
//! concurrent access. The journal is the raw feed behind the CSV export.

use crate::types::SnapshotEntry;
use crate::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Sink trait for recording snapshot emissions
pub trait SnapshotSink {
    fn append(&mut self, entry: &SnapshotEntry) -> Result<()>;
}

/// JSONL-based snapshot sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SnapshotSink for JsonlSink {
    fn append(&mut self, entry: &SnapshotEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        // Open file for appending
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        // Acquire exclusive lock
        file.lock_exclusive()?;

        // Write entry as JSON line
        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!(
            "Appended snapshot for instance {} to journal",
            entry.instance_id
        );
        Ok(())
    }
}

/// Read all entries from a journal file
///
/// Malformed lines are skipped with a warning rather than failing the
/// whole read.
pub fn read_entries(path: &Path) -> Result<Vec<SnapshotEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SnapshotEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} entries from journal", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExerciseSessionState, Set};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_entry(exercise: &str) -> SnapshotEntry {
        let mut state = ExerciseSessionState::default();
        state.sets.push(Set::blank("1", "k1"));
        SnapshotEntry {
            instance_id: Uuid::new_v4(),
            exercise: exercise.into(),
            recorded_at: Utc::now(),
            state,
        }
    }

    #[test]
    fn test_append_and_read_single_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("session.jsonl");

        let entry = sample_entry("Bench Press");
        let instance_id = entry.instance_id;

        let mut sink = JsonlSink::new(&journal_path);
        sink.append(&entry).unwrap();

        let entries = read_entries(&journal_path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].instance_id, instance_id);
        assert_eq!(entries[0].exercise, "Bench Press");
    }

    #[test]
    fn test_append_multiple_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("session.jsonl");

        let mut sink = JsonlSink::new(&journal_path);
        for _ in 0..5 {
            sink.append(&sample_entry("Squat")).unwrap();
        }

        let entries = read_entries(&journal_path).unwrap();
        assert_eq!(entries.len(), 5);
    }

    #[test]
    fn test_read_empty_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("nonexistent.jsonl");

        let entries = read_entries(&journal_path).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("session.jsonl");

        let mut sink = JsonlSink::new(&journal_path);
        sink.append(&sample_entry("Row")).unwrap();

        use std::io::Write as _;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&journal_path)
            .unwrap();
        writeln!(file, "{{ not json").unwrap();

        sink.append(&sample_entry("Row")).unwrap();

        let entries = read_entries(&journal_path).unwrap();
        assert_eq!(entries.len(), 2);
    }
}
