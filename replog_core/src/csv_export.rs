//! CSV export of completed sets from the snapshot journal.
//!
//! The journal records every emitted snapshot; only the latest entry per
//! session instance reflects the final state of that exercise. Export
//! walks the journal, keeps the last entry per instance, and appends one
//! CSV row per completed non-warmup set.

use crate::types::SnapshotEntry;
use crate::Result;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    instance_id: String,
    exercise: String,
    set_id: String,
    weight: String,
    reps: String,
    rir: String,
    total: String,
    recorded_at: String,
}

/// Export the journal's completed sets to CSV
///
/// Appends to the CSV file (creates with headers if needed) and returns
/// the number of set rows written. The journal itself is left in place.
pub fn journal_to_csv(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let entries = crate::journal::read_entries(journal_path)?;

    if entries.is_empty() {
        tracing::info!("No journal entries to export");
        return Ok(0);
    }

    // Last entry per instance wins; journal order is append order.
    let mut latest: HashMap<Uuid, &SnapshotEntry> = HashMap::new();
    for entry in &entries {
        latest.insert(entry.instance_id, entry);
    }

    let mut instances: Vec<&SnapshotEntry> = latest.into_values().collect();
    instances.sort_by_key(|e| e.recorded_at);

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when the file is empty
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut count = 0;
    for entry in instances {
        for set in &entry.state.sets {
            if !set.completed || set.is_warmup() {
                continue;
            }
            writer.serialize(CsvRow {
                instance_id: entry.instance_id.to_string(),
                exercise: entry.exercise.clone(),
                set_id: set.id.clone(),
                weight: set.weight.clone(),
                reps: set.reps.clone(),
                rir: set.rir.clone(),
                total: set.total.clone(),
                recorded_at: entry.recorded_at.to_rfc3339(),
            })?;
            count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} completed sets to CSV", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{JsonlSink, SnapshotSink};
    use crate::types::{ExerciseSessionState, Set, WARMUP_ID};
    use chrono::Utc;

    fn entry_with_sets(instance_id: Uuid, sets: Vec<Set>) -> SnapshotEntry {
        SnapshotEntry {
            instance_id,
            exercise: "Bench Press".into(),
            recorded_at: Utc::now(),
            state: ExerciseSessionState {
                sets,
                notes: String::new(),
                set_timers: Default::default(),
            },
        }
    }

    fn completed_set(id: &str, key: &str) -> Set {
        let mut set = Set::blank(id, key);
        set.weight = "50".into();
        set.reps = "10".into();
        set.total = "500".into();
        set.completed = true;
        set
    }

    #[test]
    fn test_export_writes_completed_sets_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("session.jsonl");
        let csv_path = temp_dir.path().join("sets.csv");

        let mut warmup = completed_set(WARMUP_ID, "k1");
        warmup.completed = true;

        let mut sink = JsonlSink::new(&journal_path);
        sink.append(&entry_with_sets(
            Uuid::new_v4(),
            vec![warmup, completed_set("1", "k2"), Set::blank("2", "k3")],
        ))
        .unwrap();

        let count = journal_to_csv(&journal_path, &csv_path).unwrap();
        assert_eq!(count, 1);
        assert!(csv_path.exists());
    }

    #[test]
    fn test_latest_entry_per_instance_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("session.jsonl");
        let csv_path = temp_dir.path().join("sets.csv");

        let instance_id = Uuid::new_v4();
        let mut sink = JsonlSink::new(&journal_path);

        // Two snapshots of the same instance; only the second counts.
        sink.append(&entry_with_sets(instance_id, vec![completed_set("1", "k1")]))
            .unwrap();
        sink.append(&entry_with_sets(
            instance_id,
            vec![completed_set("1", "k1"), completed_set("2", "k2")],
        ))
        .unwrap();

        let count = journal_to_csv(&journal_path, &csv_path).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_export_appends_without_duplicate_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_a = temp_dir.path().join("a.jsonl");
        let journal_b = temp_dir.path().join("b.jsonl");
        let csv_path = temp_dir.path().join("sets.csv");

        let mut sink = JsonlSink::new(&journal_a);
        sink.append(&entry_with_sets(Uuid::new_v4(), vec![completed_set("1", "k1")]))
            .unwrap();
        journal_to_csv(&journal_a, &csv_path).unwrap();

        let mut sink = JsonlSink::new(&journal_b);
        sink.append(&entry_with_sets(Uuid::new_v4(), vec![completed_set("1", "k1")]))
            .unwrap();
        journal_to_csv(&journal_b, &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        let record_count = reader.into_records().count();
        assert_eq!(record_count, 2);
    }

    #[test]
    fn test_empty_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("empty.jsonl");
        let csv_path = temp_dir.path().join("sets.csv");

        std::fs::File::create(&journal_path).unwrap();

        let count = journal_to_csv(&journal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }
}
