#![forbid(unsafe_code)]

//! Core domain model and business logic for the Replog workout logger.
//!
//! This crate provides:
//! - Domain types (sets, session state, templates, effects)
//! - The active workout session engine (ledger, completion workflow,
//!   rest timer coordination, change-detecting aggregator)
//! - Pure value codecs for set inputs and timer durations
//! - Persistence collaborators (snapshot store, journal, CSV export)

pub mod types;
pub mod error;
pub mod codec;
pub mod config;
pub mod logging;
pub mod ledger;
pub mod completion;
pub mod timer;
pub mod aggregate;
pub mod session;
pub mod history;
pub mod state;
pub mod journal;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use ledger::SetLedger;
pub use completion::{toggle_completion, CompletionContext};
pub use timer::{RestTimerCoordinator, TickOutcome};
pub use aggregate::SessionAggregator;
pub use session::ExerciseSession;
pub use history::{load_exercise_history, ExerciseHistory};
pub use journal::{JsonlSink, SnapshotSink};
