use clap::{Parser, Subcommand};
use replog_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "replog")]
#[command(about = "Live workout set logger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live logging session for one exercise
    Live {
        /// Exercise name
        #[arg(long)]
        exercise: String,

        /// Exercise history file (previous sets + template ranges)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Use per-set countdown timers instead of the workout-wide rest timer
        #[arg(long)]
        per_set_timers: bool,

        /// Disable rest timer functionality entirely
        #[arg(long)]
        no_rest_timer: bool,
    },

    /// Export completed sets from the journal to CSV
    Export,
}

fn main() -> Result<()> {
    replog_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Live {
            exercise,
            history,
            per_set_timers,
            no_rest_timer,
        } => cmd_live(
            data_dir,
            exercise,
            history,
            per_set_timers,
            no_rest_timer,
            config,
        ),
        Commands::Export => cmd_export(data_dir),
    }
}

fn cmd_live(
    data_dir: PathBuf,
    exercise: String,
    history_path: Option<PathBuf>,
    per_set_timers: bool,
    no_rest_timer: bool,
    mut config: Config,
) -> Result<()> {
    if per_set_timers {
        config.features.timer_type = TimerMode::Set;
    }
    if no_rest_timer {
        config.features.rest_timer_enabled = false;
    }

    let snapshot_path = data_dir.join("sessions").join(snapshot_name(&exercise));
    let journal_path = data_dir.join("journal").join("snapshots.jsonl");

    let history = match history_path {
        Some(path) => load_exercise_history(&path)?.unwrap_or_default(),
        None => ExerciseHistory::default(),
    };

    let mut session = if snapshot_path.exists() {
        let state = ExerciseSessionState::load(&snapshot_path)?;
        ExerciseSession::restore(&exercise, state, history.template, history.sets, &config)
    } else {
        ExerciseSession::start(&exercise, history.template, history.sets, &config)
    };

    let mut sink = JsonlSink::new(&journal_path);

    println!("Logging: {}", session.exercise());
    print_sets(&session);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();

        let effects = match parts.as_slice() {
            &[] => continue,
            &["finish"] | &["quit"] => break,
            &["show"] => {
                print_sets(&session);
                continue;
            }
            &["add"] => {
                let (id, effects) = session.add_set();
                println!("added set {}", id);
                effects
            }
            &["del", id] => session.delete_set(id),
            &["weight", id, value] | &["w", id, value] => session.set_weight(id, value),
            &["reps", id, value] | &["r", id, value] => session.set_reps(id, value),
            &["rir", id, value] => session.set_rir(id, value),
            &["done", position] => match position.parse::<usize>() {
                Ok(p) if p >= 1 => session.toggle_completion(p - 1, false),
                _ => {
                    eprintln!("done takes a set position (1-based)");
                    continue;
                }
            },
            &["note", ..] => session.set_notes(line.trim_start().trim_start_matches("note").trim()),
            &["timer", id, value] => session.set_timer_change(id, value),
            &["start", id] => session.start_set_timer(id),
            &["stop", id] => session.stop_set_timer(id),
            &["tick"] => session.tick(),
            &["tick", n] => {
                let mut effects = Vec::new();
                for _ in 0..n.parse::<u32>().unwrap_or(1) {
                    effects.extend(session.tick());
                }
                effects
            }
            &["rest", "up"] => {
                println!("rest: {}s", session.adjust_rest(true));
                continue;
            }
            &["rest", "down"] => {
                println!("rest: {}s", session.adjust_rest(false));
                continue;
            }
            &["rest", seconds] => match seconds.parse::<u32>() {
                Ok(s) => {
                    session.set_rest_preset(s);
                    println!("rest: {}s", s);
                    continue;
                }
                Err(_) => {
                    eprintln!("rest takes up, down, or a preset in seconds");
                    continue;
                }
            },
            _ => {
                eprintln!("unknown command: {}", line.trim());
                continue;
            }
        };

        run_effects(&session, effects, &mut sink, &snapshot_path)?;
        io::stdout().flush()?;
    }

    let totals = session.totals();
    println!(
        "Session finished: {} completed sets, {} total volume",
        totals.completed_sets, totals.total_volume
    );

    Ok(())
}

fn cmd_export(data_dir: PathBuf) -> Result<()> {
    let journal_path = data_dir.join("journal").join("snapshots.jsonl");
    let csv_path = data_dir.join("sets.csv");

    if !journal_path.exists() {
        println!("No journal found - nothing to export.");
        return Ok(());
    }

    let count = replog_core::csv_export::journal_to_csv(&journal_path, &csv_path)?;

    println!("Exported {} completed sets", count);
    println!("  CSV: {}", csv_path.display());

    Ok(())
}

/// Execute the effects a mutation returned
///
/// The engine never performs I/O; everything observable happens here.
fn run_effects(
    session: &ExerciseSession,
    effects: Vec<Effect>,
    sink: &mut JsonlSink,
    snapshot_path: &Path,
) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::Haptic(haptic) => {
                println!("  ~ haptic: {:?}", haptic);
            }
            Effect::FocusWeightField {
                set_index,
                delay_ms,
            } => {
                println!(
                    "  ~ focus weight field of set {} (after {}ms)",
                    set_index + 1,
                    delay_ms
                );
            }
            Effect::StartRestTimer { seconds } => {
                println!("  ~ rest timer started: {}s", seconds);
            }
            Effect::StartSetTimer { set_id } => {
                println!("  ~ countdown started for set {}", set_id);
            }
            Effect::StopSetTimer { set_id } => {
                println!("  ~ countdown stopped for set {}", set_id);
            }
            Effect::TotalsChanged { totals } => {
                println!(
                    "  = {} completed sets, {} volume",
                    totals.completed_sets, totals.total_volume
                );
            }
            Effect::StateChanged(state) => {
                state.save(snapshot_path)?;
                sink.append(&SnapshotEntry {
                    instance_id: session.instance_id(),
                    exercise: session.exercise().to_string(),
                    recorded_at: chrono::Utc::now(),
                    state,
                })?;
            }
        }
    }
    Ok(())
}

fn print_sets(session: &ExerciseSession) {
    println!("  #   weight   reps   rir   total   done");
    for set in session.sets() {
        println!(
            "  {:<3} {:<8} {:<6} {:<5} {:<7} {}",
            set.id,
            set.weight,
            set.reps,
            set.rir,
            set.total,
            if set.completed { "x" } else { "-" }
        );
        if let Some(text) = session.timer_text(&set.id) {
            println!("      timer: {}", text);
        }
    }
}

fn snapshot_name(exercise: &str) -> String {
    let slug: String = exercise
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.json", slug)
}
