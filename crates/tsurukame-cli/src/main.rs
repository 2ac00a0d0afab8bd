//! Tsurukame CLI
//!
//! Command-line WaniKani client: syncs your assignments, submits lessons and
//! reviews, and projects SRS timings.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use tsurukame_core::api::RateLimitStatus;
use tsurukame_core::prelude::*;
use tsurukame_core::{RateLimiter, StudyMaterial, SyncOutcome, date};

/// Tsurukame - WaniKani from the command line
#[derive(Parser)]
#[command(name = "tsurukame")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for WaniKani")]
#[command(long_about = "Tsurukame talks to the WaniKani v2 API.\n\nThe API token is read from TSURUKAME_API_TOKEN unless --token is given.")]
struct Cli {
    /// WaniKani API token
    #[arg(long, global = true)]
    token: Option<String>,

    /// API base URL (for mirrors and test servers)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the logged-in user
    User,

    /// Sync subjects, assignments and friends
    Sync {
        /// Ignore the stored cursor and refetch everything
        #[arg(long)]
        full: bool,

        /// Cursor file (defaults to the platform data directory)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Forget the stored sync cursor so the next sync starts over
    Reset {
        /// Cursor file (defaults to the platform data directory)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Report a finished lesson or review
    Submit {
        /// Assignment id
        assignment_id: i64,

        /// This was a lesson, not a review
        #[arg(long)]
        lesson: bool,

        /// Wrong meaning answers
        #[arg(long, default_value = "0")]
        meaning_wrong: u32,

        /// Wrong reading answers
        #[arg(long, default_value = "0")]
        reading_wrong: u32,

        /// When the answer was given (any API timestamp format; default now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Set notes and synonyms for a subject
    Note {
        /// Subject id
        subject_id: i64,

        #[arg(long)]
        meaning_note: Option<String>,

        #[arg(long)]
        reading_note: Option<String>,

        /// Meaning synonym (repeatable)
        #[arg(long = "synonym")]
        synonyms: Vec<String>,
    },

    /// Parse an API timestamp and print it canonically
    Date {
        /// Timestamp in any format the API emits
        value: String,
    },

    /// Project when an item reaches Guru
    Guru {
        /// Current SRS stage number (0-9)
        stage: i32,

        /// Subject level
        #[arg(long, default_value = "3")]
        level: i32,

        /// When the next review is available (default now)
        #[arg(long)]
        available_at: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let token = cli.token.as_deref();
    let base_url = cli.base_url.as_deref();

    match cli.command {
        Commands::User => run_user(&config(token, base_url)?, cli.json).await,
        Commands::Sync { full, state } => {
            run_sync(&config(token, base_url)?, full, state, cli.json).await
        }
        Commands::Submit {
            assignment_id,
            lesson,
            meaning_wrong,
            reading_wrong,
            at,
        } => {
            let progress = PendingProgress {
                assignment_id,
                is_lesson: lesson,
                meaning_wrong_count: meaning_wrong,
                reading_wrong_count: reading_wrong,
                created_at: parse_or_now(at.as_deref())?,
            };
            run_submit(&config(token, base_url)?, progress).await
        }
        Commands::Note {
            subject_id,
            meaning_note,
            reading_note,
            synonyms,
        } => {
            let material = StudyMaterial {
                id: 0,
                subject_id,
                meaning_note,
                reading_note,
                meaning_synonyms: synonyms,
            };
            run_note(&config(token, base_url)?, material, cli.json).await
        }
        Commands::Reset { state } => run_reset(state),
        Commands::Date { value } => run_date(&value, cli.json),
        Commands::Guru {
            stage,
            level,
            available_at,
        } => run_guru(stage, level, available_at.as_deref(), cli.json),
    }
}

/// Environment configuration with command-line overrides
fn config(token: Option<&str>, base_url: Option<&str>) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(token) = token {
        config = config.with_token(token);
    }
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url)?;
    }
    Ok(config)
}

fn parse_or_now(value: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match value {
        Some(value) => Ok(date::parse(value)?),
        None => Ok(Utc::now()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run user command
async fn run_user(config: &ClientConfig, json: bool) -> anyhow::Result<()> {
    let client = WaniKaniClient::connect(config)?;
    let user = client.user(&FetchProgress::new()).await?;

    if json {
        return print_json(&user);
    }

    println!("{}", "=== WaniKani User ===".cyan().bold());
    println!();
    println!("{}: {}", "Username".white().bold(), user.username);
    println!("{}: {}", "Level".white().bold(), user.current_level());
    if user.level != user.current_level() {
        println!(
            "{}: {} (capped by subscription)",
            "Account Level".white().bold(),
            user.level
        );
    }
    println!(
        "{}: {}",
        "Subscribed".white().bold(),
        if user.subscribed { "yes".green() } else { "no".yellow() }
    );
    if user.on_vacation() {
        println!("{}", "Vacation mode is on".yellow());
    }
    print_rate_limit(client.rate_limiter());

    Ok(())
}

/// Run reset command
fn run_reset(state: Option<PathBuf>) -> anyhow::Result<()> {
    let store = CursorStore::new(state)?;
    store.clear()?;
    info!("Removed cursor at {}", store.path().display());
    println!("{}", "Sync cursor cleared".green());
    Ok(())
}

/// Run sync command
async fn run_sync(
    config: &ClientConfig,
    full: bool,
    state: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let client = WaniKaniClient::connect(config)?;
    let store = CursorStore::new(state)?;
    let mode = if full {
        SyncMode::Full
    } else {
        SyncMode::Incremental
    };
    info!("Syncing with cursor at {}", store.path().display());

    let outcome = Syncer::new(&client, store).sync(mode).await?;

    if json {
        return print_json(&outcome.report);
    }

    println!("{}", format!("=== {} Sync Complete ===", capitalize(mode.as_str())).cyan().bold());
    println!();
    println!("{}: {}", "Subjects".white().bold(), outcome.report.subjects);
    println!("{}: {}", "Assignments".white().bold(), outcome.report.assignments);
    println!("{}: {}", "Study Materials".white().bold(), outcome.report.study_materials);
    println!("{}: {}", "Level Progressions".white().bold(), outcome.report.level_progressions);
    println!("{}: {}", "Voice Actors".white().bold(), outcome.report.voice_actors);
    print_status(&outcome.report.rate_limit);

    print_srs_distribution(&outcome);

    Ok(())
}

/// Print how the synced assignments spread over the SRS categories
fn print_srs_distribution(outcome: &SyncOutcome) {
    let total = outcome.assignments.len();
    if total == 0 {
        return;
    }

    println!();
    println!("{}", "=== SRS Distribution ===".yellow().bold());

    let counts = category_counts(&outcome.assignments);
    for (category, count) in &counts {
        print_distribution_bar(category.name(), *count, total, category_color(*category));
    }

    let lessons = outcome.assignments.iter().filter(|a| a.is_lesson_stage()).count();
    if lessons > 0 {
        println!();
        println!("{}: {}", "Lessons Waiting".white().bold(), lessons);
    }

    let now = Utc::now();
    let reviews_now = outcome
        .assignments
        .iter()
        .filter(|a| a.available_at.is_some_and(|at| at <= now) && !a.is_burned())
        .count();
    println!("{}: {}", "Reviews Available".white().bold(), reviews_now);
}

/// Started assignments per category, in ladder order
fn category_counts(assignments: &[Assignment]) -> Vec<(SrsStageCategory, usize)> {
    SrsStageCategory::ALL
        .iter()
        .map(|category| {
            let count = assignments
                .iter()
                .filter(|a| !a.is_locked() && a.stage() != SrsStage::Unlocking)
                .filter(|a| a.stage().category() == *category)
                .count();
            (*category, count)
        })
        .collect()
}

fn category_color(category: SrsStageCategory) -> &'static str {
    match category {
        SrsStageCategory::Apprentice => "magenta",
        SrsStageCategory::Guru => "purple",
        SrsStageCategory::Master => "blue",
        SrsStageCategory::Enlightened => "cyan",
        SrsStageCategory::Burned => "yellow",
    }
}

/// Print a distribution bar
fn print_distribution_bar(label: &str, count: usize, total: usize, color: &str) {
    let percentage = if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let bar_width: usize = 30;
    let filled = ((percentage / 100.0) * bar_width as f64) as usize;
    let empty = bar_width.saturating_sub(filled);

    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));
    let colored_bar = match color {
        "magenta" => bar.magenta(),
        "purple" => bar.purple(),
        "blue" => bar.blue(),
        "cyan" => bar.cyan(),
        "yellow" => bar.yellow(),
        _ => bar.white(),
    };

    println!(
        "  {:12} [{:30}] {:>5} ({:>5.1}%)",
        label, colored_bar, count, percentage
    );
}

fn print_rate_limit(limiter: &RateLimiter) {
    print_status(&limiter.status(Utc::now()));
}

fn print_status(status: &RateLimitStatus) {
    println!();
    println!(
        "{}: {} requests left, window resets in {:.1}s (clock skew {}ms)",
        "Rate Limit".white().bold(),
        status.requests_remaining,
        status.reset_in_ms as f64 / 1000.0,
        status.clock_skew_ms
    );
}

/// Run submit command
async fn run_submit(config: &ClientConfig, progress: PendingProgress) -> anyhow::Result<()> {
    let client = WaniKaniClient::connect(config)?;
    client.send_progress(&progress).await?;

    let kind = if progress.is_lesson { "Lesson" } else { "Review" };
    println!(
        "{} {} for assignment {}",
        kind.green().bold(),
        "submitted".green(),
        progress.assignment_id
    );
    Ok(())
}

/// Run note command
async fn run_note(config: &ClientConfig, material: StudyMaterial, json: bool) -> anyhow::Result<()> {
    let client = WaniKaniClient::connect(config)?;
    let saved = client.update_study_material(&material).await?;

    if json {
        return print_json(&saved);
    }

    println!(
        "{} study material {} for subject {}",
        "Saved".green().bold(),
        saved.id,
        saved.subject_id
    );
    if !saved.meaning_synonyms.is_empty() {
        println!("{}: {}", "Synonyms".white().bold(), saved.meaning_synonyms.join(", "));
    }
    Ok(())
}

/// Run date command
fn run_date(value: &str, json: bool) -> anyhow::Result<()> {
    let parsed: WaniKaniDate = value.parse()?;

    if json {
        return print_json(&serde_json::json!({
            "canonical": parsed.to_string(),
            "seconds": parsed.seconds(),
        }));
    }

    println!("{}: {}", "Canonical".white().bold(), parsed);
    println!("{}: {}", "Unix Seconds".white().bold(), parsed.seconds());
    Ok(())
}

/// Run guru command
fn run_guru(stage: i32, level: i32, available_at: Option<&str>, json: bool) -> anyhow::Result<()> {
    let now = Utc::now();
    let assignment = guru_assignment(stage, level, parse_or_now(available_at)?)?;
    let guru_date = assignment.guru_date(level, now);

    if json {
        return print_json(&serde_json::json!({
            "stage": assignment.stage().name(),
            "level": level,
            "guruDate": guru_date.map(|d| WaniKaniDate::new(d).to_string()),
        }));
    }

    println!("{}: {}", "Stage".white().bold(), assignment.stage());
    match guru_date {
        Some(date) if date == tsurukame_core::GURU_IN_PAST => {
            println!("{}", "Already at Guru or beyond".green());
        }
        Some(date) => {
            println!("{}: {}", "Earliest Guru".white().bold(), date.format("%Y-%m-%d %H:%M UTC"));
            let remaining = date - now;
            if remaining.num_seconds() > 0 {
                println!(
                    "{}: {}d {}h",
                    "Time Left".white().bold(),
                    remaining.num_days(),
                    remaining.num_hours() % 24
                );
            }
        }
        None => println!("{}", "Locked items have no Guru date".dimmed()),
    }
    Ok(())
}

/// A started assignment at `stage`, for projection only
fn guru_assignment(stage: i32, level: i32, available_at: DateTime<Utc>) -> anyhow::Result<Assignment> {
    let stage = SrsStage::from_number(stage)
        .ok_or_else(|| anyhow::anyhow!("SRS stage must be between 0 and 9, got {stage}"))?;
    Ok(Assignment {
        srs_stage: Some(stage),
        level,
        available_at: Some(available_at),
        started_at: (stage != SrsStage::Unlocking).then_some(available_at),
        ..Default::default()
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
