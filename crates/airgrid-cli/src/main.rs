//! `airgrid` CLI: generate and maintain a radio station's broadcast calendar.
//!
//! ## Usage
//!
//! ```sh
//! # Materialize the current month from catalog.json into diffusions.json
//! airgrid update
//!
//! # Prepare next month, every new diffusion waiting for confirmation
//! airgrid update --next-month --approval manual
//!
//! # Reproducible run for a given month
//! airgrid --catalog catalog.json --store store.json update --year 2015 --month 10 --now 2015-09-25T00:00:00Z
//!
//! # Cancel stale or no longer scheduled unconfirmed diffusions
//! airgrid clean
//! airgrid check
//!
//! # Review and resolve overlaps
//! airgrid conflicts --month 10
//! airgrid confirm 12
//! airgrid cancel 13
//!
//! # Preview a schedule without writing anything
//! airgrid dates --schedule 3 --next-month
//! ```

mod config;

use std::fs;
use std::path::{Path, PathBuf};

use airgrid_engine::lifecycle;
use airgrid_engine::{
    month_conflicts, ApprovalMode, Catalog, Diffusion, DiffusionId, Materializer, MemoryStore,
    ScheduleId, YearMonth,
};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "airgrid",
    version,
    about = "Broadcast calendar generation for radio stations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Program and schedule catalog (JSON)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Diffusion store (JSON), created if missing
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the missing diffusions of every active schedule for a month
    Update {
        #[command(flatten)]
        month: MonthArgs,
        /// Override the configured approval mode
        #[arg(long, value_enum)]
        approval: Option<Approval>,
    },
    /// Cancel unconfirmed diffusions from before the month
    Clean {
        #[command(flatten)]
        month: MonthArgs,
    },
    /// Cancel unconfirmed diffusions from the month on that match no schedule
    Check {
        #[command(flatten)]
        month: MonthArgs,
    },
    /// List overlapping unconfirmed diffusions of a month
    Conflicts {
        #[command(flatten)]
        month: MonthArgs,
    },
    /// Preview the occurrences of a schedule (nothing is written)
    Dates {
        /// Schedule id
        #[arg(long)]
        schedule: u64,
        #[command(flatten)]
        month: MonthArgs,
    },
    /// Confirm an unconfirmed diffusion
    Confirm {
        /// Diffusion id
        id: u64,
    },
    /// Cancel a diffusion
    Cancel {
        /// Diffusion id
        id: u64,
    },
}

#[derive(Args)]
struct MonthArgs {
    /// Year (defaults to the current one)
    #[arg(long)]
    year: Option<i32>,
    /// Month, 1-12 (defaults to the current one)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
    /// Move one month ahead of the selected month
    #[arg(long)]
    next_month: bool,
    /// Reference instant (RFC 3339) instead of the system clock
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

impl MonthArgs {
    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn resolve(&self) -> Result<YearMonth> {
        let current = YearMonth::of(self.now().date_naive());
        let month = YearMonth::new(
            self.year.unwrap_or(current.year()),
            self.month.unwrap_or(current.month()),
        )?;
        Ok(if self.next_month { month.next() } else { month })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Approval {
    Auto,
    Manual,
}

impl From<Approval> for ApprovalMode {
    fn from(approval: Approval) -> Self {
        match approval {
            Approval::Auto => ApprovalMode::Auto,
            Approval::Manual => ApprovalMode::Manual,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airgrid=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let catalog_path = config.catalog_path(cli.catalog.as_deref());
    let store_path = config.store_path(cli.store.as_deref());

    match cli.command {
        Commands::Update { month, approval } => {
            let now = month.now();
            let target = month.resolve()?;
            let catalog = load_catalog(&catalog_path)?;
            let mut store = load_store(&store_path)?;

            let mut engine = config.engine.clone();
            if let Some(approval) = approval {
                engine.approval = approval.into();
            }

            let report = Materializer::new(&catalog, &engine)
                .update_month(&mut store, target, now)
                .with_context(|| format!("Failed to update {target}"))?;
            save_store(&store_path, &store)?;

            for diffusion in &report.created {
                println!("{}", describe(diffusion));
            }
            println!(
                "{target}: {} created ({} unconfirmed), {} skipped, {} orphaned reruns",
                report.created.len(),
                report.unconfirmed(),
                report.skipped,
                report.orphaned.len()
            );
        }
        Commands::Clean { month } => {
            let target = month.resolve()?;
            let mut store = load_store(&store_path)?;
            let cancelled = lifecycle::clean(&mut store, target)?;
            save_store(&store_path, &store)?;
            print_cancelled(&cancelled);
        }
        Commands::Check { month } => {
            let target = month.resolve()?;
            let catalog = load_catalog(&catalog_path)?;
            let mut store = load_store(&store_path)?;
            let cancelled = lifecycle::check(&mut store, &catalog, &config.engine, target)?;
            save_store(&store_path, &store)?;
            print_cancelled(&cancelled);
        }
        Commands::Conflicts { month } => {
            let target = month.resolve()?;
            let store = load_store(&store_path)?;
            let conflicts = month_conflicts(&store, target)?;
            if conflicts.is_empty() {
                println!("{target}: no conflicts");
            }
            for conflict in &conflicts {
                println!(
                    "{} <-> {}  {} min overlap",
                    describe(&conflict.diffusion_a),
                    describe(&conflict.diffusion_b),
                    conflict.overlap_minutes
                );
            }
        }
        Commands::Dates { schedule, month } => {
            let target = month.resolve()?;
            let catalog = load_catalog(&catalog_path)?;
            let schedule = catalog.schedule(ScheduleId(schedule))?;
            catalog.validate_schedule(schedule)?;
            for occurrence in
                airgrid_engine::dates_for_month(schedule, target, config.engine.dst_policy)?
            {
                println!(
                    "{}  {}",
                    timestamp(occurrence.start),
                    timestamp(occurrence.end)
                );
            }
        }
        Commands::Confirm { id } => {
            let mut store = load_store(&store_path)?;
            let diffusion = lifecycle::confirm(&mut store, DiffusionId(id))?;
            save_store(&store_path, &store)?;
            println!("{}", describe(&diffusion));
        }
        Commands::Cancel { id } => {
            let mut store = load_store(&store_path)?;
            let diffusion = lifecycle::cancel(&mut store, DiffusionId(id))?;
            save_store(&store_path, &store)?;
            println!("{}", describe(&diffusion));
        }
    }

    Ok(())
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    let catalog = Catalog::from_json(&json)
        .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;
    debug!(
        programs = catalog.programs.len(),
        schedules = catalog.schedules.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// A missing store file is an empty store.
fn load_store(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        info!(path = %path.display(), "store not found, starting empty");
        return Ok(MemoryStore::new());
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read store: {}", path.display()))?;
    MemoryStore::from_json(&json)
        .with_context(|| format!("Failed to parse store: {}", path.display()))
}

fn save_store(path: &Path, store: &MemoryStore) -> Result<()> {
    let json = store.to_json().context("Failed to serialize store")?;
    fs::write(path, json).with_context(|| format!("Failed to write store: {}", path.display()))
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn describe(d: &Diffusion) -> String {
    let mut line = format!(
        "{}  {}  {}min  program {}  station {}  {}",
        d.id,
        timestamp(d.start),
        d.duration_minutes,
        d.program,
        d.station,
        d.kind
    );
    if let Some(initial) = d.initial {
        line.push_str(&format!("  rerun of {initial}"));
    }
    line
}

fn print_cancelled(cancelled: &[Diffusion]) {
    for diffusion in cancelled {
        println!("{}", describe(diffusion));
    }
    println!("{} cancelled", cancelled.len());
}
