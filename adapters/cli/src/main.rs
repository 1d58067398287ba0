#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Codewalk scripts in the terminal.

mod config;
mod render;
mod script;

use std::{
    io::{self, Read as _},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use codewalk_core::Snapshot;
use codewalk_session::{GameSession, RunOutcome, RunReport, RunStart, TickObserver};
use codewalk_system_economy::Variant;
use codewalk_system_levels::LevelGenerator;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Config, VariantChoice},
    render::Board,
    script::Program,
};

/// Command-line arguments for the Codewalk terminal adapter.
#[derive(Debug, Parser)]
#[command(name = "codewalk", version, about = "Guide the walker to the flag with code.")]
struct Cli {
    /// Config file to load instead of `codewalk.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Economy variant; also selects the default level catalog.
    #[arg(long, global = true, value_enum)]
    variant: Option<VariantChoice>,
    /// Seed for procedurally generated levels.
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Runs scripts in order; each one is an attempt at the current level.
    Run {
        /// Script files to execute, `-` for standard input.
        #[arg(required = true, value_name = "SCRIPT")]
        scripts: Vec<PathBuf>,
        /// Skip every delay between ticks and transitions.
        #[arg(long)]
        fast: bool,
        /// Emit one JSON snapshot per line instead of drawing the grid.
        #[arg(long)]
        json: bool,
    },
    /// Prints the layout of a level.
    Show {
        /// Level to print.
        #[arg(long, default_value_t = 1)]
        level: u32,
        /// Print the layout as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Lists the levels of the selected catalog.
    Levels,
}

/// Entry point for the Codewalk command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let variant: Variant = cli
        .variant
        .or(config.general.variant)
        .unwrap_or(VariantChoice::Lives)
        .into();
    let seed = cli
        .seed
        .or(config.general.seed)
        .unwrap_or_else(rand::random);
    let rules = config.rules(variant);
    info!(variant = variant.name(), seed, "configuration resolved");

    match cli.action {
        Action::Run {
            scripts,
            fast,
            json,
        } => {
            let mut session = GameSession::new(rules, seed)?;
            let mut host = TerminalHost { fast, json };
            play(&mut session, &scripts, &mut host)
        }
        Action::Show { level, json } => {
            let mut generator = LevelGenerator::new(rules.catalog, seed);
            let Some(layout) = generator.generate(level) else {
                bail!(
                    "level {level} is not part of the {} catalog ({} levels)",
                    generator.catalog().name(),
                    generator.level_count()
                );
            };
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&layout).context("failed to encode layout")?
                );
            } else {
                print!("{}", Board::from_layout(&layout).draw());
                if let Some(hint) = generator.catalog().hint(level) {
                    println!("{hint}");
                }
            }
            Ok(())
        }
        Action::Levels => {
            let mut generator = LevelGenerator::new(rules.catalog, seed);
            println!(
                "{} catalog, {} economy",
                generator.catalog().name(),
                variant.name()
            );
            for level in 1..=generator.level_count() {
                let Some(layout) = generator.generate(level) else {
                    continue;
                };
                let hint = generator.catalog().hint(level).unwrap_or_default();
                println!(
                    "{level}: {} walls, {} keys ({} required), {} enemies. {hint}",
                    layout.walls().len(),
                    layout.keys().len(),
                    layout.keys_required(),
                    layout.enemies().len()
                );
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn play(session: &mut GameSession, scripts: &[PathBuf], host: &mut TerminalHost) -> Result<()> {
    host.show(&session.snapshot());
    for path in scripts {
        let source = read_script(path)?;
        let mut program = Program::new(source);

        match session.run_code(&mut program) {
            Ok(RunStart::Started) => {}
            Ok(RunStart::AlreadyRunning | RunStart::NothingQueued) | Err(_) => {
                host.show(&session.snapshot());
                continue;
            }
        }

        let Some(report) = session.run(host) else {
            continue;
        };
        host.announce(&report);
        if let Some(scheduled) = report.transition {
            host.wait(scheduled.delay);
            if session.perform(scheduled) {
                host.show(&session.snapshot());
            }
        }
    }
    Ok(())
}

fn read_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        let _ = io::stdin()
            .read_to_string(&mut source)
            .context("failed to read script from standard input")?;
        return Ok(source);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script at {}", path.display()))
}

/// Presents snapshots on stdout and owns real time for the session.
#[derive(Debug)]
struct TerminalHost {
    fast: bool,
    json: bool,
}

impl TerminalHost {
    fn show(&self, snapshot: &Snapshot) {
        if self.json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{line}"),
                Err(error) => warn!(%error, "failed to encode snapshot"),
            }
        } else {
            println!("{}", render::frame(snapshot));
        }
    }

    fn wait(&self, delay: Duration) {
        if !self.fast && !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    fn announce(&self, report: &RunReport) {
        if self.json {
            return;
        }
        let summary = match report.outcome {
            RunOutcome::Won { level, next, .. } => {
                format!("level {level} solved, moving on to level {next}")
            }
            RunOutcome::AllLevelsComplete { level } => {
                format!("level {level} solved, catalog complete")
            }
            RunOutcome::NotArrived => "run ended away from the flag".to_owned(),
            RunOutcome::KeysMissing {
                collected,
                required,
            } => format!("flag reached with {collected}/{required} keys"),
            RunOutcome::LifeLost { lives_left } => {
                format!("life lost, {lives_left} remaining")
            }
            RunOutcome::GameOver => "game over".to_owned(),
        };
        println!("== {summary}");
    }
}

impl TickObserver for TerminalHost {
    fn observe(&mut self, snapshot: &Snapshot, delay: Duration) {
        self.show(snapshot);
        self.wait(delay);
    }
}
