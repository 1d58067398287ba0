#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session and turn executor for Codewalk.
//!
//! [`GameSession`] owns every piece of mutable game state: the world, the
//! command queue, the economy and the progression tracker. Scripts fill the
//! queue through the [`MoveCommands`] capability, and the host then drives the
//! run one [`GameSession::tick`] at a time, waiting the returned delay between
//! ticks. The session never sleeps itself. Delayed level restarts, resets and
//! advances are handed back as [`ScheduledTransition`] values that the host
//! performs later through [`GameSession::perform`].

mod rules;

use std::time::Duration;

use codewalk_core::{
    Command, Direction, EnqueueError, Event, LevelLayout, MoveCommands, ScheduledTransition,
    Script, ScriptError, Snapshot, StatusMessage, Transition,
};
use codewalk_system_economy::{Economy, Standing, Variant};
use codewalk_system_levels::{Catalog, LevelGenerator};
use codewalk_system_patrol::Patrol;
use codewalk_system_progression::Progression;
use codewalk_system_queue::CommandQueue;
use codewalk_world::{self as world, query, World};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use rules::{Rules, Timing};

const FIRST_LEVEL: u32 = 1;

/// Failures raised while constructing a session.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The catalog cannot produce the first level.
    #[error("the {catalog} catalog has no level {FIRST_LEVEL}")]
    MissingFirstLevel {
        /// Name of the offending catalog.
        catalog: &'static str,
    },
    /// Custom level numbers must run from 1 to the number of layouts.
    #[error("the custom catalog has {count} layouts but no level {missing}")]
    MisnumberedCatalog {
        /// Level of the contiguous range without a layout.
        missing: u32,
        /// Number of layouts provided.
        count: u32,
    },
}

/// Result of asking the executor to start a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStart {
    /// The run began; drive it with [`GameSession::tick`].
    Started,
    /// A run was already in progress; nothing changed.
    AlreadyRunning,
    /// The queue was empty; no run was started.
    NothingQueued,
}

/// How a finished run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The level was completed and another level follows.
    Won {
        /// Level that was completed.
        level: u32,
        /// Level scheduled next.
        next: u32,
        /// Whether `next` was unlocked by this win.
        newly_unlocked: bool,
    },
    /// The final level of the catalog was completed.
    AllLevelsComplete {
        /// Level that was completed.
        level: u32,
    },
    /// The queue drained away from the target.
    NotArrived,
    /// The target was reached without enough keys.
    KeysMissing {
        /// Keys held.
        collected: u32,
        /// Keys required.
        required: u32,
    },
    /// A life was lost; the level restarts.
    LifeLost {
        /// Lives remaining.
        lives_left: u32,
    },
    /// The economy was exhausted; the game resets.
    GameOver,
}

/// Summary of a completed run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Follow-up work for the host, if any.
    pub transition: Option<ScheduledTransition>,
}

/// Result of a single executor step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickReport {
    /// No run is in progress.
    Idle,
    /// One command was processed; wait `delay` before the next tick.
    Continue {
        /// Pause requested before the next tick.
        delay: Duration,
    },
    /// The run ended during this step.
    Finished(RunReport),
}

/// Host hook invoked after every tick of [`GameSession::run`].
pub trait TickObserver {
    /// Receives the post-tick snapshot and the pause requested before the next tick.
    fn observe(&mut self, snapshot: &Snapshot, delay: Duration);
}

/// Owned state of one game: world, queue, economy and progression.
#[derive(Debug)]
pub struct GameSession {
    timing: Timing,
    generator: LevelGenerator,
    world: World,
    queue: CommandQueue,
    economy: Economy,
    progression: Progression,
    patrol: Patrol,
    running: bool,
    message: Option<StatusMessage>,
    ticks: u64,
}

impl GameSession {
    /// Creates a session on level one of the configured catalog.
    pub fn new(rules: Rules, seed: u64) -> Result<Self, SessionError> {
        let Rules {
            economy,
            timing,
            max_actions,
            catalog,
        } = rules;
        let catalog_name = catalog.name();
        if let Some(missing) = catalog.missing_level() {
            return Err(SessionError::MisnumberedCatalog {
                missing,
                count: catalog.level_count(),
            });
        }
        let mut generator = LevelGenerator::new(catalog, seed);
        let layout = generator
            .generate(FIRST_LEVEL)
            .ok_or(SessionError::MissingFirstLevel {
                catalog: catalog_name,
            })?;
        info!(
            catalog = catalog_name,
            variant = economy.variant.name(),
            seed,
            "session created"
        );

        Ok(Self {
            timing,
            generator,
            world: World::new(layout),
            queue: CommandQueue::new(max_actions),
            economy: Economy::new(economy),
            progression: Progression::new(),
            patrol: Patrol,
            running: false,
            message: Some(StatusMessage::success("Start coding!")),
            ticks: 0,
        })
    }

    /// Economy policy of the session.
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.economy.variant()
    }

    /// Level currently installed.
    #[must_use]
    pub fn level(&self) -> u32 {
        query::level(&self.world)
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn level_count(&self) -> u32 {
        self.generator.level_count()
    }

    /// Catalog hint for the current level.
    #[must_use]
    pub fn level_hint(&self) -> Option<&'static str> {
        self.generator.catalog().hint(self.level())
    }

    /// Catalog the session plays through.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.generator.catalog()
    }

    /// Whether a run is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current point balance.
    #[must_use]
    pub fn points(&self) -> i64 {
        self.economy.points()
    }

    /// Remaining lives under the lives economy.
    #[must_use]
    pub fn lives(&self) -> Option<u32> {
        self.economy.lives()
    }

    /// Levels the player may select.
    #[must_use]
    pub fn unlocked_levels(&self) -> &[u32] {
        self.progression.unlocked()
    }

    /// Enqueue capability for scripts driven outside [`GameSession::run_code`].
    pub fn commands(&mut self) -> &mut dyn MoveCommands {
        &mut self.queue
    }

    /// Pending queued directions, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = Direction> + '_ {
        self.queue.iter()
    }

    /// Layout the current level was built from.
    #[must_use]
    pub fn layout(&self) -> &LevelLayout {
        query::layout(&self.world)
    }

    /// Most recent status message.
    #[must_use]
    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    /// Captures a read-only view for rendering and audio collaborators.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            level: self.level(),
            level_count: self.level_count(),
            player: query::player(&self.world),
            target: query::target(&self.world),
            walls: query::walls(&self.world).iter().copied().collect(),
            keys: query::keys(&self.world).iter().copied().collect(),
            collected_keys: query::collected_keys(&self.world).iter().copied().collect(),
            keys_required: query::keys_required(&self.world),
            enemies: query::enemies(&self.world),
            points: self.economy.points(),
            lives: self.economy.lives(),
            unlocked_levels: self.progression.unlocked().to_vec(),
            running: self.running,
            queued: self.queue.len(),
            message: self.message.clone(),
        }
    }

    /// Switches to an unlocked level. Ignored while running or when locked.
    pub fn set_level(&mut self, level: u32) -> bool {
        if self.running {
            warn!(level, "level switch ignored while running");
            return false;
        }
        if !self.progression.is_unlocked(level) {
            debug!(level, "level switch ignored for locked level");
            return false;
        }
        let Some(layout) = self.generator.generate(level) else {
            warn!(level, "level switch ignored for level outside the catalog");
            return false;
        };
        self.enter(Command::LoadLevel { layout });
        true
    }

    /// Runs a script against the queue, then starts executing it.
    ///
    /// The queue is cleared first. If the script fails, everything it enqueued
    /// is discarded and no tick runs.
    pub fn run_code(&mut self, script: &mut dyn Script) -> Result<RunStart, ScriptError> {
        if self.running {
            return Ok(RunStart::AlreadyRunning);
        }
        self.queue.clear();
        self.message = None;

        if let Err(error) = script.run(&mut self.queue) {
            warn!(%error, "script failed");
            self.queue.clear();
            self.message = Some(StatusMessage::failure(format!("Error in code: {error}")));
            return Err(error);
        }
        Ok(self.start_run())
    }

    /// Starts executing the queue as it stands.
    pub fn start_run(&mut self) -> RunStart {
        if self.running {
            return RunStart::AlreadyRunning;
        }
        if self.queue.is_empty() {
            self.message = Some(StatusMessage::failure("No actions to run."));
            return RunStart::NothingQueued;
        }
        self.running = true;
        self.ticks = 0;
        self.message = Some(StatusMessage::success("Running..."));
        info!(level = self.level(), queued = self.queue.len(), "run started");
        RunStart::Started
    }

    /// Processes one queued command.
    pub fn tick(&mut self) -> TickReport {
        if !self.running {
            return TickReport::Idle;
        }
        let Some(direction) = self.queue.pop() else {
            return TickReport::Finished(self.finish());
        };
        self.ticks += 1;
        debug!(tick = self.ticks, direction = direction.name(), "tick");

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::StepPlayer { direction }, &mut events);

        let mut commands = Vec::new();
        let standing = self.economy.handle(&events, &mut commands);

        if events
            .iter()
            .any(|event| matches!(event, Event::WallStruck { .. }))
        {
            self.message = Some(self.collision_message("You hit a wall!"));
            return match self.settle(standing, commands) {
                Some(report) => TickReport::Finished(report),
                None => TickReport::Continue {
                    delay: self.timing.wall_pause,
                },
            };
        }

        if let Some((collected, required)) = events.iter().find_map(|event| match event {
            Event::KeyCollected {
                collected, required, ..
            } => Some((*collected, *required)),
            _ => None,
        }) {
            self.message = Some(StatusMessage::success(format!(
                "Key collected ({collected}/{required})! Points: {}",
                self.economy.points()
            )));
        }

        let mut patrol_commands = Vec::new();
        self.patrol.handle(&events, &query::enemies(&self.world), &mut patrol_commands);
        let mut contact_events = Vec::new();
        for command in patrol_commands {
            world::apply(&mut self.world, command, &mut contact_events);
        }

        if let Some(damage) = contact_events.iter().find_map(|event| match event {
            Event::EnemyContact { damage, .. } => Some(*damage),
            _ => None,
        }) {
            let mut commands = Vec::new();
            let standing = self.economy.handle(&contact_events, &mut commands);
            self.message = Some(self.collision_message(&format!("Enemy hit for {damage}!")));
            if let Some(report) = self.settle(standing, commands) {
                return TickReport::Finished(report);
            }
        }

        if self.queue.is_empty() {
            return TickReport::Finished(self.finish());
        }
        TickReport::Continue {
            delay: self.timing.tick_delay,
        }
    }

    /// Drives the current run to completion, reporting every tick to `observer`.
    pub fn run(&mut self, observer: &mut dyn TickObserver) -> Option<RunReport> {
        loop {
            match self.tick() {
                TickReport::Idle => return None,
                TickReport::Continue { delay } => observer.observe(&self.snapshot(), delay),
                TickReport::Finished(report) => {
                    observer.observe(&self.snapshot(), Duration::ZERO);
                    return Some(report);
                }
            }
        }
    }

    /// Performs a scheduled transition. Dropped while a run is in progress.
    pub fn perform(&mut self, scheduled: ScheduledTransition) -> bool {
        if self.running {
            warn!(transition = ?scheduled.transition, "transition dropped while running");
            return false;
        }
        match scheduled.transition {
            Transition::RestartLevel => {
                self.enter(Command::RestartLevel);
                true
            }
            Transition::ResetGame => self.reset_game(),
            Transition::AdvanceTo(level) => self.set_level(level),
        }
    }

    /// Resets economy and progression and returns to level one.
    pub fn reset_game(&mut self) -> bool {
        if self.running {
            warn!("reset ignored while running");
            return false;
        }
        let Some(layout) = self.generator.generate(FIRST_LEVEL) else {
            return false;
        };
        self.economy.reset();
        self.progression.reset();
        self.enter(Command::LoadLevel { layout });
        info!("game reset");
        true
    }

    /// Restarts the whole game on request. Only available under the points economy.
    pub fn force_restart(&mut self) -> bool {
        if self.economy.variant() != Variant::Points {
            debug!("forced restart unavailable for the lives economy");
            return false;
        }
        if !self.reset_game() {
            return false;
        }
        self.message = Some(StatusMessage::success("Game restarted."));
        true
    }

    fn enter(&mut self, command: Command) {
        self.queue.clear();
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.economy.enter_level();
        self.message = None;
        info!(level = self.level(), "level entered");
    }

    fn settle(&mut self, standing: Standing, commands: Vec<Command>) -> Option<RunReport> {
        match standing {
            Standing::Steady => {
                let mut events = Vec::new();
                for command in commands {
                    world::apply(&mut self.world, command, &mut events);
                }
                None
            }
            Standing::RestartLevel => {
                let lives_left = self.economy.lives().unwrap_or_default();
                Some(self.end_run(
                    RunOutcome::LifeLost { lives_left },
                    Some(self.schedule(self.timing.restart_delay, Transition::RestartLevel)),
                ))
            }
            Standing::GameOver => {
                let text = match self.economy.variant() {
                    Variant::Lives => "All lives lost! The game starts over.",
                    Variant::Points => "All points lost! Game over.",
                };
                self.message = Some(StatusMessage::failure(text));
                Some(self.end_run(
                    RunOutcome::GameOver,
                    Some(self.schedule(self.timing.reset_delay, Transition::ResetGame)),
                ))
            }
        }
    }

    fn finish(&mut self) -> RunReport {
        let level = self.level();
        if !query::at_target(&self.world) {
            self.message = Some(StatusMessage::failure("You have not reached the flag yet!"));
            return self.end_run(RunOutcome::NotArrived, None);
        }
        if !query::keys_satisfied(&self.world) {
            let collected = query::collected_keys(&self.world).len() as u32;
            let required = query::keys_required(&self.world);
            self.message = Some(StatusMessage::failure(format!(
                "Collect every key first ({collected}/{required})."
            )));
            return self.end_run(RunOutcome::KeysMissing { collected, required }, None);
        }

        let bonus = self.economy.award_win();
        let next = level + 1;
        if !self.generator.has_level(next) {
            self.message = Some(StatusMessage::success(
                "Congratulations! You completed every level!",
            ));
            info!(level, "final level completed");
            return self.end_run(RunOutcome::AllLevelsComplete { level }, None);
        }

        let newly_unlocked = self.progression.unlock(next);
        let award = if bonus > 0 {
            format!(" +{bonus} points")
        } else {
            String::new()
        };
        self.message = Some(StatusMessage::success(format!(
            "Level {level} complete!{award} Points: {}",
            self.economy.points()
        )));
        info!(level, next, newly_unlocked, "level completed");
        self.end_run(
            RunOutcome::Won {
                level,
                next,
                newly_unlocked,
            },
            Some(self.schedule(self.timing.advance_delay, Transition::AdvanceTo(next))),
        )
    }

    fn end_run(
        &mut self,
        outcome: RunOutcome,
        transition: Option<ScheduledTransition>,
    ) -> RunReport {
        self.running = false;
        self.queue.clear();
        debug!(?outcome, ticks = self.ticks, "run finished");
        RunReport {
            outcome,
            transition,
        }
    }

    fn schedule(&self, delay: Duration, transition: Transition) -> ScheduledTransition {
        ScheduledTransition { delay, transition }
    }

    fn collision_message(&self, prefix: &str) -> StatusMessage {
        let text = match self.economy.lives() {
            Some(lives) => format!("{prefix} Lives left: {lives}"),
            None => format!("{prefix} Points left: {}", self.economy.points()),
        };
        StatusMessage::failure(text)
    }
}

impl MoveCommands for GameSession {
    fn enqueue(&mut self, direction: Direction, n: i64) -> Result<(), EnqueueError> {
        self.queue.enqueue(direction, n)
    }
}
