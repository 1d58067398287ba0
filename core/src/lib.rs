#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Codewalk engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The session submits [`Command`]
//! values describing desired world mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for the patrol and economy systems to react to deterministically. Hosts only
//! ever observe the world through [`Snapshot`] values and receive delayed work
//! as [`ScheduledTransition`] requests.

use std::{collections::BTreeSet, time::Duration};

use serde::Serialize;
use thiserror::Error;

/// Number of cells along each edge of the square grid.
pub const GRID: u32 = 10;

/// Total number of cells contained in the grid.
pub const CELL_COUNT: u32 = GRID * GRID;

/// Location of a single grid cell stored as a row-major index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Position(u32);

impl Position {
    /// Creates a position from a row-major cell index, rejecting off-grid values.
    #[must_use]
    pub const fn new(index: u32) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Creates a position from column and row coordinates.
    #[must_use]
    pub const fn from_xy(x: u32, y: u32) -> Option<Self> {
        if x < GRID && y < GRID {
            Some(Self(y * GRID + x))
        } else {
            None
        }
    }

    /// Row-major index of the cell.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.0
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.0 % GRID
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.0 / GRID
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x().abs_diff(other.x()) + self.y().abs_diff(other.y())
    }

    /// Returns the neighbouring cell in the provided direction, or `None` at the grid edge.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Option<Position> {
        match direction {
            Direction::Up if self.y() > 0 => Some(Self(self.0 - GRID)),
            Direction::Down if self.y() + 1 < GRID => Some(Self(self.0 + GRID)),
            Direction::Left if self.x() > 0 => Some(Self(self.0 - 1)),
            Direction::Right if self.x() + 1 < GRID => Some(Self(self.0 + 1)),
            _ => None,
        }
    }
}

/// Unit movement directions available to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in entry-point order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Lowercase name of the direction.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Unique identifier assigned to an enemy within a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Non-empty cyclic sequence of cells an enemy visits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PatrolPath {
    cells: Vec<Position>,
}

impl PatrolPath {
    /// Creates a patrol path, rejecting empty sequences.
    #[must_use]
    pub fn new(cells: Vec<Position>) -> Option<Self> {
        if cells.is_empty() {
            None
        } else {
            Some(Self { cells })
        }
    }

    /// Cells visited by the patrol in order.
    #[must_use]
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// Number of cells in the cycle. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at the provided step index, wrapping around the cycle.
    #[must_use]
    pub fn cell_at(&self, step_index: usize) -> Position {
        self.cells[step_index % self.cells.len()]
    }
}

/// Authored description of a patrolling enemy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnemyLayout {
    path: PatrolPath,
    speed: u32,
    damage: u32,
}

impl EnemyLayout {
    /// Creates an enemy layout; `speed` and `damage` must be positive.
    #[must_use]
    pub fn new(path: PatrolPath, speed: u32, damage: u32) -> Option<Self> {
        if speed == 0 || damage == 0 {
            return None;
        }
        Some(Self {
            path,
            speed,
            damage,
        })
    }

    /// Patrol path followed by the enemy.
    #[must_use]
    pub fn path(&self) -> &PatrolPath {
        &self.path
    }

    /// Number of path cells skipped per advancement.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Point cost applied when the enemy reaches the player.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }
}

/// Initial skeleton of a level as produced by the level generator.
///
/// The builder methods uphold the generation invariants: walls and keys never
/// cover the start or target cells, and keys never share a cell with a wall.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelLayout {
    level: u32,
    start: Position,
    target: Position,
    walls: BTreeSet<Position>,
    keys: BTreeSet<Position>,
    keys_required: u32,
    enemies: Vec<EnemyLayout>,
}

impl LevelLayout {
    /// Creates an empty layout. Fails when `level` is zero or `start == target`.
    #[must_use]
    pub fn new(level: u32, start: Position, target: Position) -> Option<Self> {
        if level == 0 || start == target {
            return None;
        }
        Some(Self {
            level,
            start,
            target,
            walls: BTreeSet::new(),
            keys: BTreeSet::new(),
            keys_required: 0,
            enemies: Vec::new(),
        })
    }

    /// Adds walls, silently skipping reserved cells.
    #[must_use]
    pub fn with_walls(mut self, walls: impl IntoIterator<Item = Position>) -> Self {
        for wall in walls {
            if !self.is_reserved(wall) {
                let _ = self.keys.remove(&wall);
                let _ = self.walls.insert(wall);
            }
        }
        self
    }

    /// Adds keys, silently skipping reserved cells and walls.
    #[must_use]
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = Position>) -> Self {
        for key in keys {
            if !self.is_reserved(key) && !self.walls.contains(&key) {
                let _ = self.keys.insert(key);
            }
        }
        self
    }

    /// Sets how many keys must be held for the target to count as reached.
    #[must_use]
    pub fn with_keys_required(mut self, keys_required: u32) -> Self {
        self.keys_required = keys_required;
        self
    }

    /// Appends an enemy to the layout.
    #[must_use]
    pub fn with_enemy(mut self, enemy: EnemyLayout) -> Self {
        self.enemies.push(enemy);
        self
    }

    /// Reports whether the cell is the start or target of the level.
    #[must_use]
    pub fn is_reserved(&self, cell: Position) -> bool {
        cell == self.start || cell == self.target
    }

    /// Level number the layout belongs to.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Cell the player starts on.
    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    /// Goal cell.
    #[must_use]
    pub const fn target(&self) -> Position {
        self.target
    }

    /// Wall cells.
    #[must_use]
    pub fn walls(&self) -> &BTreeSet<Position> {
        &self.walls
    }

    /// Collectible key cells.
    #[must_use]
    pub fn keys(&self) -> &BTreeSet<Position> {
        &self.keys
    }

    /// Keys required before the target counts as reached.
    #[must_use]
    pub const fn keys_required(&self) -> u32 {
        self.keys_required
    }

    /// Enemies in authoring order.
    #[must_use]
    pub fn enemies(&self) -> &[EnemyLayout] {
        &self.enemies
    }
}

/// Patrol step assignment for a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyStep {
    /// Enemy being advanced.
    pub enemy: EnemyId,
    /// New index into the enemy's patrol path.
    pub step_index: usize,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the entire world with a freshly generated level.
    LoadLevel {
        /// Layout to install.
        layout: LevelLayout,
    },
    /// Reinstalls the layout the current level was built from.
    RestartLevel,
    /// Attempts to move the player a single cell.
    StepPlayer {
        /// Direction of the attempted step.
        direction: Direction,
    },
    /// Teleports the player back to the level's start cell.
    ReturnPlayerToStart,
    /// Moves enemies to new patrol indices, then checks for player contact.
    AdvanceEnemies {
        /// Step assignments, one per enemy.
        steps: Vec<EnemyStep>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a level was installed.
    LevelLoaded {
        /// Level number now active.
        level: u32,
    },
    /// The player attempted to leave the grid; the command was consumed without movement.
    EdgeBumped {
        /// Cell the player remains on.
        at: Position,
        /// Direction of the rejected step.
        direction: Direction,
        /// Manhattan distance from the player to the target.
        distance: u32,
    },
    /// The player attempted to step onto a wall and stayed in place.
    WallStruck {
        /// Wall cell that blocked the step.
        wall: Position,
    },
    /// Confirms that the player moved between two cells.
    PlayerAdvanced {
        /// Cell occupied before the move.
        from: Position,
        /// Cell occupied after the move.
        to: Position,
        /// Distance to the target before the move.
        distance_before: u32,
        /// Distance to the target after the move.
        distance_after: u32,
    },
    /// A previously uncollected key was picked up.
    KeyCollected {
        /// Cell of the key.
        cell: Position,
        /// Number of keys collected so far in this level.
        collected: u32,
        /// Number of keys the level requires.
        required: u32,
    },
    /// The player was teleported to the start cell.
    PlayerReturnedToStart {
        /// Start cell of the level.
        start: Position,
    },
    /// Confirms that an enemy moved along its patrol.
    EnemyAdvanced {
        /// Enemy that moved.
        enemy: EnemyId,
        /// Cell occupied before the step.
        from: Position,
        /// Cell occupied after the step.
        to: Position,
    },
    /// An enemy occupies the player's cell after advancement.
    EnemyContact {
        /// First enemy found on the player's cell.
        enemy: EnemyId,
        /// Damage configured for that enemy.
        damage: u32,
    },
}

/// Read-only view of a single enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Cell currently occupied.
    pub position: Position,
    /// Current index into the patrol path.
    pub step_index: usize,
    /// Number of cells in the patrol cycle.
    pub path_len: usize,
    /// Path cells skipped per advancement.
    pub speed: u32,
}

/// Visual tone of a status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Positive feedback.
    Success,
    /// Negative feedback or error.
    Failure,
}

/// User-visible status line produced by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    /// Message text.
    pub text: String,
    /// Presentation tone.
    pub tone: Tone,
}

impl StatusMessage {
    /// Creates a success message.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Success,
        }
    }

    /// Creates a failure message.
    #[must_use]
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Failure,
        }
    }
}

/// Read-only snapshot handed to rendering and audio collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Active level number.
    pub level: u32,
    /// Number of levels in the active catalog.
    pub level_count: u32,
    /// Player cell.
    pub player: Position,
    /// Goal cell.
    pub target: Position,
    /// Wall cells.
    pub walls: Vec<Position>,
    /// All key cells of the level.
    pub keys: Vec<Position>,
    /// Keys already picked up.
    pub collected_keys: Vec<Position>,
    /// Keys needed before the target counts.
    pub keys_required: u32,
    /// Enemy positions in identifier order.
    pub enemies: Vec<EnemySnapshot>,
    /// Current points.
    pub points: i64,
    /// Remaining lives, when the economy tracks them.
    pub lives: Option<u32>,
    /// Levels the player may select.
    pub unlocked_levels: Vec<u32>,
    /// Whether a run is in progress.
    pub running: bool,
    /// Commands still waiting in the queue.
    pub queued: usize,
    /// Most recent status message.
    pub message: Option<StatusMessage>,
}

/// Deferred state change the host performs after a delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Reinstall the current level from its initial layout.
    RestartLevel,
    /// Reset economy and progression, then load level one.
    ResetGame,
    /// Switch to the provided level.
    AdvanceTo(u32),
}

/// Transition request paired with the delay the host must wait first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduledTransition {
    /// Time to wait before performing the transition.
    pub delay: Duration,
    /// Transition to perform.
    pub transition: Transition,
}

/// Reasons a repeat count is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No count was supplied.
    #[error("a step count n is required")]
    Missing,
    /// The supplied count was not an integer.
    #[error("n must be a whole number")]
    NotAnInteger,
    /// The supplied count was zero or negative.
    #[error("n must be a positive integer")]
    NotPositive,
}

/// The queue would exceed its capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("too many actions: {queued} queued + {requested} requested exceeds the limit of {capacity}")]
pub struct CapacityError {
    /// Commands already queued.
    pub queued: usize,
    /// Commands requested by the rejected call.
    pub requested: u64,
    /// Queue capacity.
    pub capacity: usize,
}

/// Failures reported by the enqueue entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EnqueueError {
    /// The repeat count was invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The queue has no room for the request.
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

/// Failures raised while a script enqueues commands.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// An enqueue entry point rejected a call.
    #[error(transparent)]
    Enqueue(#[from] EnqueueError),
    /// The script text could not be understood.
    #[error("line {line}: {message}")]
    Syntax {
        /// One-based line of the offending statement.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// The script collaborator failed for another reason.
    #[error("{0}")]
    Failed(String),
}

/// Parsing and validation helpers for repeat counts.
#[derive(Debug)]
pub struct StepCount;

impl StepCount {
    /// Validates a numeric repeat count.
    pub fn validate(n: i64) -> Result<u64, ValidationError> {
        u64::try_from(n)
            .ok()
            .filter(|count| *count > 0)
            .ok_or(ValidationError::NotPositive)
    }

    /// Parses raw argument text as a repeat count.
    pub fn parse(raw: Option<&str>) -> Result<u64, ValidationError> {
        let text = raw.map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(ValidationError::Missing);
        }
        match text.parse::<i64>() {
            Ok(n) => Self::validate(n),
            Err(_) => Err(ValidationError::NotAnInteger),
        }
    }
}

/// Capability handed to scripts: the four movement entry points and nothing else.
pub trait MoveCommands {
    /// Enqueues `n` commands in the given direction, all or nothing.
    fn enqueue(&mut self, direction: Direction, n: i64) -> Result<(), EnqueueError>;

    /// Enqueues `n` upward steps.
    fn move_up(&mut self, n: i64) -> Result<(), EnqueueError> {
        self.enqueue(Direction::Up, n)
    }

    /// Enqueues `n` downward steps.
    fn move_down(&mut self, n: i64) -> Result<(), EnqueueError> {
        self.enqueue(Direction::Down, n)
    }

    /// Enqueues `n` leftward steps.
    fn move_left(&mut self, n: i64) -> Result<(), EnqueueError> {
        self.enqueue(Direction::Left, n)
    }

    /// Enqueues `n` rightward steps.
    fn move_right(&mut self, n: i64) -> Result<(), EnqueueError> {
        self.enqueue(Direction::Right, n)
    }
}

/// Script collaborator that drives the movement capability synchronously.
pub trait Script {
    /// Executes the script, calling movement entry points as it goes.
    fn run(&mut self, commands: &mut dyn MoveCommands) -> Result<(), ScriptError>;
}

impl<F> Script for F
where
    F: FnMut(&mut dyn MoveCommands) -> Result<(), ScriptError>,
{
    fn run(&mut self, commands: &mut dyn MoveCommands) -> Result<(), ScriptError> {
        self(commands)
    }
}
