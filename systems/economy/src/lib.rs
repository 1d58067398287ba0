#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scoring economy: converts world events into point and life changes.
//!
//! Two policies are supported. The lives economy only ever adds points and
//! charges a life per collision. The points economy charges collisions in
//! points, sends the player back to the start and ends the game once the
//! balance reaches zero.

use codewalk_core::{Command, Event};

/// Economy policy selected for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Collisions consume lives; points never decrease.
    Lives,
    /// Collisions cost points; running out of points ends the game.
    Points,
}

impl Variant {
    /// Lowercase name of the variant.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lives => "lives",
            Self::Points => "points",
        }
    }
}

/// Tunable constants for an economy policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EconomyRules {
    /// Policy that interprets collisions.
    pub variant: Variant,
    /// Points held at the start of a game.
    pub starting_points: i64,
    /// Lives held at the start of a game; ignored by the points policy.
    pub starting_lives: u32,
    /// Points awarded when a move strictly reduces the distance to the target.
    pub approach_reward: i64,
    /// Points deducted when a move does not get closer. Zero in both presets.
    pub retreat_penalty: i64,
    /// Points awarded for picking up a key, instead of the approach reward.
    pub key_reward: i64,
    /// Points deducted for striking a wall under the points policy.
    pub wall_penalty: i64,
    /// Points awarded for completing a level.
    pub win_bonus: i64,
    /// Lowest balance a level may be entered with, if any.
    pub points_floor: Option<i64>,
}

impl EconomyRules {
    /// Preset for the lives economy.
    #[must_use]
    pub const fn lives() -> Self {
        Self {
            variant: Variant::Lives,
            starting_points: 0,
            starting_lives: 3,
            approach_reward: 1,
            retreat_penalty: 0,
            key_reward: 1,
            wall_penalty: 0,
            win_bonus: 0,
            points_floor: None,
        }
    }

    /// Preset for the points economy.
    #[must_use]
    pub const fn points() -> Self {
        Self {
            variant: Variant::Points,
            starting_points: 10,
            starting_lives: 0,
            approach_reward: 1,
            // Moving away is free.
            retreat_penalty: 0,
            key_reward: 3,
            wall_penalty: 2,
            win_bonus: 5,
            points_floor: Some(1),
        }
    }

    /// Preset matching the provided variant.
    #[must_use]
    pub const fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Lives => Self::lives(),
            Variant::Points => Self::points(),
        }
    }
}

/// Effect of a batch of events on the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standing {
    /// The run continues.
    Steady,
    /// A life was lost; the run ends and the level restarts.
    RestartLevel,
    /// The economy is exhausted; the game resets.
    GameOver,
}

/// Kind of collision charged by the economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Collision {
    Wall,
    Enemy { damage: u32 },
}

/// Live economy state for one game session.
#[derive(Clone, Debug)]
pub struct Economy {
    rules: EconomyRules,
    points: i64,
    lives: u32,
}

impl Economy {
    /// Creates an economy holding the starting balance of the rules.
    #[must_use]
    pub fn new(rules: EconomyRules) -> Self {
        Self {
            points: rules.starting_points,
            lives: rules.starting_lives,
            rules,
        }
    }

    /// Rules the economy applies.
    #[must_use]
    pub fn rules(&self) -> &EconomyRules {
        &self.rules
    }

    /// Active policy.
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.rules.variant
    }

    /// Current point balance.
    #[must_use]
    pub fn points(&self) -> i64 {
        self.points
    }

    /// Remaining lives under the lives policy.
    #[must_use]
    pub fn lives(&self) -> Option<u32> {
        match self.rules.variant {
            Variant::Lives => Some(self.lives),
            Variant::Points => None,
        }
    }

    /// Consumes world events from one command and reports the resulting standing.
    ///
    /// Under the points policy a survivable collision pushes a
    /// `ReturnPlayerToStart` command for the caller to apply.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) -> Standing {
        let key_collected = events
            .iter()
            .any(|event| matches!(event, Event::KeyCollected { .. }));

        for event in events {
            match event {
                Event::WallStruck { .. } => return self.collide(Collision::Wall, out),
                Event::EnemyContact { damage, .. } => {
                    return self.collide(Collision::Enemy { damage: *damage }, out)
                }
                Event::KeyCollected { .. } => self.points += self.rules.key_reward,
                Event::PlayerAdvanced {
                    distance_before,
                    distance_after,
                    ..
                } if !key_collected => self.score_move(*distance_before, *distance_after),
                Event::EdgeBumped { distance, .. } => self.score_move(*distance, *distance),
                _ => {}
            }
        }
        Standing::Steady
    }

    /// Adds the win bonus and returns the amount awarded.
    pub fn award_win(&mut self) -> i64 {
        self.points += self.rules.win_bonus;
        self.rules.win_bonus
    }

    /// Applies the entry floor when a level is selected.
    pub fn enter_level(&mut self) {
        if let Some(floor) = self.rules.points_floor {
            self.points = self.points.max(floor);
        }
    }

    /// Restores the starting balance.
    pub fn reset(&mut self) {
        self.points = self.rules.starting_points;
        self.lives = self.rules.starting_lives;
    }

    fn score_move(&mut self, before: u32, after: u32) {
        if after < before {
            self.points += self.rules.approach_reward;
        } else if self.rules.variant == Variant::Points {
            self.points = (self.points - self.rules.retreat_penalty).max(0);
        }
    }

    fn collide(&mut self, collision: Collision, out: &mut Vec<Command>) -> Standing {
        match self.rules.variant {
            Variant::Lives => {
                self.lives = self.lives.saturating_sub(1);
                if self.lives > 0 {
                    Standing::RestartLevel
                } else {
                    Standing::GameOver
                }
            }
            Variant::Points => {
                let penalty = match collision {
                    Collision::Wall => self.rules.wall_penalty,
                    Collision::Enemy { damage } => i64::from(damage),
                };
                self.points -= penalty;
                if self.points <= 0 {
                    Standing::GameOver
                } else {
                    out.push(Command::ReturnPlayerToStart);
                    Standing::Steady
                }
            }
        }
    }
}
