#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Codewalk.

use std::collections::BTreeSet;

use codewalk_core::{
    Command, Direction, EnemyId, EnemyStep, Event, LevelLayout, PatrolPath, Position,
};

/// Represents the authoritative state of the active level.
///
/// The world is always built from a [`LevelLayout`] and keeps that layout so
/// a restart reinstalls exactly the initial state. Walls, keys and the target
/// never change after installation; only the player, the collected keys and
/// the enemy patrol indices evolve.
#[derive(Debug)]
pub struct World {
    layout: LevelLayout,
    player: Position,
    collected_keys: BTreeSet<Position>,
    enemies: Vec<Enemy>,
}

impl World {
    /// Creates a world ready to play the provided level.
    #[must_use]
    pub fn new(layout: LevelLayout) -> Self {
        let enemies = layout
            .enemies()
            .iter()
            .enumerate()
            .map(|(index, enemy)| Enemy {
                id: EnemyId::new(index as u32),
                path: enemy.path().clone(),
                step_index: 0,
                speed: enemy.speed(),
                damage: enemy.damage(),
            })
            .collect();
        Self {
            player: layout.start(),
            collected_keys: BTreeSet::new(),
            enemies,
            layout,
        }
    }

    fn install(&mut self, layout: LevelLayout, out_events: &mut Vec<Event>) {
        *self = World::new(layout);
        out_events.push(Event::LevelLoaded {
            level: self.layout.level(),
        });
    }

    fn distance_to_target(&self, cell: Position) -> u32 {
        cell.manhattan_distance(self.layout.target())
    }

    fn step_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        let from = self.player;
        let Some(candidate) = from.step(direction) else {
            out_events.push(Event::EdgeBumped {
                at: from,
                direction,
                distance: self.distance_to_target(from),
            });
            return;
        };

        if self.layout.walls().contains(&candidate) {
            out_events.push(Event::WallStruck { wall: candidate });
            return;
        }

        self.player = candidate;
        out_events.push(Event::PlayerAdvanced {
            from,
            to: candidate,
            distance_before: self.distance_to_target(from),
            distance_after: self.distance_to_target(candidate),
        });

        if self.layout.keys().contains(&candidate) && self.collected_keys.insert(candidate) {
            out_events.push(Event::KeyCollected {
                cell: candidate,
                collected: self.collected_keys.len() as u32,
                required: self.layout.keys_required(),
            });
        }
    }

    fn advance_enemies(&mut self, steps: Vec<EnemyStep>, out_events: &mut Vec<Event>) {
        for step in steps {
            let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.id == step.enemy) else {
                continue;
            };
            let from = enemy.position();
            enemy.step_index = step.step_index % enemy.path.len();
            out_events.push(Event::EnemyAdvanced {
                enemy: enemy.id,
                from,
                to: enemy.position(),
            });
        }

        let player = self.player;
        if let Some(enemy) = self.enemies.iter().find(|enemy| enemy.position() == player) {
            out_events.push(Event::EnemyContact {
                enemy: enemy.id,
                damage: enemy.damage,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { layout } => world.install(layout, out_events),
        Command::RestartLevel => {
            let layout = world.layout.clone();
            world.install(layout, out_events);
        }
        Command::StepPlayer { direction } => world.step_player(direction, out_events),
        Command::ReturnPlayerToStart => {
            world.player = world.layout.start();
            out_events.push(Event::PlayerReturnedToStart {
                start: world.player,
            });
        }
        Command::AdvanceEnemies { steps } => world.advance_enemies(steps, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use super::World;
    use codewalk_core::{EnemySnapshot, LevelLayout, Position};

    /// Level number currently installed.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.layout.level()
    }

    /// Layout the current level was built from.
    #[must_use]
    pub fn layout(world: &World) -> &LevelLayout {
        &world.layout
    }

    /// Cell occupied by the player.
    #[must_use]
    pub fn player(world: &World) -> Position {
        world.player
    }

    /// Start cell of the level.
    #[must_use]
    pub fn start(world: &World) -> Position {
        world.layout.start()
    }

    /// Goal cell of the level.
    #[must_use]
    pub fn target(world: &World) -> Position {
        world.layout.target()
    }

    /// Wall cells of the level.
    #[must_use]
    pub fn walls(world: &World) -> &BTreeSet<Position> {
        world.layout.walls()
    }

    /// Key cells of the level, collected or not.
    #[must_use]
    pub fn keys(world: &World) -> &BTreeSet<Position> {
        world.layout.keys()
    }

    /// Keys picked up so far.
    #[must_use]
    pub fn collected_keys(world: &World) -> &BTreeSet<Position> {
        &world.collected_keys
    }

    /// Keys required before the target counts as reached.
    #[must_use]
    pub fn keys_required(world: &World) -> u32 {
        world.layout.keys_required()
    }

    /// Reports whether the player stands on the target cell.
    #[must_use]
    pub fn at_target(world: &World) -> bool {
        world.player == world.layout.target()
    }

    /// Reports whether enough keys have been collected.
    #[must_use]
    pub fn keys_satisfied(world: &World) -> bool {
        let required = world.layout.keys_required();
        required == 0 || world.collected_keys.len() as u32 >= required
    }

    /// Captures the enemies in identifier order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                position: enemy.position(),
                step_index: enemy.step_index,
                path_len: enemy.path.len(),
                speed: enemy.speed,
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    path: PatrolPath,
    step_index: usize,
    speed: u32,
    damage: u32,
}

impl Enemy {
    fn position(&self) -> Position {
        self.path.cell_at(self.step_index)
    }
}
