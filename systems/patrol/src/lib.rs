#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic patrol system that advances enemies along their cyclic paths.

use codewalk_core::{Command, EnemySnapshot, EnemyStep, Event};

/// Computes the patrol index reached after one advancement.
///
/// A zero-length path keeps the index at zero.
#[must_use]
pub fn advance(step_index: usize, speed: u32, path_len: usize) -> usize {
    if path_len == 0 {
        return 0;
    }
    let stride = speed as usize % path_len;
    (step_index % path_len + stride) % path_len
}

/// Pure system that reacts to player moves by emitting enemy advancement commands.
#[derive(Debug, Default)]
pub struct Patrol;

impl Patrol {
    /// Emits one `AdvanceEnemies` command when the events contain a player move.
    ///
    /// Wall strikes never advance enemies; edge bumps count as a move.
    pub fn handle(&self, events: &[Event], enemies: &[EnemySnapshot], out: &mut Vec<Command>) {
        let moved = events.iter().any(|event| {
            matches!(
                event,
                Event::PlayerAdvanced { .. } | Event::EdgeBumped { .. }
            )
        });
        if !moved || enemies.is_empty() {
            return;
        }

        let steps = enemies
            .iter()
            .map(|enemy| EnemyStep {
                enemy: enemy.id,
                step_index: advance(enemy.step_index, enemy.speed, enemy.path_len),
            })
            .collect();
        out.push(Command::AdvanceEnemies { steps });
    }
}
