#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level generation: maps a level number to the initial layout of the world.
//!
//! Fixed levels are hand-authored. Procedural levels scatter walls and keys
//! with bounded-retry sampling driven by a seeded `ChaCha8Rng`, so the same
//! seed reproduces the same sequence of generated levels. When a placement
//! exhausts its retry budget the level simply receives fewer items.

use std::ops::Range;

use codewalk_core::{EnemyLayout, LevelLayout, PatrolPath, Position, GRID};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CLASSIC_LEVELS: u32 = 5;
const EXPEDITION_LEVELS: u32 = 3;

const MAZE_WALLS: Scatter = Scatter {
    count: 16,
    attempts: 30,
    rows: 1..GRID - 1,
};
const VAULT_WALLS: Scatter = Scatter {
    count: 28,
    attempts: 40,
    rows: 1..GRID - 1,
};
const VAULT_KEY_ATTEMPTS: u32 = 100;

/// Collection of levels a session plays through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Catalog {
    /// Five fixed levels teaching sequences, loops and functions.
    Classic,
    /// Three levels with a patrolling enemy, random mazes and keys.
    Expedition,
    /// Caller-provided layouts, looked up by their level number.
    Custom(Vec<LevelLayout>),
}

impl Catalog {
    /// Number of levels the catalog provides.
    #[must_use]
    pub fn level_count(&self) -> u32 {
        match self {
            Self::Classic => CLASSIC_LEVELS,
            Self::Expedition => EXPEDITION_LEVELS,
            Self::Custom(layouts) => layouts.len() as u32,
        }
    }

    /// First level in `1..=level_count()` the catalog cannot produce.
    ///
    /// Only a custom catalog can be misnumbered: a duplicate or a gap both
    /// leave some level of the contiguous range without a layout.
    #[must_use]
    pub fn missing_level(&self) -> Option<u32> {
        let Self::Custom(layouts) = self else {
            return None;
        };
        (1..=self.level_count())
            .find(|level| !layouts.iter().any(|layout| layout.level() == *level))
    }

    /// Short human-readable catalog name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Expedition => "expedition",
            Self::Custom(_) => "custom",
        }
    }

    /// Hint shown to the learner when the level is entered.
    #[must_use]
    pub fn hint(&self, level: u32) -> Option<&'static str> {
        let hint = match (self, level) {
            (Self::Classic, 1) => "Use moveUp and moveLeft.",
            (Self::Classic, 2) => "Try nested loops.",
            (Self::Classic, 3) => "Write a function for the repeated moves.",
            (Self::Classic, 4) => "Walk around the two long walls.",
            (Self::Classic, 5) => "A proper maze!",
            (Self::Expedition, 1) => "Simple start. Try: moveUp(9);",
            (Self::Expedition, 2) => "Random walls and a patrol. Use loops or functions.",
            (Self::Expedition, 3) => "Collect every key before reaching the flag.",
            _ => return None,
        };
        Some(hint)
    }
}

/// Produces level layouts for a catalog.
#[derive(Debug)]
pub struct LevelGenerator {
    catalog: Catalog,
    rng: ChaCha8Rng,
}

impl LevelGenerator {
    /// Creates a generator for the catalog, seeding procedural placement.
    #[must_use]
    pub fn new(catalog: Catalog, seed: u64) -> Self {
        Self {
            catalog,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Catalog the generator draws from.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of levels available.
    #[must_use]
    pub fn level_count(&self) -> u32 {
        self.catalog.level_count()
    }

    /// Reports whether the catalog contains the level.
    #[must_use]
    pub fn has_level(&self, level: u32) -> bool {
        (1..=self.level_count()).contains(&level)
    }

    /// Builds the initial layout for `level`, or `None` if the catalog lacks it.
    pub fn generate(&mut self, level: u32) -> Option<LevelLayout> {
        match &self.catalog {
            Catalog::Classic => classic(level),
            Catalog::Expedition => expedition(level, &mut self.rng),
            Catalog::Custom(layouts) => layouts
                .iter()
                .find(|layout| layout.level() == level)
                .cloned(),
        }
    }
}

/// Bounded-retry placement parameters for scattered walls.
#[derive(Clone, Debug)]
struct Scatter {
    count: u32,
    attempts: u32,
    rows: Range<u32>,
}

fn cell(x: u32, y: u32) -> Option<Position> {
    Position::from_xy(x, y)
}

fn cells(coords: impl IntoIterator<Item = (u32, u32)>) -> Vec<Position> {
    coords
        .into_iter()
        .filter_map(|(x, y)| Position::from_xy(x, y))
        .collect()
}

fn classic(level: u32) -> Option<LevelLayout> {
    let layout = match level {
        1 => LevelLayout::new(1, cell(9, 9)?, cell(0, 0)?)?,
        2 => LevelLayout::new(2, cell(0, 9)?, cell(9, 0)?)?,
        3 => LevelLayout::new(3, cell(2, 8)?, cell(9, 0)?)?,
        4 => LevelLayout::new(4, cell(0, 9)?, cell(9, 0)?)?
            .with_walls(cells((2..8).map(|y| (4, y))))
            .with_walls(cells((3..9).map(|x| (x, 5)))),
        5 => LevelLayout::new(5, cell(0, 9)?, cell(9, 0)?)?
            .with_walls(cells((1..9).filter(|y| *y != 4).map(|y| (2, y))))
            .with_walls(cells((2..9).filter(|x| *x != 6).map(|x| (x, 6))))
            .with_walls(cells((2..9).filter(|y| *y != 7).map(|y| (7, y))))
            .with_walls(cells((4..9).filter(|x| *x != 5).map(|x| (x, 3)))),
        _ => return None,
    };
    Some(layout)
}

fn expedition(level: u32, rng: &mut ChaCha8Rng) -> Option<LevelLayout> {
    match level {
        1 => Some(
            LevelLayout::new(1, cell(9, 9)?, cell(9, 0)?)?
                .with_walls(cells((3..6).map(|x| (x, 7)))),
        ),
        2 => {
            let layout = LevelLayout::new(2, cell(0, 9)?, cell(9, 0)?)?;
            let walls = scatter_walls(&layout, &MAZE_WALLS, rng);
            let patrol = PatrolPath::new(cells((1..9).map(|x| (x, 5))))?;
            Some(
                layout
                    .with_walls(walls)
                    .with_enemy(EnemyLayout::new(patrol, 1, 2)?),
            )
        }
        3 => {
            let layout = LevelLayout::new(3, cell(1, 9)?, cell(9, 0)?)?;
            let walls = scatter_walls(&layout, &VAULT_WALLS, rng);
            let layout = layout.with_walls(walls);

            let wanted = rng.gen_range(2..=3);
            let keys = scatter_keys(&layout, wanted, VAULT_KEY_ATTEMPTS, rng);
            let placed = keys.len() as u32;

            let column = PatrolPath::new(cells((2..8).map(|y| (3, y))))?;
            let ring = PatrolPath::new(cells(
                (4..9)
                    .map(|x| (x, 2))
                    .chain((2..6).map(|y| (8, y)))
                    .chain((4..9).rev().map(|x| (x, 5))),
            ))?;

            Some(
                layout
                    .with_keys(keys)
                    .with_keys_required(placed)
                    .with_enemy(EnemyLayout::new(column, 1, 3)?)
                    .with_enemy(EnemyLayout::new(ring, 1, 2)?),
            )
        }
        _ => None,
    }
}

fn scatter_walls(layout: &LevelLayout, scatter: &Scatter, rng: &mut ChaCha8Rng) -> Vec<Position> {
    let mut placed: Vec<Position> = Vec::with_capacity(scatter.count as usize);
    for _ in 0..scatter.count {
        for _ in 0..scatter.attempts {
            let x = rng.gen_range(0..GRID);
            let y = rng.gen_range(scatter.rows.clone());
            let Some(candidate) = Position::from_xy(x, y) else {
                continue;
            };
            if layout.is_reserved(candidate) || placed.contains(&candidate) {
                continue;
            }
            placed.push(candidate);
            break;
        }
    }
    placed
}

fn scatter_keys(
    layout: &LevelLayout,
    wanted: u32,
    attempts: u32,
    rng: &mut ChaCha8Rng,
) -> Vec<Position> {
    let mut placed: Vec<Position> = Vec::with_capacity(wanted as usize);
    for _ in 0..wanted {
        for _ in 0..attempts {
            let x = rng.gen_range(0..GRID);
            let y = rng.gen_range(0..GRID);
            let Some(candidate) = Position::from_xy(x, y) else {
                continue;
            };
            if layout.is_reserved(candidate)
                || layout.walls().contains(&candidate)
                || placed.contains(&candidate)
            {
                continue;
            }
            placed.push(candidate);
            break;
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scatter_gives_up_after_budget() {
        let layout = LevelLayout::new(1, cell(0, 1).expect("cell"), cell(1, 1).expect("cell"))
            .expect("layout");
        let crowded = Scatter {
            count: 40,
            attempts: 5,
            rows: 1..2,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let walls = scatter_walls(&layout, &crowded, &mut rng);

        assert!(walls.len() <= (GRID as usize - 2));
        assert!(walls.iter().all(|wall| wall.y() == 1));
        assert!(walls.iter().all(|wall| !layout.is_reserved(*wall)));
    }

    #[test]
    fn classic_level_five_leaves_gaps() {
        let layout = classic(5).expect("level five");
        for gap in [(2, 4), (6, 6), (7, 7), (5, 3)] {
            let gap = cell(gap.0, gap.1).expect("cell");
            assert!(!layout.walls().contains(&gap), "gap {gap:?} walled");
        }
    }
}
