//! Text rendering of the grid and status line.

use std::fmt::Write as _;

use codewalk_core::{LevelLayout, Position, Snapshot, Tone, GRID};

/// Cell contents to draw, decoupled from where they came from.
#[derive(Clone, Debug, Default)]
pub(crate) struct Board {
    player: Option<Position>,
    target: Option<Position>,
    walls: Vec<Position>,
    keys: Vec<Position>,
    enemies: Vec<Position>,
}

impl Board {
    /// Board showing the live state of a session.
    pub(crate) fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            player: Some(snapshot.player),
            target: Some(snapshot.target),
            walls: snapshot.walls.clone(),
            keys: snapshot
                .keys
                .iter()
                .copied()
                .filter(|key| !snapshot.collected_keys.contains(key))
                .collect(),
            enemies: snapshot.enemies.iter().map(|enemy| enemy.position).collect(),
        }
    }

    /// Board showing a level as it is first loaded.
    pub(crate) fn from_layout(layout: &LevelLayout) -> Self {
        Self {
            player: Some(layout.start()),
            target: Some(layout.target()),
            walls: layout.walls().iter().copied().collect(),
            keys: layout.keys().iter().copied().collect(),
            enemies: layout
                .enemies()
                .iter()
                .filter_map(|enemy| enemy.path().cells().first().copied())
                .collect(),
        }
    }

    fn glyph(&self, cell: Position) -> char {
        if self.player == Some(cell) {
            '@'
        } else if self.enemies.contains(&cell) {
            'E'
        } else if self.walls.contains(&cell) {
            '#'
        } else if self.keys.contains(&cell) {
            'k'
        } else if self.target == Some(cell) {
            'F'
        } else {
            '.'
        }
    }

    /// Draws the grid, one row per line.
    pub(crate) fn draw(&self) -> String {
        let mut out = String::with_capacity((GRID as usize + 1) * (GRID as usize * 2));
        for y in 0..GRID {
            for x in 0..GRID {
                let glyph = Position::from_xy(x, y).map_or(' ', |cell| self.glyph(cell));
                out.push(glyph);
                if x + 1 < GRID {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Grid followed by the level, economy and status lines.
pub(crate) fn frame(snapshot: &Snapshot) -> String {
    let mut out = Board::from_snapshot(snapshot).draw();
    let _ = write!(
        out,
        "level {}/{}  points {}",
        snapshot.level, snapshot.level_count, snapshot.points
    );
    if let Some(lives) = snapshot.lives {
        let _ = write!(out, "  lives {lives}");
    }
    if snapshot.keys_required > 0 {
        let _ = write!(
            out,
            "  keys {}/{}",
            snapshot.collected_keys.len(),
            snapshot.keys_required
        );
    }
    let _ = write!(out, "  queued {}", snapshot.queued);
    out.push('\n');
    if let Some(message) = &snapshot.message {
        let marker = match message.tone {
            Tone::Success => '+',
            Tone::Failure => '!',
        };
        let _ = writeln!(out, "{marker} {}", message.text);
    }
    out
}
