//! Session-wide tuning: economy preset, queue capacity, level catalog and delays.

use std::time::Duration;

use codewalk_system_economy::{EconomyRules, Variant};
use codewalk_system_levels::Catalog;

/// Delays the host waits between ticks and before transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Pause after every ordinary tick.
    pub tick_delay: Duration,
    /// Pause after a survivable wall strike.
    pub wall_pause: Duration,
    /// Delay before a level restarts after a lost life.
    pub restart_delay: Duration,
    /// Delay before the game resets after the economy is exhausted.
    pub reset_delay: Duration,
    /// Delay before the next level loads after a win.
    pub advance_delay: Duration,
}

impl Timing {
    /// Uniform zero delays, convenient for headless hosts.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            tick_delay: Duration::ZERO,
            wall_pause: Duration::ZERO,
            restart_delay: Duration::ZERO,
            reset_delay: Duration::ZERO,
            advance_delay: Duration::ZERO,
        }
    }
}

/// Complete rule set for a game session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Economy constants and policy.
    pub economy: EconomyRules,
    /// Host-facing delays.
    pub timing: Timing,
    /// Queue capacity.
    pub max_actions: usize,
    /// Levels played through.
    pub catalog: Catalog,
}

impl Rules {
    /// Lives economy over the five classic levels.
    #[must_use]
    pub fn lives() -> Self {
        Self {
            economy: EconomyRules::lives(),
            timing: Timing {
                tick_delay: Duration::from_millis(200),
                wall_pause: Duration::from_millis(200),
                restart_delay: Duration::from_millis(500),
                reset_delay: Duration::from_millis(1500),
                advance_delay: Duration::from_millis(5000),
            },
            max_actions: 500,
            catalog: Catalog::Classic,
        }
    }

    /// Points economy over the three expedition levels.
    #[must_use]
    pub fn points() -> Self {
        Self {
            economy: EconomyRules::points(),
            timing: Timing {
                tick_delay: Duration::from_millis(200),
                wall_pause: Duration::from_millis(700),
                restart_delay: Duration::from_millis(500),
                reset_delay: Duration::from_millis(2500),
                advance_delay: Duration::from_millis(1400),
            },
            max_actions: 300,
            catalog: Catalog::Expedition,
        }
    }

    /// Preset matching the economy variant.
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Lives => Self::lives(),
            Variant::Points => Self::points(),
        }
    }

    /// Replaces the catalog, keeping every other setting.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replaces the timing, keeping every other setting.
    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}
