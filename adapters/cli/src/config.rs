//! `codewalk.toml` loading. Every key is optional and falls back to the preset
//! of the selected economy variant.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use codewalk_session::Rules;
use codewalk_system_economy::Variant;
use codewalk_system_levels::Catalog;
use serde::Deserialize;

/// File looked up in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "codewalk.toml";

/// Economy variant selectable from the command line or the config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum VariantChoice {
    /// Three lives over the classic levels.
    Lives,
    /// A point balance over the expedition levels.
    Points,
}

impl From<VariantChoice> for Variant {
    fn from(choice: VariantChoice) -> Self {
        match choice {
            VariantChoice::Lives => Variant::Lives,
            VariantChoice::Points => Variant::Points,
        }
    }
}

/// Level catalog selectable from the config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum CatalogChoice {
    Classic,
    Expedition,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GeneralSection {
    pub(crate) variant: Option<VariantChoice>,
    pub(crate) seed: Option<u64>,
    pub(crate) catalog: Option<CatalogChoice>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EconomySection {
    starting_points: Option<i64>,
    starting_lives: Option<u32>,
    approach_reward: Option<i64>,
    retreat_penalty: Option<i64>,
    key_reward: Option<i64>,
    wall_penalty: Option<i64>,
    win_bonus: Option<i64>,
    points_floor: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TimingSection {
    tick_ms: Option<u64>,
    wall_pause_ms: Option<u64>,
    restart_ms: Option<u64>,
    reset_ms: Option<u64>,
    advance_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct QueueSection {
    max_actions: Option<usize>,
}

/// Parsed contents of a config file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) general: GeneralSection,
    #[serde(default)]
    economy: EconomySection,
    #[serde(default)]
    timing: TimingSection,
    #[serde(default)]
    queue: QueueSection,
}

impl Config {
    /// Loads the explicit config file, or `codewalk.toml` when it exists.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    /// Parses config file contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid codewalk config")
    }

    /// Builds the rule set for `variant`, overriding the preset with configured keys.
    pub(crate) fn rules(&self, variant: Variant) -> Rules {
        let mut rules = Rules::for_variant(variant);
        if let Some(catalog) = self.general.catalog {
            rules.catalog = match catalog {
                CatalogChoice::Classic => Catalog::Classic,
                CatalogChoice::Expedition => Catalog::Expedition,
            };
        }

        let economy = &self.economy;
        let target = &mut rules.economy;
        override_with(&mut target.starting_points, economy.starting_points);
        override_with(&mut target.starting_lives, economy.starting_lives);
        override_with(&mut target.approach_reward, economy.approach_reward);
        override_with(&mut target.retreat_penalty, economy.retreat_penalty);
        override_with(&mut target.key_reward, economy.key_reward);
        override_with(&mut target.wall_penalty, economy.wall_penalty);
        override_with(&mut target.win_bonus, economy.win_bonus);
        if let Some(floor) = economy.points_floor {
            target.points_floor = Some(floor);
        }

        let timing = &self.timing;
        let target = &mut rules.timing;
        override_with(&mut target.tick_delay, timing.tick_ms.map(Duration::from_millis));
        override_with(
            &mut target.wall_pause,
            timing.wall_pause_ms.map(Duration::from_millis),
        );
        override_with(
            &mut target.restart_delay,
            timing.restart_ms.map(Duration::from_millis),
        );
        override_with(&mut target.reset_delay, timing.reset_ms.map(Duration::from_millis));
        override_with(
            &mut target.advance_delay,
            timing.advance_ms.map(Duration::from_millis),
        );

        override_with(&mut rules.max_actions, self.queue.max_actions);
        rules
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
