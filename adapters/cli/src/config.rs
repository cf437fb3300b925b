//! Session settings merged from a TOML file and command-line overrides.

use std::{fs, ops::RangeInclusive, path::PathBuf, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use serde::Deserialize;
use serpents_system_input::{Key, Keymap};
use serpents_world::DEFAULT_FIELD_SIZE;

const DEFAULT_WIDTH: u32 = 50;
const DEFAULT_HEIGHT: u32 = 40;
const DEFAULT_PLAYERS: u32 = 1;
const DEFAULT_START_LENGTH: u32 = 2;
const DEFAULT_TICK_RATE: u32 = 30;
const DEFAULT_MAX_TICKS: u64 = 1_000;
const DEFAULT_SEED: u64 = 0x5eed_0f5e_4935_4a11;
const TICK_RATE_RANGE: RangeInclusive<u32> = 1..=60;

/// Command-line arguments. Every value overrides the config file.
#[derive(Debug, Default, Parser)]
#[command(name = "serpents")]
#[command(version, about = "Headless multiplayer serpents simulation")]
pub(crate) struct Cli {
    /// TOML file providing grid, session, player and script settings
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    pub(crate) width: Option<u32>,

    /// Grid height in cells
    #[arg(long)]
    pub(crate) height: Option<u32>,

    /// Number of players joining before the game starts
    #[arg(long)]
    pub(crate) players: Option<u32>,

    /// Segments each serpent starts with
    #[arg(long)]
    pub(crate) start_length: Option<u32>,

    /// Simulation ticks per second
    #[arg(long)]
    pub(crate) tick_rate: Option<u32>,

    /// Upper bound on simulated ticks
    #[arg(long)]
    pub(crate) ticks: Option<u64>,

    /// Seed for apple placement and player generation
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Sleep between ticks to run at the configured tick rate
    #[arg(long)]
    pub(crate) realtime: bool,

    /// Print the final session snapshot as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    grid: GridSection,
    session: SessionSection,
    players: Vec<PlayerSection>,
    script: Vec<ScriptEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GridSection {
    width: Option<u32>,
    height: Option<u32>,
    field_size: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionSection {
    players: Option<u32>,
    start_length: Option<u32>,
    tick_rate: Option<u32>,
    max_ticks: Option<u64>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerSection {
    keymap: Keymap,
}

/// Keys held while a given tick is processed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptEntry {
    /// Number of ticks already elapsed when the keys are held.
    pub(crate) tick: u64,
    /// Keys held during that frame.
    pub(crate) keys: Vec<Key>,
}

/// Fully resolved session settings.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) field_size: f32,
    pub(crate) players: u32,
    pub(crate) keymaps: Vec<Keymap>,
    pub(crate) start_length: u32,
    pub(crate) tick_rate: u32,
    pub(crate) max_ticks: u64,
    pub(crate) seed: u64,
    pub(crate) realtime: bool,
    pub(crate) json: bool,
    pub(crate) script: Vec<ScriptEntry>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            field_size: DEFAULT_FIELD_SIZE,
            players: DEFAULT_PLAYERS,
            keymaps: Vec::new(),
            start_length: DEFAULT_START_LENGTH,
            tick_rate: DEFAULT_TICK_RATE,
            max_ticks: DEFAULT_MAX_TICKS,
            seed: DEFAULT_SEED,
            realtime: false,
            json: false,
            script: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads the config file named on the command line, if any, and applies
    /// the remaining flags on top.
    pub(crate) fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                parse_file(&text)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: &Cli, file: FileConfig) -> Result<Self> {
        let defaults = Self::default();
        let players_listed = u32::try_from(file.players.len()).context("too many players")?;

        let settings = Self {
            width: cli.width.or(file.grid.width).unwrap_or(defaults.width),
            height: cli.height.or(file.grid.height).unwrap_or(defaults.height),
            field_size: file.grid.field_size.unwrap_or(defaults.field_size),
            players: cli
                .players
                .or(file.session.players)
                .unwrap_or(players_listed.max(defaults.players)),
            keymaps: file.players.into_iter().map(|player| player.keymap).collect(),
            start_length: cli
                .start_length
                .or(file.session.start_length)
                .unwrap_or(defaults.start_length),
            tick_rate: cli
                .tick_rate
                .or(file.session.tick_rate)
                .unwrap_or(defaults.tick_rate),
            max_ticks: cli
                .ticks
                .or(file.session.max_ticks)
                .unwrap_or(defaults.max_ticks),
            seed: cli.seed.or(file.session.seed).unwrap_or(defaults.seed),
            realtime: cli.realtime,
            json: cli.json,
            script: file.script,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "grid must have at least one cell, got {}x{}",
            self.width,
            self.height
        );
        ensure!(
            self.field_size.is_finite() && self.field_size > 0.0,
            "field size must be positive, got {}",
            self.field_size
        );
        ensure!(self.players > 0, "at least one player is required");
        ensure!(self.start_length > 0, "serpents need at least one segment");
        if !TICK_RATE_RANGE.contains(&self.tick_rate) {
            bail!(
                "tick rate must be within {}..={} Hz, got {}",
                TICK_RATE_RANGE.start(),
                TICK_RATE_RANGE.end(),
                self.tick_rate
            );
        }
        Ok(())
    }

    /// Wall-clock time between ticks.
    pub(crate) fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate
    }

    /// Layout used by the player at `index`; unlisted players cycle through
    /// the built-in layouts.
    pub(crate) fn keymap_for(&self, index: usize) -> Keymap {
        self.keymaps
            .get(index)
            .copied()
            .unwrap_or(Keymap::ALL[index % Keymap::ALL.len()])
    }

    /// Keys held when `elapsed` ticks have been simulated.
    pub(crate) fn keys_at(&self, elapsed: u64) -> Vec<Key> {
        self.script
            .iter()
            .filter(|entry| entry.tick == elapsed)
            .flat_map(|entry| entry.keys.iter().copied())
            .collect()
    }
}

fn parse_file(text: &str) -> Result<FileConfig> {
    Ok(toml::from_str(text)?)
}
