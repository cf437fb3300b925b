#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Roster system responsible for emitting serpent creation and removal
//! commands on behalf of players joining or leaving.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serpents_core::{
    CellIndex, Command, CreationError, Direction, Event, GridDimensions, SerpentColor, SerpentName,
};

const NAME_PREFIX: &str = "Jormungandr_";
const DEFAULT_START_LENGTH: u32 = 2;
const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Configuration parameters required to construct the roster system.
#[derive(Clone, Debug)]
pub struct Config {
    rng_seed: u64,
    start_length: u32,
    max_attempts: u32,
}

impl Config {
    /// Creates a configuration with the provided seed and default settings.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            start_length: DEFAULT_START_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the number of segments new serpents start with.
    #[must_use]
    pub fn with_start_length(mut self, start_length: u32) -> Self {
        self.start_length = start_length;
        self
    }

    /// Overrides how many placements are tried before a player is dropped.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(0)
    }
}

#[derive(Clone, Debug)]
struct Pending {
    name: SerpentName,
    color: SerpentColor,
    attempts: u32,
}

/// Pure system tracking the players that joined and placing their serpents.
#[derive(Debug)]
pub struct Roster {
    start_length: u32,
    max_attempts: u32,
    rng: ChaCha8Rng,
    members: Vec<SerpentName>,
    pending: Vec<Pending>,
}

impl Roster {
    /// Creates a new roster system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            start_length: config.start_length,
            max_attempts: config.max_attempts,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            members: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Players currently on the roster, oldest first. Dead serpents stay
    /// listed until removed.
    #[must_use]
    pub fn members(&self) -> &[SerpentName] {
        &self.members
    }

    /// Number of players on the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Reports whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Reports whether any creation is still waiting for the world's answer.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Adds a player and emits the command creating its serpent.
    pub fn add_player(&mut self, dimensions: GridDimensions, out: &mut Vec<Command>) -> SerpentName {
        let name = self.next_name();
        let color = self.random_color();
        let start = self.random_start(dimensions);

        tracing::debug!(serpent = %name, start = %start, "player added");
        self.members.push(name.clone());
        self.pending.push(Pending {
            name: name.clone(),
            color,
            attempts: 1,
        });
        out.push(self.create_command(name.clone(), start, color));
        name
    }

    /// Removes the most recently added player, if any.
    pub fn remove_last(&mut self, out: &mut Vec<Command>) -> Option<SerpentName> {
        let name = self.members.pop()?;
        self.pending.retain(|pending| pending.name != name);
        tracing::debug!(serpent = %name, "player removed");
        out.push(Command::RemoveSerpent { name: name.clone() });
        Some(name)
    }

    /// Consumes world events, retrying placements the world rejected.
    pub fn handle(&mut self, events: &[Event], dimensions: GridDimensions, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SerpentCreated { serpent, .. } => {
                    self.pending.retain(|pending| pending.name != *serpent);
                }
                Event::SerpentRemoved { serpent } => {
                    self.members.retain(|member| member != serpent);
                    self.pending.retain(|pending| pending.name != *serpent);
                }
                Event::SerpentCreationRejected { serpent, reason } => {
                    self.retry(serpent, *reason, dimensions, out);
                }
                _ => {}
            }
        }
    }

    fn retry(
        &mut self,
        serpent: &SerpentName,
        reason: CreationError,
        dimensions: GridDimensions,
        out: &mut Vec<Command>,
    ) {
        let Some(position) = self
            .pending
            .iter()
            .position(|pending| pending.name == *serpent)
        else {
            return;
        };

        let retryable = matches!(
            reason,
            CreationError::Occupied | CreationError::BlockedByWall | CreationError::IndexOutOfRange
        );
        if !retryable || self.pending[position].attempts >= self.max_attempts {
            let dropped = self.pending.remove(position);
            self.members.retain(|member| *member != dropped.name);
            tracing::warn!(
                serpent = %dropped.name,
                ?reason,
                attempts = dropped.attempts,
                "player dropped after failed placement"
            );
            return;
        }

        let start = self.random_start(dimensions);
        let pending = &mut self.pending[position];
        pending.attempts += 1;
        let (name, color) = (pending.name.clone(), pending.color);
        tracing::debug!(serpent = %name, start = %start, ?reason, "retrying placement");
        out.push(self.create_command(name, start, color));
    }

    fn create_command(&self, name: SerpentName, start: CellIndex, color: SerpentColor) -> Command {
        Command::CreateSerpent {
            name,
            start,
            direction: Direction::Right,
            length: self.start_length,
            color,
        }
    }

    fn next_name(&self) -> SerpentName {
        let mut count = self.members.len();
        loop {
            let name = SerpentName::new(format!("{NAME_PREFIX}{count}"));
            if !self.members.contains(&name) {
                return name;
            }
            count += 1;
        }
    }

    /// Draws a head cell far enough right that a body trailing left fits,
    /// within the left half of the grid.
    fn random_start(&mut self, dimensions: GridDimensions) -> CellIndex {
        let cell_count = u32::try_from(dimensions.cell_count()).unwrap_or(u32::MAX);
        let low = dimensions
            .height()
            .saturating_mul(self.start_length.saturating_sub(1));
        let high = cell_count / 2;

        let index = if low < high {
            self.rng.gen_range(low..high)
        } else if cell_count > 0 {
            self.rng.gen_range(0..cell_count)
        } else {
            0
        };
        CellIndex::new(index)
    }

    fn random_color(&mut self) -> SerpentColor {
        let hue = self.rng.gen_range(0.0..1.0);
        let saturation = self.rng.gen_range(0.5..=1.0);
        let value = self.rng.gen_range(0.8..=1.0);
        hsv_to_rgb(hue, saturation, value)
    }
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> SerpentColor {
    let sector = (hue.rem_euclid(1.0) * 6.0).min(5.999_999);
    let chroma = value * saturation;
    let secondary = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
    let base = value - chroma;

    let (red, green, blue) = match sector as u8 {
        0 => (chroma, secondary, 0.0),
        1 => (secondary, chroma, 0.0),
        2 => (0.0, chroma, secondary),
        3 => (0.0, secondary, chroma),
        4 => (secondary, 0.0, chroma),
        _ => (chroma, 0.0, secondary),
    };

    let channel = |component: f32| ((component + base).clamp(0.0, 1.0) * 255.0).round() as u8;
    SerpentColor::from_rgb(channel(red), channel(green), channel(blue))
}
