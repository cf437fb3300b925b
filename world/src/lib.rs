#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for Serpents.
//!
//! The [`World`] owns the grid, the apple and every serpent. It is mutated
//! exclusively through [`apply`], which appends the resulting [`Event`]
//! values to the caller's buffer and hands the same events to every
//! registered [`Observer`]. Serpents advance in roster order within a tick,
//! so a cell vacated by an earlier serpent is free for a later one.

mod apple;
mod grid;
mod notify;
mod serpent;

pub use apple::{AppleSpawner, ConsumeOutcome};
pub use grid::{Cell, FieldLayout, Grid, DEFAULT_FIELD_SIZE};
pub use notify::{Notifier, Observer, SubscriptionId};
pub use serpent::{Serpent, Vitality};

use serpents_core::{
    ApplePlacementError, CellIndex, Command, CreationError, Direction, Event, GameOverReason,
    GridError, SerpentColor, SerpentName, SessionPhase, StartError,
};
use tracing::{debug, info, trace, warn};

const DEFAULT_GRID_WIDTH: u32 = 50;
const DEFAULT_GRID_HEIGHT: u32 = 40;
const DEFAULT_APPLE_SEED: u64 = 0x42f0_e1eb_d4a5_3c21;

/// Parameters required to construct a world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    width: u32,
    height: u32,
    field_size: f32,
    apple_seed: u64,
}

impl Config {
    /// Creates a configuration for a `width * height` grid whose apple
    /// placement is driven by `apple_seed`.
    #[must_use]
    pub const fn new(width: u32, height: u32, apple_seed: u64) -> Self {
        Self {
            width,
            height,
            field_size: DEFAULT_FIELD_SIZE,
            apple_seed,
        }
    }

    /// Overrides the world-space edge length of the play field.
    #[must_use]
    pub const fn with_field_size(mut self, field_size: f32) -> Self {
        self.field_size = field_size;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT, DEFAULT_APPLE_SEED)
    }
}

/// Represents the authoritative Serpents session state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    apple: AppleSpawner,
    serpents: Vec<Serpent>,
    phase: SessionPhase,
    tick_index: u64,
    notifier: Notifier,
}

impl World {
    /// Creates a world in the setup phase with an empty roster.
    pub fn new(config: Config) -> Result<Self, GridError> {
        let grid = Grid::generate(config.width, config.height, config.field_size)?;
        debug!(
            width = config.width,
            height = config.height,
            cell_scale = grid.layout().cell_scale(),
            "grid generated"
        );
        Ok(Self {
            grid,
            apple: AppleSpawner::new(config.apple_seed),
            serpents: Vec::new(),
            phase: SessionPhase::Setup,
            tick_index: 0,
            notifier: Notifier::default(),
        })
    }

    /// Registers an observer that receives every event emitted by [`apply`].
    pub fn subscribe<O>(&mut self, observer: O) -> SubscriptionId
    where
        O: Observer + 'static,
    {
        self.notifier.subscribe(Box::new(observer))
    }

    /// Removes a previously registered observer.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    fn serpent_index(&self, name: &SerpentName) -> Option<usize> {
        self.serpents
            .iter()
            .position(|serpent| serpent.name() == name)
    }

    fn has_living_serpents(&self) -> bool {
        self.serpents.iter().any(Serpent::is_alive)
    }

    fn create_serpent(
        &mut self,
        name: SerpentName,
        start: CellIndex,
        direction: Direction,
        length: u32,
        color: SerpentColor,
        out_events: &mut Vec<Event>,
    ) {
        if self.serpent_index(&name).is_some() {
            warn!(serpent = %name, "serpent name already taken");
            out_events.push(Event::SerpentCreationRejected {
                serpent: name,
                reason: CreationError::DuplicateName,
            });
            return;
        }

        match Serpent::initialize(&mut self.grid, name.clone(), color, start, direction, length) {
            Ok(serpent) => {
                debug!(serpent = %name, %start, ?direction, length, "serpent created");
                out_events.push(Event::SerpentCreated {
                    serpent: name,
                    segments: serpent.segments().to_vec(),
                });
                self.serpents.push(serpent);
            }
            Err(reason) => {
                warn!(serpent = %name, %start, ?reason, "serpent creation rejected");
                out_events.push(Event::SerpentCreationRejected {
                    serpent: name,
                    reason,
                });
            }
        }
    }

    fn remove_serpent(
        &mut self,
        name: SerpentName,
        out_events: &mut Vec<Event>,
    ) -> Result<(), GridError> {
        let Some(index) = self.serpent_index(&name) else {
            debug!(serpent = %name, "removal ignored for unknown serpent");
            return Ok(());
        };

        let mut serpent = self.serpents.remove(index);
        serpent.kill(&mut self.grid)?;
        info!(serpent = %name, "serpent removed");
        out_events.push(Event::SerpentRemoved { serpent: name });
        Ok(())
    }

    fn set_intended_direction(&mut self, name: &SerpentName, direction: Direction) {
        match self.serpents.iter_mut().find(|serpent| serpent.name() == name) {
            Some(serpent) if serpent.is_alive() => serpent.set_intended_direction(direction),
            _ => trace!(serpent = %name, "input ignored for inactive serpent"),
        }
    }

    fn start_game(&mut self, out_events: &mut Vec<Event>) {
        let rejection = match self.phase {
            SessionPhase::Running => Some(StartError::AlreadyRunning),
            SessionPhase::Over(_) => Some(StartError::SessionOver),
            SessionPhase::Setup if !self.has_living_serpents() => Some(StartError::NoSerpents),
            SessionPhase::Setup => None,
        };
        if let Some(reason) = rejection {
            warn!(?reason, "start rejected");
            out_events.push(Event::GameStartRejected { reason });
            return;
        }

        self.phase = SessionPhase::Running;
        info!(serpents = self.serpents.len(), "game started");
        out_events.push(Event::GameStarted);
        match self.apple.spawn(&self.grid) {
            Some(cell) => out_events.push(Event::AppleSpawned { cell }),
            None => self.end_session(GameOverReason::GridFull, out_events),
        }
    }

    fn place_apple(&mut self, cell: CellIndex, out_events: &mut Vec<Event>) {
        let placement = if self.phase.is_running() {
            self.apple.place(&self.grid, cell)
        } else {
            Err(ApplePlacementError::NotRunning)
        };
        match placement {
            Ok(()) => out_events.push(Event::AppleSpawned { cell }),
            Err(reason) => {
                warn!(%cell, ?reason, "apple placement rejected");
                out_events.push(Event::ApplePlacementRejected { cell, reason });
            }
        }
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) -> Result<(), GridError> {
        if !self.phase.is_running() {
            return Ok(());
        }
        self.tick_index = self.tick_index.saturating_add(1);

        for index in 0..self.serpents.len() {
            let serpent = &mut self.serpents[index];
            if !serpent.is_alive() {
                continue;
            }

            let _ = serpent.apply_intended_direction();
            let from = serpent.head();
            let outcome = serpent.advance(&mut self.grid)?;
            if outcome.is_collision() {
                serpent.kill(&mut self.grid)?;
                info!(serpent = %serpent.name(), cause = ?outcome, "serpent died");
                out_events.push(Event::SerpentDied {
                    serpent: serpent.name().clone(),
                    cause: outcome,
                });
                continue;
            }

            let to = serpent.head();
            trace!(serpent = %serpent.name(), %from, %to, "serpent advanced");
            out_events.push(Event::SerpentAdvanced {
                serpent: serpent.name().clone(),
                from,
                to,
            });

            if !self.apple.contains(to) {
                continue;
            }

            let _ = serpent.add_segment(&mut self.grid)?;
            info!(
                serpent = %serpent.name(),
                cell = %to,
                length = serpent.segments().len(),
                "apple consumed"
            );
            out_events.push(Event::AppleConsumed {
                serpent: serpent.name().clone(),
                cell: to,
            });

            match self.apple.consume(&self.grid) {
                ConsumeOutcome::Respawned(cell) => out_events.push(Event::AppleSpawned { cell }),
                ConsumeOutcome::GridFull => {
                    self.end_session(GameOverReason::GridFull, out_events);
                    return Ok(());
                }
            }
        }

        if !self.has_living_serpents() {
            self.end_session(GameOverReason::NoSerpentsRemaining, out_events);
        }
        Ok(())
    }

    fn end_session(&mut self, reason: GameOverReason, out_events: &mut Vec<Event>) {
        self.phase = SessionPhase::Over(reason);
        info!(?reason, ticks = self.tick_index, "game over");
        out_events.push(Event::GameOver { reason });
    }
}

/// Applies the provided command to the world, then notifies observers of the
/// events it produced.
///
/// Collisions, rejected requests and the end of the session are reported as
/// events. An error is returned only when a grid lookup falls outside the
/// grid, which signals a broken invariant rather than a game outcome.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), GridError> {
    let first_new = out_events.len();
    let result = match command {
        Command::CreateSerpent {
            name,
            start,
            direction,
            length,
            color,
        } => {
            world.create_serpent(name, start, direction, length, color, out_events);
            Ok(())
        }
        Command::RemoveSerpent { name } => world.remove_serpent(name, out_events),
        Command::SetIntendedDirection { serpent, direction } => {
            world.set_intended_direction(&serpent, direction);
            Ok(())
        }
        Command::StartGame => {
            world.start_game(out_events);
            Ok(())
        }
        Command::Tick => world.tick(out_events),
        Command::PlaceApple { cell } => {
            world.place_apple(cell, out_events);
            Ok(())
        }
    };

    world.notifier.dispatch(&out_events[first_new..]);
    result
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use serpents_core::{
        CellIndex, GridDimensions, GridError, SerpentName, SerpentView, SessionPhase,
        SessionSnapshot,
    };

    use super::{Cell, FieldLayout, Grid, Serpent, World};

    /// Provides read-only access to the grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Dimensions of the grid.
    #[must_use]
    pub fn dimensions(world: &World) -> GridDimensions {
        world.grid.dimensions()
    }

    /// World-space layout used to place cells, serpents and the apple.
    #[must_use]
    pub fn layout(world: &World) -> &FieldLayout {
        world.grid.layout()
    }

    /// Bounds-checked cell lookup.
    pub fn cell(world: &World, index: CellIndex) -> Result<&Cell, GridError> {
        world.grid.cell(index)
    }

    /// World-space centre of a cell.
    pub fn cell_position(world: &World, index: CellIndex) -> Result<Vec2, GridError> {
        world.grid.world_position(index)
    }

    /// Cell holding the apple, if one was placed.
    #[must_use]
    pub fn apple(world: &World) -> Option<CellIndex> {
        world.apple.cell()
    }

    /// World-space centre of the apple, if one was placed.
    #[must_use]
    pub fn apple_position(world: &World) -> Option<Vec2> {
        world
            .apple
            .cell()
            .and_then(|cell| world.grid.world_position(cell).ok())
    }

    /// Current lifecycle phase of the session.
    #[must_use]
    pub fn phase(world: &World) -> SessionPhase {
        world.phase
    }

    /// Reports whether ticks currently advance the simulation.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.phase.is_running()
    }

    /// Number of ticks processed while the session was running.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Looks up a serpent by name, alive or dead.
    #[must_use]
    pub fn serpent<'world>(world: &'world World, name: &SerpentName) -> Option<&'world Serpent> {
        world.serpents.iter().find(|serpent| serpent.name() == name)
    }

    /// Names of the serpents still alive, in roster order.
    #[must_use]
    pub fn active_roster(world: &World) -> Vec<SerpentName> {
        world
            .serpents
            .iter()
            .filter(|serpent| serpent.is_alive())
            .map(|serpent| serpent.name().clone())
            .collect()
    }

    /// Captures a read-only view of every serpent in roster order.
    #[must_use]
    pub fn serpent_view(world: &World) -> SerpentView {
        SerpentView::from_snapshots(world.serpents.iter().map(Serpent::snapshot).collect())
    }

    /// World-space centres of a serpent's segments, head first.
    #[must_use]
    pub fn segment_positions(world: &World, name: &SerpentName) -> Option<Vec<Vec2>> {
        let serpent = serpent(world, name)?;
        serpent
            .segments()
            .iter()
            .map(|cell| world.grid.world_position(*cell).ok())
            .collect()
    }

    /// Captures the complete session state.
    #[must_use]
    pub fn session_snapshot(world: &World) -> SessionSnapshot {
        SessionSnapshot {
            dimensions: world.grid.dimensions(),
            phase: world.phase,
            ticks: world.tick_index,
            apple: world.apple.cell(),
            serpents: serpent_view(world),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(width: u32, height: u32) -> World {
        World::new(Config::new(width, height, 11)).expect("valid dimensions")
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events).expect("grid invariants hold");
        events
    }

    fn create(name: &str, start: u32, direction: Direction, length: u32) -> Command {
        Command::CreateSerpent {
            name: SerpentName::new(name),
            start: CellIndex::new(start),
            direction,
            length,
            color: SerpentColor::from_rgb(0xc8, 0x2a, 0x36),
        }
    }

    #[test]
    fn new_rejects_invalid_dimensions() {
        assert!(matches!(
            World::new(Config::new(0, 10, 1)),
            Err(GridError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut world = world(10, 10);
        let _ = run(&mut world, create("A", 22, Direction::Right, 2));
        let events = run(&mut world, create("A", 55, Direction::Right, 2));
        assert_eq!(
            events,
            vec![Event::SerpentCreationRejected {
                serpent: SerpentName::new("A"),
                reason: CreationError::DuplicateName,
            }]
        );
    }

    #[test]
    fn start_requires_a_serpent_and_happens_once() {
        let mut world = world(10, 10);
        assert_eq!(
            run(&mut world, Command::StartGame),
            vec![Event::GameStartRejected {
                reason: StartError::NoSerpents
            }]
        );

        let _ = run(&mut world, create("A", 22, Direction::Right, 2));
        let events = run(&mut world, Command::StartGame);
        assert_eq!(events[0], Event::GameStarted);
        assert!(matches!(events[1], Event::AppleSpawned { .. }));
        assert!(query::is_running(&world));

        assert_eq!(
            run(&mut world, Command::StartGame),
            vec![Event::GameStartRejected {
                reason: StartError::AlreadyRunning
            }]
        );
    }

    #[test]
    fn ticks_are_ignored_before_start() {
        let mut world = world(10, 10);
        let _ = run(&mut world, create("A", 22, Direction::Right, 2));
        assert!(run(&mut world, Command::Tick).is_empty());
        assert_eq!(query::tick_index(&world), 0);
    }

    #[test]
    fn placing_apple_requires_running_session() {
        let mut world = world(10, 10);
        let events = run(
            &mut world,
            Command::PlaceApple {
                cell: CellIndex::new(5),
            },
        );
        assert_eq!(
            events,
            vec![Event::ApplePlacementRejected {
                cell: CellIndex::new(5),
                reason: ApplePlacementError::NotRunning,
            }]
        );
    }

    #[test]
    fn removing_frees_cells_and_keeps_others() {
        let mut world = world(10, 10);
        let _ = run(&mut world, create("A", 22, Direction::Right, 2));
        let _ = run(&mut world, create("B", 55, Direction::Right, 3));

        let events = run(
            &mut world,
            Command::RemoveSerpent {
                name: SerpentName::new("A"),
            },
        );
        assert_eq!(
            events,
            vec![Event::SerpentRemoved {
                serpent: SerpentName::new("A")
            }]
        );
        assert_eq!(query::grid(&world).occupied_count(), 3);
        assert_eq!(query::active_roster(&world), vec![SerpentName::new("B")]);
    }

    #[test]
    fn positions_follow_segments() {
        let mut world = world(10, 10);
        let _ = run(&mut world, create("A", 22, Direction::Right, 2));
        let positions =
            query::segment_positions(&world, &SerpentName::new("A")).expect("serpent exists");
        assert_eq!(positions.len(), 2);
        assert!((positions[0] - glam::Vec2::new(-2.5, -2.5)).length() < 1e-5);
        assert!((positions[1] - glam::Vec2::new(-3.5, -2.5)).length() < 1e-5);
    }

    #[test]
    fn cell_position_is_bounds_checked() {
        let world = world(10, 10);
        let centre = query::cell_position(&world, CellIndex::new(22)).expect("in range");
        assert!((centre - glam::Vec2::new(-2.5, -2.5)).length() < 1e-5);
        assert!(matches!(
            query::cell_position(&world, CellIndex::new(100)),
            Err(GridError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn apple_position_tracks_placed_apple() {
        let mut world = world(10, 10);
        assert_eq!(query::apple_position(&world), None);

        let _ = run(&mut world, create("A", 22, Direction::Right, 2));
        let _ = run(&mut world, Command::StartGame);
        let _ = run(
            &mut world,
            Command::PlaceApple {
                cell: CellIndex::new(99),
            },
        );

        let apple = query::apple_position(&world).expect("apple placed");
        assert!((apple - glam::Vec2::new(4.5, 4.5)).length() < 1e-5);
    }

    #[test]
    fn moved_results_are_not_collisions() {
        use serpents_core::MoveResult;

        assert!(!MoveResult::Moved.is_collision());
        assert!(MoveResult::HitWall.is_collision());
    }
}
