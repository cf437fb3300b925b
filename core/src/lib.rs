#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Serpents engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative world, and pure systems. Hosts and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems and observers react to. Presentation layers read the world
//! through immutable snapshots such as [`SerpentView`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Creates a serpent whose head sits on `start` and whose body trails
    /// behind it, opposite to `direction`.
    CreateSerpent {
        /// Unique name identifying the serpent.
        name: SerpentName,
        /// Cell occupied by the head.
        start: CellIndex,
        /// Initial heading of the serpent.
        direction: Direction,
        /// Number of segments, including the head.
        length: u32,
        /// Appearance passed through to presentation layers.
        color: SerpentColor,
    },
    /// Removes a serpent from the session, freeing every cell it occupies.
    RemoveSerpent {
        /// Name of the serpent to remove.
        name: SerpentName,
    },
    /// Buffers a heading change that is consumed by the next tick.
    ///
    /// Only the most recent request before a tick is kept.
    SetIntendedDirection {
        /// Serpent the input belongs to.
        serpent: SerpentName,
        /// Requested heading.
        direction: Direction,
    },
    /// Places the first apple and starts the session.
    StartGame,
    /// Advances every living serpent by exactly one cell.
    Tick,
    /// Moves the apple onto a specific free cell.
    PlaceApple {
        /// Cell that should hold the apple.
        cell: CellIndex,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that a serpent joined the roster.
    SerpentCreated {
        /// Name of the new serpent.
        serpent: SerpentName,
        /// Segment cells, head first.
        segments: Vec<CellIndex>,
    },
    /// Reports that a serpent could not be created.
    SerpentCreationRejected {
        /// Name requested for the serpent.
        serpent: SerpentName,
        /// Specific reason the creation failed.
        reason: CreationError,
    },
    /// Confirms that a serpent was removed on request.
    SerpentRemoved {
        /// Name of the removed serpent.
        serpent: SerpentName,
    },
    /// Announces that the session is running.
    GameStarted,
    /// Reports that a start request was refused.
    GameStartRejected {
        /// Specific reason the start failed.
        reason: StartError,
    },
    /// Confirms that a serpent's head moved between two cells.
    SerpentAdvanced {
        /// Serpent that moved.
        serpent: SerpentName,
        /// Cell the head occupied before the move.
        from: CellIndex,
        /// Cell the head occupies after the move.
        to: CellIndex,
    },
    /// Announces the cell the apple now occupies.
    AppleSpawned {
        /// Cell holding the apple.
        cell: CellIndex,
    },
    /// Reports that a forced apple placement was refused.
    ApplePlacementRejected {
        /// Cell requested for the apple.
        cell: CellIndex,
        /// Specific reason the placement failed.
        reason: ApplePlacementError,
    },
    /// A serpent's head landed on the apple.
    AppleConsumed {
        /// Serpent that ate the apple.
        serpent: SerpentName,
        /// Cell the apple occupied.
        cell: CellIndex,
    },
    /// A serpent collided and left the roster.
    SerpentDied {
        /// Serpent that died.
        serpent: SerpentName,
        /// Collision that killed the serpent.
        cause: MoveResult,
    },
    /// The session ended.
    GameOver {
        /// Condition that ended the session.
        reason: GameOverReason,
    },
}

/// Outcome of a single serpent movement attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveResult {
    /// The head advanced into a free cell.
    Moved,
    /// The head would have left the grid.
    HitWall,
    /// The head would have entered an occupied cell.
    HitSerpent,
}

impl MoveResult {
    /// Reports whether the result is a fatal collision.
    #[must_use]
    pub const fn is_collision(self) -> bool {
        !matches!(self, Self::Moved)
    }
}

/// Conditions that end a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Every serpent died or was removed.
    NoSerpentsRemaining,
    /// Serpents cover every cell, so no apple can be placed.
    GridFull,
}

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Players may join or leave; ticks are ignored.
    Setup,
    /// Ticks advance the simulation.
    Running,
    /// Terminal phase reached through a game-over condition.
    Over(GameOverReason),
}

impl SessionPhase {
    /// Reports whether ticks currently advance the simulation.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Reasons a serpent creation request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreationError {
    /// Another serpent already uses the requested name.
    DuplicateName,
    /// Serpents need at least one segment.
    InvalidLength,
    /// The start cell lies outside the grid.
    IndexOutOfRange,
    /// The body would extend past the grid boundary.
    BlockedByWall,
    /// The body would overlap an occupied cell.
    Occupied,
}

/// Reasons a start request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartError {
    /// The roster is empty.
    NoSerpents,
    /// The session is already running.
    AlreadyRunning,
    /// The session already ended.
    SessionOver,
}

/// Reasons a forced apple placement may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplePlacementError {
    /// The requested cell lies outside the grid.
    IndexOutOfRange,
    /// A serpent occupies the requested cell.
    Occupied,
    /// Apples only exist while the session runs.
    NotRunning,
}

/// Failures raised by grid construction and bounds-checked lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// A grid needs at least one column and one row.
    #[error("grid dimensions {width}x{height} must both be positive")]
    InvalidDimension {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// A lookup addressed a cell outside the grid.
    #[error("cell index {index} is outside a grid of {cell_count} cells")]
    IndexOutOfRange {
        /// Index that was requested.
        index: u32,
        /// Number of cells in the grid.
        cell_count: usize,
    },
}

/// Flat identity of a grid cell in `[0, width * height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellIndex(u32);

impl CellIndex {
    /// Creates a new cell index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Logical position of a cell, used for all game-rule arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

/// Width and height of a grid measured in cells.
///
/// Cells are laid out column by column: `index == x * height + y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    width: u32,
    height: u32,
}

impl GridDimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.width) * u64::from(self.height);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Converts a coordinate into its flat index, if it lies inside the grid.
    #[must_use]
    pub fn index_of(&self, coord: CellCoord) -> Option<CellIndex> {
        if coord.x() >= self.width || coord.y() >= self.height {
            return None;
        }
        let index = coord.x().checked_mul(self.height)?.checked_add(coord.y())?;
        Some(CellIndex::new(index))
    }

    /// Converts a flat index into its coordinate, if it lies inside the grid.
    #[must_use]
    pub fn coord_of(&self, index: CellIndex) -> Option<CellCoord> {
        if self.height == 0 || (index.get() as usize) >= self.cell_count() {
            return None;
        }
        Some(CellCoord::new(
            index.get() / self.height,
            index.get() % self.height,
        ))
    }
}

/// Axis-aligned headings available to serpents.
///
/// `Up` increases `y`, `Right` increases `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Offset `(0, 1)`.
    Up,
    /// Offset `(0, -1)`.
    Down,
    /// Offset `(-1, 0)`.
    Left,
    /// Offset `(1, 0)`.
    Right,
}

impl Direction {
    /// Unit offset of the heading as `(x, y)`.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Maps a unit offset back onto a heading.
    ///
    /// The zero vector and any non-unit offset yield `None`.
    #[must_use]
    pub const fn from_offset(x: i32, y: i32) -> Option<Self> {
        match (x, y) {
            (0, 1) => Some(Self::Up),
            (0, -1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            (1, 0) => Some(Self::Right),
            _ => None,
        }
    }

    /// Heading pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Dot product of the two unit offsets.
    #[must_use]
    pub const fn dot(self, other: Self) -> i32 {
        let (ax, ay) = self.offset();
        let (bx, by) = other.offset();
        ax * bx + ay * by
    }

    /// Reports whether both headings lie on the same axis, either the same
    /// heading or its reversal.
    #[must_use]
    pub const fn is_parallel_to(self, other: Self) -> bool {
        self.dot(other).abs() == 1
    }
}

/// Unique name identifying a serpent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerpentName(String);

impl SerpentName {
    /// Creates a new serpent name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerpentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual appearance applied to a serpent. Opaque to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerpentColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl SerpentColor {
    /// Creates a new serpent color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Immutable representation of a single serpent's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpentSnapshot {
    /// Unique name of the serpent.
    pub name: SerpentName,
    /// Appearance assigned to the serpent.
    pub color: SerpentColor,
    /// Segment cells, head first.
    pub segments: Vec<CellIndex>,
    /// Current heading.
    pub direction: Direction,
    /// Whether the serpent is still moving.
    pub alive: bool,
}

impl SerpentSnapshot {
    /// Cell occupied by the head.
    #[must_use]
    pub fn head(&self) -> Option<CellIndex> {
        self.segments.first().copied()
    }
}

/// Read-only snapshot describing every serpent in roster order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SerpentView {
    snapshots: Vec<SerpentSnapshot>,
}

impl SerpentView {
    /// Creates a new serpent view from snapshots already in roster order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<SerpentSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &SerpentSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by serpent name.
    #[must_use]
    pub fn get(&self, name: &SerpentName) -> Option<&SerpentSnapshot> {
        self.snapshots.iter().find(|snapshot| &snapshot.name == name)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SerpentSnapshot> {
        self.snapshots
    }
}

/// Complete read-only picture of a session, suitable for serialisation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Dimensions of the grid.
    pub dimensions: GridDimensions,
    /// Current lifecycle phase.
    pub phase: SessionPhase,
    /// Number of ticks processed while running.
    pub ticks: u64,
    /// Cell holding the apple, if one was placed.
    pub apple: Option<CellIndex>,
    /// Every serpent, alive or dead, in roster order.
    pub serpents: SerpentView,
}
