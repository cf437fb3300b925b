//! Per-serpent body state and the follow-the-leader movement rule.

use serpents_core::{
    CellIndex, CreationError, Direction, GridError, MoveResult, SerpentColor, SerpentName,
    SerpentSnapshot,
};

use crate::grid::Grid;

/// Life cycle of a serpent. `Dead` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vitality {
    /// The serpent advances every tick.
    Alive,
    /// The serpent collided or was removed.
    Dead,
}

/// A serpent's ordered body, heading and buffered input.
///
/// Each segment cell carries the occupancy flag set by this serpent; the
/// flags are transferred tick by tick as the body moves.
#[derive(Clone, Debug)]
pub struct Serpent {
    name: SerpentName,
    color: SerpentColor,
    segments: Vec<CellIndex>,
    direction: Direction,
    intended: Option<Direction>,
    vitality: Vitality,
    holds_cells: bool,
    growth_slot: Option<CellIndex>,
}

impl Serpent {
    /// Lays out a new serpent with its head on `start` and `length - 1` body
    /// segments trailing opposite to `direction`, then marks every segment
    /// cell occupied.
    ///
    /// Nothing is written to the grid unless the whole body fits: a body that
    /// would cross the boundary or overlap an occupied cell is rejected.
    pub fn initialize(
        grid: &mut Grid,
        name: SerpentName,
        color: SerpentColor,
        start: CellIndex,
        direction: Direction,
        length: u32,
    ) -> Result<Self, CreationError> {
        if length == 0 {
            return Err(CreationError::InvalidLength);
        }

        let capacity = usize::try_from(length).unwrap_or(usize::MAX).min(grid.len());
        let mut segments = Vec::with_capacity(capacity);
        let head_occupied = grid
            .is_occupied(start)
            .map_err(|_| CreationError::IndexOutOfRange)?;
        if head_occupied {
            return Err(CreationError::Occupied);
        }
        segments.push(start);

        let trailing = direction.opposite();
        let mut cursor = start;
        for _ in 1..length {
            let next = grid
                .adjacent(cursor, trailing)
                .map_err(|_| CreationError::IndexOutOfRange)?
                .ok_or(CreationError::BlockedByWall)?;
            if grid
                .is_occupied(next)
                .map_err(|_| CreationError::IndexOutOfRange)?
            {
                return Err(CreationError::Occupied);
            }
            segments.push(next);
            cursor = next;
        }

        for cell in &segments {
            grid.set_occupied(*cell, true)
                .map_err(|_| CreationError::IndexOutOfRange)?;
        }

        Ok(Self {
            name,
            color,
            segments,
            direction,
            intended: None,
            vitality: Vitality::Alive,
            holds_cells: true,
            growth_slot: None,
        })
    }

    /// Unique name of the serpent.
    #[must_use]
    pub fn name(&self) -> &SerpentName {
        &self.name
    }

    /// Appearance assigned to the serpent.
    #[must_use]
    pub const fn color(&self) -> SerpentColor {
        self.color
    }

    /// Segment cells, head first.
    #[must_use]
    pub fn segments(&self) -> &[CellIndex] {
        &self.segments
    }

    /// Cell occupied by the head.
    #[must_use]
    pub fn head(&self) -> CellIndex {
        self.segments[0]
    }

    /// Current heading.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Input waiting for the next tick, if any.
    #[must_use]
    pub const fn intended_direction(&self) -> Option<Direction> {
        self.intended
    }

    /// Current life-cycle state.
    #[must_use]
    pub const fn vitality(&self) -> Vitality {
        self.vitality
    }

    /// Reports whether the serpent still moves.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.vitality == Vitality::Alive
    }

    /// Buffers a heading for the next tick. The last call before a tick wins,
    /// even when it would be rejected by the turn rule.
    pub fn set_intended_direction(&mut self, direction: Direction) {
        self.intended = Some(direction);
    }

    /// Consumes the buffered input, turning only when it is perpendicular to
    /// the current heading. Returns whether the heading changed.
    ///
    /// Reversals and repeats of the current heading are both dropped.
    pub fn apply_intended_direction(&mut self) -> bool {
        match self.intended.take() {
            Some(direction) if !direction.is_parallel_to(self.direction) => {
                self.direction = direction;
                true
            }
            _ => false,
        }
    }

    /// Moves the head one cell along the current heading and drags every body
    /// segment into the cell its predecessor held before the move.
    ///
    /// Hitting a wall or an occupied cell marks the serpent dead without
    /// touching the grid; the caller then frees the body with [`Serpent::kill`].
    /// A dead serpent cannot move and always reports `HitSerpent`.
    pub fn advance(&mut self, grid: &mut Grid) -> Result<MoveResult, GridError> {
        if !self.is_alive() {
            return Ok(MoveResult::HitSerpent);
        }

        let Some(target) = grid.adjacent(self.head(), self.direction)? else {
            self.vitality = Vitality::Dead;
            return Ok(MoveResult::HitWall);
        };
        if grid.is_occupied(target)? {
            self.vitality = Vitality::Dead;
            return Ok(MoveResult::HitSerpent);
        }

        grid.set_occupied(target, true)?;
        let vacated = self.segments[self.segments.len() - 1];
        self.segments.rotate_right(1);
        self.segments[0] = target;
        grid.set_occupied(vacated, false)?;
        self.growth_slot = Some(vacated);

        Ok(MoveResult::Moved)
    }

    /// Appends a tail segment on the cell the tail vacated during the last
    /// successful move. Returns the new segment's cell, or `None` before the
    /// first move.
    pub fn add_segment(&mut self, grid: &mut Grid) -> Result<Option<CellIndex>, GridError> {
        let Some(slot) = self.growth_slot.take() else {
            return Ok(None);
        };
        grid.set_occupied(slot, true)?;
        self.segments.push(slot);
        Ok(Some(slot))
    }

    /// Frees every segment cell and marks the serpent dead. Safe to repeat:
    /// cells are released only once, so a later occupant keeps its flags.
    pub fn kill(&mut self, grid: &mut Grid) -> Result<(), GridError> {
        if self.holds_cells {
            for cell in &self.segments {
                grid.set_occupied(*cell, false)?;
            }
            self.holds_cells = false;
        }
        self.vitality = Vitality::Dead;
        self.intended = None;
        self.growth_slot = None;
        Ok(())
    }

    /// Captures an immutable snapshot for presentation layers.
    #[must_use]
    pub fn snapshot(&self) -> SerpentSnapshot {
        SerpentSnapshot {
            name: self.name.clone(),
            color: self.color,
            segments: self.segments.clone(),
            direction: self.direction,
            alive: self.is_alive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DEFAULT_FIELD_SIZE;

    const GREEN: SerpentColor = SerpentColor::from_rgb(0x2f, 0x95, 0x32);

    fn grid(width: u32, height: u32) -> Grid {
        Grid::generate(width, height, DEFAULT_FIELD_SIZE).expect("valid dimensions")
    }

    fn spawn(grid: &mut Grid, start: u32, direction: Direction, length: u32) -> Serpent {
        Serpent::initialize(
            grid,
            SerpentName::new("A"),
            GREEN,
            CellIndex::new(start),
            direction,
            length,
        )
        .expect("serpent fits")
    }

    fn occupied(grid: &Grid) -> Vec<u32> {
        grid.cells()
            .filter(|cell| cell.is_occupied())
            .map(|cell| cell.index().get())
            .collect()
    }

    #[test]
    fn initialize_trails_body_behind_head() {
        let mut grid = grid(10, 10);
        let serpent = spawn(&mut grid, 22, Direction::Right, 2);
        assert_eq!(serpent.segments(), &[CellIndex::new(22), CellIndex::new(12)]);
        assert_eq!(occupied(&grid), vec![12, 22]);
    }

    #[test]
    fn initialize_rejects_body_through_wall_without_side_effects() {
        let mut grid = grid(10, 10);
        let result = Serpent::initialize(
            &mut grid,
            SerpentName::new("A"),
            GREEN,
            CellIndex::new(12),
            Direction::Right,
            3,
        );
        assert_eq!(result.unwrap_err(), CreationError::BlockedByWall);
        assert!(occupied(&grid).is_empty());
    }

    #[test]
    fn initialize_rejects_overlap_and_bad_input() {
        let mut grid = grid(10, 10);
        let _first = spawn(&mut grid, 22, Direction::Right, 2);

        let overlap = Serpent::initialize(
            &mut grid,
            SerpentName::new("B"),
            GREEN,
            CellIndex::new(32),
            Direction::Right,
            2,
        );
        assert_eq!(overlap.unwrap_err(), CreationError::Occupied);

        let empty = Serpent::initialize(
            &mut grid,
            SerpentName::new("C"),
            GREEN,
            CellIndex::new(50),
            Direction::Up,
            0,
        );
        assert_eq!(empty.unwrap_err(), CreationError::InvalidLength);

        let outside = Serpent::initialize(
            &mut grid,
            SerpentName::new("D"),
            GREEN,
            CellIndex::new(100),
            Direction::Up,
            1,
        );
        assert_eq!(outside.unwrap_err(), CreationError::IndexOutOfRange);
        assert_eq!(occupied(&grid), vec![12, 22]);
    }

    #[test]
    fn advance_shifts_body_and_transfers_occupancy() {
        let mut grid = grid(10, 10);
        let mut serpent = spawn(&mut grid, 22, Direction::Right, 2);

        assert_eq!(serpent.advance(&mut grid).unwrap(), MoveResult::Moved);
        assert_eq!(serpent.segments(), &[CellIndex::new(32), CellIndex::new(22)]);
        assert_eq!(occupied(&grid), vec![22, 32]);
    }

    #[test]
    fn straight_run_keeps_contiguous_row() {
        let mut grid = grid(12, 6);
        let length = 4;
        let start = 3 * 6 + 2;
        let mut serpent = spawn(&mut grid, start, Direction::Right, length);

        for _ in 0..length - 1 {
            assert_eq!(serpent.advance(&mut grid).unwrap(), MoveResult::Moved);
        }

        assert_eq!(serpent.head(), CellIndex::new(start + (length - 1) * 6));
        assert_eq!(grid.occupied_count(), length as usize);
        let expected: Vec<u32> = (0..length).map(|step| start + step * 6).collect();
        assert_eq!(occupied(&grid), expected);
    }

    #[test]
    fn single_segment_serpent_frees_previous_cell() {
        let mut grid = grid(5, 5);
        let mut serpent = spawn(&mut grid, 12, Direction::Up, 1);
        assert_eq!(serpent.advance(&mut grid).unwrap(), MoveResult::Moved);
        assert_eq!(occupied(&grid), vec![13]);
    }

    #[test]
    fn turn_rule_accepts_only_perpendicular_input() {
        let mut grid = grid(10, 10);
        let mut serpent = spawn(&mut grid, 55, Direction::Right, 3);

        serpent.set_intended_direction(Direction::Left);
        assert!(!serpent.apply_intended_direction());
        serpent.set_intended_direction(Direction::Right);
        assert!(!serpent.apply_intended_direction());
        assert_eq!(serpent.direction(), Direction::Right);

        serpent.set_intended_direction(Direction::Down);
        serpent.set_intended_direction(Direction::Up);
        assert_eq!(serpent.intended_direction(), Some(Direction::Up));
        assert!(serpent.apply_intended_direction());
        assert_eq!(serpent.direction(), Direction::Up);
        assert_eq!(serpent.intended_direction(), None);
    }

    #[test]
    fn parallel_input_overwrites_earlier_turn() {
        let mut grid = grid(10, 10);
        let mut serpent = spawn(&mut grid, 55, Direction::Right, 3);

        serpent.set_intended_direction(Direction::Up);
        serpent.set_intended_direction(Direction::Left);
        assert_eq!(serpent.intended_direction(), Some(Direction::Left));
        assert!(!serpent.apply_intended_direction());
        assert_eq!(serpent.direction(), Direction::Right);
    }

    #[test]
    fn wall_hit_marks_dead_and_kill_frees_body() {
        let mut grid = grid(5, 5);
        let mut serpent = spawn(&mut grid, 14, Direction::Up, 2);

        assert_eq!(serpent.advance(&mut grid).unwrap(), MoveResult::HitWall);
        assert_eq!(serpent.vitality(), Vitality::Dead);
        assert_eq!(occupied(&grid), vec![13, 14]);

        serpent.kill(&mut grid).unwrap();
        assert!(occupied(&grid).is_empty());

        grid.set_occupied(CellIndex::new(13), true).unwrap();
        serpent.kill(&mut grid).unwrap();
        assert_eq!(occupied(&grid), vec![13]);
    }

    #[test]
    fn self_collision_is_detected() {
        let mut grid = grid(10, 10);
        let mut serpent = spawn(&mut grid, 55, Direction::Right, 5);

        for direction in [Direction::Up, Direction::Left] {
            serpent.set_intended_direction(direction);
            assert!(serpent.apply_intended_direction());
            assert_eq!(serpent.advance(&mut grid).unwrap(), MoveResult::Moved);
        }
        serpent.set_intended_direction(Direction::Down);
        assert!(serpent.apply_intended_direction());
        assert_eq!(serpent.advance(&mut grid).unwrap(), MoveResult::HitSerpent);
        assert!(!serpent.is_alive());
    }

    #[test]
    fn add_segment_reuses_vacated_tail_cell() {
        let mut grid = grid(10, 10);
        let mut serpent = spawn(&mut grid, 22, Direction::Right, 2);

        assert_eq!(serpent.add_segment(&mut grid).unwrap(), None);
        let _ = serpent.advance(&mut grid).unwrap();
        assert_eq!(
            serpent.add_segment(&mut grid).unwrap(),
            Some(CellIndex::new(12))
        );
        assert_eq!(serpent.segments().len(), 3);
        assert_eq!(occupied(&grid), vec![12, 22, 32]);
    }
}
