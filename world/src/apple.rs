//! Apple placement and respawn.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serpents_core::{ApplePlacementError, CellIndex};

use crate::grid::Grid;

/// Result of consuming the apple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The apple moved to the provided free cell.
    Respawned(CellIndex),
    /// Every cell is occupied; the session is over.
    GridFull,
}

/// Holds the apple's cell and the seeded generator used to relocate it.
#[derive(Clone, Debug)]
pub struct AppleSpawner {
    cell: Option<CellIndex>,
    rng: ChaCha8Rng,
}

impl AppleSpawner {
    /// Creates a spawner with no apple placed yet.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            cell: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Cell currently holding the apple.
    #[must_use]
    pub const fn cell(&self) -> Option<CellIndex> {
        self.cell
    }

    /// Reports whether the apple sits on the provided cell.
    #[must_use]
    pub fn contains(&self, index: CellIndex) -> bool {
        self.cell == Some(index)
    }

    /// Samples cells uniformly, rejecting occupied ones, and moves the apple
    /// to the first free cell found.
    ///
    /// Returns `None` and leaves the apple in place when the grid is full.
    pub fn spawn(&mut self, grid: &Grid) -> Option<CellIndex> {
        if !grid.has_free_cell() {
            return None;
        }

        let cell_count = u32::try_from(grid.len()).unwrap_or(u32::MAX);
        loop {
            let candidate = CellIndex::new(self.rng.gen_range(0..cell_count));
            if matches!(grid.is_occupied(candidate), Ok(false)) {
                self.cell = Some(candidate);
                return Some(candidate);
            }
        }
    }

    /// Relocates the apple after a serpent ate it.
    pub fn consume(&mut self, grid: &Grid) -> ConsumeOutcome {
        match self.spawn(grid) {
            Some(cell) => ConsumeOutcome::Respawned(cell),
            None => ConsumeOutcome::GridFull,
        }
    }

    /// Forces the apple onto a specific free cell.
    pub fn place(&mut self, grid: &Grid, index: CellIndex) -> Result<(), ApplePlacementError> {
        let occupied = grid
            .is_occupied(index)
            .map_err(|_| ApplePlacementError::IndexOutOfRange)?;
        if occupied {
            return Err(ApplePlacementError::Occupied);
        }
        self.cell = Some(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DEFAULT_FIELD_SIZE;

    fn grid(width: u32, height: u32) -> Grid {
        Grid::generate(width, height, DEFAULT_FIELD_SIZE).expect("valid dimensions")
    }

    #[test]
    fn spawn_avoids_occupied_cells() {
        let mut grid = grid(4, 4);
        for index in 0..15 {
            grid.set_occupied(CellIndex::new(index), true).unwrap();
        }

        let mut spawner = AppleSpawner::new(7);
        for _ in 0..10 {
            assert_eq!(spawner.spawn(&grid), Some(CellIndex::new(15)));
        }
    }

    #[test]
    fn consume_reports_full_grid() {
        let mut grid = grid(2, 2);
        let mut spawner = AppleSpawner::new(1);
        spawner.place(&grid, CellIndex::new(3)).unwrap();
        for index in 0..4 {
            grid.set_occupied(CellIndex::new(index), true).unwrap();
        }

        assert_eq!(spawner.consume(&grid), ConsumeOutcome::GridFull);
        assert_eq!(spawner.cell(), Some(CellIndex::new(3)));
    }

    #[test]
    fn same_seed_yields_same_sequence() {
        let grid = grid(20, 20);
        let mut first = AppleSpawner::new(0x5eed);
        let mut second = AppleSpawner::new(0x5eed);
        for _ in 0..32 {
            assert_eq!(first.spawn(&grid), second.spawn(&grid));
        }
    }

    #[test]
    fn place_rejects_occupied_and_out_of_range_cells() {
        let mut grid = grid(3, 3);
        grid.set_occupied(CellIndex::new(4), true).unwrap();
        let mut spawner = AppleSpawner::new(3);

        assert_eq!(
            spawner.place(&grid, CellIndex::new(4)),
            Err(ApplePlacementError::Occupied)
        );
        assert_eq!(
            spawner.place(&grid, CellIndex::new(9)),
            Err(ApplePlacementError::IndexOutOfRange)
        );
        assert!(spawner.place(&grid, CellIndex::new(5)).is_ok());
        assert!(spawner.contains(CellIndex::new(5)));
    }
}
