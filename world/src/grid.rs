//! Flat cell storage, index arithmetic and per-cell occupancy.

use glam::Vec2;
use serpents_core::{CellCoord, CellIndex, Direction, GridDimensions, GridError};

/// Edge length of the square play field in world units when none is given.
pub const DEFAULT_FIELD_SIZE: f32 = 10.0;

/// A single addressable grid square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    index: CellIndex,
    occupied: bool,
}

impl Cell {
    /// Flat index identifying the cell.
    #[must_use]
    pub const fn index(&self) -> CellIndex {
        self.index
    }

    /// Reports whether a serpent segment currently sits on the cell.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }
}

/// World-space placement derived from the grid dimensions.
///
/// Only presentation layers consume these values; game rules work on
/// [`CellIndex`] and [`CellCoord`] exclusively.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldLayout {
    cell_scale: f32,
    offset: Vec2,
    bounds_scale: Vec2,
}

impl FieldLayout {
    fn new(dimensions: GridDimensions, field_size: f32) -> Self {
        let width = dimensions.width() as f32;
        let height = dimensions.height() as f32;
        let cell_scale = field_size / width.max(height);

        // The shorter axis spans a proportionally smaller share of the field so
        // that cells stay square.
        let x_denominator = if height > width {
            height / width * 2.0
        } else {
            2.0
        };
        let y_denominator = if width > height {
            width / height * 2.0
        } else {
            2.0
        };
        let field = Vec2::new(field_size / x_denominator, field_size / y_denominator);
        let offset = field - Vec2::splat(cell_scale / 2.0);

        let bounds_scale = Vec2::new(
            if field.x < field.y {
                field.x / field.y
            } else {
                1.0
            },
            if field.y < field.x {
                field.y / field.x
            } else {
                1.0
            },
        );

        Self {
            cell_scale,
            offset,
            bounds_scale,
        }
    }

    /// Side length of one cell in world units.
    #[must_use]
    pub const fn cell_scale(&self) -> f32 {
        self.cell_scale
    }

    /// Scale applied to a unit bounding visual so it hugs a non-square grid.
    #[must_use]
    pub const fn bounds_scale(&self) -> Vec2 {
        self.bounds_scale
    }

    /// Centre of the provided cell, with the grid centred on the origin.
    #[must_use]
    pub fn position(&self, coord: CellCoord) -> Vec2 {
        Vec2::new(coord.x() as f32, coord.y() as f32) * self.cell_scale - self.offset
    }
}

/// Fixed-size grid of cells addressed by `index == x * height + y`.
#[derive(Clone, Debug)]
pub struct Grid {
    dimensions: GridDimensions,
    cells: Vec<Cell>,
    layout: FieldLayout,
}

impl Grid {
    /// Allocates a `width * height` grid laid out inside a square field of
    /// `field_size` world units.
    pub fn generate(width: u32, height: u32, field_size: f32) -> Result<Self, GridError> {
        let dimensions = GridDimensions::new(width, height);
        let addressable = u32::try_from(dimensions.cell_count()).is_ok();
        if width == 0 || height == 0 || !addressable {
            return Err(GridError::InvalidDimension { width, height });
        }

        let cells = (0..width)
            .flat_map(|x| (0..height).map(move |y| x * height + y))
            .map(|index| Cell {
                index: CellIndex::new(index),
                occupied: false,
            })
            .collect();

        Ok(Self {
            dimensions,
            cells,
            layout: FieldLayout::new(dimensions, field_size),
        })
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// World-space layout of the grid.
    #[must_use]
    pub const fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Grids always hold at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterator over every cell in index order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Bounds-checked cell lookup.
    pub fn cell(&self, index: CellIndex) -> Result<&Cell, GridError> {
        self.cells
            .get(index.get() as usize)
            .ok_or(self.out_of_range(index))
    }

    /// Reports whether a serpent segment sits on the cell.
    pub fn is_occupied(&self, index: CellIndex) -> Result<bool, GridError> {
        self.cell(index).map(Cell::is_occupied)
    }

    /// Sets or clears the occupancy flag of a cell.
    ///
    /// No ownership check happens here: the serpent logic is responsible for
    /// only touching cells it owns.
    pub fn set_occupied(&mut self, index: CellIndex, occupied: bool) -> Result<(), GridError> {
        let error = self.out_of_range(index);
        let cell = self.cells.get_mut(index.get() as usize).ok_or(error)?;
        cell.occupied = occupied;
        Ok(())
    }

    /// Reports whether at least one cell is free.
    #[must_use]
    pub fn has_free_cell(&self) -> bool {
        self.cells.iter().any(|cell| !cell.occupied)
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.occupied).count()
    }

    /// Cell next to `index` in `direction`, or `None` when the step would
    /// cross the grid boundary.
    ///
    /// The vertical edge checks run first: without them a step off the top or
    /// bottom of a column would land on the neighbouring column.
    pub fn adjacent(
        &self,
        index: CellIndex,
        direction: Direction,
    ) -> Result<Option<CellIndex>, GridError> {
        let _ = self.cell(index)?;
        let height = i64::from(self.dimensions.height());
        let current = i64::from(index.get());

        if (current % height == 0 && direction == Direction::Down)
            || (current % height == height - 1 && direction == Direction::Up)
        {
            return Ok(None);
        }

        let (dx, dy) = direction.offset();
        let next = current + i64::from(dx) * height + i64::from(dy);
        if next < 0 || next >= self.cells.len() as i64 {
            return Ok(None);
        }

        Ok(u32::try_from(next).ok().map(CellIndex::new))
    }

    /// World-space centre of a cell.
    pub fn world_position(&self, index: CellIndex) -> Result<Vec2, GridError> {
        let coord = self
            .dimensions
            .coord_of(index)
            .ok_or(self.out_of_range(index))?;
        Ok(self.layout.position(coord))
    }

    fn out_of_range(&self, index: CellIndex) -> GridError {
        GridError::IndexOutOfRange {
            index: index.get(),
            cell_count: self.cells.len(),
        }
    }
}
