//! The board model: a 10×10 grid, ship placements, and cell states.
//!
//! The board is the authoritative record of one participant's fleet.
//! Cells start `Empty`, become `Ship(kind)` when a placement commits,
//! and transition to `Hit`/`Miss` only through the attack resolver.

use std::collections::{BTreeMap, BTreeSet};

use broadside_protocol::{Coord, ShipKind};

use crate::PlacementError;

/// Board edge length. Valid coordinates are `[0, GRID_SIZE)` on each axis.
pub const GRID_SIZE: u8 = 10;

/// The axis a ship lies along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The per-cell step `(dx, dy)` for this orientation.
    pub fn step(self) -> (u8, u8) {
        match self {
            Orientation::Horizontal => (1, 0),
            Orientation::Vertical => (0, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// A requested ship placement: kind, anchor cell, and orientation.
///
/// The occupied cells are derived, never stored: `anchor + i·step` for
/// `i` in `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub kind: ShipKind,
    pub anchor: Coord,
    pub orientation: Orientation,
}

impl Placement {
    /// Computes the cells this placement would occupy.
    ///
    /// Coordinates are computed with saturating arithmetic; anything at
    /// or past the grid edge fails the bounds check in
    /// [`Board::validate_placement`].
    pub fn cells(&self) -> Vec<Coord> {
        let (dx, dy) = self.orientation.step();
        (0..self.kind.size())
            .map(|i| {
                Coord::new(
                    self.anchor.x.saturating_add(dx * i),
                    self.anchor.y.saturating_add(dy * i),
                )
            })
            .collect()
    }

    /// Recovers a placement from an ordered coordinate list, as received
    /// in a `place_ships` message.
    ///
    /// The list must have exactly `kind.size()` cells, all on one row or
    /// one column, each stepping by exactly one cell from the previous.
    pub fn from_cells(
        kind: ShipKind,
        cells: &[Coord],
    ) -> Result<Placement, PlacementError> {
        let expected = kind.size() as usize;
        if cells.len() != expected {
            return Err(PlacementError::WrongLength {
                kind,
                expected: kind.size(),
                got: cells.len(),
            });
        }

        let anchor = cells[0];
        let orientation = if cells[1].y == anchor.y {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        let placement = Placement {
            kind,
            anchor,
            orientation,
        };
        if placement.cells() != cells {
            return Err(PlacementError::NotAligned(kind));
        }
        Ok(placement)
    }
}

// ---------------------------------------------------------------------------
// Cells and ships
// ---------------------------------------------------------------------------

/// The state of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    /// Open water, never targeted.
    #[default]
    Empty,
    /// Occupied by a ship, never targeted.
    Ship(ShipKind),
    /// A ship cell that has been struck.
    Hit,
    /// Open water that has been targeted.
    Miss,
}

/// One committed ship: its cells and which of them have been hit.
#[derive(Debug, Clone)]
pub struct Ship {
    kind: ShipKind,
    cells: Vec<Coord>,
    hits: BTreeSet<Coord>,
}

impl Ship {
    /// The ship's type.
    pub fn kind(&self) -> ShipKind {
        self.kind
    }

    /// The cells the ship occupies, in placement order.
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    /// `true` once every cell has been hit.
    pub fn is_sunk(&self) -> bool {
        self.hits.len() == self.cells.len()
    }

    pub(crate) fn record_hit(&mut self, target: Coord) {
        self.hits.insert(target);
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// One participant's 10×10 board.
///
/// Invariants:
/// - `grid` and `ships` agree: every `Ship(kind)` cell belongs to the
///   ship of that kind, and vice versa for unhit cells.
/// - A failed operation never leaves partial mutations behind.
#[derive(Debug, Clone, Default)]
pub struct Board {
    grid: [[CellState; GRID_SIZE as usize]; GRID_SIZE as usize],
    pub(crate) ships: BTreeMap<ShipKind, Ship>,
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if the coordinate lies on the grid.
    pub fn in_bounds(coord: Coord) -> bool {
        coord.x < GRID_SIZE && coord.y < GRID_SIZE
    }

    /// The state of one cell. Out-of-bounds coordinates read as `Empty`;
    /// callers that care about bounds check them first.
    pub fn cell(&self, coord: Coord) -> CellState {
        if Self::in_bounds(coord) {
            self.grid[coord.y as usize][coord.x as usize]
        } else {
            CellState::Empty
        }
    }

    pub(crate) fn set_cell(&mut self, coord: Coord, state: CellState) {
        self.grid[coord.y as usize][coord.x as usize] = state;
    }

    /// Checks a placement against the current board without mutating it.
    ///
    /// Returns the cells the ship would occupy, so `place` does not
    /// compute them twice.
    pub fn validate_placement(
        &self,
        placement: &Placement,
    ) -> Result<Vec<Coord>, PlacementError> {
        if self.ships.contains_key(&placement.kind) {
            return Err(PlacementError::DuplicateShipType(placement.kind));
        }

        let cells = placement.cells();
        for &cell in &cells {
            if !Self::in_bounds(cell) {
                return Err(PlacementError::OutOfBounds(placement.kind));
            }
            if self.cell(cell) != CellState::Empty {
                return Err(PlacementError::Overlap(placement.kind));
            }
        }
        Ok(cells)
    }

    /// Validates and commits a placement.
    ///
    /// On error the board is untouched.
    pub fn place(&mut self, placement: Placement) -> Result<(), PlacementError> {
        let cells = self.validate_placement(&placement)?;
        for &cell in &cells {
            self.set_cell(cell, CellState::Ship(placement.kind));
        }
        self.ships.insert(
            placement.kind,
            Ship {
                kind: placement.kind,
                cells,
                hits: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// `true` once all five canonical ship kinds are placed.
    pub fn is_complete(&self) -> bool {
        self.ships.len() == ShipKind::ALL.len()
    }

    /// The committed ships.
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// `true` once the fleet is complete and every ship is sunk.
    pub fn all_sunk(&self) -> bool {
        self.is_complete() && self.ships.values().all(Ship::is_sunk)
    }
}

// =========================================================================
// Tests
// =========================================================================
