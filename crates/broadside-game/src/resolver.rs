//! The attack resolver: the single authority on attack outcomes.
//!
//! Clients report only where they fire; hit, miss, sunk, and win are
//! always computed here against the defender's board. A client is never
//! trusted to report results about its own board.

use broadside_protocol::{Coord, ShipKind};

use crate::board::{Board, CellState};
use crate::AttackError;

/// The resolved outcome of one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Whether the shot struck a ship cell.
    pub hit: bool,
    /// Set when this shot sank a ship.
    pub sunk: Option<ShipKind>,
    /// Set when this shot sank the defender's last ship.
    pub all_sunk: bool,
}

/// Resolves an attack against the defender's board.
///
/// Ship cells become `Hit` and update the ship's hit set; empty cells
/// become `Miss`. A cell already in `Hit`/`Miss` state is rejected as
/// [`AttackError::AlreadyTargeted`] without mutating anything — a
/// repeated shot is not a new attack and must not consume the turn.
pub fn resolve_attack(
    board: &mut Board,
    target: Coord,
) -> Result<AttackOutcome, AttackError> {
    if !Board::in_bounds(target) {
        return Err(AttackError::OutOfBounds(target));
    }

    match board.cell(target) {
        CellState::Hit | CellState::Miss => {
            Err(AttackError::AlreadyTargeted(target))
        }
        CellState::Empty => {
            board.set_cell(target, CellState::Miss);
            Ok(AttackOutcome {
                hit: false,
                sunk: None,
                all_sunk: false,
            })
        }
        CellState::Ship(kind) => {
            board.set_cell(target, CellState::Hit);
            let ship = board
                .ships
                .get_mut(&kind)
                .expect("grid and ship map agree");
            ship.record_hit(target);
            let sunk = ship.is_sunk().then_some(kind);
            Ok(AttackOutcome {
                hit: true,
                sunk,
                all_sunk: board.all_sunk(),
            })
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Orientation, Placement};

    /// A board with just a Destroyer at (5,5)-(5,6) vertical.
    fn one_destroyer() -> Board {
        let mut board = Board::new();
        board
            .place(Placement {
                kind: ShipKind::Destroyer,
                anchor: Coord::new(5, 5),
                orientation: Orientation::Vertical,
            })
            .unwrap();
        board
    }

    /// A complete five-ship board laid out in rows 0..5 at x=0.
    fn full_board() -> Board {
        let mut board = Board::new();
        for (i, kind) in ShipKind::ALL.iter().enumerate() {
            board
                .place(Placement {
                    kind: *kind,
                    anchor: Coord::new(0, i as u8),
                    orientation: Orientation::Horizontal,
                })
                .unwrap();
        }
        board
    }

    #[test]
    fn test_resolve_attack_miss_marks_cell() {
        let mut board = one_destroyer();
        let outcome = resolve_attack(&mut board, Coord::new(0, 0)).unwrap();
        assert!(!outcome.hit);
        assert_eq!(outcome.sunk, None);
        assert!(!outcome.all_sunk);
        assert_eq!(board.cell(Coord::new(0, 0)), CellState::Miss);
    }

    #[test]
    fn test_resolve_attack_hit_marks_cell_not_sunk_yet() {
        let mut board = one_destroyer();
        let outcome = resolve_attack(&mut board, Coord::new(5, 5)).unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.sunk, None);
        assert_eq!(board.cell(Coord::new(5, 5)), CellState::Hit);
    }

    #[test]
    fn test_resolve_attack_final_cell_sinks_ship() {
        let mut board = one_destroyer();
        resolve_attack(&mut board, Coord::new(5, 5)).unwrap();
        let outcome = resolve_attack(&mut board, Coord::new(5, 6)).unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.sunk, Some(ShipKind::Destroyer));
    }

    #[test]
    fn test_resolve_attack_already_targeted_hit_cell_rejected() {
        let mut board = one_destroyer();
        resolve_attack(&mut board, Coord::new(5, 5)).unwrap();
        let r = resolve_attack(&mut board, Coord::new(5, 5));
        assert!(matches!(r, Err(AttackError::AlreadyTargeted(_))));
        // The cell keeps its state.
        assert_eq!(board.cell(Coord::new(5, 5)), CellState::Hit);
    }

    #[test]
    fn test_resolve_attack_already_targeted_miss_cell_rejected() {
        let mut board = one_destroyer();
        resolve_attack(&mut board, Coord::new(0, 0)).unwrap();
        let r = resolve_attack(&mut board, Coord::new(0, 0));
        assert!(matches!(r, Err(AttackError::AlreadyTargeted(_))));
    }

    #[test]
    fn test_resolve_attack_out_of_bounds_rejected() {
        let mut board = one_destroyer();
        let r = resolve_attack(&mut board, Coord::new(10, 0));
        assert!(matches!(r, Err(AttackError::OutOfBounds(_))));
    }

    #[test]
    fn test_resolve_attack_all_sunk_only_on_last_ship_cell() {
        let mut board = full_board();

        // Sink everything except the very last cell.
        let mut cells: Vec<Coord> = board
            .ships()
            .flat_map(|s| s.cells().to_vec())
            .collect();
        let last = cells.pop().unwrap();

        for cell in cells {
            let outcome = resolve_attack(&mut board, cell).unwrap();
            assert!(!outcome.all_sunk, "premature all_sunk at {cell}");
        }

        let outcome = resolve_attack(&mut board, last).unwrap();
        assert!(outcome.hit);
        assert!(outcome.all_sunk);
        assert!(board.all_sunk());
    }
}
