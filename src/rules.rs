//! Stone placement, capture, suicide and simple-ko rules.
//!
//! The engine is pure: it never mutates the board it is given. Legality is
//! checked with [`check_move`] (or the boolean [`is_legal`]); an accepted
//! move is resolved by [`apply_move`], which returns a fresh board together
//! with the capture count and the ko point for the following move.
//!
//! Only single-point ko is detected. Longer repetitions (superko) are
//! deliberately not tracked.

use crate::board::{Board, Color, Point};
use crate::error::MoveError;

/// Result of resolving a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Board after placement and captures.
    pub board: Board,
    /// Number of opponent stones removed.
    pub captured: usize,
    /// Point forbidden on the immediately following move, if any.
    pub ko: Option<Point>,
}

/// Check whether `color` may play at `pt`.
///
/// # Errors
/// - [`MoveError::OutOfBounds`] - point is off the board
/// - [`MoveError::Occupied`] - point is not empty
/// - [`MoveError::Ko`] - point is the current ko point
/// - [`MoveError::Suicide`] - placed group has no liberties and nothing is captured
pub fn check_move(
    board: &Board,
    pt: Point,
    color: Color,
    ko: Option<Point>,
) -> Result<(), MoveError> {
    if !board.contains(pt) {
        return Err(MoveError::OutOfBounds);
    }
    if board.get(pt).is_some() {
        return Err(MoveError::Occupied);
    }
    if ko == Some(pt) {
        return Err(MoveError::Ko);
    }

    let mut scratch = board.clone();
    place(&mut scratch, pt, color);

    let opp = color.opposite();
    let captures = scratch
        .neighbors(pt)
        .any(|n| scratch.get(n) == Some(opp) && scratch.liberties(n) == 0);
    if captures || scratch.liberties(pt) > 0 {
        Ok(())
    } else {
        Err(MoveError::Suicide)
    }
}

/// Boolean form of [`check_move`].
pub fn is_legal(board: &Board, pt: Point, color: Color, ko: Option<Point>) -> bool {
    check_move(board, pt, color, ko).is_ok()
}

/// Place a stone and resolve captures.
///
/// Occupancy and ko are the caller's concern. A suicidal placement removes
/// its own group so that callers skipping [`check_move`] still end up with
/// a consistent board.
pub fn apply_move(board: &Board, pt: Point, color: Color) -> MoveOutcome {
    let mut next = board.clone();
    place(&mut next, pt, color);

    let opp = color.opposite();
    let mut captured_groups: Vec<(Point, usize)> = Vec::new();
    for n in next.neighbors(pt) {
        // A group touching the stone twice is gone after the first removal.
        if next.get(n) == Some(opp) && next.liberties(n) == 0 {
            let size = next.remove_group(n);
            captured_groups.push((n, size));
        }
    }

    if next.get(pt).is_some() && next.liberties(pt) == 0 {
        next.remove_group(pt);
    }

    let captured = captured_groups.iter().map(|&(_, size)| size).sum();
    let ko = match captured_groups.as_slice() {
        [(ko_pt, 1)] if own_group_size(&next, pt) == 1 => Some(*ko_pt),
        _ => None,
    };

    MoveOutcome {
        board: next,
        captured,
        ko,
    }
}

fn place(board: &mut Board, pt: Point, color: Color) {
    // Callers have already bounds-checked `pt`.
    let _ = board.set(pt, Some(color));
}

fn own_group_size(board: &Board, pt: Point) -> usize {
    board.group(pt).map_or(0, |g| g.stones.len())
}
