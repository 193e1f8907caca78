//! Territory scoring of a finished position.
//!
//! Area scoring: every stone counts for its owner and every empty region
//! bordered by a single color counts for that color. Regions touching both
//! colors stay undecided (dame). The user corrects the automatic result by
//! toggling dead groups, which flips their ownership and re-propagates the
//! surrounding territory.
//!
//! A [`TerritoryMap`] is derived from one node's board and is never stored
//! in the game tree.

use std::fmt;

use crate::board::{Board, Color, Grid, Point};
use crate::tree::Node;

/// Ownership of every point; `None` is undecided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerritoryMap {
    owners: Grid<Option<Color>>,
}

impl TerritoryMap {
    /// Seed the map: stones belong to their color, empty points are undecided.
    pub fn initialize(board: &Board) -> Self {
        let mut owners = Grid::filled(board.width(), board.height(), None);
        for (pt, color) in board.stones() {
            owners.set(pt, Some(color));
        }
        Self { owners }
    }

    /// Seed and assign regions for a node's position.
    pub fn for_node(node: &Node) -> Self {
        let mut map = Self::initialize(node.board());
        map.assign_regions(node.board());
        map
    }

    pub fn owner(&self, pt: Point) -> Option<Color> {
        self.owners.get(pt).copied().flatten()
    }

    pub fn owners(&self) -> &Grid<Option<Color>> {
        &self.owners
    }

    /// Give every empty region to the one color bordering it, if there is
    /// exactly one; otherwise mark it undecided.
    ///
    /// Bordering colors are read from the map, so stones toggled dead
    /// count for their captor. Calling this repeatedly is harmless.
    pub fn assign_regions(&mut self, board: &Board) {
        let mut visited = Grid::filled(board.width(), board.height(), false);

        for start in board.points() {
            if board.get(start).is_some() || visited.is_set(start) {
                continue;
            }

            let mut stack = vec![start];
            let mut region = Vec::new();
            let mut borders = (false, false);

            while let Some(pt) = stack.pop() {
                if visited.is_set(pt) {
                    continue;
                }
                visited.set(pt, true);
                region.push(pt);

                for n in board.neighbors(pt) {
                    if board.get(n).is_none() {
                        if !visited.is_set(n) {
                            stack.push(n);
                        }
                        continue;
                    }
                    match self.owner(n) {
                        Some(Color::Black) => borders.0 = true,
                        Some(Color::White) => borders.1 = true,
                        None => {}
                    }
                }
            }

            let owner = match borders {
                (true, false) => Some(Color::Black),
                (false, true) => Some(Color::White),
                _ => None,
            };
            for pt in region {
                self.owners.set(pt, owner);
            }
        }
    }

    /// Mark the stones reachable from `pt` (through same-colored stones and
    /// empty points) as owned by the other side, then recompute territory.
    ///
    /// Toggling the same group again restores it. Returns `false` if there
    /// is no stone at `pt`.
    pub fn toggle_group_ownership(&mut self, board: &Board, pt: Point) -> bool {
        let Some(color) = board.get(pt) else {
            return false;
        };
        let new_owner = match self.owner(pt) {
            Some(c) => c.opposite(),
            None => color.opposite(),
        };

        let mut visited = Grid::filled(board.width(), board.height(), false);
        let mut stack = vec![pt];
        while let Some(cur) = stack.pop() {
            if visited.is_set(cur) {
                continue;
            }
            visited.set(cur, true);
            if board.get(cur) == Some(color) {
                self.owners.set(cur, Some(new_owner));
            }
            for n in board.neighbors(cur) {
                let stone = board.get(n);
                if !visited.is_set(n) && (stone == Some(color) || stone.is_none()) {
                    stack.push(n);
                }
            }
        }

        for p in board.points() {
            if board.get(p).is_none() {
                self.owners.set(p, None);
            }
        }
        self.assign_regions(board);
        true
    }

    /// Count points per owner, adding `komi` to White.
    pub fn score(&self, komi: f64) -> Score {
        let mut score = Score {
            black: 0.0,
            white: komi,
        };
        for (_, owner) in self.owners.iter() {
            match owner {
                Some(Color::Black) => score.black += 1.0,
                Some(Color::White) => score.white += 1.0,
                None => {}
            }
        }
        score
    }
}

/// Final totals for both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub black: f64,
    pub white: f64,
}

impl Score {
    /// Black's lead; negative when White is ahead.
    pub fn margin(&self) -> f64 {
        self.black - self.white
    }

    pub fn winner(&self) -> Option<Color> {
        let m = self.margin();
        if m > 0.0 {
            Some(Color::Black)
        } else if m < 0.0 {
            Some(Color::White)
        } else {
            None
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner() {
            Some(c) => write!(f, "{}+{}", c.letter(), self.margin().abs()),
            None => write!(f, "Jigo"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rows of `X` (black), `O` (white) and `.` (empty).
    fn board_from(rows: &[&str]) -> Board {
        let mut board = Board::new(rows[0].len(), rows.len()).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let stone = match ch {
                    'X' => Some(Color::Black),
                    'O' => Some(Color::White),
                    _ => None,
                };
                board.set((x, y), stone).unwrap();
            }
        }
        board
    }

    #[test]
    fn test_initialize() {
        let board = board_from(&["X.O", "..."]);
        let map = TerritoryMap::initialize(&board);
        assert_eq!(map.owner((0, 0)), Some(Color::Black));
        assert_eq!(map.owner((2, 0)), Some(Color::White));
        assert_eq!(map.owner((1, 0)), None);
    }

    #[test]
    fn test_split_board() {
        let board = board_from(&[
            "..X.O",
            "..X.O",
            "..X.O",
        ]);
        let mut map = TerritoryMap::initialize(&board);
        map.assign_regions(&board);
        assert_eq!(map.owner((0, 0)), Some(Color::Black));
        assert_eq!(map.owner((1, 2)), Some(Color::Black));
        assert_eq!(map.owner((3, 1)), None, "column between colors is dame");
        let score = map.score(0.5);
        assert_eq!(score.black, 9.0);
        assert_eq!(score.white, 3.5);
        assert_eq!(score.to_string(), "B+5.5");
    }

    #[test]
    fn test_empty_board_is_undecided() {
        let board = Board::new(5, 5).unwrap();
        let mut map = TerritoryMap::initialize(&board);
        map.assign_regions(&board);
        assert!(map.owners().iter().all(|(_, o)| o.is_none()));
        assert_eq!(map.score(7.0).to_string(), "W+7");
    }

    #[test]
    fn test_assign_regions_idempotent() {
        let board = board_from(&[
            ".X.O.",
            "XX.OO",
            ".....",
            "OOXX.",
            ".O.X.",
        ]);
        let mut map = TerritoryMap::initialize(&board);
        map.assign_regions(&board);
        let once = map.clone();
        map.assign_regions(&board);
        assert_eq!(map, once);
    }

    #[test]
    fn test_toggle_dead_stone() {
        let board = board_from(&[
            "..X..",
            "..X..",
            "..XO.",
            "..X..",
            "..X..",
        ]);
        let mut map = TerritoryMap::initialize(&board);
        map.assign_regions(&board);
        assert_eq!(map.owner((4, 0)), None);

        assert!(map.toggle_group_ownership(&board, (3, 2)));
        assert_eq!(map.owner((3, 2)), Some(Color::Black));
        assert_eq!(map.owner((4, 0)), Some(Color::Black));
        assert_eq!(map.owner((0, 0)), Some(Color::Black));
        assert_eq!(map.score(0.0).black, 25.0);

        // Toggling again brings the stone back to life.
        assert!(map.toggle_group_ownership(&board, (3, 2)));
        assert_eq!(map.owner((3, 2)), Some(Color::White));
        assert_eq!(map.owner((4, 0)), None);
    }

    #[test]
    fn test_toggle_empty_point() {
        let board = board_from(&["X.."]);
        let mut map = TerritoryMap::initialize(&board);
        assert!(!map.toggle_group_ownership(&board, (1, 0)));
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score { black: 10.0, white: 10.0 }.to_string(), "Jigo");
        assert_eq!(Score { black: 10.0, white: 12.5 }.to_string(), "W+2.5");
        assert_eq!(Score { black: 10.0, white: 12.5 }.winner(), Some(Color::White));
    }
}
