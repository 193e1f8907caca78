//! Board primitives: stone colors, points, rectangular grids and the
//! flood fills the rules engine and scorer are built from.
//!
//! Boards are value types. Every node of the game tree owns its own
//! [`Board`]; mutations happen on clones.

use std::fmt;

use crate::constants::MAX_BOARD_DIM;
use crate::error::BoardError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter form used by records and the engine protocol.
    pub fn letter(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }

    /// Parse `B`/`W`/`black`/`white` (case-insensitive).
    pub fn parse(s: &str) -> Option<Color> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "Black"),
            Color::White => write!(f, "White"),
        }
    }
}

/// A board point as `(x, y)`, with `(0, 0)` the top-left corner.
pub type Point = (usize, usize);

/// Check that both dimensions lie in `1..=MAX_BOARD_DIM`.
pub fn check_dimensions(width: usize, height: usize) -> Result<(), BoardError> {
    if (1..=MAX_BOARD_DIM).contains(&width) && (1..=MAX_BOARD_DIM).contains(&height) {
        Ok(())
    } else {
        Err(BoardError::InvalidSize { width, height })
    }
}

/// A dense `width x height` array of cells, stored row-major.
///
/// Used for the board itself, for per-node overlays (setup stones,
/// annotation marks) and for territory maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, (x, y): Point) -> bool {
        x < self.width && y < self.height
    }

    fn idx(&self, (x, y): Point) -> usize {
        y * self.width + x
    }

    /// Index of a point in row-major order, if it is on the grid.
    pub fn index_of(&self, pt: Point) -> Option<usize> {
        self.contains(pt).then(|| self.idx(pt))
    }

    /// Point at a row-major index.
    pub fn point_at(&self, index: usize) -> Point {
        (index % self.width, index / self.width)
    }

    pub fn get(&self, pt: Point) -> Option<&T> {
        self.index_of(pt).map(|i| &self.cells[i])
    }

    /// Write a cell. Points off the grid are ignored and return `false`.
    pub fn set(&mut self, pt: Point, value: T) -> bool {
        match self.index_of(pt) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// All points of the grid in row-major order (top row first).
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.cells.len()).map(|i| self.point_at(i))
    }

    /// Points with their cell values, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> + '_ {
        self.cells.iter().enumerate().map(|(i, v)| (self.point_at(i), v))
    }

    /// The up to four orthogonal neighbors of a point.
    pub fn neighbors(&self, (x, y): Point) -> std::vec::IntoIter<Point> {
        let (w, h) = (self.width, self.height);
        let mut v = Vec::with_capacity(4);
        if y > 0 {
            v.push((x, y - 1));
        }
        if y + 1 < h {
            v.push((x, y + 1));
        }
        if x > 0 {
            v.push((x - 1, y));
        }
        if x + 1 < w {
            v.push((x + 1, y));
        }
        v.into_iter()
    }
}

impl Grid<bool> {
    /// Set points in row-major order.
    pub fn marked(&self) -> impl Iterator<Item = Point> + '_ {
        self.iter().filter(|(_, v)| **v).map(|(pt, _)| pt)
    }

    pub fn any(&self) -> bool {
        self.cells.iter().any(|&v| v)
    }

    pub fn is_set(&self, pt: Point) -> bool {
        self.get(pt).copied().unwrap_or(false)
    }
}

/// A connected group of same-colored stones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub color: Color,
    pub stones: Vec<Point>,
    pub liberties: usize,
}

/// The playing surface: a grid of empty or occupied points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Grid<Option<Color>>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Result<Self, BoardError> {
        check_dimensions(width, height)?;
        Ok(Self {
            cells: Grid::filled(width, height, None),
        })
    }

    pub fn width(&self) -> usize {
        self.cells.width()
    }

    pub fn height(&self) -> usize {
        self.cells.height()
    }

    pub fn is_square(&self) -> bool {
        self.width() == self.height()
    }

    pub fn contains(&self, pt: Point) -> bool {
        self.cells.contains(pt)
    }

    /// Stone at a point; `None` for empty or off-board points.
    pub fn get(&self, pt: Point) -> Option<Color> {
        self.cells.get(pt).copied().flatten()
    }

    /// Write a cell directly, bypassing the rules.
    pub fn set(&mut self, pt: Point, stone: Option<Color>) -> Result<(), BoardError> {
        if self.cells.set(pt, stone) {
            Ok(())
        } else {
            Err(BoardError::OutOfBounds {
                point: pt,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    pub fn neighbors(&self, pt: Point) -> std::vec::IntoIter<Point> {
        self.cells.neighbors(pt)
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells.points()
    }

    /// Occupied points with their colors, row-major.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Color)> + '_ {
        self.cells.iter().filter_map(|(pt, c)| c.map(|c| (pt, c)))
    }

    pub fn stone_count(&self) -> usize {
        self.stones().count()
    }

    /// Collect the group containing `start`.
    ///
    /// Uses an explicit stack; returns `None` if `start` is empty.
    pub fn group(&self, start: Point) -> Option<Group> {
        let color = self.get(start)?;
        let mut stack = vec![start];
        let mut visited = Grid::filled(self.width(), self.height(), false);
        let mut liberty_seen = Grid::filled(self.width(), self.height(), false);
        let mut stones = Vec::new();
        let mut liberties = 0;

        while let Some(pt) = stack.pop() {
            if visited.is_set(pt) {
                continue;
            }
            visited.set(pt, true);
            stones.push(pt);
            for n in self.neighbors(pt) {
                match self.get(n) {
                    None => {
                        if !liberty_seen.is_set(n) {
                            liberty_seen.set(n, true);
                            liberties += 1;
                        }
                    }
                    Some(c) if c == color && !visited.is_set(n) => stack.push(n),
                    _ => {}
                }
            }
        }
        Some(Group {
            color,
            stones,
            liberties,
        })
    }

    /// Number of liberties of the group at `pt` (0 for empty points).
    pub fn liberties(&self, pt: Point) -> usize {
        self.group(pt).map_or(0, |g| g.liberties)
    }

    /// Remove the group at `pt`, returning the number of stones removed.
    pub fn remove_group(&mut self, pt: Point) -> usize {
        match self.group(pt) {
            Some(group) => {
                for &stone in &group.stones {
                    self.cells.set(stone, None);
                }
                group.stones.len()
            }
            None => 0,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let ch = match self.get((x, y)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
