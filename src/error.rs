//! Error types for every layer of the crate.

use std::fmt;

use thiserror::Error;

use crate::board::{Color, Point};
use crate::constants::MAX_BOARD_DIM;

/// Errors raised when constructing or indexing boards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid board size {width}x{height} (each dimension must be between 1 and {max})", max = MAX_BOARD_DIM)]
    InvalidSize { width: usize, height: usize },

    #[error("point {point:?} is outside the {width}x{height} board")]
    OutOfBounds {
        point: Point,
        width: usize,
        height: usize,
    },
}

/// Reasons a stone may not be placed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("illegal move: point is outside the board")]
    OutOfBounds,

    #[error("illegal move: point not empty")]
    Occupied,

    #[error("illegal move: retakes ko")]
    Ko,

    #[error("illegal move: suicide")]
    Suicide,
}

/// Errors raised by game tree operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("no node with id {0}")]
    UnknownNode(usize),

    #[error("{color} cannot play at {point:?}: {source}")]
    IllegalMove {
        color: Color,
        point: Point,
        #[source]
        source: MoveError,
    },

    #[error("moves are not allowed from setup node {0}")]
    SetupNode(usize),

    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Location of a syntax error inside record text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    /// Byte offset from the start of the text.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl TextPosition {
    /// Locate a byte offset inside `text`.
    pub fn locate(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors raised while reading a game record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SgfError {
    #[error("syntax error at {position}: {message}")]
    Syntax {
        position: TextPosition,
        message: String,
    },

    #[error("invalid {ident} value '{value}' at {position}")]
    InvalidValue {
        ident: String,
        value: String,
        position: TextPosition,
    },

    #[error("record contains no game tree")]
    Empty,

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl SgfError {
    pub(crate) fn syntax(text: &str, offset: usize, message: impl Into<String>) -> Self {
        SgfError::Syntax {
            position: TextPosition::locate(text, offset),
            message: message.into(),
        }
    }
}

/// Errors raised while talking to an analysis engine.
#[derive(Error, Debug)]
pub enum GtpError {
    #[error("engine is not attached")]
    NotAttached,

    #[error("failed to start engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine closed its output stream")]
    Eof,

    #[error("engine reported failure: {0}")]
    Failure(String),

    #[error("engine does not support required command: {0}")]
    Unsupported(String),

    #[error("engine does not support rectangular boards and board is not square")]
    RectangularUnsupported,

    #[error("invalid engine vertex '{0}'")]
    InvalidVertex(String),

    #[error("board width {0} exceeds the engine coordinate alphabet")]
    BoardTooWide(usize),

    #[error("engine played an illegal move at {vertex}: {source}")]
    IllegalMove {
        vertex: String,
        #[source]
        source: MoveError,
    },

    #[error("engine move could not be recorded: {0}")]
    Tree(#[from] TreeError),
}

/// Errors surfaced by the command surface in [`crate::session`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not in scoring mode")]
    NotScoring,

    #[error("no stone at {0:?}")]
    NoStone(Point),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Record(#[from] SgfError),

    #[error(transparent)]
    Engine(#[from] GtpError),
}
