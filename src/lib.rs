//! Goban: a Go game-record editor core.
//!
//! This crate holds everything behind a board editor except the drawing:
//! the rules, a branching game history, territory scoring, reading and
//! writing SGF records, and driving an external engine over GTP.
//!
//! ## Modules
//!
//! - [`constants`] - Limits, defaults and protocol identifiers
//! - [`error`] - Error types for every layer
//! - [`board`] - Colors, points, grids and the stone board
//! - [`rules`] - Legality, captures and simple ko
//! - [`tree`] - The game tree arena with variations and annotations
//! - [`score`] - Territory assignment and dead-stone marking
//! - [`sgf`] - Record parser, tree builder and serializer
//! - [`gtp`] - GTP client connection and vertex names
//! - [`engine`] - Engine subprocess lifecycle
//! - [`session`] - One open game and the commands a front-end issues
//!
//! ## Example
//!
//! ```
//! use goban::session::{Session, SessionOptions};
//!
//! let mut session = Session::new(SessionOptions::default()).unwrap();
//! session.play((3, 3)).unwrap();
//! session.play((15, 15)).unwrap();
//! let record = session.export_record();
//! assert!(record.contains(";B[dd]"));
//!
//! let mut copy = Session::new(SessionOptions::default()).unwrap();
//! copy.import_record(&record).unwrap();
//! assert_eq!(copy.tree().len(), 3);
//! ```

pub mod board;
pub mod constants;
pub mod engine;
pub mod error;
pub mod gtp;
pub mod rules;
pub mod score;
pub mod session;
pub mod sgf;
pub mod tree;
