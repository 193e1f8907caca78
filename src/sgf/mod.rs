//! Game record codec.
//!
//! - [`coord`] - the two-letter coordinate alphabet
//! - [`property`] - typed properties with a passthrough variant
//! - [`parser`] - text to [`SgfTree`] collections
//! - [`build`] - [`SgfTree`] to [`GameTree`](crate::tree::GameTree)
//! - [`writer`] - [`GameTree`](crate::tree::GameTree) to text

pub mod build;
pub mod coord;
pub mod parser;
pub mod property;
pub mod writer;

pub use build::{Import, build_tree, import};
pub use parser::{SgfNode, SgfTree, parse};
pub use property::{MoveValue, PointList, Property};
pub use writer::{RecordWriter, serialize};
