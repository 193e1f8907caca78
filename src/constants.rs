//! Compile-time configuration: board limits, defaults, record identifiers
//! and the engine protocol vocabulary.
//!
//! Runtime choices (board size of a particular game, komi, which engine to
//! attach) live in [`crate::session::SessionOptions`] and
//! [`crate::engine::EngineConfig`]; everything here is fixed at build time.

// =============================================================================
// Board Geometry
// =============================================================================

/// Largest board dimension. Record coordinates use one letter per axis
/// (`a`-`z` then `A`-`Z`), so 52 is a hard limit.
pub const MAX_BOARD_DIM: usize = 52;

/// Board size used by a fresh session.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Largest board on which a `tt` move value still means "pass".
pub const TT_PASS_MAX_DIM: usize = 19;

// =============================================================================
// Scoring
// =============================================================================

/// Komi (compensation points for White) used by a fresh session.
pub const DEFAULT_KOMI: f64 = 7.0;

// =============================================================================
// Record Format
// =============================================================================

/// Deepest variation nesting accepted when reading a record.
pub const MAX_VARIATION_DEPTH: usize = 500;

/// Record format version written to `FF`.
pub const SGF_FILE_FORMAT: u32 = 4;

/// Game type written to `GM` (1 = Go).
pub const SGF_GAME_TYPE: u32 = 1;

/// Charset written to `CA`.
pub const SGF_CHARSET: &str = "UTF-8";

/// Application tag written to `AP`.
pub const SGF_APPLICATION: &str = concat!("goban:", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Engine Protocol
// =============================================================================

/// Column letters used by GTP vertices (`I` is skipped).
pub const GTP_COLUMNS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Commands an engine must advertise before it can be attached.
pub const REQUIRED_COMMANDS: &[&str] = &["boardsize", "komi", "play", "genmove"];

/// Optional command used for non-square boards.
pub const RECTANGULAR_BOARDSIZE: &str = "rectangular_boardsize";

/// Engine program attached when none is configured.
pub const DEFAULT_ENGINE_PROGRAM: &str = "/usr/games/gnugo";

/// Arguments passed to [`DEFAULT_ENGINE_PROGRAM`].
pub const DEFAULT_ENGINE_ARGS: &[&str] = &[
    "--mode",
    "gtp",
    "--level",
    "15",
    "--large-scale",
    "--cache-size",
    "93",
    "--chinese-rules",
    "--komi",
    "7",
];
