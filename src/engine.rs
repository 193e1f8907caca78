//! External engine process.
//!
//! An [`EngineSession`] exists only while an engine is attached: creating
//! one spawns the process and brings it to the current position, and
//! [`EngineSession::detach`] consumes it. A session whose engine has
//! misbehaved should be detached by its owner.

use std::collections::HashSet;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use log::{debug, error, info};

use crate::board::{Board, Color};
use crate::constants::{
    DEFAULT_ENGINE_ARGS, DEFAULT_ENGINE_PROGRAM, GTP_COLUMNS, RECTANGULAR_BOARDSIZE,
    REQUIRED_COMMANDS,
};
use crate::error::GtpError;
use crate::gtp::{GtpConnection, Vertex, color_arg, format_point, format_vertex, parse_vertex};

/// How to launch an engine and which side it plays.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Color the engine plays; local moves of the other color trigger a reply.
    pub color: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_ENGINE_PROGRAM.to_string(),
            args: DEFAULT_ENGINE_ARGS.iter().map(|s| s.to_string()).collect(),
            color: Color::Black,
        }
    }
}

/// An attached engine process.
pub struct EngineSession {
    child: Child,
    conn: GtpConnection<BufReader<ChildStdout>, ChildStdin>,
    color: Color,
    width: usize,
    height: usize,
}

impl EngineSession {
    /// Spawn the engine and load `board` and `komi` into it.
    ///
    /// If initialization fails the process is torn down before the error
    /// is returned.
    pub fn attach(config: &EngineConfig, board: &Board, komi: f64) -> Result<Self, GtpError> {
        let spawn_error = |source| GtpError::Spawn {
            program: config.program.clone(),
            source,
        };
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        let pipes = child.stdin.take().zip(child.stdout.take());
        let Some((stdin, stdout)) = pipes else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(spawn_error(io::Error::other("engine pipes unavailable")));
        };

        let mut session = Self {
            child,
            conn: GtpConnection::new(BufReader::new(stdout), stdin),
            color: config.color,
            width: board.width(),
            height: board.height(),
        };
        match initialize(&mut session.conn, board, komi) {
            Ok(()) => {
                info!(
                    "engine '{}' attached, playing {}",
                    config.program, config.color
                );
                Ok(session)
            }
            Err(err) => {
                session.detach();
                Err(err)
            }
        }
    }

    /// Color the engine plays.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn send(&mut self, command: &str) -> Result<String, GtpError> {
        self.conn.send(command)
    }

    pub fn set_komi(&mut self, komi: f64) -> Result<(), GtpError> {
        self.send(&format!("komi {komi:.1}")).map(drop)
    }

    /// Tell the engine about a move.
    pub fn play(&mut self, color: Color, vertex: Vertex) -> Result<(), GtpError> {
        let vertex = format_vertex(vertex, self.height)?;
        self.send(&format!("play {} {vertex}", color_arg(color)))
            .map(drop)
    }

    /// Ask the engine for a move. The engine also plays it on its own board.
    pub fn genmove(&mut self, color: Color) -> Result<(Vertex, String), GtpError> {
        let reply = self.send(&format!("genmove {}", color_arg(color)))?;
        let vertex = parse_vertex(&reply, self.width, self.height)?;
        Ok((vertex, reply))
    }

    /// Kill the process, close both pipes and wait for it to exit.
    ///
    /// Teardown errors are logged and returned; the session is gone either
    /// way.
    pub fn detach(self) -> Vec<io::Error> {
        let EngineSession {
            mut child, conn, ..
        } = self;
        let mut errors = Vec::new();

        if let Err(err) = child.kill() {
            errors.push(err);
        }
        // Closes stdin and stdout.
        drop(conn);
        match child.wait() {
            Ok(status) => debug!("engine exited: {status}"),
            Err(err) => errors.push(err),
        }

        for err in &errors {
            error!("engine teardown: {err}");
        }
        info!("engine detached");
        errors
    }
}

/// Bring a freshly started engine to `board`.
///
/// Checks the command list, sets the board size (the rectangular variant
/// only when needed), sets komi and replays every stone.
pub fn initialize<R: BufRead, W: Write>(
    conn: &mut GtpConnection<R, W>,
    board: &Board,
    komi: f64,
) -> Result<(), GtpError> {
    let listing = conn.send("list_commands")?;
    let supported: HashSet<&str> = listing.lines().map(str::trim).collect();
    for &command in REQUIRED_COMMANDS {
        if !supported.contains(command) {
            return Err(GtpError::Unsupported(command.to_string()));
        }
    }

    let (width, height) = (board.width(), board.height());
    if width > GTP_COLUMNS.len() {
        return Err(GtpError::BoardTooWide(width));
    }
    if board.is_square() {
        conn.send(&format!("boardsize {width}"))?;
    } else if supported.contains(RECTANGULAR_BOARDSIZE) {
        conn.send(&format!("{RECTANGULAR_BOARDSIZE} {width} {height}"))?;
    } else {
        return Err(GtpError::RectangularUnsupported);
    }

    conn.send(&format!("komi {komi:.1}"))?;

    for (pt, color) in board.stones() {
        let vertex = format_point(pt, height)?;
        conn.send(&format!("play {} {vertex}", color_arg(color)))?;
    }
    Ok(())
}
