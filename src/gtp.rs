//! Go Text Protocol (GTP) client side.
//!
//! Commands are single lines. A response starts with `=` (success) or `?`
//! (failure), optionally followed by the command id, and ends with a blank
//! line. Anything the engine prints before the status character is
//! skipped.
//!
//! GTP vertices name columns with letters that skip `I` and count rows
//! from the bottom edge, so row 1 is the last row of the board.
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use goban::gtp::GtpConnection;
//!
//! let replies = Cursor::new("= C3\n\n");
//! let mut conn = GtpConnection::new(replies, Vec::new());
//! assert_eq!(conn.send("genmove W").unwrap(), "C3");
//! ```

use std::io::{BufRead, Write};

use log::debug;

use crate::board::{Color, Point};
use crate::constants::GTP_COLUMNS;
use crate::error::GtpError;

/// A line-oriented GTP connection over any reader/writer pair.
pub struct GtpConnection<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> GtpConnection<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Send one command and wait for its full response.
    ///
    /// Blocks until the engine answers. Returns the payload with the status
    /// character and id stripped; a `?` response becomes
    /// [`GtpError::Failure`].
    pub fn send(&mut self, command: &str) -> Result<String, GtpError> {
        debug!("gtp >> {command}");
        writeln!(self.writer, "{command}")?;
        self.writer.flush()?;

        let (success, payload) = self.read_response()?;
        debug!("gtp << {}{payload}", if success { "= " } else { "? " });
        if success {
            Ok(payload)
        } else {
            Err(GtpError::Failure(payload))
        }
    }

    fn read_response(&mut self) -> Result<(bool, String), GtpError> {
        let mut line = String::new();

        let (success, first) = loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(GtpError::Eof);
            }
            let text = line.trim_end();
            match text.chars().next() {
                Some('=') => break (true, text[1..].to_string()),
                Some('?') => break (false, text[1..].to_string()),
                _ if text.is_empty() => {}
                _ => debug!("gtp skipped: {text}"),
            }
        };

        let (_, first) = parse_id(&first);
        let mut payload = first.to_string();
        loop {
            line.clear();
            // A stream that ends after the status line ends the response.
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            let text = line.trim_end();
            if text.is_empty() {
                break;
            }
            if !payload.is_empty() {
                payload.push('\n');
            }
            payload.push_str(text);
        }
        Ok((success, payload.trim().to_string()))
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

/// Split an optional numeric id from the start of a response line.
fn parse_id(line: &str) -> (Option<u32>, &str) {
    let trimmed = line.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    match trimmed[..end].parse::<u32>() {
        Ok(id) => (Some(id), trimmed[end..].trim()),
        Err(_) => (None, trimmed.trim()),
    }
}

/// A move as GTP spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertex {
    Pass,
    Resign,
    Point(Point),
}

/// GTP color argument.
pub fn color_arg(color: Color) -> char {
    color.letter()
}

/// Engine name of a point on a board `height` rows tall.
pub fn format_point((x, y): Point, height: usize) -> Result<String, GtpError> {
    let column = GTP_COLUMNS.get(x).ok_or(GtpError::BoardTooWide(x + 1))?;
    Ok(format!("{}{}", *column as char, height - y))
}

pub fn format_vertex(vertex: Vertex, height: usize) -> Result<String, GtpError> {
    match vertex {
        Vertex::Pass => Ok("pass".to_string()),
        Vertex::Resign => Ok("resign".to_string()),
        Vertex::Point(pt) => format_point(pt, height),
    }
}

/// Parse an engine vertex for a `width` x `height` board. Case-insensitive.
pub fn parse_vertex(text: &str, width: usize, height: usize) -> Result<Vertex, GtpError> {
    let text = text.trim();
    let invalid = || GtpError::InvalidVertex(text.to_string());

    if text.eq_ignore_ascii_case("pass") {
        return Ok(Vertex::Pass);
    }
    if text.eq_ignore_ascii_case("resign") {
        return Ok(Vertex::Resign);
    }

    let mut chars = text.chars();
    let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
    let x = GTP_COLUMNS
        .iter()
        .position(|&c| c as char == letter)
        .ok_or_else(invalid)?;
    let row: usize = chars.as_str().parse().map_err(|_| invalid())?;

    if x >= width || row == 0 || row > height {
        return Err(invalid());
    }
    Ok(Vertex::Point((x, height - row)))
}
