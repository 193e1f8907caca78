//! Typed record properties.
//!
//! The parser converts every `IDENT[value]...` group into a [`Property`].
//! Malformed coordinates do not fail the conversion: they are collected in
//! the `rejected` lists so the tree builder can report and skip them.
//! Properties this crate does not interpret are kept as
//! [`Property::Unknown`] and written back unchanged.

use crate::board::{Color, Point};
use crate::error::{SgfError, TextPosition};
use crate::sgf::coord;
use crate::tree::{Mark, SetupKind};

/// Value of a `B` or `W` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveValue {
    /// Empty value.
    Pass,
    /// A decodable coordinate. `tt` is left to the tree builder, which
    /// knows the board size.
    At(Point),
    Invalid(String),
}

/// Decoded point list with the values that could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointList {
    pub points: Vec<Point>,
    pub rejected: Vec<String>,
}

impl PointList {
    /// Decode values of the form `xy` or the rectangle shorthand `xy:xy`.
    pub fn decode(values: &[String]) -> Self {
        let mut list = PointList::default();
        for value in values {
            match decode_range(value) {
                Some(points) => list.points.extend(points),
                None => list.rejected.push(value.clone()),
            }
        }
        list
    }
}

fn decode_range(value: &str) -> Option<Vec<Point>> {
    let Some((from, to)) = value.split_once(':') else {
        return coord::decode_point(value).map(|pt| vec![pt]);
    };
    let (x0, y0) = coord::decode_point(from)?;
    let (x1, y1) = coord::decode_point(to)?;
    let mut points = Vec::new();
    for y in y0.min(y1)..=y0.max(y1) {
        for x in x0.min(x1)..=x0.max(x1) {
            points.push((x, y));
        }
    }
    Some(points)
}

/// One property of a record node.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    FileFormat(String),
    GameType(String),
    Charset(String),
    Application(String),
    Size { width: usize, height: usize },
    Komi(f64),
    Move { color: Color, value: MoveValue },
    Setup { kind: SetupKind, points: PointList },
    Mark { mark: Mark, points: PointList },
    Labels {
        labels: Vec<(Point, String)>,
        rejected: Vec<String>,
    },
    Comment(String),
    Unknown { ident: String, values: Vec<String> },
}

impl Property {
    /// Convert a raw property. `offset` is the byte position of the
    /// identifier in `text`, used for error positions.
    ///
    /// # Errors
    /// [`SgfError::InvalidValue`] for a size or komi that is not a number.
    pub fn from_raw(
        ident: &str,
        values: Vec<String>,
        text: &str,
        offset: usize,
    ) -> Result<Property, SgfError> {
        let first = || values.first().cloned().unwrap_or_default();
        let invalid = |value: &str| SgfError::InvalidValue {
            ident: ident.to_string(),
            value: value.to_string(),
            position: TextPosition::locate(text, offset),
        };

        let prop = match ident {
            "FF" => Property::FileFormat(first()),
            "GM" => Property::GameType(first()),
            "CA" => Property::Charset(first()),
            "AP" => Property::Application(first()),
            "SZ" => {
                let value = first();
                let (width, height) = parse_size(&value).ok_or_else(|| invalid(&value))?;
                Property::Size { width, height }
            }
            "KM" => {
                let value = first();
                let komi = value.trim().parse::<f64>().map_err(|_| invalid(&value))?;
                Property::Komi(komi)
            }
            "B" | "W" => {
                let color = if ident == "B" { Color::Black } else { Color::White };
                let value = first();
                let value = if value.is_empty() {
                    MoveValue::Pass
                } else {
                    coord::decode_point(&value).map_or(MoveValue::Invalid(value), MoveValue::At)
                };
                Property::Move { color, value }
            }
            "AB" | "AW" | "AE" => {
                let kind = match ident {
                    "AB" => SetupKind::Black,
                    "AW" => SetupKind::White,
                    _ => SetupKind::Empty,
                };
                Property::Setup {
                    kind,
                    points: PointList::decode(&values),
                }
            }
            "CR" | "SQ" | "TR" | "MA" => {
                let mark = match ident {
                    "CR" => Mark::Circle,
                    "SQ" => Mark::Square,
                    "TR" => Mark::Triangle,
                    _ => Mark::Cross,
                };
                Property::Mark {
                    mark,
                    points: PointList::decode(&values),
                }
            }
            "LB" => {
                let mut labels = Vec::new();
                let mut rejected = Vec::new();
                for value in values {
                    let decoded = value
                        .split_once(':')
                        .and_then(|(pt, label)| Some((coord::decode_point(pt)?, label.to_string())));
                    match decoded {
                        Some(label) => labels.push(label),
                        None => rejected.push(value),
                    }
                }
                Property::Labels { labels, rejected }
            }
            "C" => Property::Comment(first()),
            _ => Property::Unknown {
                ident: ident.to_string(),
                values,
            },
        };
        Ok(prop)
    }

    /// Identifier as written in a record.
    pub fn ident(&self) -> &str {
        match self {
            Property::FileFormat(_) => "FF",
            Property::GameType(_) => "GM",
            Property::Charset(_) => "CA",
            Property::Application(_) => "AP",
            Property::Size { .. } => "SZ",
            Property::Komi(_) => "KM",
            Property::Move { color: Color::Black, .. } => "B",
            Property::Move { color: Color::White, .. } => "W",
            Property::Setup { kind, .. } => setup_ident(*kind),
            Property::Mark { mark, .. } => mark_ident(*mark),
            Property::Labels { .. } => "LB",
            Property::Comment(_) => "C",
            Property::Unknown { ident, .. } => ident,
        }
    }
}

pub(crate) fn setup_ident(kind: SetupKind) -> &'static str {
    match kind {
        SetupKind::Black => "AB",
        SetupKind::White => "AW",
        SetupKind::Empty => "AE",
    }
}

pub(crate) fn mark_ident(mark: Mark) -> &'static str {
    match mark {
        Mark::Circle => "CR",
        Mark::Square => "SQ",
        Mark::Triangle => "TR",
        Mark::Cross => "MA",
    }
}

/// `N` or `W:H`.
fn parse_size(value: &str) -> Option<(usize, usize)> {
    let value = value.trim();
    match value.split_once(':') {
        Some((w, h)) => Some((w.trim().parse().ok()?, h.trim().parse().ok()?)),
        None => {
            let n = value.parse().ok()?;
            Some((n, n))
        }
    }
}
