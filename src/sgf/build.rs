//! Interpretation of a parsed record into a [`GameTree`].
//!
//! Every record node becomes exactly one tree node, including nodes that
//! only carry a comment. Damaged data inside a node (bad coordinates,
//! moves off the board, moves that break the rules) is reported as a
//! warning and skipped or tolerated; only structural problems and an
//! unusable board size fail the import.

use log::{info, warn};

use crate::board::{Board, Color, Point};
use crate::constants::{DEFAULT_BOARD_SIZE, TT_PASS_MAX_DIM};
use crate::error::SgfError;
use crate::sgf::coord;
use crate::sgf::parser::{SgfNode, SgfTree, parse};
use crate::sgf::property::{MoveValue, PointList, Property};
use crate::tree::{GameTree, Mark, Move, NodeId, Setup};

/// Result of importing a record.
#[derive(Debug, Clone)]
pub struct Import {
    pub tree: GameTree,
    /// Value of the root `KM` property, if present.
    pub komi: Option<f64>,
    /// Problems that were skipped over, in record order.
    pub warnings: Vec<String>,
}

/// Parse `text` and build its first game tree.
pub fn import(text: &str) -> Result<Import, SgfError> {
    let trees = parse(text)?;
    let first = trees.first().ok_or(SgfError::Empty)?;
    if trees.len() > 1 {
        info!("record holds {} game trees, importing the first", trees.len());
    }
    build_tree(first)
}

/// Build a game tree from one parsed record tree.
///
/// The main line follows the first variation at every branch, and its
/// last node becomes the current node.
pub fn build_tree(record: &SgfTree) -> Result<Import, SgfError> {
    let root = record.nodes.first().ok_or(SgfError::Empty)?;
    let (width, height) = match root.find("SZ") {
        Some(&Property::Size { width, height }) => (width, height),
        _ => (DEFAULT_BOARD_SIZE, DEFAULT_BOARD_SIZE),
    };

    let mut builder = Builder {
        tree: GameTree::new(width, height)?,
        komi: None,
        warnings: Vec::new(),
    };
    builder.root(root);

    let mut parent = GameTree::ROOT;
    for node in &record.nodes[1..] {
        parent = builder.node(parent, node);
    }
    for variation in &record.variations {
        builder.sequence(parent, variation);
    }

    let mut tree = builder.tree;
    if let Some(&last) = tree.main_line().last() {
        // Ids on the main line always exist.
        let _ = tree.set_current(last);
    }
    if !builder.warnings.is_empty() {
        info!("record imported with {} warnings", builder.warnings.len());
    }

    Ok(Import {
        tree,
        komi: builder.komi,
        warnings: builder.warnings,
    })
}

/// Node contents gathered before the node is created.
#[derive(Default)]
struct Contents<'r> {
    mv: Option<(Color, &'r MoveValue)>,
    setup: Setup,
    marks: Vec<(Mark, Point)>,
    labels: Vec<(Point, &'r str)>,
    comment: Option<&'r str>,
    passthrough: Vec<(String, Vec<String>)>,
}

struct Builder {
    tree: GameTree,
    komi: Option<f64>,
    warnings: Vec<String>,
}

impl Builder {
    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    fn board(&self) -> &Board {
        self.tree.root().board()
    }

    fn sequence(&mut self, parent: NodeId, record: &SgfTree) {
        let mut parent = parent;
        for node in &record.nodes {
            parent = self.node(parent, node);
        }
        for variation in &record.variations {
            self.sequence(parent, variation);
        }
    }

    fn root(&mut self, node: &SgfNode) {
        let contents = self.gather(node, true);
        if let Some((color, _)) = contents.mv {
            self.warn(format!("{color} move on the root node ignored"));
        }
        self.tree.setup_root(&contents.setup);
        self.annotate(GameTree::ROOT, contents);
    }

    fn node(&mut self, parent: NodeId, node: &SgfNode) -> NodeId {
        let contents = self.gather(node, false);
        let mv = match contents.mv {
            None => Move::None,
            Some((color, value)) => self.resolve_move(color, value),
        };

        match self.tree.append_recorded(parent, mv, &contents.setup) {
            Ok((id, violation)) => {
                if let (Some(err), Move::Play(color, pt)) = (violation, mv) {
                    self.warn(format!("node {id}: {color} at {}: {err}, applied anyway", show(pt)));
                }
                self.annotate(id, contents);
                id
            }
            // The parent was created by this builder.
            Err(err) => {
                self.warn(err.to_string());
                parent
            }
        }
    }

    fn resolve_move(&mut self, color: Color, value: &MoveValue) -> Move {
        match *value {
            MoveValue::Pass => Move::Pass(color),
            MoveValue::At(pt) if pt == (TT_PASS_MAX_DIM, TT_PASS_MAX_DIM) && self.tt_is_pass() => {
                Move::Pass(color)
            }
            MoveValue::At(pt) if self.board().contains(pt) => Move::Play(color, pt),
            MoveValue::At(pt) => {
                self.warn(format!("{color} move at {} is off the board, dropped", show(pt)));
                Move::None
            }
            MoveValue::Invalid(ref raw) => {
                self.warn(format!("{color} move has invalid coordinate '{raw}', dropped"));
                Move::None
            }
        }
    }

    fn tt_is_pass(&self) -> bool {
        self.tree.width() <= TT_PASS_MAX_DIM && self.tree.height() <= TT_PASS_MAX_DIM
    }

    /// Sort a node's properties into what goes into the tree.
    fn gather<'r>(&mut self, node: &'r SgfNode, is_root: bool) -> Contents<'r> {
        let mut contents = Contents::default();
        for prop in &node.properties {
            match prop {
                Property::FileFormat(_)
                | Property::GameType(_)
                | Property::Charset(_)
                | Property::Application(_) => {}
                Property::Size { .. } if is_root => {}
                Property::Komi(komi) if is_root => self.komi = Some(*komi),
                Property::Size { .. } => self.warn("SZ outside the root node ignored".to_string()),
                Property::Komi(komi) => contents
                    .passthrough
                    .push(("KM".to_string(), vec![komi.to_string()])),
                Property::Move { color, value } => {
                    if contents.mv.is_some() {
                        self.warn("more than one move in a node, extra move ignored".to_string());
                    } else {
                        contents.mv = Some((*color, value));
                    }
                }
                Property::Setup { kind, points } => {
                    let points = self.on_board(prop.ident(), points);
                    contents.setup.points_mut(*kind).extend(points);
                }
                Property::Mark { mark, points } => {
                    let points = self.on_board(prop.ident(), points);
                    contents.marks.extend(points.into_iter().map(|pt| (*mark, pt)));
                }
                Property::Labels { labels, rejected } => {
                    for raw in rejected {
                        self.warn(format!("LB value '{raw}' is not point:text, skipped"));
                    }
                    for (pt, text) in labels {
                        if self.board().contains(*pt) {
                            contents.labels.push((*pt, text.as_str()));
                        } else {
                            self.warn(format!("LB point {} is off the board, skipped", show(*pt)));
                        }
                    }
                }
                Property::Comment(text) => contents.comment = Some(text.as_str()),
                Property::Unknown { ident, values } => {
                    contents.passthrough.push((ident.clone(), values.clone()));
                }
            }
        }
        contents
    }

    /// Points of a list that fit on the board; the rest are reported.
    fn on_board(&mut self, ident: &str, list: &PointList) -> Vec<Point> {
        for raw in &list.rejected {
            self.warn(format!("{ident} value '{raw}' is not a coordinate, skipped"));
        }
        let mut points = Vec::with_capacity(list.points.len());
        for &pt in &list.points {
            if self.board().contains(pt) {
                points.push(pt);
            } else {
                self.warn(format!("{ident} point {} is off the board, skipped", show(pt)));
            }
        }
        points
    }

    fn annotate(&mut self, id: NodeId, contents: Contents<'_>) {
        let mut results = Vec::new();
        for (mark, pt) in contents.marks {
            results.push(self.tree.set_mark(id, mark, pt, true));
        }
        for (pt, text) in contents.labels {
            results.push(self.tree.set_label(id, pt, text));
        }
        if let Some(comment) = contents.comment {
            results.push(self.tree.set_comment(id, comment));
        }
        if !contents.passthrough.is_empty() {
            results.push(self.tree.set_passthrough(id, contents.passthrough));
        }
        for err in results.into_iter().filter_map(Result::err) {
            self.warn(err.to_string());
        }
    }
}

fn show(pt: Point) -> String {
    coord::encode_point(pt).unwrap_or_else(|| format!("{pt:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SetupKind;

    #[test]
    fn test_default_size_and_komi() {
        let import = import("(;KM[6.5];B[dd])").unwrap();
        assert_eq!((import.tree.width(), import.tree.height()), (19, 19));
        assert_eq!(import.komi, Some(6.5));
        assert!(import.warnings.is_empty());
    }

    #[test]
    fn test_rectangular_size() {
        let import = import("(;SZ[13:7];B[md])").unwrap();
        assert_eq!((import.tree.width(), import.tree.height()), (13, 7));
        assert_eq!(import.tree.current_node().mv(), Move::Play(Color::Black, (12, 3)));
    }

    #[test]
    fn test_oversized_board_rejected() {
        assert!(matches!(import("(;SZ[53])"), Err(SgfError::Board(_))));
        assert!(matches!(import("(;SZ[19:60])"), Err(SgfError::Board(_))));
        assert!(matches!(import("(;SZ[0])"), Err(SgfError::Board(_))));
    }

    #[test]
    fn test_no_game_tree() {
        assert_eq!(import("").unwrap_err(), SgfError::Empty);
    }

    #[test]
    fn test_root_setup_and_annotations() {
        let import = import("(;SZ[9]AB[ee][ff]AW[ge]CR[aa]LB[bb:X]C[start]PB[Shusaku])").unwrap();
        let root = import.tree.root();
        assert_eq!(root.board().get((4, 4)), Some(Color::Black));
        assert_eq!(root.board().get((6, 4)), Some(Color::White));
        assert!(root.added(SetupKind::Black).is_set((5, 5)));
        assert!(root.annotations().is_marked(Mark::Circle, (0, 0)));
        assert_eq!(root.annotations().label((1, 1)), Some("X"));
        assert_eq!(root.comment(), "start");
        assert_eq!(root.passthrough(), &[("PB".to_string(), vec!["Shusaku".to_string()])]);
    }

    #[test]
    fn test_one_tree_node_per_record_node() {
        let text = "(;SZ[9];B[aa];C[just a comment];W[bb](;B[cc])(;B[dd];W[ee]))";
        let record = parse(text).unwrap();
        let import = build_tree(&record[0]).unwrap();
        assert_eq!(import.tree.len(), record[0].node_count());

        let comment_node = import.tree.get(2).unwrap();
        assert_eq!(comment_node.mv(), Move::None);
        assert_eq!(comment_node.comment(), "just a comment");
        assert_eq!(comment_node.player(), Some(Color::Black));
    }

    #[test]
    fn test_main_line_and_current() {
        let import = import("(;SZ[9];B[aa](;W[bb];B[cc])(;W[dd]))").unwrap();
        let tree = &import.tree;
        assert_eq!(tree.main_line().len(), 4);
        assert_eq!(tree.current_node().mv(), Move::Play(Color::Black, (2, 2)));
        assert_eq!(tree.get(1).unwrap().children().len(), 2);
    }

    #[test]
    fn test_pass_forms() {
        let import = import("(;SZ[9];B[];W[tt])").unwrap();
        assert_eq!(import.tree.get(1).unwrap().mv(), Move::Pass(Color::Black));
        // `tt` is off a 9x9 board but reads as a pass on boards up to 19.
        assert_eq!(import.tree.get(2).unwrap().mv(), Move::Pass(Color::White));
        assert!(import.warnings.is_empty());
    }

    #[test]
    fn test_tt_is_a_point_on_large_boards() {
        let import = import("(;SZ[25];B[tt])").unwrap();
        assert_eq!(import.tree.get(1).unwrap().mv(), Move::Play(Color::Black, (19, 19)));
    }

    #[test]
    fn test_bad_coordinates_are_warnings() {
        let import = import("(;SZ[5]AB[aa][zz][a!];B[ee];W[q])").unwrap();
        let root = import.tree.root();
        assert_eq!(root.board().stone_count(), 1);
        assert_eq!(import.warnings.len(), 3, "{:?}", import.warnings);
        assert_eq!(import.tree.len(), 3, "nodes with dropped moves are kept");
        assert_eq!(import.tree.get(2).unwrap().mv(), Move::None);
    }

    #[test]
    fn test_illegal_record_move_applied() {
        let import = import("(;SZ[9];B[ee];W[ee])").unwrap();
        assert_eq!(import.warnings.len(), 1);
        let node = import.tree.get(2).unwrap();
        assert_eq!(node.board().get((4, 4)), Some(Color::White));
    }
}
