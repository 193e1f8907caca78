//! Record serialization.
//!
//! Output is a depth-first walk. A node with one child continues the
//! current sequence; a node with several children opens one parenthesized
//! variation per child. A tree without branches is one flat sequence.

use std::fmt::Write as _;

use crate::board::Point;
use crate::constants::{SGF_APPLICATION, SGF_CHARSET, SGF_FILE_FORMAT, SGF_GAME_TYPE};
use crate::sgf::coord;
use crate::sgf::property::{mark_ident, setup_ident};
use crate::tree::{GameTree, Mark, Move, Node, NodeId, SetupKind};

/// Serialize a tree without a komi property.
pub fn serialize(tree: &GameTree) -> String {
    RecordWriter::new(tree).finish()
}

/// Builder for record text.
pub struct RecordWriter<'a> {
    tree: &'a GameTree,
    komi: Option<f64>,
    out: String,
}

impl<'a> RecordWriter<'a> {
    pub fn new(tree: &'a GameTree) -> Self {
        Self {
            tree,
            komi: None,
            out: String::new(),
        }
    }

    /// Emit `KM` on the root.
    pub fn komi(mut self, komi: f64) -> Self {
        self.komi = Some(komi);
        self
    }

    pub fn finish(mut self) -> String {
        let tree = self.tree;
        let root = tree.root();

        self.out.push_str("(;");
        self.property("FF", &SGF_FILE_FORMAT.to_string());
        self.property("GM", &SGF_GAME_TYPE.to_string());
        self.property("CA", SGF_CHARSET);
        self.property("AP", SGF_APPLICATION);
        let size = if root.board().is_square() {
            tree.width().to_string()
        } else {
            format!("{}:{}", tree.width(), tree.height())
        };
        self.property("SZ", &size);
        if let Some(komi) = self.komi {
            self.property("KM", &format_komi(komi));
        }
        self.node(root);
        self.children(GameTree::ROOT);
        self.out.push_str(")\n");
        self.out
    }

    /// Write the descendants of `id`, following single children without
    /// recursion.
    fn children(&mut self, id: NodeId) {
        let tree = self.tree;
        let mut current = id;
        loop {
            let Some(node) = tree.node(current) else {
                return;
            };
            match node.children() {
                [] => return,
                [only] => {
                    current = *only;
                    if let Some(child) = tree.node(current) {
                        self.out.push_str("\n;");
                        self.node(child);
                    }
                }
                many => {
                    for &child_id in many {
                        if let Some(child) = tree.node(child_id) {
                            self.out.push_str("\n(;");
                            self.node(child);
                            self.children(child_id);
                            self.out.push(')');
                        }
                    }
                    return;
                }
            }
        }
    }

    fn node(&mut self, node: &Node) {
        match node.mv() {
            Move::Play(color, pt) => self.points(&color.letter().to_string(), [pt]),
            Move::Pass(color) => self.property(&color.letter().to_string(), ""),
            Move::None => {}
        }
        if !node.comment().is_empty() {
            self.property("C", node.comment());
        }

        let annotations = node.annotations();
        for mark in Mark::ALL {
            self.points(mark_ident(mark), annotations.marks(mark).marked());
        }
        let labels: Vec<String> = annotations
            .labels()
            .filter_map(|(pt, text)| Some(format!("{}:{}", coord::encode_point(pt)?, text)))
            .collect();
        self.values("LB", labels.iter().map(String::as_str));

        for kind in [SetupKind::Black, SetupKind::White, SetupKind::Empty] {
            self.points(setup_ident(kind), node.added(kind).marked());
        }

        for (ident, values) in node.passthrough() {
            self.values(ident, values.iter().map(String::as_str));
        }
    }

    fn property(&mut self, ident: &str, value: &str) {
        self.values(ident, std::iter::once(value));
    }

    fn points(&mut self, ident: &str, points: impl IntoIterator<Item = Point>) {
        let codes: Vec<String> = points.into_iter().filter_map(coord::encode_point).collect();
        self.values(ident, codes.iter().map(String::as_str));
    }

    /// Write `IDENT[v1][v2]...`; nothing when there are no values.
    fn values<'v>(&mut self, ident: &str, values: impl IntoIterator<Item = &'v str>) {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return;
        }
        self.out.push_str(ident);
        for value in values {
            let _ = write!(self.out, "[{}]", escape(value));
        }
    }
}

/// Escape `\` and `]` inside a value.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\\' || ch == ']' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn format_komi(komi: f64) -> String {
    if komi.fract() == 0.0 {
        format!("{komi:.1}")
    } else {
        komi.to_string()
    }
}
