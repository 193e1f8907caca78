//! Branching game history.
//!
//! The tree is an arena: nodes live in a `Vec` owned by [`GameTree`] and
//! refer to each other by [`NodeId`]. A node is immutable once created,
//! except for its comment and annotations. Variations are formed by
//! navigating to an earlier node and creating a new child there; the old
//! line stays in place as a sibling.

use std::collections::BTreeMap;

use crate::board::{Board, Color, Grid, Point};
use crate::error::{BoardError, MoveError, TreeError};
use crate::rules::{apply_move, check_move};

/// Index of a node in its tree. Ids are assigned in creation order.
pub type NodeId = usize;

/// The move recorded at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Root, setup-only or comment-only node.
    None,
    Pass(Color),
    Play(Color, Point),
}

impl Move {
    pub fn color(&self) -> Option<Color> {
        match *self {
            Move::None => None,
            Move::Pass(c) | Move::Play(c, _) => Some(c),
        }
    }
}

/// What a setup edit puts on a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupKind {
    Black,
    White,
    Empty,
}

impl SetupKind {
    fn stone(self) -> Option<Color> {
        match self {
            SetupKind::Black => Some(Color::Black),
            SetupKind::White => Some(Color::White),
            SetupKind::Empty => None,
        }
    }
}

/// Stones placed or cleared outside of ordinary play.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Setup {
    pub black: Vec<Point>,
    pub white: Vec<Point>,
    pub empty: Vec<Point>,
}

impl Setup {
    pub fn single(kind: SetupKind, pt: Point) -> Self {
        let mut setup = Setup::default();
        setup.points_mut(kind).push(pt);
        setup
    }

    pub fn is_empty(&self) -> bool {
        self.black.is_empty() && self.white.is_empty() && self.empty.is_empty()
    }

    pub fn points(&self, kind: SetupKind) -> &[Point] {
        match kind {
            SetupKind::Black => &self.black,
            SetupKind::White => &self.white,
            SetupKind::Empty => &self.empty,
        }
    }

    pub fn points_mut(&mut self, kind: SetupKind) -> &mut Vec<Point> {
        match kind {
            SetupKind::Black => &mut self.black,
            SetupKind::White => &mut self.white,
            SetupKind::Empty => &mut self.empty,
        }
    }

    fn entries(&self) -> impl Iterator<Item = (SetupKind, Point)> + '_ {
        [SetupKind::Black, SetupKind::White, SetupKind::Empty]
            .into_iter()
            .flat_map(move |kind| self.points(kind).iter().map(move |&pt| (kind, pt)))
    }
}

/// A change that produces a new node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Play(Color, Point),
    Pass(Color),
    Setup(Setup),
}

/// Point-list annotation shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Circle,
    Square,
    Triangle,
    Cross,
}

impl Mark {
    pub const ALL: [Mark; 4] = [Mark::Circle, Mark::Square, Mark::Triangle, Mark::Cross];
}

/// Per-node board annotations: four shape overlays plus text labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotations {
    circle: Grid<bool>,
    square: Grid<bool>,
    triangle: Grid<bool>,
    cross: Grid<bool>,
    labels: BTreeMap<Point, String>,
}

impl Annotations {
    pub fn new(width: usize, height: usize) -> Self {
        let blank = Grid::filled(width, height, false);
        Self {
            circle: blank.clone(),
            square: blank.clone(),
            triangle: blank.clone(),
            cross: blank,
            labels: BTreeMap::new(),
        }
    }

    pub fn marks(&self, mark: Mark) -> &Grid<bool> {
        match mark {
            Mark::Circle => &self.circle,
            Mark::Square => &self.square,
            Mark::Triangle => &self.triangle,
            Mark::Cross => &self.cross,
        }
    }

    fn marks_mut(&mut self, mark: Mark) -> &mut Grid<bool> {
        match mark {
            Mark::Circle => &mut self.circle,
            Mark::Square => &mut self.square,
            Mark::Triangle => &mut self.triangle,
            Mark::Cross => &mut self.cross,
        }
    }

    pub fn is_marked(&self, mark: Mark, pt: Point) -> bool {
        self.marks(mark).is_set(pt)
    }

    /// Returns `false` if the point is off the board.
    pub fn set_mark(&mut self, mark: Mark, pt: Point, on: bool) -> bool {
        self.marks_mut(mark).set(pt, on)
    }

    pub fn label(&self, pt: Point) -> Option<&str> {
        self.labels.get(&pt).map(String::as_str)
    }

    /// Set a label; an empty text removes it.
    pub fn set_label(&mut self, pt: Point, text: &str) -> bool {
        if !self.circle.contains(pt) {
            return false;
        }
        if text.is_empty() {
            self.labels.remove(&pt);
        } else {
            self.labels.insert(pt, text.to_string());
        }
        true
    }

    /// Labels in `(x, y)` order.
    pub fn labels(&self) -> impl Iterator<Item = (Point, &str)> + '_ {
        self.labels.iter().map(|(&pt, s)| (pt, s.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && Mark::ALL.iter().all(|&m| !self.marks(m).any())
    }
}

/// Whether play may continue directly from a node that only holds setup
/// edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SetupMovePolicy {
    #[default]
    Allow,
    Forbid,
}

/// One point in the game history.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    board: Board,
    mv: Move,
    player: Option<Color>,
    ko: Option<Point>,
    added_black: Grid<bool>,
    added_white: Grid<bool>,
    added_empty: Grid<bool>,
    annotations: Annotations,
    comment: String,
    passthrough: Vec<(String, Vec<String>)>,
}

impl Node {
    fn new(id: NodeId, parent: Option<NodeId>, board: Board, player: Option<Color>) -> Self {
        let (w, h) = (board.width(), board.height());
        let blank = Grid::filled(w, h, false);
        Self {
            id,
            parent,
            children: Vec::new(),
            board,
            mv: Move::None,
            player,
            ko: None,
            added_black: blank.clone(),
            added_white: blank.clone(),
            added_empty: blank,
            annotations: Annotations::new(w, h),
            comment: String::new(),
            passthrough: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in order; the first child continues the main line.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mv(&self) -> Move {
        self.mv
    }

    /// Color that moved at this node; setup nodes inherit their parent's.
    pub fn player(&self) -> Option<Color> {
        self.player
    }

    /// Color to move after this node.
    pub fn to_move(&self) -> Color {
        self.player.map_or(Color::Black, Color::opposite)
    }

    pub fn ko(&self) -> Option<Point> {
        self.ko
    }

    pub fn added(&self, kind: SetupKind) -> &Grid<bool> {
        match kind {
            SetupKind::Black => &self.added_black,
            SetupKind::White => &self.added_white,
            SetupKind::Empty => &self.added_empty,
        }
    }

    pub fn has_setup(&self) -> bool {
        self.added_black.any() || self.added_white.any() || self.added_empty.any()
    }

    /// Carries setup edits and no move.
    pub fn is_setup_only(&self) -> bool {
        self.mv == Move::None && self.has_setup()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Record properties this crate does not interpret, kept verbatim.
    pub fn passthrough(&self) -> &[(String, Vec<String>)] {
        &self.passthrough
    }

    /// Short description for tree views: `Root`, `B:Setup`, `W:Pass`, `B:(3,4)`.
    pub fn label(&self) -> String {
        let who = self.player.map(|c| c.letter().to_string()).unwrap_or_default();
        match self.mv {
            _ if self.parent.is_none() => "Root".to_string(),
            Move::Play(c, (x, y)) => format!("{}:({x},{y})", c.letter()),
            Move::Pass(c) => format!("{}:Pass", c.letter()),
            Move::None if self.has_setup() => format!("{who}:Setup"),
            Move::None => format!("{who}:Node"),
        }
    }

    fn apply_setup(&mut self, setup: &Setup) {
        for (kind, pt) in setup.entries() {
            let _ = self.board.set(pt, kind.stone());
            self.added_black.set(pt, kind == SetupKind::Black);
            self.added_white.set(pt, kind == SetupKind::White);
            self.added_empty.set(pt, kind == SetupKind::Empty);
        }
    }
}

/// The whole history of one game.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<Node>,
    current: NodeId,
    policy: SetupMovePolicy,
}

impl GameTree {
    /// Root id; the root is always the first node created.
    pub const ROOT: NodeId = 0;

    /// Fresh tree with an empty board at the root.
    pub fn new(width: usize, height: usize) -> Result<Self, BoardError> {
        let board = Board::new(width, height)?;
        Ok(Self {
            nodes: vec![Node::new(Self::ROOT, None, board, None)],
            current: Self::ROOT,
            policy: SetupMovePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: SetupMovePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SetupMovePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: SetupMovePolicy) {
        self.policy = policy;
    }

    pub fn width(&self) -> usize {
        self.nodes[Self::ROOT].board.width()
    }

    pub fn height(&self) -> usize {
        self.nodes[Self::ROOT].board.height()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn current_node(&self) -> &Node {
        &self.nodes[self.current]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id).ok_or(TreeError::UnknownNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    /// Move the current-node cursor. Never changes the tree itself.
    pub fn set_current(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.get(id)?;
        self.current = id;
        Ok(())
    }

    /// Create a child of `parent` by applying `edit` to a copy of its board.
    ///
    /// Moves go through the rules engine and are rejected when illegal.
    /// The cursor is not moved.
    pub fn create_child(&mut self, parent: NodeId, edit: Edit) -> Result<NodeId, TreeError> {
        let parent_node = self.get(parent)?;
        match edit {
            Edit::Play(color, pt) => {
                self.check_policy(parent_node)?;
                check_move(&parent_node.board, pt, color, parent_node.ko).map_err(|source| {
                    TreeError::IllegalMove {
                        color,
                        point: pt,
                        source,
                    }
                })?;
                Ok(self.push_move(parent, Move::Play(color, pt)))
            }
            Edit::Pass(color) => {
                self.check_policy(parent_node)?;
                Ok(self.push_move(parent, Move::Pass(color)))
            }
            Edit::Setup(setup) => {
                let board = &parent_node.board;
                if let Some((_, pt)) = setup.entries().find(|&(_, pt)| !board.contains(pt)) {
                    return Err(BoardError::OutOfBounds {
                        point: pt,
                        width: board.width(),
                        height: board.height(),
                    }
                    .into());
                }
                let id = self.push_move(parent, Move::None);
                self.nodes[id].apply_setup(&setup);
                Ok(id)
            }
        }
    }

    fn check_policy(&self, parent: &Node) -> Result<(), TreeError> {
        if self.policy == SetupMovePolicy::Forbid && parent.is_setup_only() {
            return Err(TreeError::SetupNode(parent.id));
        }
        Ok(())
    }

    /// Append a node without legality checks. `parent` must exist.
    fn push_move(&mut self, parent: NodeId, mv: Move) -> NodeId {
        let id = self.nodes.len();
        let parent_node = &self.nodes[parent];
        let mut node = match mv {
            Move::Play(color, pt) => {
                let outcome = apply_move(&parent_node.board, pt, color);
                let mut node = Node::new(id, Some(parent), outcome.board, Some(color));
                node.ko = outcome.ko;
                node
            }
            Move::Pass(color) => Node::new(id, Some(parent), parent_node.board.clone(), Some(color)),
            Move::None => Node::new(id, Some(parent), parent_node.board.clone(), parent_node.player),
        };
        node.mv = mv;
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }

    /// Append a node read from a record.
    ///
    /// Records are authoritative, so an illegal move is still applied; the
    /// rule it breaks is returned for the caller to report.
    pub(crate) fn append_recorded(
        &mut self,
        parent: NodeId,
        mv: Move,
        setup: &Setup,
    ) -> Result<(NodeId, Option<MoveError>), TreeError> {
        let parent_node = self.get(parent)?;
        let violation = match mv {
            Move::Play(color, pt) => check_move(&parent_node.board, pt, color, parent_node.ko).err(),
            _ => None,
        };
        let id = self.push_move(parent, mv);
        self.nodes[id].apply_setup(setup);
        Ok((id, violation))
    }

    /// Apply setup edits to the root board. Only valid on a tree with no
    /// other nodes.
    pub(crate) fn setup_root(&mut self, setup: &Setup) {
        debug_assert!(self.is_empty());
        self.nodes[Self::ROOT].apply_setup(setup);
    }

    pub(crate) fn set_passthrough(&mut self, id: NodeId, props: Vec<(String, Vec<String>)>) -> Result<(), TreeError> {
        self.get_mut(id)?.passthrough = props;
        Ok(())
    }

    pub fn set_comment(&mut self, id: NodeId, comment: &str) -> Result<(), TreeError> {
        self.get_mut(id)?.comment = comment.to_string();
        Ok(())
    }

    pub fn set_mark(&mut self, id: NodeId, mark: Mark, pt: Point, on: bool) -> Result<(), TreeError> {
        let node = self.get_mut(id)?;
        if node.annotations.set_mark(mark, pt, on) {
            Ok(())
        } else {
            Err(out_of_bounds(&node.board, pt).into())
        }
    }

    /// Flip a mark, returning its new state.
    pub fn toggle_mark(&mut self, id: NodeId, mark: Mark, pt: Point) -> Result<bool, TreeError> {
        let on = !self.get(id)?.annotations.is_marked(mark, pt);
        self.set_mark(id, mark, pt, on)?;
        Ok(on)
    }

    pub fn set_label(&mut self, id: NodeId, pt: Point, text: &str) -> Result<(), TreeError> {
        let node = self.get_mut(id)?;
        if node.annotations.set_label(pt, text) {
            Ok(())
        } else {
            Err(out_of_bounds(&node.board, pt).into())
        }
    }

    /// Ids from the root down to `id`, inclusive.
    pub fn path_to(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = vec![id];
        let mut node = self.get(id)?;
        while let Some(parent) = node.parent {
            path.push(parent);
            node = &self.nodes[parent];
        }
        path.reverse();
        Ok(path)
    }

    /// Ids along first children, starting at the root.
    pub fn main_line(&self) -> Vec<NodeId> {
        let mut line = vec![Self::ROOT];
        let mut node = self.root();
        while let Some(&first) = node.children.first() {
            line.push(first);
            node = &self.nodes[first];
        }
        line
    }

    /// Depth-first pre-order walk, children in order.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }
}

fn out_of_bounds(board: &Board, pt: Point) -> BoardError {
    BoardError::OutOfBounds {
        point: pt,
        width: board.width(),
        height: board.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree() {
        let tree = GameTree::new(9, 9).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.current(), GameTree::ROOT);
        assert_eq!(tree.root().to_move(), Color::Black);
        assert_eq!(tree.root().label(), "Root");
        assert!(GameTree::new(60, 9).is_err());
    }

    #[test]
    fn test_create_child_does_not_move_cursor() {
        let mut tree = GameTree::new(9, 9).unwrap();
        let id = tree.create_child(GameTree::ROOT, Edit::Play(Color::Black, (4, 4))).unwrap();
        assert_eq!(tree.current(), GameTree::ROOT);
        assert_eq!(tree.root().children(), &[id]);
        assert_eq!(tree.get(id).unwrap().parent(), Some(GameTree::ROOT));
        assert_eq!(tree.root().board().stone_count(), 0, "parent board untouched");
        assert_eq!(tree.get(id).unwrap().board().get((4, 4)), Some(Color::Black));
    }

    #[test]
    fn test_illegal_move_rejected() {
        let mut tree = GameTree::new(9, 9).unwrap();
        let a = tree.create_child(GameTree::ROOT, Edit::Play(Color::Black, (4, 4))).unwrap();
        let err = tree.create_child(a, Edit::Play(Color::White, (4, 4))).unwrap_err();
        assert!(matches!(
            err,
            TreeError::IllegalMove {
                source: MoveError::Occupied,
                ..
            }
        ));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_variations_are_siblings() {
        let mut tree = GameTree::new(9, 9).unwrap();
        let a = tree.create_child(GameTree::ROOT, Edit::Play(Color::Black, (2, 2))).unwrap();
        let b = tree.create_child(GameTree::ROOT, Edit::Play(Color::Black, (6, 6))).unwrap();
        assert_eq!(tree.root().children(), &[a, b]);
        assert_eq!(tree.main_line(), vec![GameTree::ROOT, a]);
        assert_eq!(tree.depth_first(), vec![GameTree::ROOT, a, b]);
    }

    #[test]
    fn test_setup_child() {
        let mut tree = GameTree::new(9, 9).unwrap();
        let a = tree.create_child(GameTree::ROOT, Edit::Play(Color::Black, (2, 2))).unwrap();
        let mut setup = Setup::single(SetupKind::White, (3, 3));
        setup.empty.push((2, 2));
        let s = tree.create_child(a, Edit::Setup(setup)).unwrap();
        let node = tree.get(s).unwrap();
        assert_eq!(node.board().get((3, 3)), Some(Color::White));
        assert_eq!(node.board().get((2, 2)), None);
        assert!(node.added(SetupKind::White).is_set((3, 3)));
        assert!(node.added(SetupKind::Empty).is_set((2, 2)));
        assert_eq!(node.player(), Some(Color::Black));
        assert_eq!(node.to_move(), Color::White);
        assert_eq!(node.label(), "B:Setup");
    }

    #[test]
    fn test_setup_out_of_bounds() {
        let mut tree = GameTree::new(5, 5).unwrap();
        let err = tree
            .create_child(GameTree::ROOT, Edit::Setup(Setup::single(SetupKind::Black, (5, 0))))
            .unwrap_err();
        assert!(matches!(err, TreeError::Board(BoardError::OutOfBounds { .. })));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_setup_policy() {
        let mut tree = GameTree::new(9, 9).unwrap().with_policy(SetupMovePolicy::Forbid);
        let s = tree
            .create_child(GameTree::ROOT, Edit::Setup(Setup::single(SetupKind::Black, (3, 3))))
            .unwrap();
        assert_eq!(
            tree.create_child(s, Edit::Play(Color::White, (5, 5))),
            Err(TreeError::SetupNode(s))
        );
        assert_eq!(tree.create_child(s, Edit::Pass(Color::White)), Err(TreeError::SetupNode(s)));

        tree.set_policy(SetupMovePolicy::Allow);
        assert!(tree.create_child(s, Edit::Play(Color::White, (5, 5))).is_ok());
    }

    #[test]
    fn test_pass_keeps_board_clears_ko() {
        let mut tree = GameTree::new(9, 9).unwrap();
        let a = tree.create_child(GameTree::ROOT, Edit::Play(Color::Black, (0, 0))).unwrap();
        let p = tree.create_child(a, Edit::Pass(Color::White)).unwrap();
        let node = tree.get(p).unwrap();
        assert_eq!(node.mv(), Move::Pass(Color::White));
        assert_eq!(node.board(), tree.get(a).unwrap().board());
        assert_eq!(node.ko(), None);
        assert_eq!(node.label(), "W:Pass");
    }

    #[test]
    fn test_annotations_editable() {
        let mut tree = GameTree::new(9, 9).unwrap();
        assert!(tree.toggle_mark(GameTree::ROOT, Mark::Triangle, (1, 1)).unwrap());
        assert!(!tree.toggle_mark(GameTree::ROOT, Mark::Triangle, (1, 1)).unwrap());
        tree.set_label(GameTree::ROOT, (2, 3), "A").unwrap();
        tree.set_comment(GameTree::ROOT, "opening").unwrap();
        assert_eq!(tree.root().annotations().label((2, 3)), Some("A"));
        assert_eq!(tree.root().comment(), "opening");
        tree.set_label(GameTree::ROOT, (2, 3), "").unwrap();
        assert!(tree.root().annotations().is_empty());
        assert!(tree.set_mark(GameTree::ROOT, Mark::Circle, (9, 9), true).is_err());
    }

    #[test]
    fn test_path_and_navigation() {
        let mut tree = GameTree::new(9, 9).unwrap();
        let a = tree.create_child(GameTree::ROOT, Edit::Play(Color::Black, (2, 2))).unwrap();
        let b = tree.create_child(a, Edit::Play(Color::White, (3, 3))).unwrap();
        assert_eq!(tree.path_to(b).unwrap(), vec![GameTree::ROOT, a, b]);
        tree.set_current(b).unwrap();
        assert_eq!(tree.current_node().to_move(), Color::Black);
        assert_eq!(tree.set_current(42), Err(TreeError::UnknownNode(42)));
        assert_eq!(tree.current(), b);
    }
}
