//! The command surface a front-end drives.
//!
//! A [`Session`] owns everything one open game needs: the tree, the
//! options, the scoring overlay while scoring, and the attached engine.
//! Every command is a method; nothing is global, so independent sessions
//! can live side by side.
//!
//! Scoring mode ends as soon as the position changes or the cursor moves.

use log::{info, warn};

use crate::board::{Color, Point};
use crate::constants::{DEFAULT_BOARD_SIZE, DEFAULT_KOMI};
use crate::engine::{EngineConfig, EngineSession};
use crate::error::{GtpError, SessionError};
use crate::gtp::{Vertex, format_vertex};
use crate::rules::check_move;
use crate::score::{Score, TerritoryMap};
use crate::sgf::{self, RecordWriter};
use crate::tree::{Edit, GameTree, Mark, Move, Node, NodeId, Setup, SetupKind, SetupMovePolicy};

/// Runtime settings of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub width: usize,
    pub height: usize,
    pub komi: f64,
    pub setup_moves: SetupMovePolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_SIZE,
            height: DEFAULT_BOARD_SIZE,
            komi: DEFAULT_KOMI,
            setup_moves: SetupMovePolicy::default(),
        }
    }
}

/// What the engine did in answer to a local move.
#[derive(Debug)]
pub enum EngineReply {
    /// The engine played; the node holds its move.
    Move(NodeId),
    /// The engine passed. `game_over` is set when the local move was a
    /// pass too.
    Pass { node: NodeId, game_over: bool },
    Resigned,
    /// The exchange failed and the engine was detached.
    Detached(GtpError),
}

/// Result of a local move or pass.
#[derive(Debug)]
pub struct Played {
    /// Node created for the local move.
    pub node: NodeId,
    /// `None` when no engine is attached or it is not the engine's turn.
    pub engine: Option<EngineReply>,
}

/// One open game.
pub struct Session {
    tree: GameTree,
    options: SessionOptions,
    scoring: Option<TerritoryMap>,
    engine: Option<EngineSession>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Result<Self, SessionError> {
        let tree = GameTree::new(options.width, options.height)?.with_policy(options.setup_moves);
        Ok(Self {
            tree,
            options,
            scoring: None,
            engine: None,
        })
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    pub fn current(&self) -> &Node {
        self.tree.current_node()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn komi(&self) -> f64 {
        self.options.komi
    }

    pub fn is_scoring(&self) -> bool {
        self.scoring.is_some()
    }

    pub fn territory(&self) -> Option<&TerritoryMap> {
        self.scoring.as_ref()
    }

    pub fn engine_color(&self) -> Option<Color> {
        self.engine.as_ref().map(EngineSession::color)
    }

    /// Discard the game and start an empty board. Detaches any engine.
    pub fn new_board(&mut self, width: usize, height: usize) -> Result<(), SessionError> {
        let tree = GameTree::new(width, height)?.with_policy(self.options.setup_moves);
        self.detach_engine();
        self.scoring = None;
        self.tree = tree;
        self.options.width = width;
        self.options.height = height;
        Ok(())
    }

    /// Replace the game with a record. On any error the session is left as
    /// it was. Returns the warnings raised while reading the record.
    pub fn import_record(&mut self, text: &str) -> Result<Vec<String>, SessionError> {
        let import = sgf::import(text)?;
        self.detach_engine();
        self.scoring = None;
        self.tree = import.tree.with_policy(self.options.setup_moves);
        self.options.width = self.tree.width();
        self.options.height = self.tree.height();
        if let Some(komi) = import.komi {
            self.options.komi = komi;
        }
        info!(
            "imported {}x{} record with {} nodes",
            self.options.width,
            self.options.height,
            self.tree.len()
        );
        Ok(import.warnings)
    }

    pub fn export_record(&self) -> String {
        RecordWriter::new(&self.tree).komi(self.options.komi).finish()
    }

    /// Play a stone for the side to move at the current node.
    pub fn play(&mut self, pt: Point) -> Result<Played, SessionError> {
        let color = self.current().to_move();
        self.local_move(Edit::Play(color, pt), color, Vertex::Point(pt))
    }

    /// Pass for the side to move at the current node.
    pub fn pass(&mut self) -> Result<Played, SessionError> {
        let color = self.current().to_move();
        self.local_move(Edit::Pass(color), color, Vertex::Pass)
    }

    fn local_move(&mut self, edit: Edit, color: Color, vertex: Vertex) -> Result<Played, SessionError> {
        let node = self.tree.create_child(self.tree.current(), edit)?;
        self.tree.set_current(node)?;
        self.scoring = None;
        let engine = self.engine_reply(node, color, vertex);
        Ok(Played { node, engine })
    }

    /// Let the engine answer a move of `color` recorded at `after`.
    fn engine_reply(&mut self, after: NodeId, color: Color, vertex: Vertex) -> Option<EngineReply> {
        if self.engine_color()? == color {
            return None;
        }
        match self.exchange(after, color, vertex) {
            Ok(reply) => Some(reply),
            Err(err) => {
                warn!("engine exchange failed: {err}");
                self.detach_engine();
                Some(EngineReply::Detached(err))
            }
        }
    }

    fn exchange(&mut self, after: NodeId, color: Color, vertex: Vertex) -> Result<EngineReply, GtpError> {
        let engine = self.engine.as_mut().ok_or(GtpError::NotAttached)?;
        engine.play(color, vertex)?;
        self.engine_move(after, color.opposite(), vertex == Vertex::Pass)
    }

    /// Ask the engine for a move of `color` and record it as a child of
    /// `after`, checked against the rules first.
    fn engine_move(&mut self, after: NodeId, color: Color, after_pass: bool) -> Result<EngineReply, GtpError> {
        let engine = self.engine.as_mut().ok_or(GtpError::NotAttached)?;
        let (reply, text) = engine.genmove(color)?;

        let edit = match reply {
            Vertex::Resign => {
                info!("engine resigned");
                return Ok(EngineReply::Resigned);
            }
            Vertex::Pass => Edit::Pass(color),
            Vertex::Point(pt) => {
                let parent = self.tree.get(after)?;
                check_move(parent.board(), pt, color, parent.ko())
                    .map_err(|source| GtpError::IllegalMove { vertex: text, source })?;
                Edit::Play(color, pt)
            }
        };

        let node = self.tree.create_child(after, edit)?;
        // Only follow the engine if nothing else moved the cursor meanwhile.
        if self.tree.current() == after {
            self.tree.set_current(node)?;
        }
        Ok(match reply {
            Vertex::Pass => EngineReply::Pass {
                node,
                game_over: after_pass,
            },
            _ => EngineReply::Move(node),
        })
    }

    /// Add, change or clear a stone outside of play, as a new node.
    pub fn setup_edit(&mut self, pt: Point, kind: SetupKind) -> Result<NodeId, SessionError> {
        let node = self
            .tree
            .create_child(self.tree.current(), Edit::Setup(Setup::single(kind, pt)))?;
        self.tree.set_current(node)?;
        self.scoring = None;
        Ok(node)
    }

    pub fn set_annotation(&mut self, pt: Point, mark: Mark, on: bool) -> Result<(), SessionError> {
        Ok(self.tree.set_mark(self.tree.current(), mark, pt, on)?)
    }

    /// Flip a mark on the current node, returning its new state.
    pub fn toggle_annotation(&mut self, pt: Point, mark: Mark) -> Result<bool, SessionError> {
        Ok(self.tree.toggle_mark(self.tree.current(), mark, pt)?)
    }

    /// Set a label on the current node; an empty text removes it.
    pub fn set_label(&mut self, pt: Point, text: &str) -> Result<(), SessionError> {
        Ok(self.tree.set_label(self.tree.current(), pt, text)?)
    }

    pub fn set_comment(&mut self, text: &str) -> Result<(), SessionError> {
        Ok(self.tree.set_comment(self.tree.current(), text)?)
    }

    /// Make `id` the current node.
    pub fn navigate(&mut self, id: NodeId) -> Result<(), SessionError> {
        self.tree.set_current(id)?;
        self.scoring = None;
        Ok(())
    }

    /// Step to the parent of the current node. Returns `false` at the root.
    pub fn back(&mut self) -> Result<bool, SessionError> {
        match self.current().parent() {
            Some(parent) => self.navigate(parent).map(|()| true),
            None => Ok(false),
        }
    }

    /// Score the current position, starting from automatic territory.
    pub fn enter_scoring(&mut self) -> &TerritoryMap {
        self.scoring.insert(TerritoryMap::for_node(self.tree.current_node()))
    }

    pub fn exit_scoring(&mut self) {
        self.scoring = None;
    }

    /// Mark the group at `pt` dead (or alive again).
    pub fn toggle_group_ownership(&mut self, pt: Point) -> Result<Score, SessionError> {
        let map = self.scoring.as_mut().ok_or(SessionError::NotScoring)?;
        if !map.toggle_group_ownership(self.tree.current_node().board(), pt) {
            return Err(SessionError::NoStone(pt));
        }
        Ok(map.score(self.options.komi))
    }

    pub fn score(&self) -> Result<Score, SessionError> {
        let map = self.scoring.as_ref().ok_or(SessionError::NotScoring)?;
        Ok(map.score(self.options.komi))
    }

    /// Change komi, passing it on to an attached engine.
    pub fn set_komi(&mut self, komi: f64) -> Result<(), SessionError> {
        self.options.komi = komi;
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        if let Err(err) = engine.set_komi(komi) {
            self.detach_engine();
            return Err(err.into());
        }
        Ok(())
    }

    pub fn set_setup_policy(&mut self, policy: SetupMovePolicy) {
        self.options.setup_moves = policy;
        self.tree.set_policy(policy);
    }

    /// Start an engine on the current position, replacing any attached one.
    ///
    /// If the engine is to move at the current node it is asked for a move
    /// right away.
    pub fn attach_engine(&mut self, config: &EngineConfig) -> Result<Option<EngineReply>, SessionError> {
        self.detach_engine();
        let node = self.tree.current_node();
        let engine = EngineSession::attach(config, node.board(), self.options.komi)?;
        let to_move = node.to_move();
        let after_pass = matches!(node.mv(), Move::Pass(_));
        self.engine = Some(engine);

        if to_move != config.color {
            return Ok(None);
        }
        match self.engine_move(self.tree.current(), to_move, after_pass) {
            Ok(reply) => Ok(Some(reply)),
            Err(err) => {
                warn!("engine failed to move: {err}");
                self.detach_engine();
                Ok(Some(EngineReply::Detached(err)))
            }
        }
    }

    /// Stop the engine. Does nothing when none is attached.
    pub fn detach_engine(&mut self) {
        if let Some(engine) = self.engine.take() {
            let errors = engine.detach();
            if !errors.is_empty() {
                warn!("engine detached with {} teardown errors", errors.len());
            }
        }
    }

    /// Engine name of a point on this board, for front-end messages.
    /// `None` for points off the board or beyond the engine alphabet.
    pub fn vertex_name(&self, pt: Point) -> Option<String> {
        if !self.current().board().contains(pt) {
            return None;
        }
        format_vertex(Vertex::Point(pt), self.tree.height()).ok()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.detach_engine();
    }
}
