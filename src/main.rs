//! Goban: a Go game-record editor.
//!
//! ## Usage
//!
//! - `goban` - Start an interactive session on an empty 19x19 board
//! - `goban play --engine gnugo --engine-arg=--mode --engine-arg=gtp` - Play against an engine
//! - `goban show game.sgf` - Print the final position of a record
//! - `goban export game.sgf` - Re-serialize a record to stdout
//! - `goban score game.sgf --dead D4` - Score the final position

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};

use goban::board::{Color, Point};
use goban::constants::{DEFAULT_BOARD_SIZE, DEFAULT_KOMI};
use goban::engine::EngineConfig;
use goban::gtp::{Vertex, parse_vertex};
use goban::session::{EngineReply, Played, Session, SessionOptions};
use goban::tree::{Mark, Move, SetupKind, SetupMovePolicy};

/// Goban: a Go game-record editor
#[derive(Parser)]
#[command(name = "goban")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine traffic and record warnings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the final main-line position of a record
    Show { file: PathBuf },
    /// Read a record and write it back out to stdout
    Export { file: PathBuf },
    /// Score the final main-line position of a record
    Score {
        file: PathBuf,
        /// Komi (defaults to the record's KM, then 7.0)
        #[arg(long)]
        komi: Option<f64>,
        /// Vertices of dead groups, e.g. D4
        #[arg(long, num_args = 1..)]
        dead: Vec<String>,
    },
    /// Interactive session on stdin
    Play(PlayArgs),
}

#[derive(clap::Args, Default)]
struct PlayArgs {
    /// Engine program to attach at start
    #[arg(long)]
    engine: Option<String>,
    /// Argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,
    /// Color the engine plays (b or w)
    #[arg(long, default_value = "b")]
    engine_color: String,
    /// Record to open at start
    #[arg(long)]
    load: Option<PathBuf>,
    /// Square board size
    #[arg(long, conflicts_with_all = ["width", "height"])]
    size: Option<usize>,
    #[arg(long)]
    width: Option<usize>,
    #[arg(long)]
    height: Option<usize>,
    #[arg(long, default_value_t = DEFAULT_KOMI)]
    komi: f64,
    /// Reject moves played directly from setup-only nodes
    #[arg(long)]
    forbid_setup_moves: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Some(Commands::Show { file }) => {
            let session = open(&file)?;
            print!("{}", describe_position(&session));
        }
        Some(Commands::Export { file }) => {
            let session = open(&file)?;
            print!("{}", session.export_record());
        }
        Some(Commands::Score { file, komi, dead }) => {
            let mut session = open(&file)?;
            if let Some(komi) = komi {
                session.set_komi(komi)?;
            }
            session.enter_scoring();
            for vertex in &dead {
                let pt = parse_point(&session, vertex)?;
                session.toggle_group_ownership(pt)?;
            }
            let score = session.score()?;
            println!("Black {} White {}: {score}", score.black, score.white);
        }
        Some(Commands::Play(args)) => run_interactive(args)?,
        None => run_interactive(PlayArgs {
            engine_color: "b".to_string(),
            komi: DEFAULT_KOMI,
            ..PlayArgs::default()
        })?,
    }
    Ok(())
}

fn open(file: &Path) -> Result<Session> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let mut session = Session::new(SessionOptions::default())?;
    let warnings = session
        .import_record(&text)
        .with_context(|| format!("importing {}", file.display()))?;
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
    Ok(session)
}

fn run_interactive(args: PlayArgs) -> Result<()> {
    let (width, height) = match (args.size, args.width, args.height) {
        (Some(n), _, _) => (n, n),
        (None, w, h) => (w.unwrap_or(DEFAULT_BOARD_SIZE), h.unwrap_or(DEFAULT_BOARD_SIZE)),
    };
    let color = Color::parse(&args.engine_color)
        .ok_or_else(|| anyhow!("invalid engine color '{}'", args.engine_color))?;

    let mut engine = EngineConfig {
        color,
        ..EngineConfig::default()
    };
    if let Some(program) = &args.engine {
        engine.program = program.clone();
        engine.args = args.engine_args.clone();
    }

    let options = SessionOptions {
        width,
        height,
        komi: args.komi,
        setup_moves: if args.forbid_setup_moves {
            SetupMovePolicy::Forbid
        } else {
            SetupMovePolicy::Allow
        },
    };
    let mut editor = Editor {
        session: Session::new(options)?,
        engine,
    };
    if let Some(path) = &args.load {
        let path = path.to_string_lossy().into_owned();
        println!("{}", editor.execute("load", &[path.as_str()])?);
    }
    if args.engine.is_some() {
        println!("{}", editor.execute("attach", &[])?);
    }
    editor.run()
}

/// Line-oriented front-end over a [`Session`].
struct Editor {
    session: Session,
    engine: EngineConfig,
}

impl Editor {
    fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        print!("{}", describe_position(&self.session));

        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            let command = parts[0].to_lowercase();
            if command == "quit" {
                break;
            }

            match self.execute(&command, &parts[1..]) {
                Ok(message) => writeln!(stdout, "= {message}\n")?,
                Err(err) => writeln!(stdout, "? {err:#}\n")?,
            }
            stdout.flush()?;
        }
        Ok(())
    }

    fn execute(&mut self, command: &str, args: &[&str]) -> Result<String> {
        let session = &mut self.session;
        match command {
            "play" => {
                let pt = parse_point(session, arg(args, 0)?)?;
                let played = session.play(pt)?;
                Ok(describe_played(session, &played))
            }
            "pass" => {
                let played = session.pass()?;
                Ok(describe_played(session, &played))
            }
            "back" => {
                if !session.back()? {
                    bail!("already at the root");
                }
                Ok(describe_position(session))
            }
            "goto" => {
                let id: usize = arg(args, 0)?.parse().context("node id must be a number")?;
                session.navigate(id)?;
                Ok(describe_position(session))
            }
            "new" => {
                let width: usize = arg(args, 0)?.parse().context("invalid width")?;
                let height = match args.get(1) {
                    Some(h) => h.parse().context("invalid height")?,
                    None => width,
                };
                session.new_board(width, height)?;
                Ok(describe_position(session))
            }
            "setup" => {
                let kind = match arg(args, 0)?.to_lowercase().as_str() {
                    "b" | "black" => SetupKind::Black,
                    "w" | "white" => SetupKind::White,
                    "e" | "empty" => SetupKind::Empty,
                    other => bail!("unknown setup kind '{other}'"),
                };
                let pt = parse_point(session, arg(args, 1)?)?;
                session.setup_edit(pt, kind)?;
                Ok(describe_position(session))
            }
            "mark" => {
                let mark = match arg(args, 0)?.to_lowercase().as_str() {
                    "cr" | "circle" => Mark::Circle,
                    "sq" | "square" => Mark::Square,
                    "tr" | "triangle" => Mark::Triangle,
                    "ma" | "cross" => Mark::Cross,
                    other => bail!("unknown mark '{other}'"),
                };
                let pt = parse_point(session, arg(args, 1)?)?;
                let on = session.toggle_annotation(pt, mark)?;
                Ok(if on { "marked" } else { "unmarked" }.to_string())
            }
            "label" => {
                let pt = parse_point(session, arg(args, 0)?)?;
                session.set_label(pt, &args[1..].join(" "))?;
                Ok(String::new())
            }
            "comment" => {
                session.set_comment(&args.join(" "))?;
                Ok(String::new())
            }
            "score" => {
                session.enter_scoring();
                Ok(session.score()?.to_string())
            }
            "dead" => {
                let pt = parse_point(session, arg(args, 0)?)?;
                Ok(session.toggle_group_ownership(pt)?.to_string())
            }
            "done" => {
                session.exit_scoring();
                Ok(String::new())
            }
            "komi" => {
                let komi: f64 = arg(args, 0)?.parse().context("invalid komi")?;
                session.set_komi(komi)?;
                Ok(String::new())
            }
            "attach" => {
                let reply = session.attach_engine(&self.engine)?;
                let mut message = format!("attached {}", self.engine.program);
                if let Some(reply) = reply {
                    message.push('\n');
                    message.push_str(&describe_reply(session, &reply));
                }
                Ok(message)
            }
            "detach" => {
                session.detach_engine();
                Ok(String::new())
            }
            "export" => {
                let text = session.export_record();
                match args.first() {
                    Some(path) => {
                        fs::write(path, text).with_context(|| format!("writing {path}"))?;
                        Ok(format!("saved {path}"))
                    }
                    None => Ok(text),
                }
            }
            "load" => {
                let path = arg(args, 0)?;
                let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
                let warnings = session.import_record(&text)?;
                let mut message = describe_position(session);
                for warning in warnings {
                    message.push_str(&format!("warning: {warning}\n"));
                }
                Ok(message)
            }
            "show" => Ok(describe_position(session)),
            "tree" => Ok(describe_tree(session)),
            _ => bail!("unknown command: {command}"),
        }
    }
}

fn arg<'a>(args: &[&'a str], index: usize) -> Result<&'a str> {
    args.get(index).copied().ok_or_else(|| anyhow!("missing argument"))
}

fn parse_point(session: &Session, text: &str) -> Result<Point> {
    let tree = session.tree();
    match parse_vertex(text, tree.width(), tree.height())? {
        Vertex::Point(pt) => Ok(pt),
        _ => bail!("'{text}' is not a board point"),
    }
}

fn describe_position(session: &Session) -> String {
    let node = session.current();
    format!(
        "{}node {} {}, {} to move\n",
        node.board(),
        node.id(),
        node.label(),
        node.to_move()
    )
}

fn describe_played(session: &Session, played: &Played) -> String {
    let mut message = describe_position(session);
    if let Some(reply) = &played.engine {
        message.push_str(&describe_reply(session, reply));
    }
    message
}

fn describe_reply(session: &Session, reply: &EngineReply) -> String {
    match reply {
        EngineReply::Move(id) => match session.tree().node(*id).map(|n| n.mv()) {
            Some(Move::Play(color, pt)) => {
                let vertex = session.vertex_name(pt).unwrap_or_else(|| format!("{pt:?}"));
                format!("engine plays {color} {vertex}")
            }
            _ => format!("engine moved to node {id}"),
        },
        EngineReply::Pass { game_over: true, .. } => "engine passes, game over".to_string(),
        EngineReply::Pass { .. } => "engine passes".to_string(),
        EngineReply::Resigned => "engine resigns".to_string(),
        EngineReply::Detached(err) => format!("engine detached: {err}"),
    }
}

fn describe_tree(session: &Session) -> String {
    let tree = session.tree();
    let mut out = String::new();
    for id in tree.depth_first() {
        let Ok(path) = tree.path_to(id) else { continue };
        let Some(node) = tree.node(id) else { continue };
        let marker = if id == tree.current() { "*" } else { " " };
        out.push_str(&format!(
            "{marker}{:indent$}{id}: {}\n",
            "",
            node.label(),
            indent = path.len() - 1
        ));
    }
    out
}
