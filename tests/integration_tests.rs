//! Integration tests for goban
//!
//! Rules, tree and scoring scenarios exercised through the public API.

use goban::board::{Board, Color, Point};
use goban::error::{MoveError, TreeError};
use goban::rules::{apply_move, check_move, is_legal};
use goban::score::TerritoryMap;
use goban::tree::{Edit, GameTree, Move, NodeId, Setup};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn board_with(width: usize, height: usize, black: &[Point], white: &[Point]) -> Board {
    let mut board = Board::new(width, height).unwrap();
    for &pt in black {
        board.set(pt, Some(Color::Black)).unwrap();
    }
    for &pt in white {
        board.set(pt, Some(Color::White)).unwrap();
    }
    board
}

/// Play alternating moves from `from`, Black first unless the node says
/// otherwise. Returns the last node.
fn play_line(tree: &mut GameTree, from: NodeId, moves: &[Point]) -> NodeId {
    let mut id = from;
    for &pt in moves {
        let color = tree.get(id).unwrap().to_move();
        id = tree.create_child(id, Edit::Play(color, pt)).unwrap();
    }
    id
}

/// Tree whose root child is a setup node holding the given stones.
fn setup_tree(size: usize, black: &[Point], white: &[Point]) -> (GameTree, NodeId) {
    let mut tree = GameTree::new(size, size).unwrap();
    let setup = Setup {
        black: black.to_vec(),
        white: white.to_vec(),
        empty: Vec::new(),
    };
    let id = tree.create_child(GameTree::ROOT, Edit::Setup(setup)).unwrap();
    (tree, id)
}

// =============================================================================
// Rules scenarios
// =============================================================================

#[test]
fn test_three_moves_no_capture() {
    let mut tree = GameTree::new(9, 9).unwrap();
    let last = play_line(&mut tree, GameTree::ROOT, &[(4, 4), (4, 3), (3, 3)]);
    let node = tree.get(last).unwrap();

    assert_eq!(node.board().stone_count(), 3);
    assert_eq!(node.board().get((4, 4)), Some(Color::Black));
    assert_eq!(node.board().get((4, 3)), Some(Color::White));
    assert_eq!(node.board().get((3, 3)), Some(Color::Black));
    assert_eq!(node.ko(), None);
}

#[test]
fn test_single_stone_capture_sets_ko() {
    let (mut tree, setup) = setup_tree(5, &[(0, 1), (2, 1), (1, 0)], &[(1, 1)]);
    let capture = tree
        .create_child(setup, Edit::Play(Color::Black, (1, 2)))
        .unwrap();

    let node = tree.get(capture).unwrap();
    assert_eq!(node.board().get((1, 1)), None);
    assert_eq!(node.ko(), Some((1, 1)));
    assert_eq!(tree.get(setup).unwrap().board().stone_count(), 4);
    assert_eq!(node.board().stone_count(), 4, "one stone placed, one captured");

    // The ko point is forbidden for the very next move, whoever plays it.
    assert!(matches!(
        tree.create_child(capture, Edit::Play(Color::Black, (1, 1))),
        Err(TreeError::IllegalMove {
            source: MoveError::Ko,
            ..
        })
    ));

    // After a move elsewhere the ko point is free again.
    let elsewhere = tree
        .create_child(capture, Edit::Play(Color::White, (4, 4)))
        .unwrap();
    assert_eq!(tree.get(elsewhere).unwrap().ko(), None);
    let pass = tree.create_child(elsewhere, Edit::Pass(Color::Black)).unwrap();
    assert_eq!(tree.get(pass).unwrap().ko(), None);
    assert!(tree.create_child(pass, Edit::Play(Color::Black, (1, 1))).is_ok());
}

#[test]
fn test_recapture_of_larger_group_is_not_ko() {
    // Black (1,2) joins (1,3) when capturing, so its group has two stones.
    let board = board_with(5, 5, &[(0, 1), (2, 1), (1, 0), (1, 3)], &[(1, 1)]);
    let out = apply_move(&board, (1, 2), Color::Black);
    assert_eq!(out.captured, 1);
    assert_eq!(out.ko, None);
    assert_ne!(
        check_move(&out.board, (1, 1), Color::White, out.ko),
        Err(MoveError::Ko)
    );
}

#[test]
fn test_real_ko_shape() {
    // Black takes at (2,1); White's recapture at (1,1) would take back a
    // single stone and is forbidden for one move.
    let board = board_with(
        5,
        4,
        &[(1, 0), (0, 1), (1, 2)],
        &[(2, 0), (3, 1), (2, 2), (1, 1)],
    );
    let out = apply_move(&board, (2, 1), Color::Black);
    assert_eq!(out.ko, Some((1, 1)));
    assert_eq!(
        check_move(&out.board, (1, 1), Color::White, out.ko),
        Err(MoveError::Ko)
    );

    let later = apply_move(&out.board, (4, 3), Color::White);
    assert!(is_legal(&later.board, (1, 1), Color::White, later.ko));
}

/// Random legal game on a small board.
fn random_position(rng: &mut fastrand::Rng, size: usize, moves: usize) -> (Board, Option<Point>) {
    let mut board = Board::new(size, size).unwrap();
    let mut ko = None;
    let mut color = Color::Black;
    for _ in 0..moves {
        let pt = (rng.usize(..size), rng.usize(..size));
        if is_legal(&board, pt, color, ko) {
            let out = apply_move(&board, pt, color);
            board = out.board;
            ko = out.ko;
        }
        color = color.opposite();
    }
    (board, ko)
}

#[test]
fn test_illegal_only_for_ko_occupied_or_suicide() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..200 {
        let (board, ko) = random_position(&mut rng, 7, 60);
        let pt = (rng.usize(..7), rng.usize(..7));
        let color = if rng.bool() { Color::Black } else { Color::White };

        match check_move(&board, pt, color, ko) {
            Ok(()) => {
                let out = apply_move(&board, pt, color);
                assert_eq!(out.board.get(pt), Some(color));
                assert!(out.board.liberties(pt) > 0, "legal move left without liberties");
            }
            Err(MoveError::Occupied) => assert!(board.get(pt).is_some()),
            Err(MoveError::Ko) => {
                assert_eq!(ko, Some(pt));
                assert!(board.get(pt).is_none());
            }
            Err(MoveError::Suicide) => {
                let out = apply_move(&board, pt, color);
                assert_eq!(out.captured, 0);
                assert_eq!(out.board.get(pt), None, "suicide removes the placed group");
            }
            Err(MoveError::OutOfBounds) => panic!("{pt:?} is on the board"),
        }
    }
}

// =============================================================================
// Game tree
// =============================================================================

#[test]
fn test_variation_keeps_old_line() {
    let mut tree = GameTree::new(9, 9).unwrap();
    let main = play_line(&mut tree, GameTree::ROOT, &[(2, 2), (6, 6), (2, 6)]);
    let branch_point = tree.get(main).unwrap().parent().unwrap();

    tree.set_current(branch_point).unwrap();
    let alt = tree
        .create_child(branch_point, Edit::Play(Color::Black, (6, 2)))
        .unwrap();

    assert_eq!(tree.get(branch_point).unwrap().children(), &[main, alt]);
    assert_eq!(tree.main_line().last(), Some(&main));
    assert_eq!(tree.get(main).unwrap().board().get((2, 6)), Some(Color::Black));
    assert_eq!(tree.get(alt).unwrap().board().get((2, 6)), None);
}

#[test]
fn test_node_labels_along_a_game() {
    let mut tree = GameTree::new(9, 9).unwrap();
    let a = play_line(&mut tree, GameTree::ROOT, &[(3, 4)]);
    let p = tree.create_child(a, Edit::Pass(Color::White)).unwrap();
    let s = tree
        .create_child(p, Edit::Setup(Setup::single(goban::tree::SetupKind::Black, (0, 0))))
        .unwrap();
    let labels: Vec<String> = tree
        .path_to(s)
        .unwrap()
        .into_iter()
        .map(|id| tree.get(id).unwrap().label())
        .collect();
    assert_eq!(labels, vec!["Root", "B:(3,4)", "W:Pass", "W:Setup"]);
    assert_eq!(tree.get(s).unwrap().mv(), Move::None);
    assert_eq!(tree.get(s).unwrap().to_move(), Color::Black);
}

// =============================================================================
// Territory scoring
// =============================================================================

#[test]
fn test_assign_regions_idempotent_on_random_positions() {
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..50 {
        let (board, _) = random_position(&mut rng, 9, 50);
        let mut map = TerritoryMap::initialize(&board);
        map.assign_regions(&board);
        let once = map.clone();
        map.assign_regions(&board);
        assert_eq!(map, once);
    }
}

#[test]
fn test_toggle_only_touches_group_and_territory() {
    // White group in Black's area on the right; a separate White group on
    // the far left that must not change.
    let board = board_with(
        7,
        5,
        &[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)],
        &[(0, 2), (5, 1), (5, 2)],
    );
    let mut map = TerritoryMap::initialize(&board);
    map.assign_regions(&board);
    let before = map.clone();

    assert!(map.toggle_group_ownership(&board, (5, 1)));
    for pt in [(5, 1), (5, 2)] {
        assert_eq!(map.owner(pt), Some(Color::Black), "{pt:?} should flip");
        assert_ne!(map.owner(pt), before.owner(pt));
    }
    for (pt, color) in board.stones() {
        if pt != (5, 1) && pt != (5, 2) {
            assert_eq!(map.owner(pt), Some(color), "{pt:?} should keep its owner");
        }
    }
    assert_eq!(map.owner((0, 2)), Some(Color::White));
    assert_eq!(map.owner((6, 4)), Some(Color::Black));

    let score = map.score(6.5);
    assert_eq!(score.black, 5.0 + 4.0 * 5.0);
    assert_eq!(score.white, 1.0 + 6.5);
}
