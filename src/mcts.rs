//! Monte Carlo Tree Search (MCTS) with UCT selection.
//!
//! This module implements MCTS with:
//! - Tactical short-circuits: an immediate win or a forced block is returned
//!   without searching
//! - UCT for node selection
//! - Heuristic-biased expansion (best of a few shuffled candidates)
//! - Heuristic and uniformly random playouts for value estimation
//!
//! Each node owns its children. Descending the tree records the path of
//! child indices taken, and the update phase walks that same path back
//! from the root, so no node needs a pointer to its parent.
//!
//! Node values are accumulated in a single frame: a playout value counts as
//! is for nodes where the root's player is to move, and negated elsewhere.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use fastrand::Rng;
use log::{debug, trace, warn};

use crate::board::{Board, Cell, Move};
use crate::constants::{
    EXPAND_RANDOM_LIMIT, EXPAND_SAMPLE, EXPLORATION_CONSTANT, MAX_ITERATIONS, MAX_TIME_MS,
};
use crate::heuristic::Heuristic;
use crate::playout::{heuristic_playout, random_playout};

/// Search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// `C` in the UCT formula.
    pub exploration_constant: f64,
    pub max_iterations: usize,
    pub max_time_ms: u64,
    /// Random seed; 0 picks a time-derived seed.
    pub seed: u64,
    pub use_heuristic_rollouts: bool,
    pub use_random_rollouts: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration_constant: EXPLORATION_CONSTANT,
            max_iterations: MAX_ITERATIONS,
            max_time_ms: MAX_TIME_MS,
            seed: 0,
            use_heuristic_rollouts: true,
            use_random_rollouts: true,
        }
    }
}

/// A node in the search tree.
pub struct TreeNode {
    /// The move that led here (`Move::NONE` at the root)
    pub mv: Move,
    /// Expanded children
    pub children: Vec<TreeNode>,
    /// Legal moves not yet expanded into children
    pub untried: Vec<Move>,
    /// Number of visits
    pub visits: u32,
    /// Sum of backed-up values, in the root player's frame
    pub total_value: f64,
    /// Player to move in this node's position
    pub player_to_move: Cell,
}

impl TreeNode {
    /// Create a node for `board`, reached by playing `mv`.
    pub fn new(mv: Move, board: &Board) -> Self {
        Self {
            mv,
            children: Vec::new(),
            untried: board.legal_moves(),
            visits: 0,
            total_value: 0.0,
            player_to_move: board.current_player(),
        }
    }

    /// Average backed-up value, 0 when unvisited.
    #[inline]
    pub fn q_value(&self) -> f64 {
        if self.visits > 0 {
            self.total_value / self.visits as f64
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Count one visit carrying `value`, flipped unless `root_player` moves here.
    fn record(&mut self, value: f64, root_player: Cell) {
        self.visits += 1;
        self.total_value += if self.player_to_move == root_player {
            value
        } else {
            -value
        };
    }
}

/// UCT score of `node` as seen from its parent.
///
/// Unvisited nodes score infinity so each child is tried once before any
/// exploitation. The average value is negated because selection happens on
/// behalf of the parent.
pub fn uct_value(node: &TreeNode, parent_visits: u32, exploration: f64) -> f64 {
    if node.visits == 0 {
        return f64::INFINITY;
    }
    let exploitation = node.q_value();
    let explore = exploration * ((parent_visits as f64).ln() / node.visits as f64).sqrt();
    -exploitation + explore
}

/// Index of the child with the highest UCT score; the first one on ties.
fn most_urgent(node: &TreeNode, exploration: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, child) in node.children.iter().enumerate() {
        let score = uct_value(child, node.visits, exploration);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Descend from the root while nodes are fully expanded, replaying each
/// chosen move on `board`.
///
/// Returns the path of child indices from root to the selected node.
fn tree_descend(root: &TreeNode, board: &mut Board, exploration: f64) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = root;

    while !node.is_leaf() && node.is_fully_expanded() {
        let Some(idx) = most_urgent(node, exploration) else {
            break;
        };
        path.push(idx);
        node = &node.children[idx];
        board.make_move(node.mv);
    }

    path
}

/// Follow `path` from the root.
fn node_at_mut<'a>(root: &'a mut TreeNode, path: &[usize]) -> &'a mut TreeNode {
    path.iter().fold(root, |node, &idx| &mut node.children[idx])
}

/// Back a playout value up every node on `path`, root included.
fn tree_update(root: &mut TreeNode, path: &[usize], value: f64, root_player: Cell) {
    root.record(value, root_player);

    let mut node = root;
    for &idx in path {
        node = &mut node.children[idx];
        node.record(value, root_player);
    }
}

/// The most visited child's move; the first one on ties.
///
/// Falls back to the first untried move, then `Move::NONE`, when the root
/// was never expanded.
pub fn best_move(root: &TreeNode) -> Move {
    root.children
        .iter()
        .reduce(|best, child| if child.visits > best.visits { child } else { best })
        .map(|child| child.mv)
        .or_else(|| root.untried.first().copied())
        .unwrap_or(Move::NONE)
}

/// Log statistics for the root's children.
pub fn dump_children(root: &TreeNode) {
    if !log::log_enabled!(log::Level::Trace) {
        return;
    }
    for child in &root.children {
        trace!(
            "move {} visits={} q={:.3}",
            child.mv,
            child.visits,
            child.q_value()
        );
    }
}

fn seeded_rng(seed: u64) -> Rng {
    if seed != 0 {
        return Rng::with_seed(seed);
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    Rng::with_seed(nanos)
}

/// The search driver. Owns its configuration and the only random source.
pub struct Mcts {
    config: MctsConfig,
    heuristic: Heuristic,
    rng: Rng,
    iterations: usize,
    root_visits: u32,
}

impl Default for Mcts {
    fn default() -> Self {
        Self::new(MctsConfig::default())
    }
}

impl Mcts {
    pub fn new(config: MctsConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            config,
            heuristic: Heuristic::new(),
            rng,
            iterations: 0,
            root_visits: 0,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Mutable settings. Changing `seed` here does not re-seed; use [`Mcts::reseed`].
    pub fn config_mut(&mut self) -> &mut MctsConfig {
        &mut self.config
    }

    /// Replace the random source with one seeded from `seed` (0 = time-derived).
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = seeded_rng(seed);
    }

    /// Iterations completed by the last search.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Root visit count after the last search.
    pub fn root_visits(&self) -> u32 {
        self.root_visits
    }

    /// Search using the configured time limit.
    pub fn search(&mut self, board: &Board) -> Move {
        self.search_with_time_limit(board, self.config.max_time_ms)
    }

    /// Find a move for the side to move in `board`.
    ///
    /// Stops after `max_iterations` iterations or `time_limit_ms`
    /// milliseconds, whichever comes first. The time check happens between
    /// iterations only. Returns `Move::NONE` for a finished game.
    pub fn search_with_time_limit(&mut self, board: &Board, time_limit_ms: u64) -> Move {
        self.iterations = 0;
        self.root_visits = 0;

        if board.is_terminal() {
            warn!("search requested on a finished game");
            return Move::NONE;
        }

        let winning = self.heuristic.find_winning_move(board);
        if winning.is_valid() {
            debug!("immediate win at {winning}");
            return winning;
        }

        let blocking = self.heuristic.find_blocking_move(board);
        if blocking.is_valid() {
            debug!("forced block at {blocking}");
            return blocking;
        }

        let mut root = TreeNode::new(Move::NONE, board);
        if root.untried.len() == 1 {
            return root.untried[0];
        }

        let root_player = board.current_player();
        let limit = Duration::from_millis(time_limit_ms);
        let start = Instant::now();

        while self.iterations < self.config.max_iterations {
            if start.elapsed() >= limit {
                break;
            }

            let mut scratch = board.clone();

            // Selection
            let mut path = tree_descend(&root, &mut scratch, self.config.exploration_constant);

            // Expansion
            let node = node_at_mut(&mut root, &path);
            if !node.untried.is_empty() && !scratch.is_terminal() {
                let child = self.expand(node, &mut scratch);
                path.push(child);
            }

            // Rollout and backpropagation
            let value = self.rollout(&scratch);
            tree_update(&mut root, &path, value, root_player);

            self.iterations += 1;
        }

        self.root_visits = root.visits;
        dump_children(&root);

        let best = best_move(&root);
        let best_visits = root
            .children
            .iter()
            .find(|child| child.mv == best)
            .map_or(0, |child| child.visits);
        debug!(
            "search: {} iterations in {} ms, best {} with {} visits",
            self.iterations,
            start.elapsed().as_millis(),
            best,
            best_visits
        );
        best
    }

    /// Add one child to `node` and play its move on `board`.
    ///
    /// Returns the new child's index.
    fn expand(&mut self, node: &mut TreeNode, board: &mut Board) -> usize {
        let mv = self.choose_expansion(&mut node.untried, board);
        board.make_move(mv);
        node.children.push(TreeNode::new(mv, board));
        node.children.len() - 1
    }

    /// Remove and return the untried move to expand next.
    ///
    /// With more than [`EXPAND_RANDOM_LIMIT`] candidates the list is shuffled
    /// and the best-scoring of the first [`EXPAND_SAMPLE`] is taken;
    /// otherwise one is picked uniformly.
    fn choose_expansion(&mut self, untried: &mut Vec<Move>, board: &Board) -> Move {
        if untried.len() <= EXPAND_RANDOM_LIMIT {
            let idx = self.rng.usize(..untried.len());
            return untried.remove(idx);
        }

        self.rng.shuffle(untried);
        let sample = untried.len().min(EXPAND_SAMPLE);
        let mut best_idx = 0;
        let mut best_score = i32::MIN;
        for (i, &mv) in untried[..sample].iter().enumerate() {
            let score = self.heuristic.evaluate_move(board, mv);
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
        }
        untried.remove(best_idx)
    }

    /// Estimate the value of `board` for the player to move there.
    fn rollout(&mut self, board: &Board) -> f64 {
        if board.is_terminal() {
            // A decided winner is normally the player who just moved
            return match board.winner() {
                Cell::Empty => 0.0,
                winner if winner == board.current_player() => -1.0,
                _ => 1.0,
            };
        }

        let mut total = 0.0;
        let mut count = 0;

        if self.config.use_heuristic_rollouts {
            let mut sim = board.clone();
            total += heuristic_playout(&mut sim, &self.heuristic, &mut self.rng);
            count += 1;
        }
        if self.config.use_random_rollouts || count == 0 {
            let mut sim = board.clone();
            total += random_playout(&mut sim, &mut self.rng);
            count += 1;
        }

        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(moves: &[(i32, i32)]) -> Board {
        let mut board = Board::new();
        for &(x, y) in moves {
            board.play(x, y);
        }
        board
    }

    fn seeded(seed: u64, iterations: usize) -> Mcts {
        Mcts::new(MctsConfig {
            seed,
            max_iterations: iterations,
            max_time_ms: 60_000,
            ..MctsConfig::default()
        })
    }

    fn leaf(mv: Move, player: Cell, visits: u32, total_value: f64) -> TreeNode {
        TreeNode {
            mv,
            children: Vec::new(),
            untried: Vec::new(),
            visits,
            total_value,
            player_to_move: player,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = MctsConfig::default();
        assert_eq!(config.exploration_constant, 1.2);
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.max_time_ms, 1000);
        assert_eq!(config.seed, 0);
        assert!(config.use_heuristic_rollouts);
        assert!(config.use_random_rollouts);
    }

    #[test]
    fn test_uct_value() {
        let unvisited = leaf(Move::new(0, 0), Cell::White, 0, 0.0);
        assert_eq!(uct_value(&unvisited, 10, 1.2), f64::INFINITY);

        let node = leaf(Move::new(0, 0), Cell::White, 4, 2.0);
        let expected = -0.5 + 1.2 * ((16.0f64).ln() / 4.0).sqrt();
        assert!((uct_value(&node, 16, 1.2) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_most_urgent_prefers_first_on_ties() {
        let mut root = leaf(Move::NONE, Cell::Black, 6, 0.0);
        root.children = vec![
            leaf(Move::new(1, 1), Cell::White, 2, 0.0),
            leaf(Move::new(2, 2), Cell::White, 2, -1.0),
            leaf(Move::new(3, 3), Cell::White, 2, -1.0),
        ];
        // Lower q for the child is better for the parent
        assert_eq!(most_urgent(&root, 1.2), Some(1));

        root.children.push(leaf(Move::new(4, 4), Cell::White, 0, 0.0));
        root.children.push(leaf(Move::new(5, 5), Cell::White, 0, 0.0));
        assert_eq!(most_urgent(&root, 1.2), Some(3));

        let empty = leaf(Move::NONE, Cell::Black, 0, 0.0);
        assert_eq!(most_urgent(&empty, 1.2), None);
    }

    #[test]
    fn test_best_move_most_visited_first() {
        let mut root = leaf(Move::NONE, Cell::Black, 10, 0.0);
        root.children = vec![
            leaf(Move::new(1, 1), Cell::White, 3, 3.0),
            leaf(Move::new(2, 2), Cell::White, 4, -4.0),
            leaf(Move::new(3, 3), Cell::White, 4, 0.0),
        ];
        assert_eq!(best_move(&root), Move::new(2, 2));
    }

    #[test]
    fn test_best_move_fallbacks() {
        let mut root = leaf(Move::NONE, Cell::Black, 0, 0.0);
        assert_eq!(best_move(&root), Move::NONE);

        root.untried = vec![Move::new(6, 6), Move::new(8, 8)];
        assert_eq!(best_move(&root), Move::new(6, 6));
    }

    #[test]
    fn test_tree_update_uses_root_frame() {
        let mut root = leaf(Move::NONE, Cell::Black, 0, 0.0);
        let mut child = leaf(Move::new(7, 7), Cell::White, 0, 0.0);
        child.children = vec![leaf(Move::new(8, 8), Cell::Black, 0, 0.0)];
        root.children = vec![child];

        tree_update(&mut root, &[0, 0], 1.0, Cell::Black);
        tree_update(&mut root, &[0], -0.5, Cell::Black);

        assert_eq!(root.visits, 2);
        assert_eq!(root.total_value, 0.5);
        assert_eq!(root.children[0].visits, 2);
        assert_eq!(root.children[0].total_value, -0.5);
        let grandchild = &root.children[0].children[0];
        assert_eq!(grandchild.visits, 1);
        assert_eq!(grandchild.total_value, 1.0);
    }

    #[test]
    fn test_node_at_mut_follows_path() {
        let mut root = leaf(Move::NONE, Cell::Black, 0, 0.0);
        let mut child = leaf(Move::new(7, 7), Cell::White, 0, 0.0);
        child.children = vec![
            leaf(Move::new(6, 6), Cell::Black, 0, 0.0),
            leaf(Move::new(8, 8), Cell::Black, 0, 0.0),
        ];
        root.children = vec![child];

        assert_eq!(node_at_mut(&mut root, &[]).mv, Move::NONE);
        assert_eq!(node_at_mut(&mut root, &[0, 1]).mv, Move::new(8, 8));
    }

    #[test]
    fn test_tree_descend_replays_moves() {
        let board = setup(&[(7, 7), (8, 7)]);
        let mut root = TreeNode::new(Move::NONE, &board);
        root.untried.clear();
        root.visits = 1;
        let mut child = TreeNode::new(Move::new(6, 6), &{
            let mut b = board.clone();
            b.play(6, 6);
            b
        });
        child.visits = 1;
        root.children.push(child);

        let mut scratch = board.clone();
        let path = tree_descend(&root, &mut scratch, 1.2);
        assert_eq!(path, vec![0]);
        assert_eq!(scratch.get(6, 6), Cell::Black);
        assert_eq!(scratch.move_count(), 3);
    }

    #[test]
    fn test_choose_expansion_removes_move() {
        let board = setup(&[(7, 7), (8, 7)]);
        let mut mcts = seeded(5, 10);

        let mut untried = board.legal_moves();
        let before = untried.len();
        let mv = mcts.choose_expansion(&mut untried, &board);
        assert_eq!(untried.len(), before - 1);
        assert!(!untried.contains(&mv));
        assert!(board.legal_moves().contains(&mv));

        let mut few = vec![Move::new(1, 1), Move::new(2, 2)];
        let mv = mcts.choose_expansion(&mut few, &board);
        assert_eq!(few.len(), 1);
        assert!(mv == Move::new(1, 1) || mv == Move::new(2, 2));
    }

    #[test]
    fn test_rollout_terminal_values() {
        let mut mcts = seeded(1, 10);
        // Black just completed five; White is to move
        let won = setup(&[(3, 7), (3, 8), (4, 7), (4, 8), (5, 7), (5, 8), (6, 7), (6, 8), (7, 7)]);
        assert_eq!(mcts.rollout(&won), 1.0);
    }

    #[test]
    fn test_rollout_with_both_policies_disabled() {
        let mut mcts = seeded(1, 10);
        mcts.config_mut().use_heuristic_rollouts = false;
        mcts.config_mut().use_random_rollouts = false;
        let board = setup(&[(7, 7), (8, 7)]);
        let value = mcts.rollout(&board);
        assert!((-1.0..=1.0).contains(&value));
    }

    #[test]
    fn test_search_terminal_returns_none() {
        let board = setup(&[(3, 7), (3, 8), (4, 7), (4, 8), (5, 7), (5, 8), (6, 7), (6, 8), (7, 7)]);
        let mut mcts = seeded(1, 10);
        assert_eq!(mcts.search(&board), Move::NONE);
        assert_eq!(mcts.iterations(), 0);
    }

    #[test]
    fn test_search_empty_board_plays_center() {
        let mut mcts = seeded(1, 10);
        assert_eq!(mcts.search(&Board::new()), Move::new(7, 7));
        assert_eq!(mcts.iterations(), 0);
    }

    #[test]
    fn test_search_respects_iteration_cap() {
        let board = setup(&[(7, 7), (8, 7)]);
        let mut mcts = seeded(42, 30);
        let mv = mcts.search(&board);

        assert!(board.is_legal(mv));
        assert_eq!(mcts.iterations(), 30);
        assert_eq!(mcts.root_visits(), 30);
    }

    #[test]
    fn test_search_zero_time_falls_back() {
        let board = setup(&[(7, 7), (8, 7)]);
        let mut mcts = seeded(42, 100);
        let mv = mcts.search_with_time_limit(&board, 0);

        assert_eq!(mcts.iterations(), 0);
        assert_eq!(mv, board.legal_moves()[0]);
    }

    #[test]
    fn test_search_deterministic_with_seed() {
        let board = setup(&[(7, 7), (8, 7), (7, 8)]);

        let mut a = seeded(42, 40);
        let mut b = seeded(42, 40);
        assert_eq!(a.search(&board), b.search(&board));
        assert_eq!(a.iterations(), b.iterations());

        // Reseeding restores the same sequence
        let first = a.search(&board);
        a.reseed(42);
        b.reseed(42);
        assert_eq!(a.search(&board), b.search(&board));
        assert!(board.is_legal(first));
    }
}
