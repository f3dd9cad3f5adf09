//! Exhaustive small-state model checker for terminal invariants.
//!
//! Enumerates every sequence (up to a bounded depth) of a small alphabet of
//! byte-stream operations against a tiny `Screen`, checking after every step
//! that the invariants from spec §3/§8 hold in every reachable state rather
//! than only the ones a handful of hand-picked scenarios happen to reach.

use std::collections::{HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use vtcore::{Executor, Screen};

/// Compact, hashable snapshot of terminal state for visited-state dedup.
#[derive(Clone, Eq, PartialEq)]
struct StateSnapshot {
    cells: Vec<char>,
    wide: Vec<bool>,
    cursor_row: u16,
    cursor_col: u16,
    pending_wrap: bool,
    scroll_region: (u16, u16, u16, u16),
}

impl Hash for StateSnapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cells.hash(state);
        self.wide.hash(state);
        self.cursor_row.hash(state);
        self.cursor_col.hash(state);
        self.pending_wrap.hash(state);
        self.scroll_region.hash(state);
    }
}

struct TerminalState {
    executor: Executor,
    screen: Screen,
}

impl TerminalState {
    fn new(cols: u16, rows: u16) -> Self {
        Self { executor: Executor::new(), screen: Screen::new(cols, rows, 64) }
    }

    fn snapshot(&self) -> StateSnapshot {
        let cols = self.screen.cols();
        let rows = self.screen.rows();
        let grid = self.screen.active().grid();
        let mut cells = Vec::with_capacity((cols * rows) as usize);
        let mut wide = Vec::with_capacity((cols * rows) as usize);
        for r in 0..rows {
            for c in 0..cols {
                let cell = grid.cell(r, c);
                cells.push(cell.map_or('\0', |c| c.content()));
                wide.push(cell.is_some_and(|c| c.is_wide()));
            }
        }
        StateSnapshot {
            cells,
            wide,
            cursor_row: self.screen.cursor().row,
            cursor_col: self.screen.cursor().col,
            pending_wrap: self.screen.cursor().pending_wrap,
            scroll_region: self.screen.scroll_region(),
        }
    }

    fn apply(&mut self, bytes: &[u8]) {
        let _ = self.executor.feed(bytes, &mut self.screen);
    }

    /// Panics with a descriptive message if any spec §3/§8 invariant is
    /// violated in the current state.
    fn check_invariants(&self, path: &[&'static [u8]]) {
        let cols = self.screen.cols();
        let rows = self.screen.rows();
        let cursor = self.screen.cursor();

        assert!(
            cursor.row < rows && cursor.col < cols,
            "cursor ({}, {}) out of active bounds (cols={cols}, rows={rows}) after {path:?}",
            cursor.row,
            cursor.col
        );

        let (top, bottom, left, right) = self.screen.scroll_region();
        assert!(top < bottom && bottom <= rows, "scroll region rows invalid after {path:?}");
        assert!(left < right && right <= cols, "scroll region cols invalid after {path:?}");

        let grid = self.screen.active().grid();
        for row in 0..rows {
            let row_cells = grid.row_cells(row).unwrap();
            let width_sum: u16 = row_cells.iter().map(|c| c.width() as u16).sum();
            assert_eq!(width_sum, cols, "row {row} width sum mismatch after {path:?}");

            for (col, cell) in row_cells.iter().enumerate() {
                if cell.is_wide_continuation() {
                    assert!(col > 0, "wide-spacer at column 0 after {path:?}");
                    assert!(
                        row_cells[col - 1].is_wide(),
                        "orphan wide-spacer at ({row},{col}) after {path:?}"
                    );
                }
            }
        }
    }
}

/// A small, mixed alphabet of byte-stream "moves": printable text, cursor
/// motion, scroll-region setup, SGR, erase, wide glyphs, and scrolling.
/// Chosen to exercise the interactions most likely to break an invariant
/// (wrap at the margin, scroll-region-confined erase/scroll, wide glyphs
/// straddling the right edge) rather than covering the whole protocol.
const MOVES: &[&[u8]] = &[
    b"A",
    b"AB",
    b"\r",
    b"\n",
    b"\x1b[C",
    b"\x1b[D",
    b"\x1b[H",
    b"\x1b[2;2H",
    b"\x1b[K",
    b"\x1b[J",
    b"\x1b[2;3r",
    b"\x1b[r",
    b"\x1b[4h",
    b"\x1b[4l",
    b"\x1b[?7l",
    b"\x1b[?7h",
    "世".as_bytes(),
    b"\x1b[1P",
    b"\x1b[1@",
    b"\x1b[1L",
    b"\x1b[1M",
    b"\x1b[1S",
    b"\x1b[1T",
];

/// Bounded-depth BFS over `MOVES` sequences. Time-boxed so CI stays fast even
/// though the branching factor makes full enumeration at higher depths
/// infeasible; depth 3 over a 22-move alphabet on a 4x3 grid already covers
/// thousands of distinct reachable states.
#[test]
fn bfs_over_small_grid_never_violates_invariants() {
    const MAX_DEPTH: usize = 3;
    const TIME_BUDGET: Duration = Duration::from_secs(10);

    let start = Instant::now();
    let mut visited: HashSet<StateSnapshot> = HashSet::new();
    let mut queue: VecDeque<(TerminalState, Vec<&'static [u8]>)> = VecDeque::new();
    queue.push_back((TerminalState::new(4, 3), Vec::new()));

    let mut explored = 0usize;
    while let Some((state, path)) = queue.pop_front() {
        if start.elapsed() > TIME_BUDGET {
            break;
        }
        state.check_invariants(&path);
        explored += 1;

        if path.len() >= MAX_DEPTH {
            continue;
        }

        for &mv in MOVES {
            let mut next = TerminalState::new(4, 3);
            for &prior in &path {
                next.apply(prior);
            }
            next.apply(mv);

            let snapshot = next.snapshot();
            if visited.insert(snapshot) {
                let mut next_path = path.clone();
                next_path.push(mv);
                queue.push_back((next, next_path));
            }
        }
    }

    assert!(explored > 100, "expected the BFS to explore a meaningful number of states, got {explored}");
}

#[test]
fn bfs_over_small_grid_with_wide_glyphs_never_orphans_a_spacer() {
    // Same alphabet, narrower grid (3 cols), to force wide glyphs to
    // straddle the right margin frequently.
    const MAX_DEPTH: usize = 3;
    const TIME_BUDGET: Duration = Duration::from_secs(10);

    let start = Instant::now();
    let mut visited: HashSet<StateSnapshot> = HashSet::new();
    let mut queue: VecDeque<(TerminalState, Vec<&'static [u8]>)> = VecDeque::new();
    queue.push_back((TerminalState::new(3, 2), Vec::new()));

    while let Some((state, path)) = queue.pop_front() {
        if start.elapsed() > TIME_BUDGET {
            break;
        }
        state.check_invariants(&path);

        if path.len() >= MAX_DEPTH {
            continue;
        }

        for &mv in MOVES {
            let mut next = TerminalState::new(3, 2);
            for &prior in &path {
                next.apply(prior);
            }
            next.apply(mv);

            let snapshot = next.snapshot();
            if visited.insert(snapshot) {
                let mut next_path = path.clone();
                next_path.push(mv);
                queue.push_back((next, next_path));
            }
        }
    }
}
