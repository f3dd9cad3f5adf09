//! Scrollback buffer: lines that have scrolled off the visible viewport.
//!
//! Stores rows as `Vec<Cell>` so that SGR attributes, hyperlinks, and wide-char
//! flags are preserved through scrollback. Uses a `VecDeque` ring for O(1)
//! push/pop at both ends.
//!
//! Capacity is tracked two ways: a line-count cap (the ring's indexing
//! limit) and an optional byte budget, since real sessions vary widely in
//! per-row overhead (a blank row costs far less than one full of distinct
//! styles, hyperlinks, and wide glyphs). Each stored line also gets a
//! stable absolute index (`base()..base() + len()`) so callers holding a
//! [`crate::pagestore::Pin`] into history can tell in O(1) whether their
//! line has been evicted, without the scrollback needing to know about
//! pins itself.

use std::collections::{HashMap, VecDeque};
use std::mem::size_of;

use crate::cell::Cell;

/// Fixed per-line bookkeeping overhead counted toward the byte budget,
/// independent of cell count (matches the `Vec<Cell>` + flags overhead of
/// `ScrollbackLine` itself).
const LINE_OVERHEAD_BYTES: usize = 32;

/// A single line in the scrollback buffer.
///
/// Stores the cells that made up the row when it was evicted from the viewport.
/// The `wrapped` flag records whether the line was a soft-wrap continuation of
/// the previous line (used by reflow on resize).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollbackLine {
    /// The cells of this line (may be shorter than the viewport width if
    /// trailing blanks were trimmed).
    pub cells: Vec<Cell>,
    /// Whether this line was a soft-wrap continuation (as opposed to a hard
    /// newline / CR+LF). Used by reflow policies.
    pub wrapped: bool,
    /// Combining-codepoint side-table carried over from the active grid's
    /// own [`crate::grid::Grid`] grapheme table when this line was pushed
    /// out of the viewport, keyed by column.
    pub graphemes: HashMap<u16, Vec<char>>,
}

impl ScrollbackLine {
    /// Create a new scrollback line from a cell slice.
    pub fn new(cells: &[Cell], wrapped: bool) -> Self {
        Self {
            cells: cells.to_vec(),
            wrapped,
            graphemes: HashMap::new(),
        }
    }

    /// Create a scrollback line carrying a grapheme side-table alongside
    /// its cells.
    pub fn with_graphemes(cells: &[Cell], wrapped: bool, graphemes: HashMap<u16, Vec<char>>) -> Self {
        Self {
            cells: cells.to_vec(),
            wrapped,
            graphemes,
        }
    }

    /// Number of cells in this line.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether this line has zero cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Estimated heap + inline cost of this line, for byte-budget accounting.
    pub fn byte_cost(&self) -> usize {
        LINE_OVERHEAD_BYTES + self.cells.len() * size_of::<Cell>()
    }
}

/// Scrollback buffer with configurable line capacity.
///
/// Uses a `VecDeque` for O(1) push/pop. When over capacity, the oldest line
/// (front of the deque) is evicted.
#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: VecDeque<ScrollbackLine>,
    capacity: usize,
    byte_budget: Option<usize>,
    bytes_used: usize,
    /// Absolute index of `lines[0]`. Incremented by one for every line
    /// evicted from the front, so a `Pin` can be checked for validity by
    /// comparing its recorded absolute index against `base()`.
    base: u64,
}

impl Scrollback {
    /// Create a new scrollback with the given line capacity and no byte
    /// budget (line-count bounded only).
    ///
    /// A capacity of `0` means scrollback is disabled (all pushes are dropped).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            byte_budget: None,
            bytes_used: 0,
            base: 0,
        }
    }

    /// Create a scrollback bounded by both a line-count cap and an
    /// estimated byte budget; whichever bound is hit first evicts.
    #[must_use]
    pub fn with_byte_budget(capacity: usize, byte_budget: usize) -> Self {
        let mut sb = Self::new(capacity);
        sb.byte_budget = Some(byte_budget);
        sb
    }

    /// Maximum number of lines this scrollback can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The configured byte budget, if any.
    #[must_use]
    pub fn byte_budget(&self) -> Option<usize> {
        self.byte_budget
    }

    /// Set (or clear, with `None`) the byte budget. Lowering it below the
    /// current usage evicts the oldest lines until usage fits.
    pub fn set_byte_budget(&mut self, budget: Option<usize>) {
        self.byte_budget = budget;
        self.evict_over_budget();
    }

    /// Estimated total bytes currently held in scrollback.
    #[must_use]
    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    /// Absolute index of the oldest line currently stored (monotonically
    /// increasing as lines are evicted from the front).
    #[must_use]
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Whether an absolute line index is still live (not yet evicted).
    #[must_use]
    pub fn contains_absolute(&self, index: u64) -> bool {
        index >= self.base && index < self.base + self.lines.len() as u64
    }

    /// Change the scrollback capacity.
    ///
    /// If the new capacity is smaller than the current line count, the oldest
    /// lines are evicted.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.lines.len() > capacity {
            self.pop_front_evict();
        }
    }

    /// Current number of stored lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the scrollback is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Push a row (as a cell slice) into scrollback.
    ///
    /// `wrapped` indicates whether the row was a soft-wrap continuation.
    /// If over the line-count or byte capacity, the oldest line(s) are
    /// evicted; only the line evicted by this specific push (if any) is
    /// returned, matching the line-count-only behavior callers already
    /// depend on. Additional byte-budget evictions, if any, happen
    /// silently (callers that need notification should prefer
    /// [`crate::pagestore::PageStore`], which tracks eviction generations).
    pub fn push_row(&mut self, cells: &[Cell], wrapped: bool) -> Option<ScrollbackLine> {
        self.push_line(ScrollbackLine::new(cells, wrapped))
    }

    /// Push a fully-formed [`ScrollbackLine`] (e.g. one carrying a grapheme
    /// side-table lifted out of the active grid). Same eviction behavior as
    /// [`Scrollback::push_row`].
    pub fn push_line(&mut self, line: ScrollbackLine) -> Option<ScrollbackLine> {
        if self.capacity == 0 {
            return None;
        }
        let evicted = if self.lines.len() == self.capacity {
            self.pop_front_evict()
        } else {
            None
        };
        self.bytes_used += line.byte_cost();
        self.lines.push_back(line);
        self.evict_over_budget();
        evicted
    }

    /// Pop the most recent (newest) line from scrollback.
    ///
    /// Used when scrolling down to pull lines back into the viewport, or
    /// when the viewport grows taller and lines are reclaimed.
    pub fn pop_newest(&mut self) -> Option<ScrollbackLine> {
        let line = self.lines.pop_back()?;
        self.bytes_used = self.bytes_used.saturating_sub(line.byte_cost());
        Some(line)
    }

    fn pop_front_evict(&mut self) -> Option<ScrollbackLine> {
        let line = self.lines.pop_front()?;
        self.bytes_used = self.bytes_used.saturating_sub(line.byte_cost());
        self.base += 1;
        Some(line)
    }

    fn evict_over_budget(&mut self) {
        let Some(budget) = self.byte_budget else {
            return;
        };
        while self.bytes_used > budget && self.lines.len() > 1 {
            self.pop_front_evict();
        }
    }

    /// Peek at the most recent (newest) line without removing it.
    #[must_use]
    pub fn peek_newest(&self) -> Option<&ScrollbackLine> {
        self.lines.back()
    }

    /// Get a line by index (0 = oldest).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScrollbackLine> {
        self.lines.get(index)
    }

    /// Iterate over stored lines from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ScrollbackLine> {
        self.lines.iter()
    }

    /// Iterate over stored lines from newest to oldest.
    pub fn iter_rev(&self) -> impl Iterator<Item = &ScrollbackLine> {
        self.lines.iter().rev()
    }

    /// Clear all stored lines.
    ///
    /// Note: this does not advance `base()`, since a clear isn't an
    /// eviction of specific absolute indices a pin could still reference
    /// sensibly — callers that need pin invalidation on clear should treat
    /// every previously valid absolute index as gone.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.bytes_used = 0;
    }
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new(0)
    }
}
