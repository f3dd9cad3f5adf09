//! Page store: the active grid plus scrollback history, addressed through
//! stable [`Pin`]s instead of raw row indices.
//!
//! A raw `(row, col)` into the active [`Grid`] stops meaning anything the
//! moment a scroll or resize happens; callers that need to remember "this
//! cell" across such an event (search match highlights, hyperlink hover,
//! selection endpoints) need a handle that survives it. `Pin` is that
//! handle: it is either an offset into the live viewport, or a
//! `(slot, col)` pair into scrollback tagged with the absolute line index
//! scrollback held at pin time, so [`PageStore::resolve`] can report
//! "evicted" in O(1) instead of silently resolving to the wrong line.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::cell::{Cell, Color, HyperlinkRegistry, SgrAttrs};
use crate::grid::Grid;
use crate::scrollback::{Scrollback, ScrollbackLine};

/// `spec.md` §4.B: `resize(cols, rows, reflow_mode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReflowMode {
    /// Rewrap soft-wrapped logical lines at the new width; hard-wrapped
    /// lines are preserved unchanged (the reflow algorithm in §4.B).
    #[default]
    Reflow,
    /// Truncate/extend columns and rows in place with no rewrapping. Used
    /// by hosts that treat a resize as a hard viewport change (e.g. a
    /// one-off snap-resize during a drag) rather than a reflow event.
    Preserve,
}

/// A stable reference to a single cell, valid across scrolls and resizes
/// until the line it names is actually evicted from scrollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    /// A cell in the live viewport, named by its current `(row, col)`.
    /// Active pins are *not* stable across scrolls: a caller that needs a
    /// pin to survive a scroll must re-pin after each scroll event, or pin
    /// into history once the line has actually left the viewport.
    Active { row: u16, col: u16 },
    /// A cell in scrollback, named by the absolute line index the line had
    /// when it was pinned (stable regardless of further pushes) plus a
    /// column.
    History { absolute_line: u64, col: u16 },
}

/// Where a [`Pin`] currently resolves to, or whether it no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinRegion {
    /// Still live in the active viewport.
    Active { row: u16, col: u16 },
    /// Still live in scrollback, at this 0-based slot from the oldest
    /// currently-held line.
    History { slot: usize, col: u16 },
    /// The line (or, for an active pin, the viewport itself) this pin named
    /// has scrolled away and is gone for good.
    Evicted,
}

/// The combined active-region + history-region cell store.
///
/// Bundles a [`Grid`] and a [`Scrollback`] and offers the scroll/resize
/// operations that touch both together, plus [`Pin`] resolution so callers
/// never have to reach into scrollback indices directly.
#[derive(Debug, Clone)]
pub struct PageStore {
    grid: Grid,
    scrollback: Scrollback,
}

impl PageStore {
    #[must_use]
    pub fn new(cols: u16, rows: u16, scrollback_capacity: usize) -> Self {
        Self {
            grid: Grid::new(cols, rows),
            scrollback: Scrollback::new(scrollback_capacity),
        }
    }

    #[must_use]
    pub fn with_byte_budget(
        cols: u16,
        rows: u16,
        scrollback_capacity: usize,
        scrollback_byte_budget: usize,
    ) -> Self {
        Self {
            grid: Grid::new(cols, rows),
            scrollback: Scrollback::with_byte_budget(scrollback_capacity, scrollback_byte_budget),
        }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    #[must_use]
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    #[must_use]
    pub fn scrollback_mut(&mut self) -> &mut Scrollback {
        &mut self.scrollback
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.grid.cols()
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.grid.rows()
    }

    /// Total number of addressable lines: scrollback history followed by
    /// the active viewport.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.scrollback.len() + self.grid.rows() as usize
    }

    /// Scroll the active region up within `[top, bottom)`, pushing evicted
    /// rows into scrollback.
    pub fn scroll_up(&mut self, top: u16, bottom: u16, count: u16, bg: Color) {
        self.grid
            .scroll_up_into(top, bottom, count, &mut self.scrollback, bg);
    }

    /// Scroll the active region down within `[top, bottom)`, pulling rows
    /// back out of scrollback to refill the vacated top.
    pub fn scroll_down(&mut self, top: u16, bottom: u16, count: u16, bg: Color) {
        self.grid
            .scroll_down_from(top, bottom, count, &mut self.scrollback, bg);
    }

    /// Append one row of cells directly to scrollback without touching the
    /// active grid (used by reflow when the viewport shrinks).
    pub fn push_history_row(&mut self, cells: &[Cell], wrapped: bool) {
        let _ = self.scrollback.push_row(cells, wrapped);
    }

    /// Resize the active viewport in place, pushing/pulling rows through
    /// scrollback as needed to keep `cursor_row` anchored on-screen, with no
    /// rewrapping (`ReflowMode::Preserve`; see [`PageStore::reflow`] for
    /// `ReflowMode::Reflow`). Returns the adjusted cursor row.
    pub fn resize(&mut self, new_cols: u16, new_rows: u16, cursor_row: u16) -> u16 {
        self.grid
            .resize_with_scrollback(new_cols, new_rows, cursor_row, &mut self.scrollback)
    }

    /// Soft-wrap-aware reflow per `spec.md` §4.B's "Reflow algorithm": for
    /// each logical line (a maximal run of rows joined by the row-level wrap
    /// flag), collect its cells, drop trailing blanks, and re-emit them
    /// wrapped at `new_cols`. A row whose wrap flag is unset ends its
    /// logical line even if shorter than the new width, so hard line breaks
    /// are never merged across. The combined result (scrollback history
    /// followed by the rewrapped active rows) is then re-split into
    /// `new_rows` active rows with everything above moved to scrollback
    /// (oldest lines dropped first if that exceeds scrollback capacity).
    ///
    /// The cursor's logical position is modeled as a caret at an offset in
    /// `0..=logical_line_len` (not bound to an existing cell), so "sitting
    /// right after the last printed character with nothing typed yet" is
    /// representable even once trailing blanks are trimmed. `(cursor_row,
    /// cursor_col)` is carried to the equivalent position in the new
    /// layout; if the owning logical line's row scrolled out of the active
    /// region entirely, the cursor clamps to the top-left active cell (the
    /// nearest valid cell in reading order, per `spec.md` §4.B).
    pub fn reflow(&mut self, new_cols: u16, new_rows: u16, cursor_row: u16, cursor_col: u16) -> (u16, u16) {
        if new_cols == 0 || new_rows == 0 {
            return (0, 0);
        }
        if new_cols == self.grid.cols() && new_rows == self.grid.rows() {
            return (cursor_row.min(new_rows.saturating_sub(1)), cursor_col.min(new_cols.saturating_sub(1)));
        }

        let old_cols = self.grid.cols();
        let old_rows = self.grid.rows();
        let scrollback_len = self.scrollback.len();

        struct PhysRow {
            cells: Vec<Cell>,
            graphemes: HashMap<u16, Vec<char>>,
            wrap: bool,
        }

        // 1. Flatten scrollback (oldest first) then the active region into
        //    one ordered list of physical rows. The cursor's absolute
        //    physical row index is `scrollback_len + cursor_row`.
        let cursor_abs = scrollback_len as u64 + cursor_row as u64;
        let mut phys: Vec<PhysRow> = Vec::with_capacity(scrollback_len + old_rows as usize);
        for line in self.scrollback.iter() {
            let mut cells = line.cells.clone();
            cells.resize(old_cols as usize, Cell::default());
            phys.push(PhysRow { cells, graphemes: line.graphemes.clone(), wrap: line.wrapped });
        }
        for r in 0..old_rows {
            let cells = self.grid.row_cells(r).map(<[Cell]>::to_vec).unwrap_or_default();
            let graphemes = self.grid.row_graphemes(r);
            phys.push(PhysRow { cells, graphemes, wrap: self.grid.is_wrapped(r) });
        }

        // 2. Group into logical lines: maximal runs joined by `wrap`.
        struct LogicalLine {
            cells: Vec<Cell>,
            graphemes: BTreeMap<usize, Vec<char>>,
        }
        let mut logical: Vec<LogicalLine> = Vec::new();
        // (logical line index, pre-trim local cell offset) for the cursor.
        let mut cursor_logical: Option<(usize, usize)> = None;

        let mut i = 0usize;
        while i < phys.len() {
            let mut cells: Vec<Cell> = Vec::new();
            let mut graphemes: BTreeMap<usize, Vec<char>> = BTreeMap::new();
            loop {
                let row = &phys[i];
                let base = cells.len();
                if i as u64 == cursor_abs {
                    cursor_logical = Some((logical.len(), base + cursor_col as usize));
                }
                for (col, cell) in row.cells.iter().enumerate() {
                    cells.push(*cell);
                    let _ = col;
                }
                for (&col, chars) in &row.graphemes {
                    graphemes.insert(base + col as usize, chars.clone());
                }
                let continues = row.wrap;
                i += 1;
                if !continues || i >= phys.len() {
                    break;
                }
            }

            // Trailing-blank trim (spec.md §4.B: "Trailing blanks of each
            // logical line are dropped before re-wrapping"). The cursor is
            // a caret at an offset, not an indexed cell, so trimming is
            // unconditional; the caret offset is clamped afterward.
            let mut trim_to = cells.len();
            while trim_to > 0 && is_blank_cell(&cells[trim_to - 1]) {
                trim_to -= 1;
            }
            cells.truncate(trim_to);
            graphemes.retain(|&k, _| k < trim_to);

            logical.push(LogicalLine { cells, graphemes });
        }

        if let Some((idx, offset)) = cursor_logical.as_mut() {
            let len = logical[*idx].cells.len();
            *offset = (*offset).min(len);
        }

        // 3. Re-wrap each logical line at `new_cols`.
        let mut out_rows: Vec<PhysRow> = Vec::new();
        let mut cursor_out: Option<(usize, u16)> = None;

        for (logical_idx, line) in logical.into_iter().enumerate() {
            let total = line.cells.len();
            let mut last_chunk: (usize, usize) = (0, 0); // (idx, take) of the final emitted chunk

            if total == 0 {
                out_rows.push(PhysRow {
                    cells: vec![Cell::default(); new_cols as usize],
                    graphemes: HashMap::new(),
                    wrap: false,
                });
            } else {
                let mut idx = 0usize;
                while idx < total {
                    let remaining = total - idx;
                    let mut take = remaining.min(new_cols as usize);
                    // Never split a wide cell's lead from its spacer across
                    // the new row boundary.
                    if take == new_cols as usize && take > 0 && line.cells[idx + take - 1].is_wide() {
                        take -= 1;
                    }
                    let take = take.max(1);

                    let mut row_cells = line.cells[idx..idx + take].to_vec();
                    row_cells.resize(new_cols as usize, Cell::default());
                    let mut row_graphemes = HashMap::new();
                    for (&k, chars) in line.graphemes.range(idx..idx + take) {
                        row_graphemes.insert((k - idx) as u16, chars.clone());
                    }

                    let continues = idx + take < total;
                    out_rows.push(PhysRow { cells: row_cells, graphemes: row_graphemes, wrap: continues });

                    if let Some((l_idx, offset)) = cursor_logical {
                        if l_idx == logical_idx && offset >= idx && offset < idx + take {
                            cursor_out = Some((out_rows.len() - 1, (offset - idx) as u16));
                        }
                    }
                    last_chunk = (idx, take);
                    idx += take;
                }
            }

            // Caret sits exactly at `total` (one past the last real cell):
            // lands right after the last emitted row of this logical line.
            // If that row is exactly full, the caret is at the right margin
            // (pending-wrap position) and clamps to the last column.
            if let Some((l_idx, offset)) = cursor_logical {
                if l_idx == logical_idx && offset == total && cursor_out.is_none() {
                    let last_row = out_rows.len() - 1;
                    let (_, last_take) = last_chunk;
                    let col = if last_take == new_cols as usize {
                        new_cols - 1
                    } else {
                        last_take as u16
                    };
                    cursor_out = Some((last_row, col));
                }
            }
        }

        if out_rows.is_empty() {
            out_rows.push(PhysRow { cells: vec![Cell::default(); new_cols as usize], graphemes: HashMap::new(), wrap: false });
        }

        // 4. Pad with blank rows at the bottom if there isn't enough
        //    content to fill `new_rows`.
        while out_rows.len() < new_rows as usize {
            out_rows.push(PhysRow { cells: vec![Cell::default(); new_cols as usize], graphemes: HashMap::new(), wrap: false });
        }

        // 5. Split: the last `new_rows` become active, everything before
        //    goes to scrollback (oldest-first push, which evicts its own
        //    oldest entries if that exceeds scrollback capacity).
        let split_at = out_rows.len() - new_rows as usize;
        self.scrollback.clear();
        for (n, row) in out_rows.iter().enumerate().take(split_at) {
            let _ = n;
            self.scrollback.push_line(ScrollbackLine::with_graphemes(&row.cells, row.wrap, row.graphemes.clone()));
        }

        let mut new_grid = Grid::new(new_cols, new_rows);
        for (r, row) in out_rows[split_at..].iter().enumerate() {
            if let Some(dest) = new_grid.row_cells_mut(r as u16) {
                dest.copy_from_slice(&row.cells);
            }
            new_grid.set_wrapped(r as u16, row.wrap);
            for (&col, chars) in &row.graphemes {
                for ch in chars {
                    new_grid.push_combining(r as u16, col, *ch);
                }
            }
        }
        self.grid = new_grid;

        match cursor_out {
            Some((row, col)) if row >= split_at => {
                ((row - split_at) as u16, col.min(new_cols.saturating_sub(1)))
            }
            _ => (0, 0),
        }
    }

    /// Resolve a [`Pin`] to its current location, or report eviction.
    #[must_use]
    pub fn resolve(&self, pin: Pin) -> PinRegion {
        match pin {
            Pin::Active { row, col } => {
                if row < self.grid.rows() && col < self.grid.cols() {
                    PinRegion::Active { row, col }
                } else {
                    PinRegion::Evicted
                }
            }
            Pin::History { absolute_line, col } => {
                if !self.scrollback.contains_absolute(absolute_line) {
                    return PinRegion::Evicted;
                }
                let slot = (absolute_line - self.scrollback.base()) as usize;
                PinRegion::History { slot, col }
            }
        }
    }

    /// Pin the active-region cell at `(row, col)`.
    #[must_use]
    pub fn pin_active(&self, row: u16, col: u16) -> Pin {
        Pin::Active { row, col }
    }

    /// Pin the scrollback cell currently at `slot` (0 = oldest held line).
    ///
    /// Returns `None` if `slot` is out of range.
    #[must_use]
    pub fn pin_history(&self, slot: usize, col: u16) -> Option<Pin> {
        if slot >= self.scrollback.len() {
            return None;
        }
        Some(Pin::History {
            absolute_line: self.scrollback.base() + slot as u64,
            col,
        })
    }

    /// Read the cell a [`Pin`] currently names, or `None` if it has been
    /// evicted or the column is past the line's stored width.
    #[must_use]
    pub fn cell_at(&self, pin: Pin) -> Option<Cell> {
        match self.resolve(pin) {
            PinRegion::Active { row, col } => self.grid.cell(row, col).copied(),
            PinRegion::History { slot, col } => self
                .scrollback
                .get(slot)
                .and_then(|line| line.cells.get(col as usize))
                .copied(),
            PinRegion::Evicted => None,
        }
    }

    /// Borrow the scrollback line a history pin resolves to, if still live.
    #[must_use]
    pub fn history_line_at(&self, slot: usize) -> Option<&ScrollbackLine> {
        self.scrollback.get(slot)
    }

    /// Release hyperlink refcounts held by rows about to be discarded
    /// outright (e.g. on a full reset), rather than scrolled into history.
    pub fn release_hyperlinks(&self, registry: &mut HyperlinkRegistry) {
        for row in 0..self.grid.rows() {
            if let Some(cells) = self.grid.row_cells(row) {
                registry.release_cells(cells);
            }
        }
        for line in self.scrollback.iter() {
            registry.release_cells(&line.cells);
        }
    }

    /// Print a character at `(row, col)`, routed straight to the active
    /// grid (history is never written to directly).
    pub fn write_printable(&mut self, row: u16, col: u16, ch: char, attrs: SgrAttrs) -> u8 {
        self.grid.write_printable(row, col, ch, attrs)
    }
}

/// A cell [`PageStore::reflow`]'s trailing-blank trim treats as empty: the
/// default space glyph, no hyperlink, no grapheme, and the row background
/// carried in default (unstyled) attributes. A cell erased with a non-default
/// background (`Color::Named`/`Color::Rgb`/etc.) is intentionally styled
/// "blank" ink and is not trimmed, since dropping it would lose that
/// background when the line re-wraps.
fn is_blank_cell(cell: &Cell) -> bool {
    cell.content() == ' '
        && !cell.is_wide()
        && !cell.is_wide_continuation()
        && !cell.has_grapheme()
        && cell.hyperlink == 0
        && cell.attrs == SgrAttrs::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn active_pin_resolves_until_out_of_bounds() {
        let store = PageStore::new(10, 5, 100);
        let pin = store.pin_active(2, 3);
        assert_eq!(store.resolve(pin), PinRegion::Active { row: 2, col: 3 });

        let bad = store.pin_active(99, 0);
        assert_eq!(store.resolve(bad), PinRegion::Evicted);
    }

    #[test]
    fn history_pin_survives_further_scrolls_until_evicted() {
        let mut store = PageStore::new(4, 2, 3);
        store.scroll_up(0, 2, 1, Color::Default); // evicts nothing yet, row 0 -> scrollback
        let pin = store.pin_history(0, 0).expect("one history line");
        assert!(matches!(
            store.resolve(pin),
            PinRegion::History { slot: 0, .. }
        ));

        // Scroll enough times to exceed scrollback capacity (3) and evict it.
        store.scroll_up(0, 2, 1, Color::Default);
        store.scroll_up(0, 2, 1, Color::Default);
        store.scroll_up(0, 2, 1, Color::Default);
        assert_eq!(store.resolve(pin), PinRegion::Evicted);
    }

    #[test]
    fn cell_at_reads_through_active_and_history() {
        let mut store = PageStore::new(3, 2, 10);
        store.grid_mut().write_printable(0, 0, 'x', SgrAttrs::default());
        let active_pin = store.pin_active(0, 0);
        assert_eq!(store.cell_at(active_pin).unwrap().content(), 'x');

        store.scroll_up(0, 2, 1, Color::Default);
        let history_pin = store.pin_history(0, 0).unwrap();
        assert_eq!(store.cell_at(history_pin).unwrap().content(), 'x');
    }

    #[test]
    fn total_lines_counts_history_and_viewport() {
        let mut store = PageStore::new(4, 3, 10);
        assert_eq!(store.total_lines(), 3);
        store.scroll_up(0, 3, 2, Color::Default);
        assert_eq!(store.total_lines(), 5);
    }

    #[test]
    fn release_hyperlinks_touches_active_and_history_rows() {
        let mut registry = HyperlinkRegistry::default();
        let id = registry.acquire("https://example.com");
        let mut store = PageStore::new(2, 2, 10);
        let mut cell = Cell::new('a');
        cell.hyperlink = id;
        *store.grid_mut().cell_mut(0, 0).unwrap() = cell;
        store.release_hyperlinks(&mut registry);
        assert!(!registry.contains(id));
    }
}
