//! Minimal diff between two [`Grid`] snapshots, for hosts that want to push
//! only changed cells to a renderer instead of re-uploading the whole
//! viewport every frame.
//!
//! This is ambient to `spec.md` (the renderer itself is out of scope) but is
//! the natural complement to [`crate::grid::Grid`]'s per-row dirty flags:
//! [`DirtyTracker`] lets a caller accumulate "what changed" cheaply as
//! mutations happen, and [`GridDiff`] turns two snapshots (or a snapshot plus
//! a tracker) into a [`Patch`] a renderer can apply cell-by-cell.

use crate::cell::Cell;
use crate::grid::Grid;

/// One cell that changed, with its new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellUpdate {
    pub row: u16,
    pub col: u16,
    pub cell: Cell,
}

/// A maximal contiguous run of changed cells on a single row, grouped for
/// renderers that prefer to batch by span (e.g. one texture sub-upload per
/// run) instead of one update per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRun {
    pub row: u16,
    pub start_col: u16,
    pub cells: Vec<Cell>,
}

/// An inclusive column range `[start_col, end_col]` touched on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtySpan {
    pub row: u16,
    pub start_col: u16,
    pub end_col: u16,
}

/// A set of cell-level updates between two grid snapshots of the same
/// dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    cols: u16,
    rows: u16,
    pub updates: Vec<CellUpdate>,
}

impl Patch {
    /// An empty patch over a grid of the given dimensions, with update
    /// storage reserved so repeated [`GridDiff::diff_into`] calls don't
    /// reallocate on every frame.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            updates: Vec::new(),
        }
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    /// Apply this patch's updates to `grid` in place. Updates outside
    /// `grid`'s current bounds are skipped rather than panicking, since a
    /// patch computed against one size may be replayed against a grid that
    /// has since been resized.
    pub fn apply_to(&self, grid: &mut Grid) {
        for update in &self.updates {
            if let Some(cell) = grid.cell_mut(update.row, update.col) {
                *cell = update.cell;
            }
        }
    }

    /// Group this patch's per-cell updates into maximal contiguous runs per
    /// row. Updates must already be in row-major, column-ascending order
    /// (as produced by [`GridDiff`]) for runs to be maximal; a shuffled
    /// update list still yields *correct* (if less compact) runs.
    #[must_use]
    pub fn runs(&self) -> Vec<ChangeRun> {
        let mut runs: Vec<ChangeRun> = Vec::new();
        for update in &self.updates {
            if let Some(last) = runs.last_mut()
                && last.row == update.row
                && last.start_col as u32 + last.cells.len() as u32 == update.col as u32
            {
                last.cells.push(update.cell);
                continue;
            }
            runs.push(ChangeRun {
                row: update.row,
                start_col: update.col,
                cells: vec![update.cell],
            });
        }
        runs
    }
}

/// Per-row dirty column ranges, accumulated incrementally as cells are
/// written (cheaper than re-diffing two full snapshots when the caller
/// already knows what it touched).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyTracker {
    cols: u16,
    rows: u16,
    /// `spans[row]` is `Some((min_col, max_col))` once any cell in that row
    /// has been marked; `None` otherwise.
    spans: Vec<Option<(u16, u16)>>,
}

impl DirtyTracker {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            spans: vec![None; rows as usize],
        }
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Mark a single cell dirty, widening that row's span if needed.
    pub fn mark_cell(&mut self, row: u16, col: u16) {
        let Some(slot) = self.spans.get_mut(row as usize) else {
            return;
        };
        *slot = Some(match *slot {
            Some((lo, hi)) => (lo.min(col), hi.max(col)),
            None => (col, col),
        });
    }

    /// Mark an entire row dirty (e.g. after an erase/scroll touched it).
    pub fn mark_row(&mut self, row: u16) {
        if self.cols == 0 {
            return;
        }
        if let Some(slot) = self.spans.get_mut(row as usize) {
            *slot = Some((0, self.cols - 1));
        }
    }

    /// Mark a column range `[start_col, end_col]` dirty on one row.
    pub fn mark_range(&mut self, row: u16, start_col: u16, end_col: u16) {
        if start_col > end_col {
            return;
        }
        let Some(slot) = self.spans.get_mut(row as usize) else {
            return;
        };
        *slot = Some(match *slot {
            Some((lo, hi)) => (lo.min(start_col), hi.max(end_col)),
            None => (start_col, end_col),
        });
    }

    /// Iterate the dirty spans accumulated so far, in row order.
    pub fn spans(&self) -> impl Iterator<Item = DirtySpan> + '_ {
        self.spans
            .iter()
            .enumerate()
            .filter_map(|(row, span)| {
                span.map(|(start_col, end_col)| DirtySpan {
                    row: row as u16,
                    start_col,
                    end_col,
                })
            })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.spans.iter_mut().for_each(|s| *s = None);
    }
}

/// Pure functions that compare two [`Grid`] snapshots and produce a [`Patch`].
pub struct GridDiff;

impl GridDiff {
    /// Diff every cell of `old` against `new`, allocating a fresh [`Patch`].
    ///
    /// `old` and `new` need not share dimensions; cells only present in one
    /// grid (because the other is smaller) are treated as changed relative
    /// to a default blank cell.
    #[must_use]
    pub fn diff(old: &Grid, new: &Grid) -> Patch {
        let mut patch = Patch::new(new.cols(), new.rows());
        Self::diff_into(old, new, &mut patch);
        patch
    }

    /// Like [`GridDiff::diff`], but reuses `patch`'s update buffer instead of
    /// allocating a new one - the hot path for a renderer that diffs every
    /// frame.
    pub fn diff_into(old: &Grid, new: &Grid, patch: &mut Patch) {
        patch.cols = new.cols();
        patch.rows = new.rows();
        patch.updates.clear();

        for row in 0..new.rows() {
            let new_cells = new.row_cells(row);
            let old_cells = old.row_cells(row);
            for col in 0..new.cols() {
                let new_cell = new_cells.and_then(|c| c.get(col as usize)).copied();
                let old_cell = old_cells.and_then(|c| c.get(col as usize)).copied();
                let Some(new_cell) = new_cell else { continue };
                if old_cell != Some(new_cell) {
                    patch.updates.push(CellUpdate {
                        row,
                        col,
                        cell: new_cell,
                    });
                }
            }
        }
    }

    /// Diff only the cells named by `tracker`'s accumulated dirty spans,
    /// instead of scanning every cell. Correct only insofar as `tracker`
    /// actually saw every mutation between `old` and `new`; an incomplete
    /// tracker under-reports changes rather than over-reporting them.
    #[must_use]
    pub fn diff_dirty(old: &Grid, new: &Grid, tracker: &DirtyTracker) -> Patch {
        let mut patch = Patch::new(new.cols(), new.rows());
        for span in tracker.spans() {
            let new_cells = new.row_cells(span.row);
            let old_cells = old.row_cells(span.row);
            for col in span.start_col..=span.end_col {
                let new_cell = new_cells.and_then(|c| c.get(col as usize)).copied();
                let old_cell = old_cells.and_then(|c| c.get(col as usize)).copied();
                let Some(new_cell) = new_cell else { continue };
                if old_cell != Some(new_cell) {
                    patch.updates.push(CellUpdate {
                        row: span.row,
                        col,
                        cell: new_cell,
                    });
                }
            }
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn diff_finds_only_changed_cells() {
        let mut old = Grid::new(5, 2);
        let mut new = old.clone();
        new.cell_mut(0, 2).unwrap().set_content('x', 1);
        new.cell_mut(1, 4).unwrap().set_content('y', 1);

        let patch = GridDiff::diff(&old, &new);
        assert_eq!(patch.len(), 2);
        assert!(patch.updates.iter().any(|u| (u.row, u.col) == (0, 2)));
        assert!(patch.updates.iter().any(|u| (u.row, u.col) == (1, 4)));

        patch.apply_to(&mut old);
        assert_eq!(old.cell(0, 2).unwrap().content(), 'x');
        assert_eq!(old.cell(1, 4).unwrap().content(), 'y');
    }

    #[test]
    fn diff_into_clears_previous_contents() {
        let mut patch = Patch::new(5, 2);
        let old = Grid::new(5, 2);
        let mut new = old.clone();
        new.cell_mut(0, 0).unwrap().set_content('a', 1);
        GridDiff::diff_into(&old, &new, &mut patch);
        assert_eq!(patch.len(), 1);

        // Diffing identical grids must clear out the previous frame's updates.
        GridDiff::diff_into(&new, &new, &mut patch);
        assert!(patch.is_empty());
    }

    #[test]
    fn diff_dirty_only_scans_marked_spans() {
        let old = Grid::new(10, 3);
        let mut new = old.clone();
        new.cell_mut(1, 5).unwrap().set_content('z', 1);
        // Also touch a cell we will *not* mark dirty; diff_dirty must miss it.
        new.cell_mut(2, 0).unwrap().set_content('q', 1);

        let mut tracker = DirtyTracker::new(10, 3);
        tracker.mark_cell(1, 5);

        let patch = GridDiff::diff_dirty(&old, &new, &tracker);
        assert_eq!(patch.len(), 1);
        assert_eq!((patch.updates[0].row, patch.updates[0].col), (1, 5));
    }

    #[test]
    fn runs_group_contiguous_columns_per_row() {
        let old = Grid::new(10, 1);
        let mut new = old.clone();
        for col in [0u16, 1, 2, 5] {
            new.cell_mut(0, col).unwrap().set_content('a', 1);
        }
        let patch = GridDiff::diff(&old, &new);
        let runs = patch.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].start_col, 0);
        assert_eq!(runs[0].cells.len(), 3);
        assert_eq!(runs[1].start_col, 5);
        assert_eq!(runs[1].cells.len(), 1);
    }

    #[test]
    fn dirty_tracker_clear_resets_all_rows() {
        let mut tracker = DirtyTracker::new(4, 2);
        tracker.mark_cell(0, 1);
        tracker.mark_row(1);
        assert!(!tracker.is_empty());
        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.spans().count(), 0);
    }

    #[test]
    fn unused_cell_update_fields_stay_accessible() {
        let update = CellUpdate {
            row: 0,
            col: 0,
            cell: Cell::new('x'),
        };
        assert_eq!(update.cell.content(), 'x');
    }
}
