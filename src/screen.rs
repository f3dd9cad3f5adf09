//! Screen model: the mutable terminal state the [`crate::executor::Executor`]
//! drives — primary/alternate page stores, cursor, scroll region, tab stops,
//! mode set, saved-cursor stack, hyperlink registry, selection, and the
//! handful of string/color slots a host persists between sessions (title,
//! OSC 4/10/11/12 color overrides).
//!
//! The Screen never parses bytes itself; [`Parser`](crate::parser::Parser)
//! and [`Executor`](crate::executor::Executor) are the only things that
//! mutate it, matching `spec.md` §9's "all current modes live in the Screen;
//! functions that depend on modes take the mode set explicitly."

use crate::cell::HyperlinkRegistry;
use crate::cursor::{Cursor, SavedCursor};
use crate::modes::Modes;
use crate::pagestore::{PageStore, ReflowMode};
use crate::stringmap::Selection;

/// Default tab-stop spacing (every 8th column), matching every xterm-family
/// terminal's power-on default.
const DEFAULT_TAB_WIDTH: u16 = 8;

/// The full mutable terminal state: primary/alternate [`PageStore`]s, the
/// [`Cursor`], scroll region, tab stops, [`Modes`], saved-cursor stack, and
/// the ancillary state (hyperlinks, selection, title, color overrides) a
/// host persists or queries.
#[derive(Debug, Clone)]
pub struct Screen {
    primary: PageStore,
    alt: PageStore,
    /// Cursor position/attrs for whichever of `primary`/`alt` is active.
    cursor: Cursor,
    /// The primary screen's cursor, stashed while the alt screen is active
    /// (xterm's alt-screen cursor is independent of the primary one even
    /// without the 1049 save/restore wrapper).
    primary_cursor_shadow: Cursor,
    alt_active: bool,
    modes: Modes,
    /// Scroll region, `[top, bottom) x [left, right)`. `left`/`right` are
    /// only honored by the executor when `DecModes::LEFT_RIGHT_MARGIN` is
    /// set (DECLRMM); see `spec.md` §4.D's DECSLRM tie-break.
    top: u16,
    bottom: u16,
    left: u16,
    right: u16,
    tab_stops: Vec<bool>,
    /// DECSC/DECRC save stack (`spec.md` §3 calls out "saved-cursor stack").
    /// `save_cursor` pushes; `restore_cursor` reads the top without popping
    /// it, so repeated DECRCs without an intervening DECSC keep restoring
    /// the same snapshot, matching every real terminal's single-slot DECSC
    /// behavior while still giving 1049's own save/restore a stack frame
    /// that nests correctly with an explicit DECSC made before entering the
    /// alt screen.
    saved_cursors: Vec<SavedCursor>,
    hyperlinks: HyperlinkRegistry,
    selection: Option<Selection>,
    title: String,
    icon_title: String,
    /// OSC 4 palette overrides, indexed 0-255.
    palette: Vec<Option<(u8, u8, u8)>>,
    fg_color: Option<(u8, u8, u8)>,
    bg_color: Option<(u8, u8, u8)>,
    cursor_color: Option<(u8, u8, u8)>,
}

impl Screen {
    #[must_use]
    pub fn new(cols: u16, rows: u16, scrollback_capacity: usize) -> Self {
        Self {
            primary: PageStore::new(cols, rows, scrollback_capacity),
            alt: PageStore::new(cols, rows, 0),
            cursor: Cursor::new(cols, rows),
            primary_cursor_shadow: Cursor::new(cols, rows),
            alt_active: false,
            modes: Modes::new(),
            top: 0,
            bottom: rows,
            left: 0,
            right: cols,
            tab_stops: default_tab_stops(cols),
            saved_cursors: Vec::new(),
            hyperlinks: HyperlinkRegistry::new(),
            selection: None,
            title: String::new(),
            icon_title: String::new(),
            palette: vec![None; 256],
            fg_color: None,
            bg_color: None,
            cursor_color: None,
        }
    }

    #[must_use]
    pub fn with_byte_budget(cols: u16, rows: u16, scrollback_capacity: usize, byte_budget: usize) -> Self {
        let mut screen = Self::new(cols, rows, scrollback_capacity);
        screen.primary = PageStore::with_byte_budget(cols, rows, scrollback_capacity, byte_budget);
        screen
    }

    // ── Active page store ───────────────────────────────────────────

    #[must_use]
    pub fn active(&self) -> &PageStore {
        if self.alt_active { &self.alt } else { &self.primary }
    }

    pub fn active_mut(&mut self) -> &mut PageStore {
        if self.alt_active { &mut self.alt } else { &mut self.primary }
    }

    #[must_use]
    pub fn primary(&self) -> &PageStore {
        &self.primary
    }

    #[must_use]
    pub fn alt_screen_active(&self) -> bool {
        self.alt_active
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.active().cols()
    }

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.active().rows()
    }

    // ── Cursor / modes ──────────────────────────────────────────────

    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    #[must_use]
    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn modes_mut(&mut self) -> &mut Modes {
        &mut self.modes
    }

    // ── Scroll region ───────────────────────────────────────────────

    /// Current scroll region as `(top, bottom, left, right)`, half-open on
    /// both axes (`[top, bottom)`, `[left, right)`).
    #[must_use]
    pub fn scroll_region(&self) -> (u16, u16, u16, u16) {
        (self.top, self.bottom, self.left, self.right)
    }

    /// DECSTBM. `None` for either bound resets that bound to the full
    /// screen, matching "DECSTBM without parameters resets to full screen."
    pub fn set_vertical_margins(&mut self, top: Option<u16>, bottom: Option<u16>) {
        let rows = self.rows();
        let top = top.unwrap_or(0).min(rows.saturating_sub(1));
        let bottom = bottom.map(|b| b.min(rows)).unwrap_or(rows);
        if top + 1 < bottom {
            self.top = top;
            self.bottom = bottom;
        } else {
            self.top = 0;
            self.bottom = rows;
        }
    }

    /// DECSLRM. Caller is responsible for checking DECLRMM is enabled first
    /// (`spec.md` §4.D: "DECSLRM is recognized only when DECLRMM... is
    /// enabled").
    pub fn set_horizontal_margins(&mut self, left: Option<u16>, right: Option<u16>) {
        let cols = self.cols();
        let left = left.unwrap_or(0).min(cols.saturating_sub(1));
        let right = right.map(|r| r.min(cols)).unwrap_or(cols);
        if left + 1 < right {
            self.left = left;
            self.right = right;
        } else {
            self.left = 0;
            self.right = cols;
        }
    }

    pub fn reset_scroll_region(&mut self) {
        self.top = 0;
        self.bottom = self.rows();
        self.left = 0;
        self.right = self.cols();
    }

    // ── Tab stops ───────────────────────────────────────────────────

    pub fn set_tab_stop(&mut self, col: u16) {
        if let Some(slot) = self.tab_stops.get_mut(col as usize) {
            *slot = true;
        }
    }

    pub fn clear_tab_stop(&mut self, col: u16) {
        if let Some(slot) = self.tab_stops.get_mut(col as usize) {
            *slot = false;
        }
    }

    pub fn clear_all_tab_stops(&mut self) {
        for slot in &mut self.tab_stops {
            *slot = false;
        }
    }

    pub fn reset_tab_stops(&mut self) {
        self.tab_stops = default_tab_stops(self.cols());
    }

    /// The next tab stop strictly after `col`, clamped to the last column.
    #[must_use]
    pub fn next_tab_stop(&self, col: u16) -> u16 {
        let last = self.cols().saturating_sub(1);
        ((col + 1)..=last)
            .find(|&c| self.tab_stops.get(c as usize).copied().unwrap_or(false))
            .unwrap_or(last)
    }

    /// The previous tab stop strictly before `col`, clamped to column 0.
    #[must_use]
    pub fn prev_tab_stop(&self, col: u16) -> u16 {
        (0..col)
            .rev()
            .find(|&c| self.tab_stops.get(c as usize).copied().unwrap_or(false))
            .unwrap_or(0)
    }

    // ── Resize ──────────────────────────────────────────────────────

    /// Resize both page stores to `(new_cols, new_rows)` with no rewrapping
    /// (`spec.md` §4.B `reflow_mode` left at its non-reflow setting): columns
    /// truncate/extend in place. Equivalent to
    /// `resize_with_mode(new_cols, new_rows, ReflowMode::Preserve)`.
    pub fn resize(&mut self, new_cols: u16, new_rows: u16) {
        self.resize_with_mode(new_cols, new_rows, ReflowMode::Preserve);
    }

    /// Resize both page stores to `(new_cols, new_rows)`, clamping the
    /// scroll region and rebuilding tab stops past the new width.
    ///
    /// `ReflowMode::Reflow` runs the soft-wrap-aware algorithm of
    /// [`PageStore::reflow`] on both the primary and alternate page stores,
    /// carrying each screen's own cursor to its equivalent logical position
    /// (`spec.md` §4.B: "if that position no longer exists, cursor moves to
    /// the nearest valid cell following reading order").
    pub fn resize_with_mode(&mut self, new_cols: u16, new_rows: u16, reflow_mode: ReflowMode) {
        let active_is_alt = self.alt_active;
        let primary_cursor = self.cursor_for(false);
        let alt_cursor = self.cursor_for(true);

        let (new_row, new_col) = match reflow_mode {
            ReflowMode::Reflow => {
                self.primary.reflow(new_cols, new_rows, primary_cursor.0, primary_cursor.1)
            }
            ReflowMode::Preserve => {
                (self.primary.resize(new_cols, new_rows, primary_cursor.0), primary_cursor.1)
            }
        };
        let (new_alt_row, new_alt_col) = match reflow_mode {
            ReflowMode::Reflow => self.alt.reflow(new_cols, new_rows, alt_cursor.0, alt_cursor.1),
            ReflowMode::Preserve => (self.alt.resize(new_cols, new_rows, alt_cursor.0), alt_cursor.1),
        };

        if active_is_alt {
            self.cursor.row = new_alt_row.min(new_rows.saturating_sub(1));
            self.cursor.col = new_alt_col.min(new_cols.saturating_sub(1));
            self.primary_cursor_shadow.row = new_row.min(new_rows.saturating_sub(1));
            self.primary_cursor_shadow.col = new_col.min(new_cols.saturating_sub(1));
        } else {
            self.cursor.row = new_row.min(new_rows.saturating_sub(1));
            self.cursor.col = new_col.min(new_cols.saturating_sub(1));
            self.primary_cursor_shadow.row = new_alt_row.min(new_rows.saturating_sub(1));
            self.primary_cursor_shadow.col = new_alt_col.min(new_cols.saturating_sub(1));
        }
        self.cursor.pending_wrap = false;

        if self.tab_stops.len() != new_cols as usize {
            self.tab_stops = default_tab_stops(new_cols);
        }
        self.top = self.top.min(new_rows.saturating_sub(1));
        self.bottom = new_rows;
        self.left = self.left.min(new_cols.saturating_sub(1));
        self.right = new_cols;
    }

    fn cursor_for(&self, alt: bool) -> (u16, u16) {
        if alt == self.alt_active {
            (self.cursor.row, self.cursor.col)
        } else {
            (self.primary_cursor_shadow.row, self.primary_cursor_shadow.col)
        }
    }

    // ── Alternate screen ────────────────────────────────────────────

    /// Switch to the alternate screen. If `save_cursor` is set (modes
    /// 1047/1049's cursor-preserving variants), the primary cursor is
    /// snapshotted onto the save stack first.
    pub fn enter_alt_screen(&mut self, save_cursor: bool, clear: bool) {
        if self.alt_active {
            return;
        }
        if save_cursor {
            self.save_cursor();
        }
        std::mem::swap(&mut self.cursor, &mut self.primary_cursor_shadow);
        self.alt_active = true;
        if clear {
            self.alt.grid_mut().erase_all(crate::cell::Color::Default);
        }
    }

    /// Switch back to the primary screen, restoring the stashed primary
    /// cursor (and, if `restore_cursor` is set, popping DECRC state).
    pub fn leave_alt_screen(&mut self, restore_cursor: bool) {
        if !self.alt_active {
            return;
        }
        self.alt_active = false;
        std::mem::swap(&mut self.cursor, &mut self.primary_cursor_shadow);
        if restore_cursor {
            self.restore_cursor();
        }
    }

    // ── Save/restore cursor (DECSC/DECRC) ───────────────────────────

    pub fn save_cursor(&mut self) {
        self.saved_cursors.push(SavedCursor::save(&self.cursor, self.modes.origin_mode()));
    }

    /// Restore the most recently saved cursor, if any (peek, not pop).
    pub fn restore_cursor(&mut self) {
        let Some(saved) = self.saved_cursors.last().copied() else {
            return;
        };
        let max_row = self.rows().saturating_sub(1);
        let max_col = self.cols().saturating_sub(1);
        let origin = self.cursor.restore(&saved, max_row, max_col);
        if origin {
            self.modes.dec.insert(crate::modes::DecModes::ORIGIN);
        } else {
            self.modes.dec.remove(crate::modes::DecModes::ORIGIN);
        }
    }

    /// Drop the top save-stack entry (used when 1049's own bookkeeping needs
    /// to undo a save that didn't pair with an explicit DECRC).
    pub fn discard_saved_cursor(&mut self) {
        self.saved_cursors.pop();
    }

    // ── Hyperlinks / selection ──────────────────────────────────────

    #[must_use]
    pub fn hyperlinks(&self) -> &HyperlinkRegistry {
        &self.hyperlinks
    }

    pub fn hyperlinks_mut(&mut self) -> &mut HyperlinkRegistry {
        &mut self.hyperlinks
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    // ── Title / colors ──────────────────────────────────────────────

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    #[must_use]
    pub fn icon_title(&self) -> &str {
        &self.icon_title
    }

    pub fn set_icon_title(&mut self, title: String) {
        self.icon_title = title;
    }

    #[must_use]
    pub fn palette_color(&self, index: u8) -> Option<(u8, u8, u8)> {
        self.palette.get(index as usize).copied().flatten()
    }

    pub fn set_palette_color(&mut self, index: u8, rgb: Option<(u8, u8, u8)>) {
        if let Some(slot) = self.palette.get_mut(index as usize) {
            *slot = rgb;
        }
    }

    #[must_use]
    pub fn fg_color(&self) -> Option<(u8, u8, u8)> {
        self.fg_color
    }

    pub fn set_fg_color(&mut self, rgb: Option<(u8, u8, u8)>) {
        self.fg_color = rgb;
    }

    #[must_use]
    pub fn bg_color(&self) -> Option<(u8, u8, u8)> {
        self.bg_color
    }

    pub fn set_bg_color(&mut self, rgb: Option<(u8, u8, u8)>) {
        self.bg_color = rgb;
    }

    #[must_use]
    pub fn cursor_color(&self) -> Option<(u8, u8, u8)> {
        self.cursor_color
    }

    pub fn set_cursor_color(&mut self, rgb: Option<(u8, u8, u8)>) {
        self.cursor_color = rgb;
    }

    // ── Reset ───────────────────────────────────────────────────────

    /// RIS (`ESC c`): full terminal reset. Clears both screens, releases
    /// every live hyperlink, and resets modes/cursor/tab-stops/margins to
    /// power-on defaults. Scrollback and the color/title overrides a host
    /// would want to survive a shell-initiated reset are left untouched,
    /// matching real terminals (a reset clears the *screen*, not history).
    pub fn full_reset(&mut self) {
        self.primary.release_hyperlinks(&mut self.hyperlinks);
        self.alt.release_hyperlinks(&mut self.hyperlinks);
        self.primary.grid_mut().clear();
        self.alt.grid_mut().clear();
        self.cursor = Cursor::new(self.cols(), self.rows());
        self.primary_cursor_shadow = Cursor::new(self.cols(), self.rows());
        self.alt_active = false;
        self.modes = Modes::new();
        self.reset_scroll_region();
        self.reset_tab_stops();
        self.saved_cursors.clear();
        self.selection = None;
    }
}

fn default_tab_stops(cols: u16) -> Vec<bool> {
    (0..cols).map(|c| c > 0 && c % DEFAULT_TAB_WIDTH == 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tab_stops_every_eight_columns() {
        let screen = Screen::new(40, 10, 100);
        assert_eq!(screen.next_tab_stop(0), 8);
        assert_eq!(screen.next_tab_stop(8), 16);
        assert_eq!(screen.prev_tab_stop(10), 8);
    }

    #[test]
    fn alt_screen_round_trip_preserves_primary_cursor() {
        let mut screen = Screen::new(10, 5, 100);
        screen.cursor_mut().move_to(2, 3, 4, 9);
        screen.enter_alt_screen(true, true);
        assert!(screen.alt_screen_active());
        screen.cursor_mut().move_to(0, 0, 4, 9);
        screen.leave_alt_screen(true);
        assert!(!screen.alt_screen_active());
        assert_eq!((screen.cursor().row, screen.cursor().col), (2, 3));
    }

    #[test]
    fn save_restore_cursor_peeks_without_popping() {
        let mut screen = Screen::new(10, 5, 100);
        screen.cursor_mut().move_to(1, 1, 4, 9);
        screen.save_cursor();
        screen.cursor_mut().move_to(3, 3, 4, 9);
        screen.restore_cursor();
        assert_eq!((screen.cursor().row, screen.cursor().col), (1, 1));
        screen.cursor_mut().move_to(3, 3, 4, 9);
        screen.restore_cursor();
        assert_eq!((screen.cursor().row, screen.cursor().col), (1, 1));
    }

    #[test]
    fn set_vertical_margins_rejects_inverted_region() {
        let mut screen = Screen::new(10, 24, 100);
        screen.set_vertical_margins(Some(5), Some(10));
        assert_eq!(screen.scroll_region(), (5, 10, 0, 10));
        screen.set_vertical_margins(Some(10), Some(5));
        assert_eq!(screen.scroll_region(), (0, 24, 0, 10));
    }

    #[test]
    fn full_reset_restores_defaults() {
        let mut screen = Screen::new(10, 5, 100);
        screen.modes_mut().dec.insert(crate::modes::DecModes::ORIGIN);
        screen.cursor_mut().move_to(3, 3, 4, 9);
        screen.set_title("x".into());
        screen.full_reset();
        assert!(!screen.modes().origin_mode());
        assert_eq!((screen.cursor().row, screen.cursor().col), (0, 0));
    }
}
