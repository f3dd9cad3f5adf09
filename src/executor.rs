//! VT Executor: applies [`crate::parser::Action`]s to a [`Screen`], implementing
//! the CSI/OSC/DCS/APC semantics `spec.md` §4.D specifies.
//!
//! The executor owns the [`Parser`](crate::parser::Parser) (bytes in) and
//! produces two kinds of output: bytes to write back to the PTY (device
//! status reports, DA/DA2, OSC color/clipboard query replies) and
//! [`EngineEvent`]s for state changes a host cares about but that have no
//! wire-protocol reply (title changes, bell, graphics placement).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::cell::{Color, SgrAttrs};
use crate::cursor::{Charset, CharsetSlot};
use crate::interfaces::{Utf8WidthOracle, WidthOracle};
use crate::modes::{AnsiModes, DecModes, KittyFlags, ModifyOtherKeys, MouseFormat, MouseTracking};
use crate::parser::{Action, CsiParams, Parser, ParserDiagnostics};
use crate::screen::Screen;

/// Which clipboard selection an OSC 52 request names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardSelection {
    Clipboard,
    Primary,
}

/// Host hook for OSC 52 clipboard read/write, gated by a permission check the
/// host controls (`spec.md` §4.D: "OSC 52 clipboard (subject to a permission
/// callback)").
pub trait ClipboardHost {
    fn allow_read(&mut self, selection: ClipboardSelection) -> bool;
    fn allow_write(&mut self, selection: ClipboardSelection) -> bool;
    fn read(&mut self, selection: ClipboardSelection) -> Option<String>;
    fn write(&mut self, selection: ClipboardSelection, text: String);
}

/// Side-channel notifications the executor raises that have no PTY-bound
/// reply of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TitleChanged(String),
    IconTitleChanged(String),
    Notification { title: String, body: String },
    Bell,
    /// A sixel/kitty-graphics DCS or APC sequence closed. The core does not
    /// rasterize the image itself (`spec.md` §4.D: "pass-through to a
    /// collaborator; the core records where the image anchors and its cell
    /// footprint"); `byte_count` is the size of the payload that was
    /// dropped.
    GraphicsPlacement {
        anchor_row: u16,
        anchor_col: u16,
        byte_count: usize,
    },
}

/// Everything one [`Executor::feed`] call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorOutput {
    /// Bytes to write back to the PTY (device status reports, color query
    /// replies, clipboard reads).
    pub reply: Vec<u8>,
    pub events: Vec<EngineEvent>,
}

impl ExecutorOutput {
    fn push_reply(&mut self, s: &str) {
        self.reply.extend_from_slice(s.as_bytes());
    }
}

/// State for an open DCS passthrough session (sixel / kitty graphics), from
/// `DcsHook` to `DcsUnhook`.
#[derive(Debug, Clone, Copy)]
struct DcsSession {
    anchor_row: u16,
    anchor_col: u16,
    byte_count: usize,
}

/// Applies parser actions to a [`Screen`]. Owns the byte-level [`Parser`]
/// so a host only needs to hand raw PTY bytes to [`Executor::feed`].
pub struct Executor {
    parser: Parser,
    clipboard: Option<Box<dyn ClipboardHost>>,
    osc52_default_allow: bool,
    open_dcs: Option<DcsSession>,
    /// `spec.md` §6 width oracle; defaults to [`Utf8WidthOracle`]. A host can
    /// install a different one (e.g. to special-case emoji ZWJ sequences it
    /// wants rendered width-1) via [`Executor::set_width_oracle`].
    width_oracle: Box<dyn WidthOracle>,
}

impl Executor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            clipboard: None,
            osc52_default_allow: false,
            open_dcs: None,
            width_oracle: Box::new(Utf8WidthOracle),
        }
    }

    #[must_use]
    pub fn with_osc52_default_allow(mut self, allow: bool) -> Self {
        self.osc52_default_allow = allow;
        self
    }

    pub fn set_clipboard_host(&mut self, host: Box<dyn ClipboardHost>) {
        self.clipboard = Some(host);
    }

    /// Install a non-default [`WidthOracle`]. `spec.md` §6: the width
    /// function is "supplied by a collaborator"; [`Utf8WidthOracle`] is used
    /// until a host calls this.
    pub fn set_width_oracle(&mut self, oracle: Box<dyn WidthOracle>) {
        self.width_oracle = oracle;
    }

    #[must_use]
    pub fn diagnostics(&self) -> ParserDiagnostics {
        self.parser.diagnostics()
    }

    /// Feed raw PTY bytes through the parser and apply every resulting
    /// action to `screen`, in order (`spec.md` §5: "the resulting action
    /// sequence is applied to the Screen in order").
    pub fn feed(&mut self, bytes: &[u8], screen: &mut Screen) -> ExecutorOutput {
        let actions = self.parser.feed(bytes);
        let mut out = ExecutorOutput::default();
        for action in actions {
            self.dispatch(action, screen, &mut out);
        }
        out
    }

    fn dispatch(&mut self, action: Action, screen: &mut Screen, out: &mut ExecutorOutput) {
        match action {
            Action::Print(ch) => self.print_char(screen, ch),
            Action::Execute(byte) => self.execute_control(screen, byte, out),
            Action::EscDispatch { final_byte, intermediates } => {
                self.esc_dispatch(screen, final_byte, &intermediates)
            }
            Action::CsiDispatch { final_byte, private, params, intermediates } => {
                self.csi_dispatch(screen, final_byte, private, &params, &intermediates, out)
            }
            Action::OscString(body) => self.osc_dispatch(screen, &body, out),
            Action::DcsHook { final_byte, private: _, params: _, intermediates: _ } => {
                let _ = final_byte;
                self.open_dcs = Some(DcsSession {
                    anchor_row: screen.cursor().row,
                    anchor_col: screen.cursor().col,
                    byte_count: 0,
                });
            }
            Action::DcsPut(_byte) => {
                if let Some(session) = self.open_dcs.as_mut() {
                    session.byte_count += 1;
                }
            }
            Action::DcsUnhook => {
                if let Some(session) = self.open_dcs.take() {
                    out.events.push(EngineEvent::GraphicsPlacement {
                        anchor_row: session.anchor_row,
                        anchor_col: session.anchor_col,
                        byte_count: session.byte_count,
                    });
                }
            }
            Action::ApcString(body) => self.apc_dispatch(screen, &body, out),
        }
    }

    // ── Printing (spec.md §4.C) ──────────────────────────────────────

    fn print_char(&mut self, screen: &mut Screen, ch: char) {
        if screen.cols() == 0 || screen.rows() == 0 {
            return;
        }
        let ch = screen.cursor_mut().translate(ch);
        let width = self.width_oracle.width(ch);

        // Rule 5: non-spacing marks append to the preceding base cell's
        // grapheme side-table and never move the cursor.
        if width == 0 {
            let row = screen.cursor().row;
            let col = screen.cursor().col;
            let base_col = if col > 0 {
                let prev_is_continuation = screen
                    .active()
                    .grid()
                    .cell(row, col - 1)
                    .is_some_and(|c| c.is_wide_continuation());
                if prev_is_continuation { col.checked_sub(2) } else { col.checked_sub(1) }
            } else {
                None
            };
            if let Some(base_col) = base_col {
                screen.active_mut().grid_mut().push_combining(row, base_col, ch);
            }
            return;
        }

        // Rule 1: consume a pending wrap before printing.
        if screen.cursor().pending_wrap && screen.modes().autowrap() {
            self.wrap_to_next_row(screen);
        }

        let (_, _, left, right) = screen.scroll_region();
        let attrs = screen.cursor().pending_attrs;
        let link = screen.cursor().pending_link;
        let mut row = screen.cursor().row;
        let mut col = screen.cursor().col;

        // Rule 4 (overrun half): a wide glyph that doesn't fit in what's left
        // of the row blanks the remainder and wraps before writing.
        if col + u16::from(width) > right {
            if screen.modes().autowrap() {
                screen.active_mut().grid_mut().erase_chars(row, col, right.saturating_sub(col), attrs.bg);
                self.wrap_to_next_row(screen);
                row = screen.cursor().row;
                col = screen.cursor().col;
            } else {
                // DECAWM off: overwrite in place at the right edge, no wrap.
                col = right.saturating_sub(u16::from(width)).max(left);
            }
        }

        // Rule 3: insert mode shifts the remainder of the row right first.
        if screen.modes().insert_mode() {
            screen.active_mut().grid_mut().insert_chars(row, col, u16::from(width), attrs.bg);
        }

        let old_link = screen.active().grid().cell(row, col).map(|c| c.hyperlink).unwrap_or(0);
        let written = screen.active_mut().grid_mut().write_printable(row, col, ch, attrs);
        if written > 0 {
            screen.active_mut().grid_mut().mark_dirty(row);
            if old_link != link {
                if old_link != 0 {
                    screen.hyperlinks_mut().release_id(old_link);
                }
                if link != 0 {
                    screen.hyperlinks_mut().acquire_id(link);
                }
            }
            if link != 0 {
                if let Some(cell) = screen.active_mut().grid_mut().cell_mut(row, col) {
                    cell.hyperlink = link;
                }
            }

            // Rule 6: advance the cursor; set pending-wrap at the margin
            // instead of moving past it.
            let new_col = col + u16::from(written);
            if new_col >= right {
                screen.cursor_mut().col = right.saturating_sub(1).max(left);
                if screen.modes().autowrap() {
                    screen.cursor_mut().pending_wrap = true;
                }
            } else {
                screen.cursor_mut().col = new_col;
                screen.cursor_mut().pending_wrap = false;
            }
        }
    }

    /// Advance one row within the scroll region, scrolling if already at the
    /// bottom, and reset the column to the left margin. This is the
    /// autowrap/NEL behavior, where moving down always implies a carriage
    /// return to the left margin; plain LF/IND use
    /// [`Executor::index_down`] instead, which does not touch the column.
    fn wrap_to_next_row(&mut self, screen: &mut Screen) {
        // Mark the row being left as a soft-wrap continuation (`spec.md`
        // §3 Row: "wrap (this row continues on the next)") before
        // `index_down` potentially scrolls it out from under us.
        let from_row = screen.cursor().row;
        screen.active_mut().grid_mut().set_wrapped(from_row, true);
        self.index_down(screen);
        let (_, _, left, _) = screen.scroll_region();
        screen.cursor_mut().col = left;
        screen.cursor_mut().pending_wrap = false;
    }

    /// Move the cursor down one row within the scroll region, scrolling the
    /// region up if already at its bottom. Leaves the column untouched
    /// (`spec.md` §4.D: LF only performs a carriage return under LNM).
    fn index_down(&mut self, screen: &mut Screen) {
        let (top, bottom, _left, _right) = screen.scroll_region();
        let bg = screen.cursor().pending_attrs.bg;
        if screen.cursor().row + 1 >= bottom {
            self.scroll_up_region(screen, top, bottom, 1, bg);
        } else {
            let row = screen.cursor().row + 1;
            screen.cursor_mut().row = row;
        }
        screen.cursor_mut().pending_wrap = false;
    }

    /// Scroll the region `[top, bottom)` up by `count`, pushing to
    /// scrollback only when the region starts at the true top of the
    /// screen (matches xterm: a scroll region confined below row 0 never
    /// contributes history).
    fn scroll_up_region(&self, screen: &mut Screen, top: u16, bottom: u16, count: u16, bg: Color) {
        if top == 0 {
            screen.active_mut().scroll_up(top, bottom, count, bg);
        } else {
            screen.active_mut().grid_mut().scroll_up(top, bottom, count, bg);
        }
    }

    fn scroll_down_region(&self, screen: &mut Screen, top: u16, bottom: u16, count: u16, bg: Color) {
        if top == 0 {
            screen.active_mut().scroll_down(top, bottom, count, bg);
        } else {
            screen.active_mut().grid_mut().scroll_down(top, bottom, count, bg);
        }
    }

    // ── C0 controls ──────────────────────────────────────────────────

    fn execute_control(&mut self, screen: &mut Screen, byte: u8, out: &mut ExecutorOutput) {
        match byte {
            0x07 => {
                // BEL has no grid effect; just raise the event for hosts.
                out.events.push(EngineEvent::Bell);
            }
            0x08 => {
                let (_, _, left, _) = screen.scroll_region();
                let col = screen.cursor().col;
                screen.cursor_mut().col = col.saturating_sub(1).max(left);
                screen.cursor_mut().pending_wrap = false;
            }
            0x09 => {
                let next = screen.next_tab_stop(screen.cursor().col);
                screen.cursor_mut().col = next;
                screen.cursor_mut().pending_wrap = false;
            }
            0x0a | 0x0b | 0x0c => {
                self.index_down(screen);
                if screen.modes().ansi.contains(AnsiModes::LINEFEED_NEWLINE) {
                    let (_, _, left, _) = screen.scroll_region();
                    screen.cursor_mut().col = left;
                }
            }
            0x0d => {
                let (_, _, left, _) = screen.scroll_region();
                screen.cursor_mut().col = left;
                screen.cursor_mut().pending_wrap = false;
            }
            0x0e => screen.cursor_mut().gl = CharsetSlot::G1,
            0x0f => screen.cursor_mut().gl = CharsetSlot::G0,
            _ => {}
        }
    }

    // ── ESC dispatch ─────────────────────────────────────────────────

    fn esc_dispatch(&mut self, screen: &mut Screen, final_byte: u8, intermediates: &[u8]) {
        if let Some(&intermediate) = intermediates.first() {
            let slot = match intermediate {
                b'(' => Some(CharsetSlot::G0),
                b')' => Some(CharsetSlot::G1),
                b'*' => Some(CharsetSlot::G2),
                b'+' => Some(CharsetSlot::G3),
                _ => None,
            };
            if let Some(slot) = slot {
                screen.cursor_mut().designate(slot, Charset::from_final_byte(final_byte));
            }
            return;
        }

        match final_byte {
            b'7' => screen.save_cursor(),
            b'8' => screen.restore_cursor(),
            b'c' => screen.full_reset(),
            b'D' => self.index_down(screen),
            b'M' => self.reverse_index(screen),
            b'E' => self.wrap_to_next_row(screen),
            b'H' => screen.set_tab_stop(screen.cursor().col),
            b'=' => screen.modes_mut().dec.insert(DecModes::KEYPAD_APPLICATION),
            b'>' => screen.modes_mut().dec.remove(DecModes::KEYPAD_APPLICATION),
            b'N' => screen.cursor_mut().single_shift = Some(CharsetSlot::G2),
            b'O' => screen.cursor_mut().single_shift = Some(CharsetSlot::G3),
            _ => {}
        }
    }

    /// RI (`ESC M`): reverse index. Move up, scrolling the region down when
    /// already at the top.
    fn reverse_index(&mut self, screen: &mut Screen) {
        let (top, bottom, _left, _right) = screen.scroll_region();
        let bg = screen.cursor().pending_attrs.bg;
        if screen.cursor().row == top {
            self.scroll_down_region(screen, top, bottom, 1, bg);
        } else {
            let row = screen.cursor().row - 1;
            screen.cursor_mut().row = row;
        }
        screen.cursor_mut().pending_wrap = false;
    }

    // ── CSI dispatch ─────────────────────────────────────────────────

    fn csi_dispatch(
        &mut self,
        screen: &mut Screen,
        final_byte: u8,
        private: Option<u8>,
        params: &CsiParams,
        intermediates: &[u8],
        out: &mut ExecutorOutput,
    ) {
        let p = |i: usize, default: u16| -> u16 {
            let v = params.get(i, default);
            if v == 0 { default.max(1).min(if default == 0 { 1 } else { default }) } else { v }
        };
        // Cursor-position parameters are 1-indexed with 0 treated as 1
        // (`spec.md` §4.D tie-break); everything else defaults via `get`.
        let one_indexed = |i: usize| -> u16 {
            let v = params.get(i, 1);
            if v == 0 { 1 } else { v }
        };

        match (private, final_byte) {
            (None, b'H') | (None, b'f') => self.cup(screen, one_indexed(0), one_indexed(1)),
            (None, b'A') => self.cuu(screen, p(0, 1)),
            (None, b'B') => self.cud(screen, p(0, 1)),
            (None, b'C') => self.cuf(screen, p(0, 1)),
            (None, b'D') => self.cub(screen, p(0, 1)),
            (None, b'E') => self.cnl(screen, p(0, 1)),
            (None, b'F') => self.cpl(screen, p(0, 1)),
            (None, b'G') | (None, b'`') => self.cha(screen, one_indexed(0)),
            (None, b'd') => self.vpa(screen, one_indexed(0)),
            (None, b'I') => {
                let n = p(0, 1);
                for _ in 0..n {
                    let next = screen.next_tab_stop(screen.cursor().col);
                    screen.cursor_mut().col = next;
                }
            }
            (None, b'Z') => {
                let n = p(0, 1);
                for _ in 0..n {
                    let prev = screen.prev_tab_stop(screen.cursor().col);
                    screen.cursor_mut().col = prev;
                }
            }
            (None, b'J') => self.ed(screen, params.get(0, 0)),
            (None, b'K') => self.el(screen, params.get(0, 0)),
            (None, b'L') => self.il(screen, p(0, 1)),
            (None, b'M') => self.dl(screen, p(0, 1)),
            (None, b'@') => self.ich(screen, p(0, 1)),
            (None, b'P') => self.dch(screen, p(0, 1)),
            (None, b'X') => self.ech(screen, p(0, 1)),
            (None, b'S') => {
                let (top, bottom, _, _) = screen.scroll_region();
                let bg = screen.cursor().pending_attrs.bg;
                self.scroll_up_region(screen, top, bottom, p(0, 1), bg);
            }
            (None, b'T') => {
                let (top, bottom, _, _) = screen.scroll_region();
                let bg = screen.cursor().pending_attrs.bg;
                self.scroll_down_region(screen, top, bottom, p(0, 1), bg);
            }
            (None, b'm') => screen.cursor_mut().pending_attrs.apply_sgr(params),
            (None, b'r') => {
                let top = if params.len() > 0 { Some(one_indexed(0) - 1) } else { None };
                let bottom = if params.len() > 1 { Some(params.get(1, 0)) } else { None };
                screen.set_vertical_margins(top, bottom);
                screen.cursor_mut().move_to(0, 0, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
            }
            (None, b's') => {
                if screen.modes().left_right_margin_mode() {
                    let left = if params.len() > 0 { Some(one_indexed(0) - 1) } else { None };
                    let right = if params.len() > 1 { Some(params.get(1, 0)) } else { None };
                    screen.set_horizontal_margins(left, right);
                } else {
                    screen.save_cursor();
                }
            }
            (None, b'u') => screen.restore_cursor(),
            (Some(b'>'), b'u') => {
                let flags = KittyFlags::from_bits_truncate(params.get(0, 0) as u8);
                screen.modes_mut().push_kitty_flags(flags);
            }
            (Some(b'<'), b'u') => screen.modes_mut().pop_kitty_flags(params.get(0, 1)),
            (Some(b'='), b'u') => {
                let flags = KittyFlags::from_bits_truncate(params.get(0, 0) as u8);
                screen.modes_mut().push_kitty_flags(flags);
            }
            (Some(b'?'), b'u') => {
                out.push_reply(&format!("\x1b[?{}u", screen.modes().kitty_flags().bits()));
            }
            (None, b'n') => self.dsr(screen, params.get(0, 0), out),
            (Some(b'?'), b'n') => self.dsr(screen, params.get(0, 0), out),
            (None, b'c') => out.push_reply("\x1b[?62;22c"),
            (Some(b'>'), b'c') => out.push_reply("\x1b[>0;10;0c"),
            (None, b'g') => match params.get(0, 0) {
                0 => screen.clear_tab_stop(screen.cursor().col),
                3 => screen.clear_all_tab_stops(),
                _ => {}
            },
            (Some(b'?'), b'h') => self.decset(screen, params, true),
            (Some(b'?'), b'l') => self.decset(screen, params, false),
            (None, b'h') => self.sm(screen, params, true),
            (None, b'l') => self.sm(screen, params, false),
            (Some(b'>'), b'm') => {
                // `CSI > 4 ; n m`: modifyOtherKeys.
                if params.get(0, 0) == 4 {
                    screen.modes_mut().modify_other_keys = match params.get(1, 0) {
                        1 => ModifyOtherKeys::State1,
                        2 => ModifyOtherKeys::State2,
                        _ => ModifyOtherKeys::Off,
                    };
                }
            }
            (None, b'p') if intermediates.first() == Some(&b'!') => {
                // DECSTR soft reset.
                screen.modes_mut().dec = DecModes::default();
                screen.modes_mut().ansi = AnsiModes::empty();
                screen.reset_scroll_region();
                screen.cursor_mut().move_to(0, 0, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
                screen.cursor_mut().pending_attrs = SgrAttrs::default();
            }
            _ => {}
        }
    }

    fn cursor_bounds(&self, screen: &Screen) -> (u16, u16, u16, u16) {
        let (top, bottom, left, right) = screen.scroll_region();
        if screen.modes().origin_mode() {
            (top, left, bottom.saturating_sub(1), right.saturating_sub(1))
        } else {
            (0, 0, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1))
        }
    }

    fn cup(&mut self, screen: &mut Screen, row1: u16, col1: u16) {
        let (min_row, min_col, max_row, max_col) = self.cursor_bounds(screen);
        let row = (min_row + row1 - 1).min(max_row);
        let col = (min_col + col1 - 1).min(max_col);
        let page_max_row = screen.rows().saturating_sub(1);
        let page_max_col = screen.cols().saturating_sub(1);
        screen.cursor_mut().move_to(row, col, page_max_row, page_max_col);
    }

    fn cuu(&mut self, screen: &mut Screen, n: u16) {
        let (min_row, _, _, max_col) = self.cursor_bounds(screen);
        let row = screen.cursor().row.saturating_sub(n).max(min_row);
        let col = screen.cursor().col;
        screen.cursor_mut().move_to(row, col, row.max(screen.rows().saturating_sub(1)), max_col);
    }

    fn cud(&mut self, screen: &mut Screen, n: u16) {
        let (_, _, max_row, _) = self.cursor_bounds(screen);
        let row = (screen.cursor().row + n).min(max_row);
        let col = screen.cursor().col;
        screen.cursor_mut().move_to(row, col, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
    }

    fn cuf(&mut self, screen: &mut Screen, n: u16) {
        let (_, _, _, max_col) = self.cursor_bounds(screen);
        let col = (screen.cursor().col + n).min(max_col);
        let row = screen.cursor().row;
        screen.cursor_mut().move_to(row, col, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
    }

    fn cub(&mut self, screen: &mut Screen, n: u16) {
        let (_, min_col, _, _) = self.cursor_bounds(screen);
        let col = screen.cursor().col.saturating_sub(n).max(min_col);
        let row = screen.cursor().row;
        screen.cursor_mut().move_to(row, col, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
    }

    fn cnl(&mut self, screen: &mut Screen, n: u16) {
        self.cud(screen, n);
        let (_, min_col, _, _) = self.cursor_bounds(screen);
        let row = screen.cursor().row;
        screen.cursor_mut().move_to(row, min_col, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
    }

    fn cpl(&mut self, screen: &mut Screen, n: u16) {
        self.cuu(screen, n);
        let (_, min_col, _, _) = self.cursor_bounds(screen);
        let row = screen.cursor().row;
        screen.cursor_mut().move_to(row, min_col, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
    }

    fn cha(&mut self, screen: &mut Screen, col1: u16) {
        let (_, min_col, _, max_col) = self.cursor_bounds(screen);
        let col = (min_col + col1 - 1).min(max_col);
        let row = screen.cursor().row;
        screen.cursor_mut().move_to(row, col, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
    }

    fn vpa(&mut self, screen: &mut Screen, row1: u16) {
        let (min_row, _, max_row, _) = self.cursor_bounds(screen);
        let row = (min_row + row1 - 1).min(max_row);
        let col = screen.cursor().col;
        screen.cursor_mut().move_to(row, col, screen.rows().saturating_sub(1), screen.cols().saturating_sub(1));
    }

    fn ed(&mut self, screen: &mut Screen, mode: u16) {
        let bg = screen.cursor().pending_attrs.bg;
        let (row, col) = (screen.cursor().row, screen.cursor().col);
        let grid = screen.active_mut().grid_mut();
        match mode {
            0 => grid.erase_below(row, col, bg),
            1 => grid.erase_above(row, col, bg),
            2 | 3 => grid.erase_all(bg),
            _ => {}
        }
    }

    fn el(&mut self, screen: &mut Screen, mode: u16) {
        let bg = screen.cursor().pending_attrs.bg;
        let (row, col) = (screen.cursor().row, screen.cursor().col);
        let grid = screen.active_mut().grid_mut();
        match mode {
            0 => grid.erase_line_right(row, col, bg),
            1 => grid.erase_line_left(row, col, bg),
            2 => grid.erase_line(row, bg),
            _ => {}
        }
    }

    fn il(&mut self, screen: &mut Screen, n: u16) {
        let bg = screen.cursor().pending_attrs.bg;
        let row = screen.cursor().row;
        let (top, bottom, _, _) = screen.scroll_region();
        screen.active_mut().grid_mut().insert_lines(row, n, top, bottom, bg);
    }

    fn dl(&mut self, screen: &mut Screen, n: u16) {
        let bg = screen.cursor().pending_attrs.bg;
        let row = screen.cursor().row;
        let (top, bottom, _, _) = screen.scroll_region();
        screen.active_mut().grid_mut().delete_lines(row, n, top, bottom, bg);
    }

    fn ich(&mut self, screen: &mut Screen, n: u16) {
        let bg = screen.cursor().pending_attrs.bg;
        let (row, col) = (screen.cursor().row, screen.cursor().col);
        screen.active_mut().grid_mut().insert_chars(row, col, n, bg);
    }

    fn dch(&mut self, screen: &mut Screen, n: u16) {
        let bg = screen.cursor().pending_attrs.bg;
        let (row, col) = (screen.cursor().row, screen.cursor().col);
        screen.active_mut().grid_mut().delete_chars(row, col, n, bg);
    }

    fn ech(&mut self, screen: &mut Screen, n: u16) {
        let bg = screen.cursor().pending_attrs.bg;
        let (row, col) = (screen.cursor().row, screen.cursor().col);
        screen.active_mut().grid_mut().erase_chars(row, col, n, bg);
    }

    fn dsr(&mut self, screen: &mut Screen, code: u16, out: &mut ExecutorOutput) {
        match code {
            5 => out.push_reply("\x1b[0n"),
            6 => {
                let (top, _, left, _) = screen.scroll_region();
                let (row, col) = if screen.modes().origin_mode() {
                    (screen.cursor().row - top, screen.cursor().col - left)
                } else {
                    (screen.cursor().row, screen.cursor().col)
                };
                out.push_reply(&format!("\x1b[{};{}R", row + 1, col + 1));
            }
            _ => {}
        }
    }

    fn decset(&mut self, screen: &mut Screen, params: &CsiParams, enable: bool) {
        for n in params.iter() {
            match n {
                1 => set_dec(screen, DecModes::CURSOR_KEYS_APPLICATION, enable),
                5 => set_dec(screen, DecModes::REVERSE_VIDEO, enable),
                6 => set_dec(screen, DecModes::ORIGIN, enable),
                7 => set_dec(screen, DecModes::AUTOWRAP, enable),
                9 => screen.modes_mut().mouse_tracking = if enable { MouseTracking::X10 } else { MouseTracking::Off },
                25 => set_dec(screen, DecModes::SHOW_CURSOR, enable),
                69 => set_dec(screen, DecModes::LEFT_RIGHT_MARGIN, enable),
                1000 => screen.modes_mut().mouse_tracking = if enable { MouseTracking::Normal } else { MouseTracking::Off },
                1002 => screen.modes_mut().mouse_tracking = if enable { MouseTracking::ButtonEvent } else { MouseTracking::Off },
                1003 => screen.modes_mut().mouse_tracking = if enable { MouseTracking::AnyEvent } else { MouseTracking::Off },
                1005 => screen.modes_mut().mouse_format = if enable { MouseFormat::Utf8 } else { MouseFormat::X10 },
                1006 => screen.modes_mut().mouse_format = if enable { MouseFormat::Sgr } else { MouseFormat::X10 },
                1015 => screen.modes_mut().mouse_format = if enable { MouseFormat::Urxvt } else { MouseFormat::X10 },
                1004 => set_dec(screen, DecModes::FOCUS_EVENT, enable),
                2004 => set_dec(screen, DecModes::BRACKETED_PASTE, enable),
                47 | 1047 => {
                    if enable {
                        screen.enter_alt_screen(false, n == 1047);
                    } else {
                        screen.leave_alt_screen(false);
                    }
                }
                1048 => {
                    if enable {
                        screen.save_cursor();
                    } else {
                        screen.restore_cursor();
                    }
                }
                1049 => {
                    if enable {
                        screen.enter_alt_screen(true, true);
                    } else {
                        screen.leave_alt_screen(true);
                    }
                }
                3 => {
                    // DECCOLM (80/132 column switch): reshaping the physical
                    // terminal width is a host/window-manager decision in a
                    // GPU terminal, not something the core resizes itself
                    // to; accepted here as a recognized-but-inert mode so
                    // it doesn't fall through to "unknown private mode."
                }
                _ => {}
            }
        }
    }

    fn sm(&mut self, screen: &mut Screen, params: &CsiParams, enable: bool) {
        for n in params.iter() {
            match n {
                4 => {
                    if enable {
                        screen.modes_mut().ansi.insert(AnsiModes::INSERT);
                    } else {
                        screen.modes_mut().ansi.remove(AnsiModes::INSERT);
                    }
                }
                20 => {
                    if enable {
                        screen.modes_mut().ansi.insert(AnsiModes::LINEFEED_NEWLINE);
                    } else {
                        screen.modes_mut().ansi.remove(AnsiModes::LINEFEED_NEWLINE);
                    }
                }
                _ => {}
            }
        }
    }

    // ── OSC dispatch ─────────────────────────────────────────────────

    fn osc_dispatch(&mut self, screen: &mut Screen, body: &[u8], out: &mut ExecutorOutput) {
        let text = String::from_utf8_lossy(body);
        let Some((code_str, rest)) = text.split_once(';') else {
            return;
        };
        let Ok(code) = code_str.parse::<u32>() else {
            return;
        };
        match code {
            0 => {
                screen.set_title(rest.to_string());
                screen.set_icon_title(rest.to_string());
                out.events.push(EngineEvent::TitleChanged(rest.to_string()));
            }
            1 => {
                screen.set_icon_title(rest.to_string());
                out.events.push(EngineEvent::IconTitleChanged(rest.to_string()));
            }
            2 => {
                screen.set_title(rest.to_string());
                out.events.push(EngineEvent::TitleChanged(rest.to_string()));
            }
            4 => self.osc4(screen, rest, out),
            8 => self.osc8(screen, rest),
            10 => self.osc_color(screen, rest, OscColorSlot::Foreground, out),
            11 => self.osc_color(screen, rest, OscColorSlot::Background, out),
            12 => self.osc_color(screen, rest, OscColorSlot::Cursor, out),
            52 => self.osc52(rest, out),
            133 => self.osc133(screen, rest),
            777 => self.osc777(rest, out),
            _ => {}
        }
    }

    fn osc4(&mut self, screen: &mut Screen, rest: &str, out: &mut ExecutorOutput) {
        let fields: Vec<&str> = rest.split(';').collect();
        let mut i = 0;
        while i + 1 < fields.len() {
            let Ok(idx) = fields[i].parse::<u16>() else { break };
            if idx > 255 {
                i += 2;
                continue;
            }
            let idx = idx as u8;
            let spec = fields[i + 1];
            if spec == "?" {
                if let Some(rgb) = screen.palette_color(idx) {
                    out.push_reply(&format!("\x1b]4;{};{}\x1b\\", idx, format_color_reply(rgb)));
                }
            } else {
                screen.set_palette_color(idx, parse_color_spec(spec));
            }
            i += 2;
        }
    }

    fn osc8(&mut self, screen: &mut Screen, rest: &str) {
        // `params;uri` — params is a colon-separated key=value list we don't
        // need to interpret (id= is the only one with any cross-cell
        // meaning, and dedup already happens on URI identity).
        let uri = rest.split_once(';').map(|(_, uri)| uri).unwrap_or(rest);
        screen.cursor_mut().pending_link = if uri.is_empty() {
            0
        } else {
            screen.hyperlinks_mut().intern(uri)
        };
    }

    fn osc_color(&mut self, screen: &mut Screen, rest: &str, slot: OscColorSlot, out: &mut ExecutorOutput) {
        let osc_num = match slot {
            OscColorSlot::Foreground => 10,
            OscColorSlot::Background => 11,
            OscColorSlot::Cursor => 12,
        };
        if rest == "?" {
            let current = match slot {
                OscColorSlot::Foreground => screen.fg_color(),
                OscColorSlot::Background => screen.bg_color(),
                OscColorSlot::Cursor => screen.cursor_color(),
            };
            if let Some(rgb) = current {
                out.push_reply(&format!("\x1b]{};{}\x1b\\", osc_num, format_color_reply(rgb)));
            }
            return;
        }
        let rgb = parse_color_spec(rest);
        match slot {
            OscColorSlot::Foreground => screen.set_fg_color(rgb),
            OscColorSlot::Background => screen.set_bg_color(rgb),
            OscColorSlot::Cursor => screen.set_cursor_color(rgb),
        }
    }

    fn osc52(&mut self, rest: &str, out: &mut ExecutorOutput) {
        let Some((selector, payload)) = rest.split_once(';') else {
            return;
        };
        let selection = if selector.contains('p') { ClipboardSelection::Primary } else { ClipboardSelection::Clipboard };

        if payload == "?" {
            let allowed = self
                .clipboard
                .as_mut()
                .map(|host| host.allow_read(selection))
                .unwrap_or(self.osc52_default_allow);
            if !allowed {
                return;
            }
            if let Some(text) = self.clipboard.as_mut().and_then(|host| host.read(selection)) {
                let encoded = BASE64.encode(text.as_bytes());
                out.push_reply(&format!("\x1b]52;{};{}\x1b\\", selector, encoded));
            }
            return;
        }

        let allowed = self
            .clipboard
            .as_mut()
            .map(|host| host.allow_write(selection))
            .unwrap_or(self.osc52_default_allow);
        if !allowed {
            return;
        }
        if let Ok(bytes) = BASE64.decode(payload) {
            if let Ok(text) = String::from_utf8(bytes) {
                if let Some(host) = self.clipboard.as_mut() {
                    host.write(selection, text);
                }
            }
        }
    }

    fn osc133(&mut self, screen: &mut Screen, rest: &str) {
        use crate::grid::SemanticPromptKind;
        let kind = match rest.chars().next() {
            Some('A') => SemanticPromptKind::Input,
            Some('B') => SemanticPromptKind::Input,
            Some('C') => SemanticPromptKind::Output,
            Some('D') => SemanticPromptKind::Command,
            _ => return,
        };
        let row = screen.cursor().row;
        screen.active_mut().grid_mut().set_semantic_prompt(row, kind);
    }

    fn osc777(&mut self, rest: &str, out: &mut ExecutorOutput) {
        let mut fields = rest.splitn(3, ';');
        if fields.next() != Some("notify") {
            return;
        }
        let title = fields.next().unwrap_or_default().to_string();
        let body = fields.next().unwrap_or_default().to_string();
        out.events.push(EngineEvent::Notification { title, body });
    }

    // ── APC dispatch (kitty graphics) ───────────────────────────────

    fn apc_dispatch(&mut self, screen: &mut Screen, body: &[u8], out: &mut ExecutorOutput) {
        // Real kitty graphics frames arrive as APC (`ESC _ G ... ESC \`),
        // not the DCS the distilled wording suggests; kitty keyboard itself
        // already rides on CSI `>`/`<`/`=`/`?` + `u` (see `csi_dispatch`),
        // matching both xterm's actual wire format and this crate's own
        // input encoder. The core only records the placement footprint,
        // never the pixel payload.
        if body.first() != Some(&b'G') {
            return;
        }
        out.events.push(EngineEvent::GraphicsPlacement {
            anchor_row: screen.cursor().row,
            anchor_col: screen.cursor().col,
            byte_count: body.len(),
        });
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OscColorSlot {
    Foreground,
    Background,
    Cursor,
}

fn set_dec(screen: &mut Screen, flag: DecModes, enable: bool) {
    if enable {
        screen.modes_mut().dec.insert(flag);
    } else {
        screen.modes_mut().dec.remove(flag);
    }
}

/// Parse an xterm color spec: `rgb:RRRR/GGGG/BBBB` (1-4 hex digits per
/// channel) or `#RRGGBB`.
fn parse_color_spec(spec: &str) -> Option<(u8, u8, u8)> {
    if let Some(rest) = spec.strip_prefix("rgb:") {
        let mut parts = rest.split('/');
        let r = parts.next()?;
        let g = parts.next()?;
        let b = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        return Some((hex_channel(r)?, hex_channel(g)?, hex_channel(b)?));
    }
    if let Some(rest) = spec.strip_prefix('#') {
        if rest.len() == 6 {
            let r = u8::from_str_radix(&rest[0..2], 16).ok()?;
            let g = u8::from_str_radix(&rest[2..4], 16).ok()?;
            let b = u8::from_str_radix(&rest[4..6], 16).ok()?;
            return Some((r, g, b));
        }
    }
    None
}

fn hex_channel(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 4 {
        return None;
    }
    let v = u32::from_str_radix(s, 16).ok()?;
    let max = (1u32 << (4 * s.len())) - 1;
    Some(((v * 255 + max / 2) / max) as u8)
}

fn format_color_reply(rgb: (u8, u8, u8)) -> String {
    format!(
        "rgb:{:02x}{:02x}/{:02x}{:02x}/{:02x}{:02x}",
        rgb.0, rgb.0, rgb.1, rgb.1, rgb.2, rgb.2
    )
}
