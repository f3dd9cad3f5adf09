//! Cursor state: position, pending style/link, G0-G3 charset slots, and the
//! DECSC/DECRC save stack.
//!
//! The cursor never reaches into the grid directly; [`crate::executor::Executor`]
//! reads [`Cursor::row`]/[`Cursor::col`] to address [`crate::grid::Grid`] and
//! writes back through [`Cursor::move_to`] and friends. Keeping the cursor as
//! plain data (rather than a grid-owning object) matches `spec.md` §3's "the
//! core never uses raw (x,y) screen coordinates across operations that can
//! mutate the store; it promotes them to pins first" once a position needs to
//! outlive a single call - see [`crate::pagestore::Pin`].

use crate::cell::{HyperlinkId, SgrAttrs};

/// One of the four designatable character-set slots (G0-G3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharsetSlot {
    G0,
    G1,
    G2,
    G3,
}

/// A designated character set. Only the 94-character sets xterm actually
/// switches between in practice are modeled; anything else is accepted by
/// the parser/executor but treated as [`Charset::Ascii`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Charset {
    #[default]
    Ascii,
    /// DEC Special Graphics (line-drawing): `ESC ( 0`.
    DecSpecialGraphics,
    /// United Kingdom: `ESC ( A`.
    Uk,
}

impl Charset {
    /// Decode the final byte of a `ESC ( / ) / * / +` designation sequence.
    #[must_use]
    pub fn from_final_byte(b: u8) -> Self {
        match b {
            b'0' => Self::DecSpecialGraphics,
            b'A' => Self::Uk,
            _ => Self::Ascii,
        }
    }

    /// Translate a single character through this charset's mapping.
    ///
    /// Only [`Charset::DecSpecialGraphics`] remaps anything: lowercase
    /// `` ` ``-`~` become the box-drawing/block glyphs xterm's `vt100`
    /// graphics character set maps them to.
    #[must_use]
    pub fn translate(self, ch: char) -> char {
        match self {
            Self::DecSpecialGraphics => translate_dec_special_graphics(ch),
            Self::Uk => {
                if ch == '#' {
                    '\u{00a3}' // pound sign
                } else {
                    ch
                }
            }
            Self::Ascii => ch,
        }
    }
}

/// Free-function form of [`Charset::translate`], kept for callers that carry
/// a charset value without a full [`Cursor`] in scope.
#[must_use]
pub fn translate_charset(charset: Charset, ch: char) -> char {
    charset.translate(ch)
}

/// DEC Special Graphics mapping (`ESC ( 0`), ASCII 0x5F..0x7E.
fn translate_dec_special_graphics(ch: char) -> char {
    match ch {
        '`' => '\u{25c6}', // diamond
        'a' => '\u{2592}', // checkerboard
        'b' => '\u{2409}', // HT symbol
        'c' => '\u{240c}', // FF symbol
        'd' => '\u{240d}', // CR symbol
        'e' => '\u{240a}', // LF symbol
        'f' => '\u{00b0}', // degree
        'g' => '\u{00b1}', // plus/minus
        'h' => '\u{2424}', // NL symbol
        'i' => '\u{240b}', // VT symbol
        'j' => '\u{2518}', // bottom-right corner
        'k' => '\u{2510}', // top-right corner
        'l' => '\u{250c}', // top-left corner
        'm' => '\u{2514}', // bottom-left corner
        'n' => '\u{253c}', // cross
        'o' => '\u{23ba}', // scan line 1
        'p' => '\u{23bb}', // scan line 3
        'q' => '\u{2500}', // horizontal line
        'r' => '\u{23bc}', // scan line 7
        's' => '\u{23bd}', // scan line 9
        't' => '\u{251c}', // left tee
        'u' => '\u{2524}', // right tee
        'v' => '\u{2534}', // bottom tee
        'w' => '\u{252c}', // top tee
        'x' => '\u{2502}', // vertical line
        'y' => '\u{2264}', // less-or-equal
        'z' => '\u{2265}', // greater-or-equal
        '{' => '\u{03c0}', // pi
        '|' => '\u{2260}', // not-equal
        '}' => '\u{00a3}', // pound sign
        '~' => '\u{00b7}', // middle dot
        other => other,
    }
}

/// Cursor state saved/restored by DECSC/DECRC (`ESC 7`/`ESC 8`) and by the
/// alternate-screen-with-save-cursor private modes (1049).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedCursor {
    pub row: u16,
    pub col: u16,
    pub pending_wrap: bool,
    pub attrs: SgrAttrs,
    pub origin_mode: bool,
    pub gl: CharsetSlot,
    pub gr: CharsetSlot,
    pub g: [Charset; 4],
}

impl Default for SavedCursor {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            attrs: SgrAttrs::default(),
            origin_mode: false,
            gl: CharsetSlot::G0,
            gr: CharsetSlot::G1,
            g: [Charset::Ascii; 4],
        }
    }
}

impl SavedCursor {
    /// Snapshot the given [`Cursor`] as of right now.
    #[must_use]
    pub fn save(cursor: &Cursor, origin_mode: bool) -> Self {
        Self {
            row: cursor.row,
            col: cursor.col,
            pending_wrap: cursor.pending_wrap,
            attrs: cursor.pending_attrs,
            origin_mode,
            gl: cursor.gl,
            gr: cursor.gr,
            g: cursor.g,
        }
    }
}

/// Terminal cursor: position, pending SGR/hyperlink state for the *next*
/// printed cell, charset slots, and the wrap-pending flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub row: u16,
    pub col: u16,
    /// Set iff the last write landed in the rightmost column of the scroll
    /// region with auto-wrap on; consumed (and cleared) by the next
    /// printable write, which wraps to the next row before printing
    /// (`spec.md` §3 invariant 3).
    pub pending_wrap: bool,
    /// SGR attributes applied to the next printed cell.
    pub pending_attrs: SgrAttrs,
    /// Hyperlink id applied to the next printed cell (0 = none).
    pub pending_link: HyperlinkId,
    /// Which of G0-G3 is currently invoked into GL (used by `Cursor::translate`).
    pub gl: CharsetSlot,
    /// Which of G0-G3 is currently invoked into GR (only meaningful for 8-bit
    /// hosts; tracked for completeness, unused by the 7-bit write path).
    pub gr: CharsetSlot,
    /// The character set designated into each of G0-G3.
    pub g: [Charset; 4],
    /// Single-shift pending for the very next character only (SS2/SS3, `ESC N`/`ESC O`).
    pub single_shift: Option<CharsetSlot>,
}

impl Cursor {
    /// A cursor at the origin, no pending state, ASCII everywhere.
    #[must_use]
    pub fn new(_cols: u16, _rows: u16) -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            pending_attrs: SgrAttrs::default(),
            pending_link: 0,
            gl: CharsetSlot::G0,
            gr: CharsetSlot::G1,
            g: [Charset::Ascii; 4],
            single_shift: None,
        }
    }

    /// A cursor parked at an explicit `(row, col)` - mainly useful for tests.
    #[must_use]
    pub fn at(row: u16, col: u16) -> Self {
        Self {
            row,
            col,
            ..Self::new(0, 0)
        }
    }

    /// Move to an absolute position, clamped to `[0, max_row] x [0, max_col]`,
    /// and clear pending-wrap (any absolute positioning cancels it).
    pub fn move_to(&mut self, row: u16, col: u16, max_row: u16, max_col: u16) {
        self.row = row.min(max_row);
        self.col = col.min(max_col);
        self.pending_wrap = false;
    }

    /// Designate a charset into one of the G0-G3 slots.
    pub fn designate(&mut self, slot: CharsetSlot, charset: Charset) {
        self.g[slot as usize] = charset;
    }

    /// The charset currently invoked into GL, honoring a pending single shift
    /// (which is consumed by the caller via [`Cursor::take_single_shift`]).
    #[must_use]
    pub fn active_charset(&self) -> Charset {
        let slot = self.single_shift.unwrap_or(self.gl);
        self.g[slot as usize]
    }

    /// Consume the pending single-shift, if any (SS2/SS3 apply to exactly
    /// one following character).
    pub fn take_single_shift(&mut self) -> Charset {
        let charset = self.active_charset();
        self.single_shift = None;
        charset
    }

    /// Translate a printable character through the currently active charset.
    #[must_use]
    pub fn translate(&mut self, ch: char) -> char {
        self.take_single_shift().translate(ch)
    }

    /// Restore from a [`SavedCursor`] snapshot (DECRC / `ESC 8`). Returns the
    /// origin-mode flag that was saved alongside, for the caller to restore
    /// into `Modes`.
    pub fn restore(&mut self, saved: &SavedCursor, max_row: u16, max_col: u16) -> bool {
        self.row = saved.row.min(max_row);
        self.col = saved.col.min(max_col);
        self.pending_wrap = saved.pending_wrap;
        self.pending_attrs = saved.attrs;
        self.gl = saved.gl;
        self.gr = saved.gr;
        self.g = saved.g;
        saved.origin_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_to_clamps_and_clears_pending_wrap() {
        let mut cursor = Cursor::new(80, 24);
        cursor.pending_wrap = true;
        cursor.move_to(100, 200, 23, 79);
        assert_eq!((cursor.row, cursor.col), (23, 79));
        assert!(!cursor.pending_wrap);
    }

    #[test]
    fn dec_special_graphics_maps_line_drawing() {
        let mut cursor = Cursor::new(80, 24);
        cursor.designate(CharsetSlot::G0, Charset::DecSpecialGraphics);
        assert_eq!(cursor.translate('q'), '\u{2500}');
        assert_eq!(cursor.translate('j'), '\u{2518}');
    }

    #[test]
    fn save_restore_roundtrips_position_and_charset() {
        let mut cursor = Cursor::new(80, 24);
        cursor.move_to(5, 10, 23, 79);
        cursor.designate(CharsetSlot::G0, Charset::DecSpecialGraphics);
        let saved = SavedCursor::save(&cursor, true);

        let mut other = Cursor::new(80, 24);
        let origin = other.restore(&saved, 23, 79);
        assert_eq!((other.row, other.col), (5, 10));
        assert!(origin);
        assert_eq!(other.active_charset(), Charset::DecSpecialGraphics);
    }

    #[test]
    fn single_shift_applies_to_one_character_only() {
        let mut cursor = Cursor::new(80, 24);
        cursor.designate(CharsetSlot::G2, Charset::DecSpecialGraphics);
        cursor.single_shift = Some(CharsetSlot::G2);
        assert_eq!(cursor.translate('q'), '\u{2500}');
        // Next char uses GL (still ASCII) since the single shift consumed itself.
        assert_eq!(cursor.translate('q'), 'q');
    }
}
