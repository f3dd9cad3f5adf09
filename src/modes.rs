//! Terminal mode set: DEC private modes, ANSI standard modes, and the
//! keyboard-reporting modes that shape both the [`crate::executor::Executor`]
//! and the [`crate::input`] encoder.
//!
//! All "current modes" live here; nothing is read from process-wide globals.
//! Functions elsewhere that depend on modes take a `&Modes` explicitly.

use bitflags::bitflags;

bitflags! {
    /// ANSI (non-DEC) standard modes, set/reset via plain `CSI h`/`CSI l`
    /// (no `?` private-mode prefix).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnsiModes: u16 {
        /// IRM (mode 4): insert mode. Printable characters shift the rest
        /// of the row right instead of overwriting in place.
        const INSERT = 1 << 0;
        /// LNM (mode 20): linefeed/newline. When set, a received LF also
        /// performs a carriage return.
        const LINEFEED_NEWLINE = 1 << 1;
    }
}

bitflags! {
    /// DEC private modes, set/reset via `CSI ? Ps h`/`CSI ? Ps l`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DecModes: u32 {
        /// DECCKM (1): cursor keys send application (`SS3`) sequences
        /// instead of ANSI cursor sequences.
        const CURSOR_KEYS_APPLICATION = 1 << 0;
        /// DECANM / numeric keypad application mode (set by `ESC =`/`ESC >`,
        /// tracked here for the input encoder even though it has no CSI
        /// private-mode number of its own).
        const KEYPAD_APPLICATION = 1 << 1;
        /// DECSCNM (5): reverse video (swap default fg/bg for the whole
        /// screen).
        const REVERSE_VIDEO = 1 << 2;
        /// DECOM (6): origin mode. Cursor positioning is relative to the
        /// scroll region instead of the full screen.
        const ORIGIN = 1 << 3;
        /// DECAWM (7): auto-wrap. Printing at the right margin sets
        /// pending-wrap instead of overwriting in place.
        const AUTOWRAP = 1 << 4;
        /// DECTCEM (25): cursor visible.
        const SHOW_CURSOR = 1 << 5;
        /// Alternate screen buffer active (DEC private modes 47/1047/1049).
        const ALT_SCREEN = 1 << 6;
        /// Bracketed paste (2004): pasted text is wrapped in
        /// `ESC[200~ ... ESC[201~`.
        const BRACKETED_PASTE = 1 << 7;
        /// Focus in/out reporting (1004): `ESC[I`/`ESC[O` sent on focus
        /// change.
        const FOCUS_EVENT = 1 << 8;
        /// DECLRMM (69): left/right margin mode. DECSLRM is only honored
        /// while this is set.
        const LEFT_RIGHT_MARGIN = 1 << 9;
        /// Alt-screen save/restore cursor bundled with 1049 (distinct from
        /// plain 47/1047, which do not save/restore cursor state).
        const ALT_SCREEN_SAVE_CURSOR = 1 << 10;
    }
}

impl Default for DecModes {
    /// A freshly reset terminal has auto-wrap and cursor visibility on;
    /// everything else starts cleared.
    fn default() -> Self {
        Self::AUTOWRAP | Self::SHOW_CURSOR
    }
}

/// Mouse event reporting protocol (which events are sent at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseTracking {
    #[default]
    Off,
    /// Mode 9: press only.
    X10,
    /// Mode 1000: press and release.
    Normal,
    /// Mode 1002: press, release, and motion while a button is held.
    ButtonEvent,
    /// Mode 1003: press, release, and all motion.
    AnyEvent,
}

/// Mouse event encoding format (how coordinates are serialized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseFormat {
    /// Mode off: legacy X10 single-byte coordinates (max 223).
    #[default]
    X10,
    /// Mode 1005: UTF-8 encoded coordinates.
    Utf8,
    /// Mode 1006: `CSI < ... M`/`m` SGR-style coordinates (no coordinate
    /// ceiling).
    Sgr,
    /// Mode 1015: urxvt decimal coordinates.
    Urxvt,
}

bitflags! {
    /// Kitty keyboard protocol progressive-enhancement flags (pushed via
    /// `CSI > flags u`, popped via `CSI < n u`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KittyFlags: u8 {
        const DISAMBIGUATE    = 1 << 0;
        const REPORT_EVENTS   = 1 << 1;
        const ALTERNATE_KEYS  = 1 << 2;
        const ALL_AS_ESCAPE   = 1 << 3;
        const ASSOCIATED_TEXT = 1 << 4;
    }
}

/// `modifyOtherKeys` state, set via `CSI > 4 ; n m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifyOtherKeys {
    #[default]
    Off,
    State1,
    State2,
}

/// The full terminal mode set: every boolean/enumerated mode the parser's
/// DECSET/DECRST/SM/RM handlers and the input encoder consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    pub ansi: AnsiModes,
    pub dec: DecModes,
    pub mouse_tracking: MouseTracking,
    pub mouse_format: MouseFormat,
    pub modify_other_keys: ModifyOtherKeys,
    /// Stack of pushed kitty keyboard flag sets (`CSI > flags u` pushes,
    /// `CSI < n u` pops `n` entries). The active flags are the top of the
    /// stack, or empty if the stack is empty.
    kitty_stack: Vec<KittyFlags>,
}

impl Modes {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ansi: AnsiModes::empty(),
            dec: DecModes::default(),
            mouse_tracking: MouseTracking::default(),
            mouse_format: MouseFormat::default(),
            modify_other_keys: ModifyOtherKeys::default(),
            kitty_stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn insert_mode(&self) -> bool {
        self.ansi.contains(AnsiModes::INSERT)
    }

    #[must_use]
    pub fn origin_mode(&self) -> bool {
        self.dec.contains(DecModes::ORIGIN)
    }

    #[must_use]
    pub fn autowrap(&self) -> bool {
        self.dec.contains(DecModes::AUTOWRAP)
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.dec.contains(DecModes::SHOW_CURSOR)
    }

    #[must_use]
    pub fn alt_screen_active(&self) -> bool {
        self.dec.contains(DecModes::ALT_SCREEN)
    }

    #[must_use]
    pub fn left_right_margin_mode(&self) -> bool {
        self.dec.contains(DecModes::LEFT_RIGHT_MARGIN)
    }

    /// Currently active kitty keyboard flags (empty if the protocol has
    /// never been engaged).
    #[must_use]
    pub fn kitty_flags(&self) -> KittyFlags {
        self.kitty_stack.last().copied().unwrap_or(KittyFlags::empty())
    }

    /// `CSI > flags u`: push a new kitty flag set onto the stack.
    pub fn push_kitty_flags(&mut self, flags: KittyFlags) {
        self.kitty_stack.push(flags);
    }

    /// `CSI < n u`: pop `n` entries from the kitty flag stack (at least 1).
    pub fn pop_kitty_flags(&mut self, n: u16) {
        let n = n.max(1) as usize;
        let new_len = self.kitty_stack.len().saturating_sub(n);
        self.kitty_stack.truncate(new_len);
    }

    /// Depth of the kitty flag stack, reported by `CSI ? u` queries.
    #[must_use]
    pub fn kitty_stack_depth(&self) -> usize {
        self.kitty_stack.len()
    }
}

impl Default for Modes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_autowrap_and_cursor_visible() {
        let modes = Modes::new();
        assert!(modes.autowrap());
        assert!(modes.cursor_visible());
        assert!(!modes.origin_mode());
        assert!(!modes.insert_mode());
    }

    #[test]
    fn kitty_flag_stack_push_pop() {
        let mut modes = Modes::new();
        assert_eq!(modes.kitty_flags(), KittyFlags::empty());
        modes.push_kitty_flags(KittyFlags::DISAMBIGUATE);
        modes.push_kitty_flags(KittyFlags::DISAMBIGUATE | KittyFlags::REPORT_EVENTS);
        assert_eq!(modes.kitty_stack_depth(), 2);
        assert_eq!(
            modes.kitty_flags(),
            KittyFlags::DISAMBIGUATE | KittyFlags::REPORT_EVENTS
        );
        modes.pop_kitty_flags(1);
        assert_eq!(modes.kitty_flags(), KittyFlags::DISAMBIGUATE);
        modes.pop_kitty_flags(5);
        assert_eq!(modes.kitty_flags(), KittyFlags::empty());
        assert_eq!(modes.kitty_stack_depth(), 0);
    }

    #[test]
    fn dec_mode_toggle_roundtrip() {
        let mut modes = Modes::new();
        modes.dec.insert(DecModes::ORIGIN);
        assert!(modes.origin_mode());
        modes.dec.remove(DecModes::ORIGIN);
        assert!(!modes.origin_mode());
    }
}
