//! Keyboard-event to PTY-bytes encoder.
//!
//! Grounded on `frankenterm-web`'s `input.rs` (the `Modifiers` bitset, the
//! legacy CSI-building helpers, the kitty codepoint table, and the
//! `1 + bits` xterm modifier-value encoding all come straight from there),
//! generalized to the full six-layer priority order a terminal core needs
//! once it also has to speak `modifyOtherKeys` and fixterms, not just
//! legacy-vs-kitty: kitty keyboard protocol, then `modifyOtherKeys` state 2,
//! then fixterms, then the PC-style function-key table, then plain
//! ctrl-to-C0, then raw UTF-8. [`encode_key`] is a pure function of its two
//! arguments - no hidden state, nothing cached between calls.

use bitflags::bitflags;

use crate::modes::{DecModes, KittyFlags, ModifyOtherKeys, Modes};

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Modifiers {
    #[must_use]
    pub const fn from_bits_truncate_u8(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }
}

/// Normalized key identity, independent of host (DOM/terminal-lib) naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    BackTab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
}

/// Phase of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Press,
    Repeat,
    Release,
}

/// One normalized key event, ready for [`encode_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub code: KeyCode,
    pub modifiers: Modifiers,
    /// `true` while an IME composition session owns this keystroke; such
    /// events never produce PTY bytes (the eventual commit arrives as plain
    /// text through the host's paste/insert path, not through this encoder).
    pub composing: bool,
}

impl KeyEvent {
    #[must_use]
    pub fn new(kind: KeyEventKind, code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            kind,
            code,
            modifiers,
            composing: false,
        }
    }
}

/// Encode one key event into the bytes it should write to the PTY, given the
/// terminal's current [`Modes`]. Returns an empty vector for events that
/// intentionally produce no bytes (composing events; release events outside
/// kitty's report-events flag; unencodable combinations).
#[must_use]
pub fn encode_key(event: &KeyEvent, modes: &Modes) -> Vec<u8> {
    if event.composing {
        return Vec::new();
    }

    let kitty_flags = modes.kitty_flags();
    if !kitty_flags.is_empty() {
        return encode_kitty(event, kitty_flags);
    }

    if event.kind == KeyEventKind::Release {
        // Without kitty's report-events flag, legacy/fixterms/modifyOtherKeys
        // streams have no representation for key-up at all.
        return Vec::new();
    }

    if modes.modify_other_keys == ModifyOtherKeys::State2
        && let Some(bytes) = encode_modify_other_keys(event)
    {
        return bytes;
    }

    if let Some(bytes) = encode_fixterm_ctrl(event) {
        return bytes;
    }

    if let Some(bytes) = encode_function_key_table(event, modes.dec) {
        return bytes;
    }

    if let Some(bytes) = encode_plain_ctrl(event) {
        return bytes;
    }

    encode_raw_utf8(event)
}

/// Layer 1: kitty keyboard protocol (`CSI codepoint;mods[:kind]u`), active
/// whenever any progressive-enhancement flag has been pushed.
fn encode_kitty(event: &KeyEvent, flags: KittyFlags) -> Vec<u8> {
    if event.kind == KeyEventKind::Release && !flags.contains(KittyFlags::REPORT_EVENTS) {
        return Vec::new();
    }

    let Some(codepoint) = kitty_codepoint_for_keycode(event.code) else {
        return Vec::new();
    };

    let mod_value = xterm_modifier_value(event.modifiers);
    let kind_value = match event.kind {
        KeyEventKind::Release => 3,
        KeyEventKind::Repeat => 2,
        KeyEventKind::Press => 1,
    };

    if kind_value == 1 && !flags.contains(KittyFlags::REPORT_EVENTS) {
        format!("\x1b[{codepoint};{mod_value}u").into_bytes()
    } else {
        format!("\x1b[{codepoint};{mod_value}:{kind_value}u").into_bytes()
    }
}

fn kitty_codepoint_for_keycode(code: KeyCode) -> Option<u32> {
    match code {
        KeyCode::Char(ch) => Some(u32::from(ch)),
        KeyCode::Enter => Some(57_345),
        KeyCode::Escape => Some(57_344),
        KeyCode::Backspace => Some(57_347),
        KeyCode::Tab | KeyCode::BackTab => Some(57_346),
        KeyCode::Delete => Some(57_349),
        KeyCode::Insert => Some(57_348),
        KeyCode::Home => Some(57_356),
        KeyCode::End => Some(57_357),
        KeyCode::PageUp => Some(57_354),
        KeyCode::PageDown => Some(57_355),
        KeyCode::Up => Some(57_352),
        KeyCode::Down => Some(57_353),
        KeyCode::Left => Some(57_350),
        KeyCode::Right => Some(57_351),
        KeyCode::F(n @ 1..=24) => Some(57_364 + (u32::from(n) - 1)),
        KeyCode::F(_) => None,
    }
}

/// Layer 2: `modifyOtherKeys` state 2 (`CSI 27;mods;codepoint~`) for the
/// "basic" keys (printable chars and the control keys that otherwise
/// collide with C0) once any modifier is held. Keys with dedicated CSI
/// forms (arrows, function keys, navigation) are left to the PC-style table
/// regardless of this mode.
fn encode_modify_other_keys(event: &KeyEvent) -> Option<Vec<u8>> {
    if event.modifiers.is_empty() {
        return None;
    }
    let codepoint = match event.code {
        KeyCode::Char(ch) => u32::from(ch),
        KeyCode::Enter => 13,
        KeyCode::Escape => 27,
        KeyCode::Backspace => 127,
        KeyCode::Tab | KeyCode::BackTab => 9,
        _ => return None,
    };
    let mod_value = xterm_modifier_value(event.modifiers);
    Some(format!("\x1b[27;{mod_value};{codepoint}~").into_bytes())
}

/// Layer 3: fixterms (`CSI codepoint;mods u`) for ctrl+letter/symbol
/// combinations that also carry a second modifier (shift, alt, or super),
/// which a bare C0 byte cannot represent.
fn encode_fixterm_ctrl(event: &KeyEvent) -> Option<Vec<u8>> {
    let KeyCode::Char(ch) = event.code else {
        return None;
    };
    if !event.modifiers.contains(Modifiers::CTRL) {
        return None;
    }
    // Ctrl alone is handled by the plain-C0 layer; fixterms is only needed
    // once ctrl combines with something else.
    if event.modifiers == Modifiers::CTRL {
        return None;
    }
    ctrl_char_to_byte(ch)?;
    let mod_value = xterm_modifier_value(event.modifiers);
    Some(format!("\x1b[{};{mod_value}u", ch as u32).into_bytes())
}

/// Layer 4: the PC-style function/navigation key table, honoring
/// cursor-keys-application mode for the arrow keys (SS3 instead of CSI,
/// only when no other modifier is held).
fn encode_function_key_table(event: &KeyEvent, dec: DecModes) -> Option<Vec<u8>> {
    let application_cursor_keys = dec.contains(DecModes::CURSOR_KEYS_APPLICATION);
    match event.code {
        KeyCode::Up => Some(arrow_or_ss3('A', event.modifiers, application_cursor_keys)),
        KeyCode::Down => Some(arrow_or_ss3('B', event.modifiers, application_cursor_keys)),
        KeyCode::Right => Some(arrow_or_ss3('C', event.modifiers, application_cursor_keys)),
        KeyCode::Left => Some(arrow_or_ss3('D', event.modifiers, application_cursor_keys)),
        KeyCode::Home => Some(csi_with_mod_or_plain('H', event.modifiers)),
        KeyCode::End => Some(csi_with_mod_or_plain('F', event.modifiers)),
        KeyCode::BackTab => Some(csi_with_mod_or_plain('Z', event.modifiers)),
        KeyCode::Insert => Some(csi_tilde_with_mod(2, event.modifiers)),
        KeyCode::Delete => Some(csi_tilde_with_mod(3, event.modifiers)),
        KeyCode::PageUp => Some(csi_tilde_with_mod(5, event.modifiers)),
        KeyCode::PageDown => Some(csi_tilde_with_mod(6, event.modifiers)),
        KeyCode::F(n) => Some(encode_function_key(n, event.modifiers)),
        _ => None,
    }
}

fn arrow_or_ss3(final_byte: char, mods: Modifiers, application_cursor_keys: bool) -> Vec<u8> {
    if application_cursor_keys && mods.is_empty() {
        vec![0x1b, b'O', final_byte as u8]
    } else {
        csi_with_mod_or_plain(final_byte, mods)
    }
}

fn encode_function_key(n: u8, mods: Modifiers) -> Vec<u8> {
    match n {
        1..=4 => {
            if !mods.is_empty() {
                return csi_tilde_with_mod(10 + n as u16, mods);
            }
            let ss3 = match n {
                1 => b'P',
                2 => b'Q',
                3 => b'R',
                _ => b'S',
            };
            vec![0x1b, b'O', ss3]
        }
        5 => csi_tilde_with_mod(15, mods),
        6 => csi_tilde_with_mod(17, mods),
        7 => csi_tilde_with_mod(18, mods),
        8 => csi_tilde_with_mod(19, mods),
        9 => csi_tilde_with_mod(20, mods),
        10 => csi_tilde_with_mod(21, mods),
        11 => csi_tilde_with_mod(23, mods),
        12 => csi_tilde_with_mod(24, mods),
        _ => Vec::new(),
    }
}

fn csi_with_mod_or_plain(final_byte: char, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        format!("\x1b[{final_byte}").into_bytes()
    } else {
        let mod_value = xterm_modifier_value(mods);
        format!("\x1b[1;{mod_value}{final_byte}").into_bytes()
    }
}

fn csi_tilde_with_mod(code: u16, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        format!("\x1b[{code}~").into_bytes()
    } else {
        let mod_value = xterm_modifier_value(mods);
        format!("\x1b[{code};{mod_value}~").into_bytes()
    }
}

fn xterm_modifier_value(mods: Modifiers) -> u8 {
    1 + mods.bits()
}

/// Layer 5: plain ctrl-to-C0, with an `ESC` prefix if alt is also held.
fn encode_plain_ctrl(event: &KeyEvent) -> Option<Vec<u8>> {
    let byte = match event.code {
        KeyCode::Char(ch) if event.modifiers.contains(Modifiers::CTRL) => ctrl_char_to_byte(ch)?,
        KeyCode::Enter => b'\r',
        KeyCode::Backspace => 0x7f,
        KeyCode::Tab => b'\t',
        KeyCode::Escape => 0x1b,
        _ => return None,
    };
    let mut out = Vec::with_capacity(2);
    if event.modifiers.contains(Modifiers::ALT) {
        out.push(0x1b);
    }
    out.push(byte);
    Some(out)
}

fn ctrl_char_to_byte(ch: char) -> Option<u8> {
    match ch {
        '@' | ' ' => Some(0x00),
        'a'..='z' => Some((u32::from(ch) as u8) - b'a' + 1),
        'A'..='Z' => Some((u32::from(ch) as u8) - b'A' + 1),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' => Some(0x1f),
        _ => None,
    }
}

/// Layer 6: the raw UTF-8 payload of the character, with an `ESC` prefix if
/// alt is held. The fallback of last resort - reached only for printable
/// characters with no ctrl modifier (shift is already folded into the
/// character by the host).
fn encode_raw_utf8(event: &KeyEvent) -> Vec<u8> {
    let KeyCode::Char(ch) = event.code else {
        return Vec::new();
    };
    let mut buf = [0u8; 4];
    let mut out = Vec::with_capacity(8);
    if event.modifiers.contains(Modifiers::ALT) {
        out.push(0x1b);
    }
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modes_with(f: impl FnOnce(&mut Modes)) -> Modes {
        let mut modes = Modes::new();
        f(&mut modes);
        modes
    }

    #[test]
    fn plain_char_is_raw_utf8() {
        let event = KeyEvent::new(KeyEventKind::Press, KeyCode::Char('x'), Modifiers::empty());
        assert_eq!(encode_key(&event, &Modes::new()), b"x".to_vec());
    }

    #[test]
    fn ctrl_c_is_c0_byte() {
        let event = KeyEvent::new(KeyEventKind::Press, KeyCode::Char('c'), Modifiers::CTRL);
        assert_eq!(encode_key(&event, &Modes::new()), vec![0x03]);
    }

    #[test]
    fn alt_prefixes_plain_char() {
        let event = KeyEvent::new(KeyEventKind::Press, KeyCode::Char('x'), Modifiers::ALT);
        assert_eq!(encode_key(&event, &Modes::new()), vec![0x1b, b'x']);
    }

    #[test]
    fn ctrl_alt_shift_uses_fixterms() {
        let event = KeyEvent::new(
            KeyEventKind::Press,
            KeyCode::Char('c'),
            Modifiers::CTRL | Modifiers::ALT,
        );
        assert_eq!(encode_key(&event, &Modes::new()), b"\x1b[99;7u".to_vec());
    }

    #[test]
    fn arrow_key_uses_csi_by_default_and_ss3_in_application_mode() {
        let event = KeyEvent::new(KeyEventKind::Press, KeyCode::Up, Modifiers::empty());
        assert_eq!(encode_key(&event, &Modes::new()), b"\x1b[A".to_vec());

        let modes = modes_with(|m| m.dec.insert(DecModes::CURSOR_KEYS_APPLICATION));
        assert_eq!(encode_key(&event, &modes), b"\x1bOA".to_vec());
    }

    #[test]
    fn arrow_key_with_modifier_uses_csi_modifier_form_even_in_application_mode() {
        let event = KeyEvent::new(KeyEventKind::Press, KeyCode::Up, Modifiers::CTRL);
        let modes = modes_with(|m| m.dec.insert(DecModes::CURSOR_KEYS_APPLICATION));
        assert_eq!(encode_key(&event, &modes), b"\x1b[1;5A".to_vec());
    }

    #[test]
    fn modify_other_keys_state_two_wraps_basic_keys() {
        let event = KeyEvent::new(KeyEventKind::Press, KeyCode::Enter, Modifiers::SHIFT);
        let modes = modes_with(|m| m.modify_other_keys = ModifyOtherKeys::State2);
        assert_eq!(encode_key(&event, &modes), b"\x1b[27;2;13~".to_vec());
    }

    #[test]
    fn kitty_flags_take_priority_over_every_other_layer() {
        let event = KeyEvent::new(KeyEventKind::Press, KeyCode::Char('c'), Modifiers::CTRL);
        let modes = modes_with(|m| m.push_kitty_flags(KittyFlags::DISAMBIGUATE));
        assert_eq!(encode_key(&event, &modes), b"\x1b[99;5u".to_vec());
    }

    #[test]
    fn release_is_silent_without_kitty_report_events() {
        let event = KeyEvent::new(KeyEventKind::Release, KeyCode::Char('c'), Modifiers::empty());
        assert!(encode_key(&event, &Modes::new()).is_empty());

        let modes = modes_with(|m| m.push_kitty_flags(KittyFlags::DISAMBIGUATE));
        assert!(encode_key(&event, &modes).is_empty());

        let modes = modes_with(|m| {
            m.push_kitty_flags(KittyFlags::DISAMBIGUATE | KittyFlags::REPORT_EVENTS)
        });
        assert!(!encode_key(&event, &modes).is_empty());
    }

    #[test]
    fn composing_events_never_produce_bytes() {
        let mut event =
            KeyEvent::new(KeyEventKind::Press, KeyCode::Char('a'), Modifiers::empty());
        event.composing = true;
        assert!(encode_key(&event, &Modes::new()).is_empty());
    }

    #[test]
    fn function_key_uses_ss3_plain_and_csi_tilde_with_modifier() {
        let plain = KeyEvent::new(KeyEventKind::Press, KeyCode::F(1), Modifiers::empty());
        assert_eq!(encode_key(&plain, &Modes::new()), vec![0x1b, b'O', b'P']);

        let shifted = KeyEvent::new(KeyEventKind::Press, KeyCode::F(1), Modifiers::SHIFT);
        assert_eq!(encode_key(&shifted, &Modes::new()), b"\x1b[11;2~".to_vec());
    }
}
