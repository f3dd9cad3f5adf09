//! VT/ANSI parser: a byte-oriented state machine patterned on Paul Williams'
//! "A parser for DEC's ANSI-compatible video terminals", extended with OSC,
//! DCS, and APC string collection (both BEL and ST terminators) and with
//! UTF-8 decoding folded into the ground state.
//!
//! The parser never allocates per byte: parameter and intermediate storage
//! is reused across dispatches, and string collection (OSC/DCS/APC bodies)
//! writes into a single capped buffer that is drained, not reallocated, on
//! every dispatch. Malformed input is never fatal — see [`Parser::advance`].

/// Hard cap on the number of semicolon-separated parameters a single CSI/DCS
/// sequence may carry; further parameters are dropped (the parser keeps
/// consuming bytes but stops recording).
const MAX_PARAMS: usize = 32;
/// Hard cap on colon-separated sub-parameters within one parameter.
const MAX_SUBPARAMS: usize = 8;
/// Hard cap on intermediate bytes collected before a final byte.
const MAX_INTERMEDIATES: usize = 4;
/// Hard cap on the OSC/DCS/APC string collector, in bytes. Oversized payloads
/// are truncated per `spec.md` §4.A/§7; the dropped flag records that this
/// happened so callers/diagnostics can observe it.
const MAX_STRING_LEN: usize = 1 << 20;

/// Parsed CSI/DCS parameters: semicolon-separated groups, each possibly
/// holding colon-separated sub-parameters (used by SGR extended color and
/// the kitty keyboard protocol). Both parameter counts are capped; any
/// values seen past the cap still advance the state machine but stop being
/// recorded.
///
/// A group in progress is buffered in `current` rather than appended to
/// `groups` directly, so a `;` with nothing before it (an omitted leading
/// parameter, e.g. `CSI ;5H`) closes out an all-zero group instead of a
/// later digit reaching back and mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsiParams {
    groups: Vec<Vec<u16>>,
    current: Vec<u16>,
    /// Whether any parameter byte (digit, `;`, or `:`) has been seen at all;
    /// distinguishes a bare `CSI m` (zero groups) from `CSI ;m` (one,
    /// all-omitted, group).
    touched: bool,
    /// Set once either the parameter-group or sub-parameter cap is hit.
    pub overflowed: bool,
}

impl Default for CsiParams {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            current: vec![0],
            touched: false,
            overflowed: false,
        }
    }
}

impl CsiParams {
    fn new() -> Self {
        Self::default()
    }

    /// Number of semicolon-separated parameter groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The sub-parameters of group `i`, or an empty slice if `i` is out of
    /// range (treat as "not given", i.e. default).
    #[must_use]
    pub fn subparams(&self, i: usize) -> &[u16] {
        self.groups.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First (and usually only) value of group `i`, or `default` if group
    /// `i` was never given at all. An omitted parameter *within* a given
    /// group (e.g. the first field of `CSI ;5H`) reads back as `0`, same as
    /// an explicit `0` — xterm and friends don't distinguish the two either.
    #[must_use]
    pub fn get(&self, i: usize, default: u16) -> u16 {
        match self.groups.get(i) {
            Some(group) => group.first().copied().unwrap_or(0),
            None => default,
        }
    }

    /// Iterate the leading value of every group, in order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.groups.iter().map(|g| g.first().copied().unwrap_or(0))
    }

    /// `;`: close out the group being built and start a fresh one.
    fn begin_group(&mut self) {
        self.touched = true;
        self.close_current();
    }

    /// `:`: start a new sub-parameter slot within the group being built.
    fn push_subparam(&mut self) {
        self.touched = true;
        if self.current.len() >= MAX_SUBPARAMS {
            self.overflowed = true;
            return;
        }
        self.current.push(0);
    }

    fn push_digit(&mut self, digit: u8) {
        self.touched = true;
        let Some(value) = self.current.last_mut() else {
            return;
        };
        *value = value.saturating_mul(10).saturating_add(digit as u16);
    }

    fn close_current(&mut self) {
        if self.groups.len() >= MAX_PARAMS {
            self.overflowed = true;
            return;
        }
        let done = std::mem::replace(&mut self.current, vec![0]);
        self.groups.push(done);
    }

    /// Fold the in-progress group into `groups` so readers see it. Called
    /// once a CSI/DCS sequence's final byte is reached.
    fn finish(&mut self) {
        if self.touched {
            self.close_current();
        }
    }

    fn clear(&mut self) {
        self.groups.clear();
        self.current = vec![0];
        self.touched = false;
        self.overflowed = false;
    }
}

/// Parser output actions — the parser's complete public alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A printable Unicode scalar value reached the ground state.
    Print(char),
    /// A C0/C1 control byte executed in the ground state (e.g. LF, CR, BEL).
    Execute(u8),
    /// `ESC ... final` with no `[`/`]`/`P`/`X`/`^`/`_` introducer (e.g.
    /// `ESC =`, `ESC c`, charset designations).
    EscDispatch {
        final_byte: u8,
        intermediates: Vec<u8>,
    },
    /// A complete CSI sequence: `CSI [private] params final`.
    CsiDispatch {
        final_byte: u8,
        /// The `?`/`>`/`=`/`<` private marker, if present.
        private: Option<u8>,
        params: CsiParams,
        intermediates: Vec<u8>,
    },
    /// A complete OSC body (the bytes between `ESC ]` and the BEL/ST
    /// terminator), not including the terminator itself.
    OscString(Vec<u8>),
    /// DCS sequence header: `DCS [private] params intermediates final` just
    /// before passthrough data begins.
    DcsHook {
        final_byte: u8,
        private: Option<u8>,
        params: CsiParams,
        intermediates: Vec<u8>,
    },
    /// One passthrough data byte of an open DCS sequence.
    DcsPut(u8),
    /// The DCS sequence's terminator (BEL/ST) was reached.
    DcsUnhook,
    /// A complete SOS/PM/APC body (kitty keyboard flag push/pop arrives as
    /// APC in some emulators; most implementations only use APC here).
    ApcString(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    DcsIgnore,
    OscString,
    SosPmApcString,
}

/// Which string-collection state is open, so a single collector/termination
/// path can serve OSC, SOS/PM/APC, and (for the final flush) DCS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Osc,
    SosPmApc,
}

/// Records which string-collecting state an `ESC` was seen from, so that the
/// following byte can decide between "ST terminator" (`ESC \`) and "this
/// ESC actually starts a fresh escape sequence, abandon the open string".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingTerminator {
    None,
    Dcs,
    Osc,
    SosPmApc,
}

/// UTF-8 continuation bookkeeping folded into ground-state byte handling.
#[derive(Debug, Clone, Copy, Default)]
struct Utf8Decode {
    /// Continuation bytes still expected, or 0 if not mid-sequence.
    remaining: u8,
    /// Codepoint accumulated so far.
    codepoint: u32,
    /// Lowest codepoint value this sequence length may legally encode
    /// (rejects overlong encodings).
    min_value: u32,
}

/// Parser anomaly counters, exposed for host diagnostics/telemetry. Every
/// counter here corresponds to a silently-recovered malformed-input case per
/// `spec.md` §4.A/§7 — none of them ever surface as an error to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserDiagnostics {
    pub oversized_params: u64,
    pub truncated_strings: u64,
    pub invalid_utf8_resyncs: u64,
}

/// VT/ANSI parser state machine.
#[derive(Debug, Clone)]
pub struct Parser {
    state: State,
    params: CsiParams,
    intermediates: Vec<u8>,
    private_marker: Option<u8>,
    string_kind: StringKind,
    string_buf: Vec<u8>,
    pending_terminator: PendingTerminator,
    utf8: Utf8Decode,
    diagnostics: ParserDiagnostics,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            params: CsiParams::new(),
            intermediates: Vec::with_capacity(MAX_INTERMEDIATES),
            private_marker: None,
            string_kind: StringKind::Osc,
            string_buf: Vec::new(),
            pending_terminator: PendingTerminator::None,
            utf8: Utf8Decode::default(),
            diagnostics: ParserDiagnostics::default(),
        }
    }

    /// Anomaly counters accumulated since construction (or the last
    /// [`Parser::reset_diagnostics`]).
    #[must_use]
    pub fn diagnostics(&self) -> ParserDiagnostics {
        self.diagnostics
    }

    pub fn reset_diagnostics(&mut self) {
        self.diagnostics = ParserDiagnostics::default();
    }

    #[cfg(feature = "tracing")]
    fn trace_oversized_params(&self) {
        tracing::trace!(target: "vtcore::parser", total = self.diagnostics.oversized_params, "oversized CSI/DCS parameter list");
    }
    #[cfg(not(feature = "tracing"))]
    fn trace_oversized_params(&self) {}

    #[cfg(feature = "tracing")]
    fn trace_truncated_string(&self) {
        tracing::debug!(target: "vtcore::parser", total = self.diagnostics.truncated_strings, cap = MAX_STRING_LEN, "OSC/DCS/APC string collector truncated");
    }
    #[cfg(not(feature = "tracing"))]
    fn trace_truncated_string(&self) {}

    #[cfg(feature = "tracing")]
    fn trace_utf8_resync(&self) {
        tracing::trace!(target: "vtcore::parser", total = self.diagnostics.invalid_utf8_resyncs, "invalid UTF-8 byte sequence, emitted replacement character");
    }
    #[cfg(not(feature = "tracing"))]
    fn trace_utf8_resync(&self) {}

    /// Feed a chunk of bytes and return every action produced.
    ///
    /// Tolerant to any split across calls, including mid-UTF-8-sequence and
    /// mid-escape-sequence splits.
    #[must_use]
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut out = Vec::new();
        for &b in bytes {
            self.advance(b, &mut out);
        }
        out
    }

    /// Advance the parser by a single byte, pushing zero or more actions
    /// into `out`. Most bytes produce at most one action; UTF-8 lead bytes
    /// produce none until their continuation bytes complete the scalar.
    pub fn advance(&mut self, b: u8, out: &mut Vec<Action>) {
        match self.state {
            State::Ground => self.advance_ground(b, out),
            State::Escape => self.advance_escape(b, out),
            State::EscapeIntermediate => self.advance_escape_intermediate(b, out),
            State::CsiEntry => self.advance_csi_entry(b, out),
            State::CsiParam => self.advance_csi_param(b, out),
            State::CsiIntermediate => self.advance_csi_intermediate(b, out),
            State::CsiIgnore => self.advance_csi_ignore(b),
            State::DcsEntry => self.advance_dcs_entry(b, out),
            State::DcsParam => self.advance_dcs_param(b, out),
            State::DcsIntermediate => self.advance_dcs_intermediate(b, out),
            State::DcsPassthrough => self.advance_dcs_passthrough(b, out),
            State::DcsIgnore => self.advance_dcs_ignore(b),
            State::OscString => self.advance_string(b, out),
            State::SosPmApcString => self.advance_string(b, out),
        }
    }

    // ── Ground state (includes UTF-8 decode) ────────────────────────

    fn advance_ground(&mut self, b: u8, out: &mut Vec<Action>) {
        if self.utf8.remaining > 0 {
            self.advance_utf8_continuation(b, out);
            return;
        }
        match b {
            0x1b => self.enter_escape(),
            0x00..=0x1a | 0x1c..=0x1f => out.push(Action::Execute(b)),
            0x20..=0x7e => out.push(Action::Print(b as char)),
            0x7f => out.push(Action::Execute(b)),
            0xc2..=0xdf => self.begin_utf8(b, 1, 0x80),
            0xe0..=0xef => self.begin_utf8(b, 2, 0x800),
            0xf0..=0xf4 => self.begin_utf8(b, 3, 0x10000),
            0x80..=0xc1 | 0xf5..=0xff => self.emit_replacement(out),
        }
    }

    fn begin_utf8(&mut self, lead: u8, continuations: u8, min_value: u32) {
        let payload_bits = match continuations {
            1 => lead as u32 & 0x1f,
            2 => lead as u32 & 0x0f,
            _ => lead as u32 & 0x07,
        };
        self.utf8 = Utf8Decode {
            remaining: continuations,
            codepoint: payload_bits,
            min_value,
        };
    }

    fn advance_utf8_continuation(&mut self, b: u8, out: &mut Vec<Action>) {
        if b & 0xc0 != 0x80 {
            // Not a continuation byte: the sequence was truncated. Emit
            // replacement for what we had and reprocess `b` from ground.
            self.utf8 = Utf8Decode::default();
            self.diagnostics.invalid_utf8_resyncs += 1;
            self.trace_utf8_resync();
            out.push(Action::Print('\u{fffd}'));
            self.advance_ground(b, out);
            return;
        }
        self.utf8.codepoint = (self.utf8.codepoint << 6) | (b as u32 & 0x3f);
        self.utf8.remaining -= 1;
        if self.utf8.remaining == 0 {
            let cp = self.utf8.codepoint;
            let min = self.utf8.min_value;
            self.utf8 = Utf8Decode::default();
            if cp < min || cp > 0x10ffff || (0xd800..=0xdfff).contains(&cp) {
                self.diagnostics.invalid_utf8_resyncs += 1;
                self.trace_utf8_resync();
                out.push(Action::Print('\u{fffd}'));
            } else if let Some(ch) = char::from_u32(cp) {
                out.push(Action::Print(ch));
            } else {
                self.diagnostics.invalid_utf8_resyncs += 1;
                self.trace_utf8_resync();
                out.push(Action::Print('\u{fffd}'));
            }
        }
    }

    fn emit_replacement(&mut self, out: &mut Vec<Action>) {
        self.diagnostics.invalid_utf8_resyncs += 1;
        self.trace_utf8_resync();
        out.push(Action::Print('\u{fffd}'));
    }

    // ── Escape ───────────────────────────────────────────────────────

    /// Enter `Escape` from ground (no open string/DCS to resolve).
    fn enter_escape(&mut self) {
        self.state = State::Escape;
        self.intermediates.clear();
        self.pending_terminator = PendingTerminator::None;
        self.utf8 = Utf8Decode::default();
    }

    /// Enter `Escape` from an open OSC/SOS/PM/APC/DCS state. The next byte
    /// decides between `ST` (`\`, terminating the string/DCS) and an
    /// unrelated escape sequence (which abandons the open string per the
    /// edge policy: an ESC not immediately followed by `\` aborts rather
    /// than being buffered indefinitely).
    fn enter_escape_from(&mut self, pending: PendingTerminator) {
        self.state = State::Escape;
        self.intermediates.clear();
        self.pending_terminator = pending;
        self.utf8 = Utf8Decode::default();
    }

    fn advance_escape(&mut self, b: u8, out: &mut Vec<Action>) {
        if self.pending_terminator != PendingTerminator::None {
            let pending = self.pending_terminator;
            self.pending_terminator = PendingTerminator::None;
            if b == b'\\' {
                self.state = State::Ground;
                match pending {
                    PendingTerminator::Dcs => out.push(Action::DcsUnhook),
                    PendingTerminator::Osc => self.terminate_string(out),
                    PendingTerminator::SosPmApc => self.terminate_string(out),
                    PendingTerminator::None => {}
                }
                return;
            }
            // Not a terminator: the open string/DCS is abandoned (no
            // `DcsUnhook`/`OscString`/`ApcString` is emitted for it), and
            // `b` is processed as the byte following a fresh ESC below.
        }
        match b {
            0x1b => self.enter_escape(), // bare ESC restarts escape state
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => out.push(Action::Execute(b)),
            0x20..=0x2f => {
                self.push_intermediate(b);
                self.state = State::EscapeIntermediate;
            }
            b'[' => self.enter_csi_entry(),
            b']' => self.enter_string(StringKind::Osc),
            b'P' => self.enter_dcs_entry(),
            b'X' | b'^' | b'_' => self.enter_string(StringKind::SosPmApc),
            0x30..=0x7e => {
                let intermediates = std::mem::take(&mut self.intermediates);
                self.state = State::Ground;
                out.push(Action::EscDispatch {
                    final_byte: b,
                    intermediates,
                });
            }
            _ => {}
        }
    }

    fn advance_escape_intermediate(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x1b => self.enter_escape(),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => out.push(Action::Execute(b)),
            0x20..=0x2f => self.push_intermediate(b),
            0x30..=0x7e => {
                let intermediates = std::mem::take(&mut self.intermediates);
                self.state = State::Ground;
                out.push(Action::EscDispatch {
                    final_byte: b,
                    intermediates,
                });
            }
            _ => {}
        }
    }

    fn push_intermediate(&mut self, b: u8) {
        if self.intermediates.len() < MAX_INTERMEDIATES {
            self.intermediates.push(b);
        } else {
            self.diagnostics.oversized_params += 1;
            self.trace_oversized_params();
        }
    }

    // ── CSI ──────────────────────────────────────────────────────────

    fn enter_csi_entry(&mut self) {
        self.state = State::CsiEntry;
        self.params.clear();
        self.intermediates.clear();
        self.private_marker = None;
    }

    fn advance_csi_entry(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x3c..=0x3f => {
                self.private_marker = Some(b);
                self.state = State::CsiParam;
            }
            _ => self.advance_csi_param(b, out),
        }
    }

    fn advance_csi_param(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x1b => self.enter_escape(),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => out.push(Action::Execute(b)),
            b'0'..=b'9' => {
                self.state = State::CsiParam;
                self.params.push_digit(b - b'0');
            }
            b';' => {
                self.state = State::CsiParam;
                self.params.begin_group();
            }
            b':' => {
                self.state = State::CsiParam;
                self.params.push_subparam();
            }
            0x20..=0x2f => {
                self.push_intermediate(b);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7e => self.dispatch_csi(b, out),
            // A private marker outside the entry position (two markers, or
            // one after parameters have started) is a malformed sequence;
            // consume it silently until the final byte.
            _ => self.state = State::CsiIgnore,
        }
        if self.params.overflowed {
            self.diagnostics.oversized_params += 1;
            self.trace_oversized_params();
        }
    }

    fn advance_csi_intermediate(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x1b => self.enter_escape(),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => out.push(Action::Execute(b)),
            0x20..=0x2f => self.push_intermediate(b),
            0x40..=0x7e => self.dispatch_csi(b, out),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_ignore(&mut self, b: u8) {
        match b {
            0x1b => self.enter_escape(),
            0x40..=0x7e => self.state = State::Ground,
            _ => {}
        }
    }

    fn dispatch_csi(&mut self, final_byte: u8, out: &mut Vec<Action>) {
        self.state = State::Ground;
        self.params.finish();
        out.push(Action::CsiDispatch {
            final_byte,
            private: self.private_marker.take(),
            params: std::mem::take(&mut self.params),
            intermediates: std::mem::take(&mut self.intermediates),
        });
    }

    // ── DCS ──────────────────────────────────────────────────────────

    fn enter_dcs_entry(&mut self) {
        self.state = State::DcsEntry;
        self.params.clear();
        self.intermediates.clear();
        self.private_marker = None;
    }

    fn advance_dcs_entry(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x3c..=0x3f => {
                self.private_marker = Some(b);
                self.state = State::DcsParam;
            }
            _ => self.advance_dcs_param(b, out),
        }
    }

    fn advance_dcs_param(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x1b => self.enter_escape(),
            b'0'..=b'9' => {
                self.state = State::DcsParam;
                self.params.push_digit(b - b'0');
            }
            b';' => {
                self.state = State::DcsParam;
                self.params.begin_group();
            }
            b':' => {
                self.state = State::DcsParam;
                self.params.push_subparam();
            }
            0x20..=0x2f => {
                self.push_intermediate(b);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7e => self.hook_dcs(b, out),
            _ => self.state = State::DcsIgnore,
        }
    }

    fn advance_dcs_intermediate(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x1b => self.enter_escape(),
            0x20..=0x2f => self.push_intermediate(b),
            0x40..=0x7e => self.hook_dcs(b, out),
            _ => self.state = State::DcsIgnore,
        }
    }

    /// The DCS final byte both ends the header and begins passthrough data;
    /// unlike CSI there is no separate dispatch-on-final, since the data
    /// that follows the final byte is the DCS payload itself.
    fn hook_dcs(&mut self, final_byte: u8, out: &mut Vec<Action>) {
        self.state = State::DcsPassthrough;
        self.string_buf.clear();
        self.params.finish();
        out.push(Action::DcsHook {
            final_byte,
            private: self.private_marker.take(),
            params: std::mem::take(&mut self.params),
            intermediates: std::mem::take(&mut self.intermediates),
        });
    }

    fn advance_dcs_passthrough(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x1b => self.enter_escape_from(PendingTerminator::Dcs),
            0x00..=0x17 | 0x19 => {} // ignored inside passthrough
            _ => out.push(Action::DcsPut(b)),
        }
    }

    fn advance_dcs_ignore(&mut self, b: u8) {
        if b == 0x1b {
            self.enter_escape();
        }
    }

    // ── OSC / SOS / PM / APC string collection ──────────────────────

    fn enter_string(&mut self, kind: StringKind) {
        self.state = match kind {
            StringKind::Osc => State::OscString,
            StringKind::SosPmApc => State::SosPmApcString,
        };
        self.string_kind = kind;
        self.string_buf.clear();
    }

    fn advance_string(&mut self, b: u8, out: &mut Vec<Action>) {
        match b {
            0x07 => self.terminate_string(out), // BEL
            0x1b => {
                let pending = match self.string_kind {
                    StringKind::Osc => PendingTerminator::Osc,
                    StringKind::SosPmApc => PendingTerminator::SosPmApc,
                };
                self.enter_escape_from(pending);
            }
            0x00..=0x06 | 0x08..=0x17 | 0x19 | 0x1c..=0x1f => {} // ignored
            _ => {
                if self.string_buf.len() < MAX_STRING_LEN {
                    self.string_buf.push(b);
                } else {
                    self.diagnostics.truncated_strings += 1;
                    self.trace_truncated_string();
                }
            }
        }
    }

    fn terminate_string(&mut self, out: &mut Vec<Action>) {
        self.state = State::Ground;
        let body = std::mem::take(&mut self.string_buf);
        match self.string_kind {
            StringKind::Osc => out.push(Action::OscString(body)),
            StringKind::SosPmApc => out.push(Action::ApcString(body)),
        }
    }
}
