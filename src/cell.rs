//! Terminal cell: the fundamental unit of the grid.
//!
//! Each cell stores a character (or grapheme cluster) and its SGR attributes.
//! This is intentionally simpler than `ftui-render::Cell` — it models the
//! terminal's internal state rather than the rendering pipeline.

use bitflags::bitflags;
use std::collections::HashMap;
use unicode_width::UnicodeWidthChar;

bitflags! {
    /// SGR text attribute flags.
    ///
    /// Maps directly to the ECMA-48 / VT100 SGR parameter values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SgrFlags: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
        const DOUBLE_UNDERLINE = 1 << 8;
        const CURLY_UNDERLINE  = 1 << 9;
        const OVERLINE      = 1 << 10;
        const DOTTED_UNDERLINE = 1 << 11;
        const DASHED_UNDERLINE = 1 << 12;
    }
}

/// The underline style selected by SGR 4's colon sub-parameter (`4:n`).
///
/// `None` and `Single` both map to the plain [`SgrFlags::UNDERLINE`] bit;
/// the richer styles each own a distinct flag bit so a renderer can tell
/// them apart without re-deriving them from SGR parameter history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnderlineStyle {
    #[default]
    None,
    Single,
    Double,
    Curly,
    Dotted,
    Dashed,
}

impl UnderlineStyle {
    /// Decode the `4:n` sub-parameter value from SGR (0-5).
    #[must_use]
    pub fn from_sgr_param(n: u16) -> Self {
        match n {
            1 => Self::Single,
            2 => Self::Double,
            3 => Self::Curly,
            4 => Self::Dotted,
            5 => Self::Dashed,
            _ => Self::None,
        }
    }

    /// The [`SgrFlags`] bits this style sets (with the plain `UNDERLINE` bit
    /// already folded in for any non-`None` style).
    #[must_use]
    pub fn to_flags(self) -> SgrFlags {
        match self {
            Self::None => SgrFlags::empty(),
            Self::Single => SgrFlags::UNDERLINE,
            Self::Double => SgrFlags::UNDERLINE | SgrFlags::DOUBLE_UNDERLINE,
            Self::Curly => SgrFlags::UNDERLINE | SgrFlags::CURLY_UNDERLINE,
            Self::Dotted => SgrFlags::UNDERLINE | SgrFlags::DOTTED_UNDERLINE,
            Self::Dashed => SgrFlags::UNDERLINE | SgrFlags::DASHED_UNDERLINE,
        }
    }
}

bitflags! {
    /// Cell-level flags that are orthogonal to SGR attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// This cell is the leading (left) cell of a wide (2-column) character.
        const WIDE_CHAR = 1 << 0;
        /// This cell is the trailing (right) continuation of a wide character.
        /// Its content is meaningless; rendering uses the leading cell.
        const WIDE_CONTINUATION = 1 << 1;
        /// DECSCA (character protection): this cell is exempt from DECSED/DECSEL
        /// (selective erase) even though plain ED/EL still erases it.
        const PROTECTED = 1 << 2;
        /// This cell has one or more combining codepoints recorded in its
        /// owning row's grapheme side-table, keyed by this cell's column.
        const GRAPHEME_PRESENT = 1 << 3;
    }
}

/// Color representation for terminal cells.
///
/// Supports the standard terminal color model hierarchy:
/// default → 16 named → 256 indexed → 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default (SGR 39 / SGR 49).
    #[default]
    Default,
    /// Named color index (0-15): standard 8 + bright 8.
    Named(u8),
    /// 256-color palette index (0-255).
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

/// SGR attributes for a cell: flags + foreground/background colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SgrAttrs {
    pub flags: SgrFlags,
    pub fg: Color,
    pub bg: Color,
    /// Underline color (SGR 58). `None` means use foreground.
    pub underline_color: Option<Color>,
}

impl SgrAttrs {
    /// Reset all attributes to default (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply one SGR (`CSI ... m`) dispatch's parameter groups in order.
    ///
    /// Colon-separated sub-parameters are used for extended color (`38`/`48`/
    /// `58`) and the underline-style sub-parameter (`4:n`) per `spec.md`
    /// §4.D's tie-break: "colon-form is canonical, semicolon-form is parsed
    /// permissively" — the semicolon fallback for `38`/`48` consumes the
    /// following bare groups (`5`/`2` plus their components) the way xterm
    /// does.
    pub fn apply_sgr(&mut self, params: &crate::parser::CsiParams) {
        if params.is_empty() {
            self.reset();
            return;
        }
        let mut i = 0usize;
        let n = params.len();
        while i < n {
            let sub = params.subparams(i);
            let p = sub.first().copied().unwrap_or(0);
            match p {
                0 => self.reset(),
                1 => self.flags.insert(SgrFlags::BOLD),
                2 => self.flags.insert(SgrFlags::DIM),
                3 => self.flags.insert(SgrFlags::ITALIC),
                4 => {
                    if sub.len() > 1 {
                        let style = UnderlineStyle::from_sgr_param(sub[1]);
                        self.flags.remove(
                            SgrFlags::UNDERLINE
                                | SgrFlags::DOUBLE_UNDERLINE
                                | SgrFlags::CURLY_UNDERLINE
                                | SgrFlags::DOTTED_UNDERLINE
                                | SgrFlags::DASHED_UNDERLINE,
                        );
                        self.flags.insert(style.to_flags());
                    } else {
                        self.flags.insert(SgrFlags::UNDERLINE);
                    }
                }
                5 | 6 => self.flags.insert(SgrFlags::BLINK),
                7 => self.flags.insert(SgrFlags::INVERSE),
                8 => self.flags.insert(SgrFlags::HIDDEN),
                9 => self.flags.insert(SgrFlags::STRIKETHROUGH),
                21 => self.flags.insert(SgrFlags::DOUBLE_UNDERLINE),
                22 => self.flags.remove(SgrFlags::BOLD | SgrFlags::DIM),
                23 => self.flags.remove(SgrFlags::ITALIC),
                24 => self.flags.remove(
                    SgrFlags::UNDERLINE
                        | SgrFlags::DOUBLE_UNDERLINE
                        | SgrFlags::CURLY_UNDERLINE
                        | SgrFlags::DOTTED_UNDERLINE
                        | SgrFlags::DASHED_UNDERLINE,
                ),
                25 => self.flags.remove(SgrFlags::BLINK),
                27 => self.flags.remove(SgrFlags::INVERSE),
                28 => self.flags.remove(SgrFlags::HIDDEN),
                29 => self.flags.remove(SgrFlags::STRIKETHROUGH),
                30..=37 => self.fg = Color::Named(p as u8 - 30),
                38 => {
                    if sub.len() >= 2 {
                        // Colon form: `38:2:...:r:g:b` or `38:5:idx`.
                        if let Some((color, _consumed)) = Self::extended_color_colon(sub) {
                            self.fg = color;
                        }
                    } else if let Some((color, consumed)) = Self::extended_color_semicolon(params, i)
                    {
                        self.fg = color;
                        i += consumed;
                        continue;
                    }
                }
                39 => self.fg = Color::Default,
                40..=47 => self.bg = Color::Named(p as u8 - 40),
                48 => {
                    if sub.len() >= 2 {
                        if let Some((color, _consumed)) = Self::extended_color_colon(sub) {
                            self.bg = color;
                        }
                    } else if let Some((color, consumed)) = Self::extended_color_semicolon(params, i)
                    {
                        self.bg = color;
                        i += consumed;
                        continue;
                    }
                }
                49 => self.bg = Color::Default,
                53 => self.flags.insert(SgrFlags::OVERLINE),
                55 => self.flags.remove(SgrFlags::OVERLINE),
                58 => {
                    if sub.len() >= 2 {
                        if let Some((color, _consumed)) = Self::extended_color_colon(sub) {
                            self.underline_color = Some(color);
                        }
                    } else if let Some((color, consumed)) = Self::extended_color_semicolon(params, i)
                    {
                        self.underline_color = Some(color);
                        i += consumed;
                        continue;
                    }
                }
                59 => self.underline_color = None,
                90..=97 => self.fg = Color::Named(p as u8 - 90 + 8),
                100..=107 => self.bg = Color::Named(p as u8 - 100 + 8),
                _ => {}
            }
            i += 1;
        }
    }

    /// Decode a colon-form extended color (`38:5:idx` / `38:2:r:g:b`, with or
    /// without the optional colorspace-id field some emitters insert as
    /// `38:2:<cs>:r:g:b`). `sub[0]` is the `38`/`48`/`58` itself.
    fn extended_color_colon(sub: &[u16]) -> Option<(Color, usize)> {
        match sub.get(1).copied() {
            Some(5) => sub.get(2).map(|&idx| (Color::Indexed(idx as u8), 1)),
            Some(2) => {
                // Distinguish `38:2:r:g:b` (4 extra fields incl. mode) from
                // `38:2:cs:r:g:b` (5 extra fields) by how many remain.
                let rest = &sub[2..];
                let (r, g, b) = if rest.len() >= 4 {
                    (rest[1], rest[2], rest[3])
                } else if rest.len() >= 3 {
                    (rest[0], rest[1], rest[2])
                } else {
                    return None;
                };
                Some((Color::Rgb(r as u8, g as u8, b as u8), 1))
            }
            _ => None,
        }
    }

    /// Decode a semicolon-form extended color starting at group `i`
    /// (`38 ; 5 ; idx` / `38 ; 2 ; r ; g ; b`), returning the color and how
    /// many extra groups past `i` it consumed.
    fn extended_color_semicolon(params: &crate::parser::CsiParams, i: usize) -> Option<(Color, usize)> {
        let mode = params.get(i + 1, u16::MAX);
        match mode {
            5 => {
                let idx = params.get(i + 2, u16::MAX);
                if idx == u16::MAX {
                    None
                } else {
                    Some((Color::Indexed(idx as u8), 2))
                }
            }
            2 => {
                let r = params.get(i + 2, u16::MAX);
                let g = params.get(i + 3, u16::MAX);
                let b = params.get(i + 4, u16::MAX);
                if r == u16::MAX || g == u16::MAX || b == u16::MAX {
                    None
                } else {
                    Some((Color::Rgb(r as u8, g as u8, b as u8), 4))
                }
            }
            _ => None,
        }
    }
}

/// Hyperlink identifier for OSC 8 links.
///
/// Zero means "no link". Non-zero values index into an external link registry
/// that maps IDs to URIs.
pub type HyperlinkId = u16;

/// Registry for OSC 8 hyperlink URIs.
///
/// Cells store compact `HyperlinkId`s instead of full URI strings. This
/// registry provides ID allocation, deduplication, and reference-counted
/// release so hosts can clear unused hyperlinks when content is dropped
/// (e.g., scrollback eviction).
#[derive(Debug, Clone)]
pub struct HyperlinkRegistry {
    /// Slots indexed by ID (0 reserved for "no link").
    slots: Vec<Option<HyperlinkSlot>>,
    /// URI -> ID lookup for deduplication.
    lookup: HashMap<String, HyperlinkId>,
    /// Reusable IDs from released hyperlinks.
    free_list: Vec<HyperlinkId>,
}

#[derive(Debug, Clone)]
struct HyperlinkSlot {
    uri: String,
    ref_count: u32,
}

impl HyperlinkRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            slots: vec![None],
            lookup: HashMap::new(),
            free_list: Vec::new(),
        }
    }

    /// Intern a URI and return its hyperlink ID without changing refcounts.
    ///
    /// Empty URIs return 0 (interpreted as "no link").
    pub fn intern(&mut self, uri: &str) -> HyperlinkId {
        if uri.is_empty() {
            return 0;
        }
        if let Some(&id) = self.lookup.get(uri) {
            return id;
        }

        let id = if let Some(id) = self.free_list.pop() {
            id
        } else {
            let next = self.slots.len();
            if next > HyperlinkId::MAX as usize {
                return 0;
            }
            let id = next as HyperlinkId;
            self.slots.push(None);
            id
        };

        if id == 0 {
            return 0;
        }
        let idx = id as usize;
        if idx >= self.slots.len() {
            return 0;
        }

        self.slots[idx] = Some(HyperlinkSlot {
            uri: uri.to_string(),
            ref_count: 0,
        });
        self.lookup.insert(uri.to_string(), id);
        id
    }

    /// Convenience: intern a URI and increment its refcount once.
    pub fn acquire(&mut self, uri: &str) -> HyperlinkId {
        let id = self.intern(uri);
        self.acquire_id(id);
        id
    }

    /// Increment the refcount for an existing hyperlink ID.
    ///
    /// Invalid IDs and 0 are ignored.
    pub fn acquire_id(&mut self, id: HyperlinkId) {
        if id == 0 {
            return;
        }
        let Some(slot) = self.slots.get_mut(id as usize) else {
            return;
        };
        let Some(slot) = slot.as_mut() else {
            return;
        };
        slot.ref_count = slot.ref_count.saturating_add(1);
    }

    /// Decrement the refcount for an ID and release it when it reaches zero.
    ///
    /// Invalid IDs and 0 are ignored. Releasing an ID with refcount 0 is a no-op.
    pub fn release_id(&mut self, id: HyperlinkId) {
        if id == 0 {
            return;
        }
        let Some(entry) = self.slots.get_mut(id as usize) else {
            return;
        };

        let should_remove = match entry.as_mut() {
            Some(slot) if slot.ref_count > 0 => {
                slot.ref_count -= 1;
                slot.ref_count == 0
            }
            _ => false,
        };

        if should_remove && let Some(removed) = entry.take() {
            self.lookup.remove(&removed.uri);
            self.free_list.push(id);
        }
    }

    /// Release hyperlink references for all cells in the slice.
    ///
    /// Intended for use when dropping content (e.g., evicted scrollback lines).
    pub fn release_cells(&mut self, cells: &[Cell]) {
        for cell in cells {
            self.release_id(cell.hyperlink);
        }
    }

    /// Look up the URI for a hyperlink ID.
    pub fn get(&self, id: HyperlinkId) -> Option<&str> {
        self.slots
            .get(id as usize)
            .and_then(|slot| slot.as_ref())
            .map(|slot| slot.uri.as_str())
    }

    /// Clear all hyperlinks, resetting the registry to empty.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.slots.push(None);
        self.lookup.clear();
        self.free_list.clear();
    }

    /// Number of currently registered hyperlinks.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether the registry has no hyperlinks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the registry contains the given ID.
    pub fn contains(&self, id: HyperlinkId) -> bool {
        self.get(id).is_some()
    }
}

impl Default for HyperlinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A single cell in the terminal grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The character content. A space for empty/erased cells.
    content: char,
    /// Display width of the content in terminal columns (1 or 2 for wide chars).
    width: u8,
    /// Cell-level flags (wide char, continuation, etc.).
    pub flags: CellFlags,
    /// SGR text attributes.
    pub attrs: SgrAttrs,
    /// Hyperlink ID (0 = no link).
    pub hyperlink: HyperlinkId,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: ' ',
            width: 1,
            flags: CellFlags::empty(),
            attrs: SgrAttrs::default(),
            hyperlink: 0,
        }
    }
}

impl Cell {
    /// Create a new cell with the given character and default attributes.
    pub fn new(ch: char) -> Self {
        Self {
            content: ch,
            width: 1,
            flags: CellFlags::empty(),
            attrs: SgrAttrs::default(),
            hyperlink: 0,
        }
    }

    /// Create a new cell with the given character, width, and attributes.
    pub fn with_attrs(ch: char, width: u8, attrs: SgrAttrs) -> Self {
        Self {
            content: ch,
            width,
            flags: CellFlags::empty(),
            attrs,
            hyperlink: 0,
        }
    }

    /// Create a wide (2-column) character cell.
    ///
    /// Returns `(leading, continuation)` pair. The leading cell holds the
    /// character; the continuation cell is a placeholder.
    pub fn wide(ch: char, attrs: SgrAttrs) -> (Self, Self) {
        let leading = Self {
            content: ch,
            width: 2,
            flags: CellFlags::WIDE_CHAR,
            attrs,
            hyperlink: 0,
        };
        let continuation = Self {
            content: ' ',
            width: 0,
            flags: CellFlags::WIDE_CONTINUATION,
            attrs,
            hyperlink: 0,
        };
        (leading, continuation)
    }

    /// The character content of this cell.
    pub fn content(&self) -> char {
        self.content
    }

    /// The display width in terminal columns.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Whether this cell is the leading half of a wide character.
    pub fn is_wide(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CHAR)
    }

    /// Whether this cell is a continuation (trailing half) of a wide character.
    pub fn is_wide_continuation(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CONTINUATION)
    }

    /// Whether this cell is protected from selective erase (DECSCA).
    pub fn is_protected(&self) -> bool {
        self.flags.contains(CellFlags::PROTECTED)
    }

    /// Set or clear the DECSCA protection flag.
    pub fn set_protected(&mut self, protected: bool) {
        self.flags.set(CellFlags::PROTECTED, protected);
    }

    /// Whether this cell has combining codepoints recorded in its row's
    /// grapheme side-table.
    pub fn has_grapheme(&self) -> bool {
        self.flags.contains(CellFlags::GRAPHEME_PRESENT)
    }

    /// Mark/unmark this cell as indexing into its row's grapheme side-table.
    pub fn set_grapheme_present(&mut self, present: bool) {
        self.flags.set(CellFlags::GRAPHEME_PRESENT, present);
    }

    /// Set the character content and display width.
    pub fn set_content(&mut self, ch: char, width: u8) {
        self.content = ch;
        self.width = width;
        // Clear wide flags when replacing content.
        self.flags
            .remove(CellFlags::WIDE_CHAR | CellFlags::WIDE_CONTINUATION);
    }

    /// Reset this cell to a blank space with the given background attributes.
    ///
    /// Used by erase operations (ED, EL, ECH) which fill with the current
    /// background color but reset all other attributes.
    pub fn erase(&mut self, bg: Color) {
        self.content = ' ';
        self.width = 1;
        self.flags = CellFlags::empty();
        self.attrs = SgrAttrs {
            bg,
            ..SgrAttrs::default()
        };
        self.hyperlink = 0;
    }

    /// Reset this cell to a blank space with default attributes.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The number of terminal columns a codepoint occupies: 0, 1, or 2.
    ///
    /// This is the crate's built-in width oracle (UAX #11 via
    /// `unicode-width`), used when no host-supplied oracle is wired in.
    /// Variation selectors and other zero-width marks report 0 so they fold
    /// into the preceding cell's grapheme rather than advancing the cursor.
    #[must_use]
    pub fn display_width(ch: char) -> u8 {
        match ch {
            '\u{FE00}'..='\u{FE0F}' | '\u{200D}' => 0,
            _ => match ch.width() {
                Some(w) => w.min(2) as u8,
                None => 0,
            },
        }
    }
}
