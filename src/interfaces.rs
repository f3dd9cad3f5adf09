//! External-interface traits from `spec.md` §6.
//!
//! The engine treats font shaping, glyph rasterization, and hyperlink
//! opening as pure collaborators it never implements itself; this module
//! gives each of those boundaries a named Rust trait so a host can plug in
//! its own implementation (or a test double) without the engine knowing or
//! caring which one it got. The width oracle is the one boundary the crate
//! also ships a concrete, spec-conformant default for (`Utf8WidthOracle`),
//! since §6 says the core "assumes it conforms to UAX #11" and every host
//! needs *a* working oracle to print anything.
//!
//! The regex engine boundary (§6 `compile`/`search`) is deliberately *not*
//! re-abstracted here: `crate::stringmap::Search` is built directly on
//! `regex::Regex`, which already has exactly the shape §6 describes
//! (captures with `-1`-equivalent `None` for unmatched optional groups,
//! `Regex::captures_at` for the anchored-from-offset contract). Wrapping it
//! in a trait would only add indirection around a dependency the crate
//! already commits to (see `SPEC_FULL.md` §4.F).
//!
//! The clipboard boundary is realized by
//! [`crate::executor::ClipboardHost`], which already carries the
//! permission-callback shape §6 describes; it lives in `executor` rather
//! than here because it is wired directly into [`crate::executor::Executor`].

use crate::cell::SgrAttrs;

/// `spec.md` §6: "A function `width(codepoint) -> {0, 1, 2}` supplied by a
/// collaborator; the core assumes it conforms to UAX #11 with explicit
/// overrides for grapheme clusters that must render single-width."
///
/// [`Executor`](crate::executor::Executor) uses [`Utf8WidthOracle`] unless a
/// host installs a different oracle via
/// [`Executor::set_width_oracle`](crate::executor::Executor::set_width_oracle).
pub trait WidthOracle {
    /// Display width of a single codepoint: 0, 1, or 2 columns.
    fn width(&self, ch: char) -> u8;
}

/// The engine's built-in width oracle: `unicode-width`'s UAX #11 table with
/// the override `spec.md` §6 calls out by name (variation selectors render
/// as width 0 so they fold into the base glyph instead of advancing the
/// cursor). This is exactly [`crate::cell::Cell::display_width`]; kept as a
/// zero-sized type so it can be boxed and installed like any other
/// [`WidthOracle`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8WidthOracle;

impl WidthOracle for Utf8WidthOracle {
    fn width(&self, ch: char) -> u8 {
        crate::cell::Cell::display_width(ch)
    }
}

/// One codepoint submitted to a [`ShapingOracle`], tagged with the grid
/// column it came from and the style in effect (ligatures and kerning can
/// depend on adjacent style changes, e.g. a bold run shaping differently
/// from a regular one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeInput {
    pub ch: char,
    pub cell_index: usize,
    pub attrs: SgrAttrs,
}

/// One shaped glyph: `spec.md` §6: "a shaping call returns a sequence of
/// (codepoint or glyph id, cell index, x/y offset)."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    /// Either the original codepoint (no reshaping occurred) or an
    /// opaque, shaper-assigned glyph id; callers distinguish the two via
    /// `is_glyph_id`.
    pub glyph_id: u32,
    pub is_glyph_id: bool,
    /// Which input cell this glyph renders over (ligatures collapse
    /// several input cells onto one glyph; this is the first).
    pub cell_index: usize,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// `spec.md` §6: "For each run of printable cells of a given style, a
/// shaping call returns a sequence of (codepoint or glyph id, cell index,
/// x/y offset). The core is indifferent to whether it is HarfBuzz-like or a
/// simpler table."
///
/// The core never implements this itself (font shaping is explicitly out of
/// scope, `spec.md` §1); this trait exists purely so a host's shaper has a
/// named contract to implement against.
pub trait ShapingOracle {
    fn shape(&self, run: &[ShapeInput]) -> Vec<ShapedGlyph>;
}

/// A trivial [`ShapingOracle`] for hosts with no ligature/kerning shaper: one
/// glyph per input cell, glyph id equal to the codepoint, zero offset.
/// Useful for tests and for terminals that render strictly monospace.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityShaper;

impl ShapingOracle for IdentityShaper {
    fn shape(&self, run: &[ShapeInput]) -> Vec<ShapedGlyph> {
        run.iter()
            .map(|input| ShapedGlyph {
                glyph_id: input.ch as u32,
                is_glyph_id: false,
                cell_index: input.cell_index,
                x_offset: 0.0,
                y_offset: 0.0,
            })
            .collect()
    }
}

/// `spec.md` §6: "`raster(glyph_id, size, style) -> {width, height,
/// bearing_x, bearing_y, pixels, format}`."
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    pub width: u32,
    pub height: u32,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub pixels: Vec<u8>,
    pub format: crate::atlas::AtlasFormat,
}

/// Font rasterization is explicitly delegated (`spec.md` §1: "Font discovery
/// and TrueType/OpenType rasterization (delegated to a font collaborator);
/// we specify only the sprite/decoration face and the glyph-cache
/// contract"). [`crate::sprite::SpriteFace`] is the core's own rasterizer
/// for the sprite/decoration codepoints it owns; this trait is the contract
/// a host's *font* rasterizer implements for everything else, so both feed
/// the same [`crate::atlas::GlyphAtlas`].
pub trait GlyphRasterizer {
    fn raster(&mut self, glyph_id: u32, size_px: f32, attrs: &SgrAttrs) -> Option<RasterizedGlyph>;
}

/// `spec.md` §6: "`open(url)` called when the caller asks the core to
/// follow a link at a pin (normally on shift-click or a keybinding)."
///
/// The core resolves a pin to a [`crate::cell::HyperlinkId`] and its URI via
/// [`crate::cell::HyperlinkRegistry`]; opening the URL in a browser/handler
/// is host-side OS interaction the core never performs itself (`spec.md`
/// §1: platform integration is out of scope). This trait names that
/// handoff so a host's implementation has a single contract to satisfy.
pub trait HyperlinkOpener {
    fn open(&mut self, url: &str);
}
