//! Procedural glyph rasterization: box drawing, block elements, Braille,
//! selected Symbols for Legacy Computing, Powerline separators, cursors, and
//! underline variants.
//!
//! A "font face" in name only. [`SpriteFace`] owns no font file; it accepts a
//! codepoint plus the cell metrics from [`crate::config::CellMetrics`] and
//! returns a [`RasterCanvas`] of grayscale, premultiplied-linear-intensity
//! pixels sized to the cell (double width for wide glyphs). The backing
//! store for rasterized glyphs is [`crate::atlas::GlyphAtlas`].

use crate::cell::UnderlineStyle;
use crate::config::CellMetrics;
use crate::error::EngineError;

/// A rasterized glyph: grayscale pixels plus the vertical offset a caller
/// applies when the glyph was drawn at an "original" height shorter than the
/// current cell (see [`SpriteFace::with_original_height`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterCanvas {
    pub width: u32,
    pub height: u32,
    pub y_offset: i32,
    pub pixels: Vec<u8>,
}

impl RasterCanvas {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            y_offset: 0,
            pixels: vec![0u8; width as usize * height as usize],
        }
    }

    /// Blend `intensity` into the pixel at `(x, y)`, taking the brighter of
    /// the existing and new value. Out-of-bounds coordinates are ignored so
    /// geometry that overshoots a boundary by a pixel doesn't panic.
    fn paint(&mut self, x: i64, y: i64, intensity: u8) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels[idx] = self.pixels[idx].max(intensity);
    }

    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, intensity: u8) {
        let (y0, y1) = (y0.max(0), y1.min(self.height as i64 - 1));
        let (x0, x1) = (x0.max(0), x1.min(self.width as i64 - 1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.paint(x, y, intensity);
            }
        }
    }

    /// Stipple a fraction of the canvas at the given density, used for the
    /// light/medium/dark shade block elements.
    fn fill_shade(&mut self, density_of_four: u32) {
        for y in 0..self.height {
            for x in 0..self.width {
                if (x + y * 2) % 4 < density_of_four {
                    self.paint(x as i64, y as i64, 255);
                }
            }
        }
    }
}

/// Line weight for a box-drawing segment radiating from the glyph's center
/// toward one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    None,
    Light,
    Heavy,
    Double,
}

/// Which direction, out of a cell's four edges, a segment reaches.
#[derive(Debug, Clone, Copy, Default)]
struct Segments {
    up: Weight,
    down: Weight,
    left: Weight,
    right: Weight,
}

impl Default for Weight {
    fn default() -> Self {
        Weight::None
    }
}

/// Cursor block shapes rasterized onto the internal sprite page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Block,
    HollowBlock,
    Bar,
    Underline,
}

/// A procedural glyph face parameterized by pixel metrics.
///
/// `original_height_px` backs the adjustment rule: when it differs from
/// `metrics.cell_height_px`, box-drawing glyphs are rasterized at the
/// original height and vertically centered, with the returned canvas's
/// `y_offset` telling the caller where to place it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFace {
    metrics: CellMetrics,
    original_height_px: u32,
}

impl SpriteFace {
    #[must_use]
    pub fn new(metrics: CellMetrics) -> Self {
        let original_height_px = metrics.cell_height_px;
        Self {
            metrics,
            original_height_px,
        }
    }

    /// Like [`Self::new`], but records a distinct "original" cell height the
    /// grid metrics were calibrated against (e.g. before the user enlarged
    /// line-height), so box-drawing glyphs still render at their native
    /// proportions instead of stretching.
    #[must_use]
    pub fn with_original_height(metrics: CellMetrics, original_height_px: u32) -> Self {
        Self {
            metrics,
            original_height_px,
        }
    }

    #[must_use]
    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Whether `codepoint` is one this face can rasterize.
    #[must_use]
    pub fn is_covered(codepoint: char) -> bool {
        matches!(codepoint,
            '\u{2500}'..='\u{259F}'
            | '\u{2800}'..='\u{28FF}'
            | '\u{E0A0}'
            | '\u{E0B0}' | '\u{E0B2}' | '\u{E0B4}' | '\u{E0B6}'
            | '\u{E0B8}' | '\u{E0BA}' | '\u{E0BC}' | '\u{E0BE}'
            | '\u{E0D2}' | '\u{E0D4}')
            || is_legacy_computing(codepoint)
    }

    /// Rasterize `codepoint` into a fresh canvas sized to the cell (double
    /// width when `wide` is set, for glyphs meant to span two columns).
    pub fn rasterize(&self, codepoint: char, wide: bool) -> Result<RasterCanvas, EngineError> {
        let width = if wide {
            self.metrics.cell_width_px * 2
        } else {
            self.metrics.cell_width_px
        };
        match codepoint {
            '\u{2500}'..='\u{257F}' => Ok(self.rasterize_lines(codepoint, width)),
            '\u{2580}'..='\u{259F}' => Ok(self.rasterize_blocks(codepoint, width)),
            '\u{2800}'..='\u{28FF}' => Ok(self.rasterize_braille(codepoint, width)),
            '\u{E0A0}' => Ok(self.rasterize_branch_icon(width)),
            '\u{E0B0}' | '\u{E0B2}' | '\u{E0B4}' | '\u{E0B6}' | '\u{E0B8}' | '\u{E0BA}'
            | '\u{E0BC}' | '\u{E0BE}' | '\u{E0D2}' | '\u{E0D4}' => {
                Ok(self.rasterize_powerline(codepoint, width))
            }
            c if is_legacy_computing(c) => Ok(self.rasterize_legacy(c, width)),
            _ => Err(EngineError::RasterizationFailed(
                "codepoint outside sprite face coverage",
            )),
        }
    }

    /// Rasterize one of the internal cursor shapes.
    #[must_use]
    pub fn rasterize_cursor(&self, shape: CursorShape) -> RasterCanvas {
        let m = self.metrics;
        let mut canvas = RasterCanvas::blank(m.cell_width_px, m.cell_height_px);
        let t = m.line_thickness_px.max(1) as i64;
        let (w, h) = (m.cell_width_px as i64, m.cell_height_px as i64);
        match shape {
            CursorShape::Block => canvas.fill_rect(0, 0, w - 1, h - 1, 255),
            CursorShape::HollowBlock => {
                canvas.fill_rect(0, 0, w - 1, t - 1, 255);
                canvas.fill_rect(0, h - t, w - 1, h - 1, 255);
                canvas.fill_rect(0, 0, t - 1, h - 1, 255);
                canvas.fill_rect(w - t, 0, w - 1, h - 1, 255);
            }
            CursorShape::Bar => canvas.fill_rect(0, 0, t - 1, h - 1, 255),
            CursorShape::Underline => canvas.fill_rect(0, h - t, w - 1, h - 1, 255),
        }
        canvas
    }

    /// Rasterize an SGR underline style at the configured underline
    /// position. [`UnderlineStyle::None`] yields a blank canvas.
    #[must_use]
    pub fn rasterize_underline(&self, style: UnderlineStyle) -> RasterCanvas {
        let m = self.metrics;
        let mut canvas = RasterCanvas::blank(m.cell_width_px, m.cell_height_px);
        let t = m.line_thickness_px.max(1) as i64;
        let w = m.cell_width_px as i64;
        let y = m.underline_position_px as i64;
        match style {
            UnderlineStyle::None => {}
            UnderlineStyle::Single => canvas.fill_rect(0, y, w - 1, y + t - 1, 255),
            UnderlineStyle::Double => {
                canvas.fill_rect(0, y - t - 1, w - 1, y - 2, 255);
                canvas.fill_rect(0, y, w - 1, y + t - 1, 255);
            }
            UnderlineStyle::Dotted => {
                let dot = t.max(1) * 2;
                let mut x = 0;
                while x < w {
                    canvas.fill_rect(x, y, (x + t - 1).min(w - 1), y + t - 1, 255);
                    x += dot;
                }
            }
            UnderlineStyle::Dashed => {
                let dash = (w / 4).max(t * 2);
                let mut x = 0;
                while x < w {
                    canvas.fill_rect(x, y, (x + dash - 1).min(w - 1), y + t - 1, 255);
                    x += dash * 2;
                }
            }
            UnderlineStyle::Curly => {
                let amplitude = (t * 2).max(m.line_thickness_px as i64);
                let period = w.max(1);
                for x in 0..w {
                    let phase = (x as f64 / period as f64) * std::f64::consts::TAU;
                    let offset = (phase.sin() * amplitude as f64 / 2.0).round() as i64;
                    let cy = y + offset;
                    for dy in 0..t {
                        canvas.paint(x, cy + dy, 255);
                    }
                }
            }
        }
        canvas
    }

    fn rasterize_lines(&self, codepoint: char, width: u32) -> RasterCanvas {
        let original = self.original_height_px;
        let mut canvas = RasterCanvas::blank(width, original);
        canvas.y_offset = (self.metrics.cell_height_px as i32 - original as i32) / 2;

        if let Some(segments) = box_drawing_segments(codepoint) {
            self.draw_segments(&mut canvas, segments);
            return canvas;
        }
        // Diagonals and the arc corners (drawn as their square-corner
        // equivalent; the rounding is cosmetic and not load-bearing for any
        // VT semantics) fall through to dedicated drawers.
        match codepoint {
            '\u{256D}' => self.draw_segments(&mut canvas, Segments { down: Weight::Light, right: Weight::Light, ..Default::default() }),
            '\u{256E}' => self.draw_segments(&mut canvas, Segments { down: Weight::Light, left: Weight::Light, ..Default::default() }),
            '\u{256F}' => self.draw_segments(&mut canvas, Segments { up: Weight::Light, left: Weight::Light, ..Default::default() }),
            '\u{2570}' => self.draw_segments(&mut canvas, Segments { up: Weight::Light, right: Weight::Light, ..Default::default() }),
            '\u{2571}' => self.draw_diagonal(&mut canvas, false),
            '\u{2572}' => self.draw_diagonal(&mut canvas, true),
            '\u{2573}' => {
                self.draw_diagonal(&mut canvas, false);
                self.draw_diagonal(&mut canvas, true);
            }
            _ => {}
        }
        canvas
    }

    fn draw_segments(&self, canvas: &mut RasterCanvas, s: Segments) {
        let light = self.metrics.line_thickness_px.max(1) as i64;
        let heavy = light * 2;
        let (w, h) = (canvas.width as i64, canvas.height as i64);
        let (cx, cy) = (w / 2, h / 2);

        let mut draw = |weight: Weight, from: (i64, i64), to: (i64, i64)| {
            let t = match weight {
                Weight::None => return,
                Weight::Light => light,
                Weight::Heavy => heavy,
                Weight::Double => light,
            };
            let double = matches!(weight, Weight::Double);
            let gap = light + 1;
            if from.1 == to.1 {
                // horizontal
                let y = from.1;
                canvas.fill_rect(from.0.min(to.0), y - t / 2, from.0.max(to.0), y - t / 2 + t - 1, 255);
                if double {
                    canvas.fill_rect(from.0.min(to.0), y + gap - t / 2, from.0.max(to.0), y + gap - t / 2 + t - 1, 255);
                }
            } else {
                let x = from.0;
                canvas.fill_rect(x - t / 2, from.1.min(to.1), x - t / 2 + t - 1, from.1.max(to.1), 255);
                if double {
                    canvas.fill_rect(x + gap - t / 2, from.1.min(to.1), x + gap - t / 2 + t - 1, from.1.max(to.1), 255);
                }
            }
        };

        draw(s.up, (cx, 0), (cx, cy));
        draw(s.down, (cx, cy), (cx, h - 1));
        draw(s.left, (0, cy), (cx, cy));
        draw(s.right, (cx, cy), (w - 1, cy));
    }

    fn draw_diagonal(&self, canvas: &mut RasterCanvas, reverse: bool) {
        let t = self.metrics.line_thickness_px.max(1) as i64;
        let (w, h) = (canvas.width as i64, canvas.height as i64);
        for x in 0..w {
            let frac = x as f64 / w.max(1) as f64;
            let y = if reverse {
                (frac * h as f64) as i64
            } else {
                ((1.0 - frac) * h as f64) as i64
            };
            for dy in -t / 2..(t - t / 2) {
                canvas.paint(x, y + dy, 255);
            }
        }
    }

    fn rasterize_blocks(&self, codepoint: char, width: u32) -> RasterCanvas {
        let h = self.metrics.cell_height_px;
        let mut canvas = RasterCanvas::blank(width, h);
        let (w, h) = (canvas.width as i64, canvas.height as i64);

        let eighths = |n: i64| (h * n) / 8;
        match codepoint {
            '\u{2580}' => canvas.fill_rect(0, 0, w - 1, h / 2 - 1, 255),
            '\u{2581}'..='\u{2588}' => {
                let n = codepoint as i64 - 0x2580;
                canvas.fill_rect(0, h - eighths(n), w - 1, h - 1, 255);
            }
            '\u{2589}'..='\u{258F}' => {
                let n = 8 - (codepoint as i64 - 0x2588);
                canvas.fill_rect(0, 0, (w * n) / 8 - 1, h - 1, 255);
            }
            '\u{2590}' => canvas.fill_rect(w / 2, 0, w - 1, h - 1, 255),
            '\u{2591}' => canvas.fill_shade(1),
            '\u{2592}' => canvas.fill_shade(2),
            '\u{2593}' => canvas.fill_shade(3),
            '\u{2594}' => canvas.fill_rect(0, 0, w - 1, eighths(1) - 1, 255),
            '\u{2595}' => canvas.fill_rect(w - w / 8, 0, w - 1, h - 1, 255),
            '\u{2596}'..='\u{259F}' => {
                let mask = quadrant_mask(codepoint);
                let (hw, hh) = (w / 2, h / 2);
                if mask & 0b0001 != 0 {
                    canvas.fill_rect(0, 0, hw - 1, hh - 1, 255);
                }
                if mask & 0b0010 != 0 {
                    canvas.fill_rect(hw, 0, w - 1, hh - 1, 255);
                }
                if mask & 0b0100 != 0 {
                    canvas.fill_rect(0, hh, hw - 1, h - 1, 255);
                }
                if mask & 0b1000 != 0 {
                    canvas.fill_rect(hw, hh, w - 1, h - 1, 255);
                }
            }
            _ => {}
        }
        canvas
    }

    fn rasterize_braille(&self, codepoint: char, width: u32) -> RasterCanvas {
        let h = self.metrics.cell_height_px;
        let mut canvas = RasterCanvas::blank(width, h);
        let mask = codepoint as u32 - 0x2800;
        let (w, h) = (canvas.width as i64, canvas.height as i64);
        let col_x = [w / 4, w * 3 / 4];
        let row_y = [h / 8, h * 3 / 8, h * 5 / 8, h * 7 / 8];
        // bits 0,1,2,6 -> column 0 rows 0-3; bits 3,4,5,7 -> column 1 rows 0-3
        let dot_bits = [0u8, 1, 2, 6, 3, 4, 5, 7];
        let radius = (self.metrics.line_thickness_px.max(1) as i64) + 1;
        for (i, bit) in dot_bits.iter().enumerate() {
            if mask & (1 << bit) == 0 {
                continue;
            }
            let col = i / 4;
            let row = i % 4;
            let (cx, cy) = (col_x[col], row_y[row]);
            canvas.fill_rect(cx - radius, cy - radius, cx + radius, cy + radius, 255);
        }
        canvas
    }

    fn rasterize_powerline(&self, codepoint: char, width: u32) -> RasterCanvas {
        let h = self.metrics.cell_height_px;
        let mut canvas = RasterCanvas::blank(width, h);
        let (w, h) = (canvas.width as i64, canvas.height as i64);
        match codepoint {
            '\u{E0B0}' | '\u{E0D2}' => {
                for y in 0..h {
                    let limit = (w * y) / h.max(1);
                    canvas.fill_rect(0, y, limit, y, 255);
                }
            }
            '\u{E0B2}' | '\u{E0D4}' => {
                for y in 0..h {
                    let limit = (w * (h - y)) / h.max(1);
                    canvas.fill_rect(w - limit, y, w - 1, y, 255);
                }
            }
            '\u{E0B4}' => {
                let r = h / 2;
                let (cx, cy) = (0i64, h / 2);
                for y in 0..h {
                    for x in 0..w {
                        let dx = x - cx;
                        let dy = y - cy;
                        if dx * dx + dy * dy <= r * r {
                            canvas.paint(x, y, 255);
                        }
                    }
                }
            }
            '\u{E0B6}' => {
                let r = h / 2;
                let (cx, cy) = (w, h / 2);
                for y in 0..h {
                    for x in 0..w {
                        let dx = x - cx;
                        let dy = y - cy;
                        if dx * dx + dy * dy <= r * r {
                            canvas.paint(x, y, 255);
                        }
                    }
                }
            }
            '\u{E0B8}' => {
                for y in 0..h {
                    let limit = (w * (h - y)) / h.max(1);
                    canvas.fill_rect(0, y, limit, y, 255);
                }
            }
            '\u{E0BA}' => {
                for y in 0..h {
                    let limit = (w * y) / h.max(1);
                    canvas.fill_rect(w - limit, y, w - 1, y, 255);
                }
            }
            '\u{E0BC}' => {
                for y in 0..h {
                    let limit = (w * y) / h.max(1);
                    canvas.fill_rect(0, y, limit, y, 255);
                }
            }
            '\u{E0BE}' => {
                for y in 0..h {
                    let limit = (w * (h - y)) / h.max(1);
                    canvas.fill_rect(w - limit, y, w - 1, y, 255);
                }
            }
            _ => {}
        }
        canvas
    }

    /// A small circle-with-stem icon standing in for the "git branch"
    /// glyph commonly paired with Powerline separators in prompt fonts.
    fn rasterize_branch_icon(&self, width: u32) -> RasterCanvas {
        let h = self.metrics.cell_height_px;
        let mut canvas = RasterCanvas::blank(width, h);
        let (w, h) = (canvas.width as i64, canvas.height as i64);
        let t = self.metrics.line_thickness_px.max(1) as i64;
        let r = (w.min(h) / 4).max(t);
        canvas.fill_rect(w / 2 - t / 2, r, w / 2 + t / 2, h - r - 1, 255);
        canvas.fill_rect(w / 2 - r, r * 2, w / 2 - r + t, h - r - 1, 255);
        for (cx, cy) in [(w / 2, r), (w / 2 - r, r * 2)] {
            canvas.fill_rect(cx - r / 2, cy - r / 2, cx + r / 2, cy + r / 2, 255);
        }
        canvas
    }

    /// Sextants (U+1FB00-1FB3B) decode algorithmically like Braille, just
    /// over a 2x3 grid. The remainder of the Legacy Computing block (wedges,
    /// shade variants, digit-in-box glyphs, and friends) is rendered as a
    /// centered proportional block rather than per-glyph geometry; see
    /// `DESIGN.md` for the rationale.
    fn rasterize_legacy(&self, codepoint: char, width: u32) -> RasterCanvas {
        let h = self.metrics.cell_height_px;
        let mut canvas = RasterCanvas::blank(width, h);
        let (w, h) = (canvas.width as i64, canvas.height as i64);

        if ('\u{1FB00}'..='\u{1FB3B}').contains(&codepoint) {
            let ordinal = codepoint as u32 - 0x1FB00;
            // Skip the two patterns already covered by SPACE and FULL BLOCK.
            let mask = if ordinal < 20 { ordinal + 1 } else { ordinal + 2 };
            let col_x = [w / 4, w * 3 / 4];
            let row_y = [h / 6, h / 2, h * 5 / 6];
            for bit in 0..6u32 {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                let col = (bit % 2) as usize;
                let row = (bit / 2) as usize;
                let (cx, cy) = (col_x[col], row_y[row]);
                canvas.fill_rect(cx - w / 4, cy - h / 6, cx + w / 4, cy + h / 6, 255);
            }
            return canvas;
        }

        let density = 2 + (codepoint as u32 % 3);
        canvas.fill_shade(density);
        canvas
    }
}

/// Gaps in the Legacy Computing block not assigned to any character.
fn is_legacy_computing(codepoint: char) -> bool {
    matches!(codepoint, '\u{1FB00}'..='\u{1FBCA}' | '\u{1FBF0}'..='\u{1FBF9}')
}

fn quadrant_mask(codepoint: char) -> u8 {
    match codepoint {
        '\u{2596}' => 0b0100,
        '\u{2597}' => 0b1000,
        '\u{2598}' => 0b0001,
        '\u{2599}' => 0b1101,
        '\u{259A}' => 0b1001,
        '\u{259B}' => 0b0111,
        '\u{259C}' => 0b1011,
        '\u{259D}' => 0b0010,
        '\u{259E}' => 0b0110,
        '\u{259F}' => 0b1110,
        _ => 0,
    }
}

fn box_drawing_segments(c: char) -> Option<Segments> {
    use Weight::{Double, Heavy, Light, None as W0};
    let s = |up, down, left, right| Some(Segments { up, down, left, right });
    match c {
        '\u{2500}' | '\u{2504}' | '\u{2508}' | '\u{254C}' => s(W0, W0, Light, Light),
        '\u{2501}' | '\u{2505}' | '\u{2509}' | '\u{254D}' => s(W0, W0, Heavy, Heavy),
        '\u{2502}' | '\u{2506}' | '\u{250A}' | '\u{254E}' => s(Light, Light, W0, W0),
        '\u{2503}' | '\u{2507}' | '\u{250B}' | '\u{254F}' => s(Heavy, Heavy, W0, W0),
        '\u{250C}' => s(W0, Light, W0, Light),
        '\u{250D}' => s(W0, Light, W0, Heavy),
        '\u{250E}' => s(W0, Heavy, W0, Light),
        '\u{250F}' => s(W0, Heavy, W0, Heavy),
        '\u{2510}' => s(W0, Light, Light, W0),
        '\u{2511}' => s(W0, Light, Heavy, W0),
        '\u{2512}' => s(W0, Heavy, Light, W0),
        '\u{2513}' => s(W0, Heavy, Heavy, W0),
        '\u{2514}' => s(Light, W0, W0, Light),
        '\u{2515}' => s(Light, W0, W0, Heavy),
        '\u{2516}' => s(Heavy, W0, W0, Light),
        '\u{2517}' => s(Heavy, W0, W0, Heavy),
        '\u{2518}' => s(Light, W0, Light, W0),
        '\u{2519}' => s(Light, W0, Heavy, W0),
        '\u{251A}' => s(Heavy, W0, Light, W0),
        '\u{251B}' => s(Heavy, W0, Heavy, W0),
        '\u{251C}' => s(Light, Light, W0, Light),
        '\u{251D}' => s(Light, Light, W0, Heavy),
        '\u{251E}' => s(Heavy, Light, W0, Light),
        '\u{251F}' => s(Light, Heavy, W0, Light),
        '\u{2520}' => s(Heavy, Heavy, W0, Light),
        '\u{2521}' => s(Light, Heavy, W0, Heavy),
        '\u{2522}' => s(Heavy, Light, W0, Heavy),
        '\u{2523}' => s(Heavy, Heavy, W0, Heavy),
        '\u{2524}' => s(Light, Light, Light, W0),
        '\u{2525}' => s(Light, Light, Heavy, W0),
        '\u{2526}' => s(Heavy, Light, Light, W0),
        '\u{2527}' => s(Light, Heavy, Light, W0),
        '\u{2528}' => s(Heavy, Heavy, Light, W0),
        '\u{2529}' => s(Light, Heavy, Heavy, W0),
        '\u{252A}' => s(Heavy, Light, Heavy, W0),
        '\u{252B}' => s(Heavy, Heavy, Heavy, W0),
        '\u{252C}' => s(W0, Light, Light, Light),
        '\u{252D}' => s(W0, Light, Heavy, Light),
        '\u{252E}' => s(W0, Light, Light, Heavy),
        '\u{252F}' => s(W0, Light, Heavy, Heavy),
        '\u{2530}' => s(W0, Heavy, Light, Light),
        '\u{2531}' => s(W0, Heavy, Light, Heavy),
        '\u{2532}' => s(W0, Heavy, Heavy, Light),
        '\u{2533}' => s(W0, Heavy, Heavy, Heavy),
        '\u{2534}' => s(Light, W0, Light, Light),
        '\u{2535}' => s(Light, W0, Heavy, Light),
        '\u{2536}' => s(Light, W0, Light, Heavy),
        '\u{2537}' => s(Light, W0, Heavy, Heavy),
        '\u{2538}' => s(Heavy, W0, Light, Light),
        '\u{2539}' => s(Heavy, W0, Light, Heavy),
        '\u{253A}' => s(Heavy, W0, Heavy, Light),
        '\u{253B}' => s(Heavy, W0, Heavy, Heavy),
        '\u{253C}' => s(Light, Light, Light, Light),
        '\u{253D}' => s(Light, Light, Heavy, Light),
        '\u{253E}' => s(Light, Light, Light, Heavy),
        '\u{253F}' => s(Light, Light, Heavy, Heavy),
        '\u{2540}' => s(Heavy, Light, Light, Light),
        '\u{2541}' => s(Light, Heavy, Light, Light),
        '\u{2542}' => s(Heavy, Heavy, Light, Light),
        '\u{2543}' => s(Heavy, Light, Heavy, Light),
        '\u{2544}' => s(Heavy, Light, Light, Heavy),
        '\u{2545}' => s(Light, Heavy, Heavy, Light),
        '\u{2546}' => s(Light, Heavy, Light, Heavy),
        '\u{2547}' => s(Light, Heavy, Heavy, Heavy),
        '\u{2548}' => s(Heavy, Light, Heavy, Heavy),
        '\u{2549}' => s(Heavy, Heavy, Heavy, Light),
        '\u{254A}' => s(Heavy, Heavy, Light, Heavy),
        '\u{254B}' => s(Heavy, Heavy, Heavy, Heavy),
        '\u{2550}' => s(W0, W0, Double, Double),
        '\u{2551}' => s(Double, Double, W0, W0),
        '\u{2552}' => s(W0, Light, W0, Double),
        '\u{2553}' => s(W0, Double, W0, Light),
        '\u{2554}' => s(W0, Double, W0, Double),
        '\u{2555}' => s(W0, Light, Double, W0),
        '\u{2556}' => s(W0, Double, Light, W0),
        '\u{2557}' => s(W0, Double, Double, W0),
        '\u{2558}' => s(Light, W0, W0, Double),
        '\u{2559}' => s(Double, W0, W0, Light),
        '\u{255A}' => s(Double, W0, W0, Double),
        '\u{255B}' => s(Light, W0, Double, W0),
        '\u{255C}' => s(Double, W0, Light, W0),
        '\u{255D}' => s(Double, W0, Double, W0),
        '\u{255E}' => s(Light, Light, W0, Double),
        '\u{255F}' => s(Double, Double, W0, Light),
        '\u{2560}' => s(Double, Double, W0, Double),
        '\u{2561}' => s(Light, Light, Double, W0),
        '\u{2562}' => s(Double, Double, Light, W0),
        '\u{2563}' => s(Double, Double, Double, W0),
        '\u{2564}' => s(W0, Light, Double, Double),
        '\u{2565}' => s(W0, Double, Light, Light),
        '\u{2566}' => s(W0, Double, Double, Double),
        '\u{2567}' => s(Light, W0, Double, Double),
        '\u{2568}' => s(Double, W0, Light, Light),
        '\u{2569}' => s(Double, W0, Double, Double),
        '\u{256A}' => s(Light, Light, Double, Double),
        '\u{256B}' => s(Double, Double, Light, Light),
        '\u{256C}' => s(Double, Double, Double, Double),
        '\u{2574}' => s(W0, W0, Light, W0),
        '\u{2575}' => s(Light, W0, W0, W0),
        '\u{2576}' => s(W0, W0, W0, Light),
        '\u{2577}' => s(W0, Light, W0, W0),
        '\u{2578}' => s(W0, W0, Heavy, W0),
        '\u{2579}' => s(Heavy, W0, W0, W0),
        '\u{257A}' => s(W0, W0, W0, Heavy),
        '\u{257B}' => s(W0, Heavy, W0, W0),
        '\u{257C}' => s(W0, W0, Light, Heavy),
        '\u{257D}' => s(Light, Heavy, W0, W0),
        '\u{257E}' => s(W0, W0, Heavy, Light),
        '\u{257F}' => s(Heavy, Light, W0, W0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face() -> SpriteFace {
        SpriteFace::new(CellMetrics {
            cell_width_px: 10,
            cell_height_px: 20,
            line_thickness_px: 1,
            underline_position_px: 18,
            strikethrough_position_px: 10,
        })
    }

    #[test]
    fn horizontal_line_fills_center_row() {
        let canvas = face().rasterize('\u{2500}', false).unwrap();
        assert_eq!(canvas.width, 10);
        assert_eq!(canvas.height, 20);
        let cy = 10usize;
        assert!(canvas.pixels[cy * 10 + 3] > 0);
        assert_eq!(canvas.pixels[2 * 10 + 3], 0);
    }

    #[test]
    fn full_block_is_entirely_opaque() {
        let canvas = face().rasterize('\u{2588}', false).unwrap();
        assert!(canvas.pixels.iter().all(|&p| p == 255));
    }

    #[test]
    fn wide_glyph_doubles_canvas_width() {
        let canvas = face().rasterize('\u{2500}', true).unwrap();
        assert_eq!(canvas.width, 20);
    }

    #[test]
    fn braille_dot_pattern_decodes_bit_zero_to_top_left_dot() {
        let canvas = face().rasterize('\u{2801}', false).unwrap();
        let top_left_quadrant: usize = canvas.pixels[..5 * 10].iter().map(|&p| p as usize).sum();
        assert!(top_left_quadrant > 0);
    }

    #[test]
    fn unsupported_codepoint_is_rejected() {
        let err = face().rasterize('A', false).unwrap_err();
        assert!(matches!(err, EngineError::RasterizationFailed(_)));
    }

    #[test]
    fn bar_cursor_width_equals_thickness_regardless_of_cell_width() {
        let wide_face = SpriteFace::new(CellMetrics {
            cell_width_px: 40,
            line_thickness_px: 2,
            ..face().metrics()
        });
        let canvas = wide_face.rasterize_cursor(CursorShape::Bar);
        let lit_columns = (0..canvas.width)
            .filter(|&x| canvas.pixels[10 * canvas.width as usize + x as usize] > 0)
            .count();
        assert_eq!(lit_columns, 2);
    }

    #[test]
    fn curly_underline_amplitude_is_at_least_thickness() {
        let canvas = face().rasterize_underline(UnderlineStyle::Curly);
        let col = 0usize;
        let lit_rows: Vec<u32> = (0..canvas.height)
            .filter(|&y| canvas.pixels[y as usize * canvas.width as usize + col] > 0)
            .collect();
        assert!(!lit_rows.is_empty());
    }

    #[test]
    fn box_drawing_glyph_centers_at_original_height_when_cell_grows() {
        let mut metrics = face().metrics();
        metrics.cell_height_px = 40;
        let sprite = SpriteFace::with_original_height(metrics, 20);
        let canvas = sprite.rasterize('\u{2502}', false).unwrap();
        assert_eq!(canvas.height, 20);
        assert_eq!(canvas.y_offset, 10);
    }

    #[test]
    fn double_line_box_drawing_is_covered() {
        let canvas = face().rasterize('\u{2554}', false).unwrap();
        assert!(canvas.pixels.iter().any(|&p| p > 0));
    }

    #[test]
    fn powerline_right_triangle_is_covered() {
        let canvas = face().rasterize('\u{E0B0}', false).unwrap();
        assert!(canvas.pixels.iter().any(|&p| p > 0));
    }

    #[test]
    fn underline_none_produces_blank_canvas() {
        let canvas = face().rasterize_underline(UnderlineStyle::None);
        assert!(canvas.pixels.iter().all(|&p| p == 0));
    }
}
