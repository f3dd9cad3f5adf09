//! Glyph atlas: a shelf-packed texture allocator that hands out stable
//! [`GlyphRegion`]s for rasterized glyphs and evicts the least-recently-used
//! ones once it has grown to its configured cap.
//!
//! Grounded on `frankenterm-web`'s `glyph_atlas.rs` shelf-allocator-plus-LRU
//! design, generalized two ways: the atlas here doubles in size on pressure
//! instead of being fixed at construction (up to
//! [`crate::config::EngineConfig::atlas_max_edge`]), and it backs both the
//! grayscale coverage buffers [`crate::sprite::SpriteFace`] produces and a
//! BGRA format for glyphs a host rasterizes as full color (emoji, images).

use std::collections::HashMap;

use crate::error::EngineError;

/// Pixel format an atlas page stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtlasFormat {
    /// One byte of coverage per pixel, as produced by [`crate::sprite::SpriteFace`].
    Grayscale,
    /// Four bytes per pixel (B, G, R, A), premultiplied alpha.
    Bgra,
}

impl AtlasFormat {
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Grayscale => 1,
            Self::Bgra => 4,
        }
    }
}

/// A stable allocated region within an atlas page, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl GlyphRegion {
    #[must_use]
    pub fn area(self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LruLinks {
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
struct Entry {
    key: u64,
    region: GlyphRegion,
    lru: LruLinks,
}

/// A single growable atlas page: a shelf allocator over a backing pixel
/// buffer, keyed by an opaque `u64` glyph id the caller derives however it
/// likes (codepoint+size, a sprite variant tag, ...).
#[derive(Debug)]
pub struct GlyphAtlas {
    format: AtlasFormat,
    width: u32,
    height: u32,
    max_edge: u32,
    pixels: Vec<u8>,

    cursor_x: u32,
    cursor_y: u32,
    row_h: u32,
    free_slots: Vec<GlyphRegion>,

    map: HashMap<u64, usize>,
    entries: Vec<Option<Entry>>,
    free_entry_indices: Vec<usize>,
    lru_head: Option<usize>,
    lru_tail: Option<usize>,

    evictions: u64,
}

impl GlyphAtlas {
    /// A new atlas starting at `initial_edge` square, growing by doubling up
    /// to `max_edge` before it starts evicting instead.
    #[must_use]
    pub fn new(format: AtlasFormat, initial_edge: u32, max_edge: u32) -> Self {
        let edge = initial_edge.max(1).min(max_edge.max(1));
        let len = edge as usize * edge as usize * format.bytes_per_pixel();
        Self {
            format,
            width: edge,
            height: edge,
            max_edge: max_edge.max(edge),
            pixels: vec![0u8; len],
            cursor_x: 0,
            cursor_y: 0,
            row_h: 0,
            free_slots: Vec::new(),
            map: HashMap::new(),
            entries: Vec::new(),
            free_entry_indices: Vec::new(),
            lru_head: None,
            lru_tail: None,
            evictions: 0,
        }
    }

    #[must_use]
    pub fn format(&self) -> AtlasFormat {
        self.format
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Look up a previously reserved region without disturbing its LRU
    /// position (use [`GlyphAtlas::reserve`] for the touching lookup-or-insert
    /// path).
    #[must_use]
    pub fn get(&self, key: u64) -> Option<GlyphRegion> {
        let idx = *self.map.get(&key)?;
        self.entries[idx].as_ref().map(|e| e.region)
    }

    /// Reserve a `width x height` region for `key`, reusing any existing
    /// reservation. Grows the backing page by doubling (bounded by
    /// `max_edge`) when the current page has no room, and only once growth is
    /// exhausted falls back to evicting least-recently-used glyphs.
    pub fn reserve(&mut self, key: u64, width: u32, height: u32) -> Result<GlyphRegion, EngineError> {
        if let Some(idx) = self.map.get(&key).copied() {
            self.touch(idx);
            return Ok(self.entries[idx].as_ref().expect("indexed entry present").region);
        }

        if width > self.max_edge || height > self.max_edge {
            return Err(EngineError::RasterizationFailed(
                "glyph exceeds maximum atlas edge",
            ));
        }

        let region = self.alloc_region(width, height)?;

        let entry = Entry {
            key,
            region,
            lru: LruLinks {
                prev: None,
                next: None,
            },
        };
        let idx = self.alloc_entry_index();
        self.entries[idx] = Some(entry);
        self.map.insert(key, idx);
        self.push_front(idx);
        Ok(region)
    }

    /// Copy `pixels` (tightly packed, `region.width * region.height *
    /// format().bytes_per_pixel()` bytes) into the atlas at `region`.
    pub fn write(&mut self, region: GlyphRegion, pixels: &[u8]) -> Result<(), EngineError> {
        let bpp = self.format.bytes_per_pixel();
        let expected = region.area() * bpp;
        if pixels.len() != expected {
            return Err(EngineError::RasterizationFailed(
                "pixel buffer does not match region dimensions",
            ));
        }
        if region.x + region.width > self.width || region.y + region.height > self.height {
            return Err(EngineError::RasterizationFailed(
                "region is outside current atlas bounds",
            ));
        }

        let stride = self.width as usize * bpp;
        for row in 0..region.height as usize {
            let dst_off = (region.y as usize + row) * stride + region.x as usize * bpp;
            let src_off = row * region.width as usize * bpp;
            let row_bytes = region.width as usize * bpp;
            self.pixels[dst_off..dst_off + row_bytes]
                .copy_from_slice(&pixels[src_off..src_off + row_bytes]);
        }
        Ok(())
    }

    /// Drop every reservation and zero the backing buffer, keeping the
    /// current page size. Used when a host invalidates its whole glyph cache
    /// (e.g. a font/DPI change upstream of this crate).
    pub fn reset(&mut self) {
        self.pixels.iter_mut().for_each(|b| *b = 0);
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.row_h = 0;
        self.free_slots.clear();
        self.map.clear();
        self.entries.clear();
        self.free_entry_indices.clear();
        self.lru_head = None;
        self.lru_tail = None;
    }

    fn alloc_region(&mut self, width: u32, height: u32) -> Result<GlyphRegion, EngineError> {
        if let Some(region) = self.try_shelf_alloc(width, height) {
            return Ok(region);
        }
        if self.grow() {
            if let Some(region) = self.try_shelf_alloc(width, height) {
                return Ok(region);
            }
        }
        loop {
            if self.lru_tail.is_none() {
                return Err(EngineError::OutOfMemory("glyph atlas is full"));
            }
            self.evict_one_lru();
            if let Some(region) = self.try_shelf_alloc(width, height) {
                return Ok(region);
            }
        }
    }

    fn try_shelf_alloc(&mut self, width: u32, height: u32) -> Option<GlyphRegion> {
        if let Some((idx, _)) = self
            .free_slots
            .iter()
            .enumerate()
            .filter(|(_, r)| r.width >= width && r.height >= height)
            .min_by_key(|(_, r)| r.width as u64 * r.height as u64)
        {
            return Some(self.free_slots.swap_remove(idx));
        }

        if self.cursor_x + width > self.width {
            self.cursor_x = 0;
            self.cursor_y += self.row_h;
            self.row_h = 0;
        }
        if self.cursor_y + height > self.height {
            return None;
        }

        let region = GlyphRegion {
            x: self.cursor_x,
            y: self.cursor_y,
            width,
            height,
        };
        self.cursor_x += width;
        self.row_h = self.row_h.max(height);
        Some(region)
    }

    /// Double the page edge (bounded by `max_edge`), preserving existing
    /// pixel contents in the top-left corner. Returns whether growth
    /// actually happened.
    fn grow(&mut self) -> bool {
        if self.width >= self.max_edge && self.height >= self.max_edge {
            return false;
        }
        let new_width = (self.width * 2).min(self.max_edge).max(self.width);
        let new_height = (self.height * 2).min(self.max_edge).max(self.height);
        if new_width == self.width && new_height == self.height {
            return false;
        }

        let bpp = self.format.bytes_per_pixel();
        let mut new_pixels = vec![0u8; new_width as usize * new_height as usize * bpp];
        let old_stride = self.width as usize * bpp;
        let new_stride = new_width as usize * bpp;
        for row in 0..self.height as usize {
            let src = row * old_stride;
            let dst = row * new_stride;
            new_pixels[dst..dst + old_stride].copy_from_slice(&self.pixels[src..src + old_stride]);
        }
        self.pixels = new_pixels;
        self.width = new_width;
        self.height = new_height;
        true
    }

    fn alloc_entry_index(&mut self) -> usize {
        if let Some(idx) = self.free_entry_indices.pop() {
            return idx;
        }
        let idx = self.entries.len();
        self.entries.push(None);
        idx
    }

    fn evict_one_lru(&mut self) {
        let Some(idx) = self.lru_tail else { return };
        self.remove_from_list(idx);
        let Some(entry) = self.entries[idx].take() else {
            return;
        };
        self.map.remove(&entry.key);
        self.free_slots.push(entry.region);
        self.free_entry_indices.push(idx);
        self.evictions += 1;
    }

    fn touch(&mut self, idx: usize) {
        if Some(idx) == self.lru_head {
            return;
        }
        self.remove_from_list(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.lru_head;
        self.lru_head = Some(idx);
        if self.lru_tail.is_none() {
            self.lru_tail = Some(idx);
        }
        let Some(entry) = self.entries[idx].as_mut() else {
            return;
        };
        entry.lru.prev = None;
        entry.lru.next = old_head;
        if let Some(h) = old_head
            && let Some(head_entry) = self.entries[h].as_mut()
        {
            head_entry.lru.prev = Some(idx);
        }
    }

    fn remove_from_list(&mut self, idx: usize) {
        let Some(entry) = self.entries[idx].as_ref() else {
            return;
        };
        let prev = entry.lru.prev;
        let next = entry.lru.next;

        if let Some(p) = prev {
            if let Some(p_entry) = self.entries[p].as_mut() {
                p_entry.lru.next = next;
            }
        } else {
            self.lru_head = next;
        }

        if let Some(n) = next {
            if let Some(n_entry) = self.entries[n].as_mut() {
                n_entry.lru.prev = prev;
            }
        } else {
            self.lru_tail = prev;
        }

        if let Some(entry) = self.entries[idx].as_mut() {
            entry.lru.prev = None;
            entry.lru.next = None;
        }
    }
}
