//! Engine-wide configuration knobs left implementation-defined by the
//! protocol: initial geometry, scrollback budget, atlas cap, and sprite
//! face cell metrics.
//!
//! Parsing configuration *files* is out of scope for this crate; this is
//! just the in-memory struct a host assembles from whatever configuration
//! source it uses.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Initial viewport width in columns.
    pub cols: u16,
    /// Initial viewport height in rows.
    pub rows: u16,
    /// Soft cap on scrollback memory, in bytes. Eviction from the head of
    /// history begins once this is exceeded.
    pub scrollback_byte_budget: usize,
    /// Maximum glyph atlas texture edge length, in pixels, before rare
    /// glyphs are LRU-evicted instead of growing the atlas further.
    pub atlas_max_edge: u32,
    /// Whether OSC 52 clipboard reads/writes are allowed absent a more
    /// specific host policy.
    pub osc52_default_allow: bool,
    /// Sprite face cell metrics, in pixels.
    pub cell_metrics: CellMetrics,
}

/// Pixel metrics the [`crate::sprite::SpriteFace`] rasterizes against.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub cell_width_px: u32,
    pub cell_height_px: u32,
    pub line_thickness_px: u32,
    pub underline_position_px: u32,
    pub strikethrough_position_px: u32,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            cell_width_px: 10,
            cell_height_px: 20,
            line_thickness_px: 1,
            underline_position_px: 18,
            strikethrough_position_px: 10,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            scrollback_byte_budget: 64 * 1024 * 1024,
            atlas_max_edge: 8192,
            osc52_default_allow: false,
            cell_metrics: CellMetrics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_reasonable() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.cols, 80);
        assert_eq!(cfg.rows, 24);
        assert!(cfg.scrollback_byte_budget > 0);
        assert!(cfg.atlas_max_edge.is_power_of_two());
    }
}
