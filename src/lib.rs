#![forbid(unsafe_code)]

//! Host-agnostic VT/ANSI terminal engine.
//!
//! `vtcore` is the platform-independent core of a GPU-accelerated terminal
//! emulator. It owns VT/ANSI parsing, a paged grid-of-cells screen model with
//! bounded scrollback, cursor/mode state, a keyboard-to-PTY-bytes encoder, a
//! regex-over-scrollback search facility, and a procedural glyph face with its
//! backing atlas allocator, all without any host I/O dependencies.
//!
//! # Primary responsibilities
//!
//! - **Parser**: VT/ANSI state machine (Paul Williams model, 12 states).
//! - **Grid** / **Scrollback** / **Pagestore**: active viewport + bounded history,
//!   addressed through stable [`Pin`](pagestore::Pin)s rather than raw coordinates.
//! - **Cell**: character content + SGR attributes (colors, bold, italic, etc.).
//! - **Cursor** / **Modes**: position, charset, and DEC/ANSI mode tracking.
//! - **Screen** / **Executor**: cursor+mode+page-store state and the CSI/OSC/DCS/APC
//!   semantics that mutate it.
//! - **Input**: keyboard event to PTY-bytes encoder (kitty keyboard, fixterms,
//!   modifyOtherKeys, legacy).
//! - **Stringmap**: selection/viewport materialized to text with a byte-to-pin
//!   back-reference map, plus a pull-based regex search iterator.
//! - **Sprite** / **Atlas**: procedural box-drawing/Braille/Powerline/cursor
//!   rasterization and a bin-packed glyph texture allocator.
//! - **Patch**: minimal diff between two grid snapshots for efficient updates.
//!
//! # Design principles
//!
//! - **No I/O**: all types are pure data + logic; the host adapter supplies bytes.
//! - **Deterministic**: identical byte sequences always produce identical state.
//! - **`#![forbid(unsafe_code)]`**: safety enforced at compile time.

pub mod atlas;
pub mod cell;
pub mod config;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod grid;
pub mod input;
pub mod interfaces;
pub mod modes;
pub mod pagestore;
pub mod parser;
pub mod patch;
pub mod screen;
pub mod scrollback;
pub mod sprite;
pub mod stringmap;

pub use atlas::{AtlasFormat, GlyphAtlas, GlyphRegion};
pub use cell::{Cell, CellFlags, Color, HyperlinkId, HyperlinkRegistry, SgrAttrs, SgrFlags};
pub use config::EngineConfig;
pub use cursor::{Charset, CharsetSlot, Cursor, SavedCursor, translate_charset};
pub use error::EngineError;
pub use executor::{ClipboardHost, ClipboardSelection, EngineEvent, Executor, ExecutorOutput};
pub use grid::Grid;
pub use input::{KeyCode, KeyEvent, KeyEventKind, Modifiers, encode_key};
pub use interfaces::{
    GlyphRasterizer, HyperlinkOpener, IdentityShaper, RasterizedGlyph, ShapeInput, ShapedGlyph,
    ShapingOracle, Utf8WidthOracle, WidthOracle,
};
pub use modes::{AnsiModes, DecModes, KittyFlags, Modes, MouseFormat, MouseTracking};
pub use pagestore::{PageStore, Pin, PinRegion, ReflowMode};
pub use parser::{Action, CsiParams, Parser};
pub use patch::{CellUpdate, ChangeRun, DirtySpan, DirtyTracker, GridDiff, Patch};
pub use screen::Screen;
pub use scrollback::{Scrollback, ScrollbackLine};
pub use sprite::{RasterCanvas, SpriteFace};
pub use stringmap::{Search, SearchMatch, Selection, StringMap};
