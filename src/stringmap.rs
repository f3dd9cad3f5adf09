//! Selection, text extraction with a byte-to-[`Pin`] back-reference map, and
//! pull-based regex search over the combined scrollback+viewport buffer.
//!
//! Grounded on the teacher's standalone `selection.rs` (word/line/char
//! selection heuristics tuned for "code and paths", soft-wrap-aware text
//! extraction) but rebuilt over [`crate::pagestore::PageStore`] and
//! [`Pin`]s instead of raw combined-buffer `(line, col)` positions, so
//! selection endpoints and search-match spans stay meaningful across the
//! host-facing API described in `SPEC_FULL.md` §4.F. The `regex` dependency
//! for [`Search`] is the same one the `oxidized` example repo pulls in for
//! scrollback search.

use regex::Regex;

use crate::cell::Cell;
use crate::pagestore::{PageStore, Pin};

/// Inclusive selection over the combined buffer, named by [`Pin`]s rather
/// than raw coordinates so it stays meaningful after the selection is first
/// computed (modulo the caveat that active-region pins don't survive a
/// scroll - see [`Pin`]'s own documentation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Pin,
    pub end: Pin,
}

impl Selection {
    #[must_use]
    pub const fn new(start: Pin, end: Pin) -> Self {
        Self { start, end }
    }

    /// Normalize start/end ordering against `store`'s current layout.
    #[must_use]
    pub fn normalized(self, store: &PageStore) -> Self {
        let (sl, sc) = linearize(store, self.start);
        let (el, ec) = linearize(store, self.end);
        if (sl, sc) <= (el, ec) {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }

    /// Select exactly one character cell; wide leads expand to include
    /// their continuation column.
    #[must_use]
    pub fn char_at(pos: Pin, store: &PageStore) -> Self {
        let cols = store.cols();
        if cols == 0 {
            return Self::new(pos, pos);
        }
        let (line, col) = linearize(store, pos);
        let col = col.min(cols.saturating_sub(1));
        let lead_col = normalize_to_wide_lead(store, line, col);
        let end_col = wide_end_col(store, line, lead_col, cols);
        Self::new(pin_for(store, line, lead_col), pin_for(store, line, end_col))
    }

    /// Select an entire logical line (every column), anchored on whichever
    /// line `pos` resolves to.
    #[must_use]
    pub fn line_at(pos: Pin, store: &PageStore) -> Self {
        let cols = store.cols();
        let total = store.total_lines() as u64;
        if cols == 0 || total == 0 {
            return Self::new(pos, pos);
        }
        let (line, _) = linearize(store, pos);
        let line = line.min(total - 1);
        Self::new(
            pin_for(store, line, 0),
            pin_for(store, line, cols.saturating_sub(1)),
        )
    }

    /// Select a "word" at `pos`: a contiguous run of path/identifier
    /// characters, or a contiguous run of whitespace if `pos` lands on
    /// whitespace.
    #[must_use]
    pub fn word_at(pos: Pin, store: &PageStore) -> Self {
        let cols = store.cols();
        let total = store.total_lines() as u64;
        if cols == 0 || total == 0 {
            return Self::new(pos, pos);
        }

        let (line, col) = linearize(store, pos);
        let line = line.min(total - 1);
        let col = col.min(cols.saturating_sub(1));
        let col = normalize_to_wide_lead(store, line, col);

        let ch = cell_char(store, line, col).unwrap_or(' ');
        let target_class = classify_char(ch);

        let mut start_col = col;
        let mut end_col = wide_end_col(store, line, col, cols);

        while start_col > 0 {
            let probe = normalize_to_wide_lead(store, line, start_col - 1);
            let ch = cell_char(store, line, probe).unwrap_or(' ');
            if classify_char(ch) != target_class {
                break;
            }
            start_col = probe;
        }

        loop {
            let next = end_col.saturating_add(1);
            if next >= cols {
                break;
            }
            let next = normalize_to_wide_lead(store, line, next);
            let ch = cell_char(store, line, next).unwrap_or(' ');
            if classify_char(ch) != target_class {
                break;
            }
            end_col = wide_end_col(store, line, next, cols);
            if end_col >= cols.saturating_sub(1) {
                break;
            }
        }

        Self::new(pin_for(store, line, start_col), pin_for(store, line, end_col))
    }

    /// Materialize this selection as a [`StringMap`]: flattened text plus a
    /// per-character back-reference to the [`Pin`] it came from.
    #[must_use]
    pub fn to_string_map(self, store: &PageStore) -> StringMap {
        StringMap::build(store, self, StringMapOptions::default())
    }
}

/// Knobs for [`StringMap::build`], kept separate from [`Selection`] since
/// they're policy (how to render text) rather than addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringMapOptions {
    /// Drop trailing blank cells on each emitted line before joining.
    pub trim_trailing_blanks: bool,
    /// Join a soft-wrapped line into its predecessor without a `\n`.
    pub join_soft_wrapped: bool,
}

impl Default for StringMapOptions {
    fn default() -> Self {
        Self {
            trim_trailing_blanks: true,
            join_soft_wrapped: true,
        }
    }
}

/// Flattened selection text plus a parallel `map` of [`Pin`]s, one per
/// `char` of `string` (so a byte offset the host got back from, say, a
/// text-search UI can be promoted straight back to a grid/scrollback cell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMap {
    pub string: String,
    pub map: Vec<Pin>,
}

impl StringMap {
    /// Build a [`StringMap`] for `selection` over `store`.
    #[must_use]
    pub fn build(store: &PageStore, selection: Selection, options: StringMapOptions) -> Self {
        let mut string = String::new();
        let mut map = Vec::new();

        let cols = store.cols();
        if cols == 0 {
            return Self { string, map };
        }
        let total = store.total_lines() as u64;
        if total == 0 {
            return Self { string, map };
        }

        let sel = selection.normalized(store);
        let (start_line, start_col) = linearize(store, sel.start);
        let (end_line, end_col) = linearize(store, sel.end);
        let start_line = start_line.min(total - 1);
        let end_line = end_line.min(total - 1);

        for line in start_line..=end_line {
            let sc = if line == start_line {
                start_col.min(cols - 1)
            } else {
                0
            };
            let ec = if line == end_line {
                end_col.min(cols - 1)
            } else {
                cols - 1
            };

            let mut line_chars: Vec<(char, Pin)> = Vec::new();
            if sc <= ec {
                for col in sc..=ec {
                    let pin = pin_for(store, line, col);
                    match cell_at(store, line, col) {
                        Some(cell) if cell.is_wide_continuation() => continue,
                        Some(cell) => line_chars.push((cell.content(), pin)),
                        None => line_chars.push((' ', pin)),
                    }
                }
            }

            if options.trim_trailing_blanks {
                while matches!(line_chars.last(), Some((' ', _))) {
                    line_chars.pop();
                }
            }

            for (ch, pin) in line_chars {
                string.push(ch);
                map.push(pin);
            }

            if line != end_line {
                let next_joins = options.join_soft_wrapped && is_soft_wrap_continuation(store, line + 1);
                if !next_joins {
                    string.push('\n');
                    map.push(pin_for(store, line + 1, 0));
                }
            }
        }

        Self { string, map }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.string.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.string.chars().count()
    }

    /// The [`Pin`] a given `char` offset into `string` came from, if any.
    #[must_use]
    pub fn pin_at_char(&self, char_index: usize) -> Option<Pin> {
        self.map.get(char_index).copied()
    }

    /// Run a regex search over this map's text, yielding a lazy
    /// [`Search`] iterator of matches with their source [`Pin`] ranges.
    #[must_use]
    pub fn search<'a>(&'a self, pattern: &'a Regex) -> Search<'a> {
        Search {
            map: self,
            pattern,
            next_byte: 0,
        }
    }
}

/// One regex match against a [`StringMap`], with both the matched text and
/// the [`Pin`] range it came from for full match and each capture group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub text: String,
    pub start: Pin,
    pub end: Pin,
    /// `groups[i]` is the `(text, start, end)` of capture group `i + 1`, or
    /// `None` if that group did not participate in this match.
    pub groups: Vec<Option<(String, Pin, Pin)>>,
}

/// A pull-based iterator over non-overlapping regex matches in a
/// [`StringMap`]'s text. Lazy: no match is computed until [`Iterator::next`]
/// is called, so a caller can stop after the first few hits without paying
/// for the rest of scrollback.
#[derive(Debug)]
pub struct Search<'a> {
    map: &'a StringMap,
    pattern: &'a Regex,
    next_byte: usize,
}

impl<'a> Iterator for Search<'a> {
    type Item = SearchMatch;

    fn next(&mut self) -> Option<Self::Item> {
        let haystack = &self.map.string[self.next_byte..];
        let caps = self.pattern.captures(haystack)?;
        let full = caps.get(0).expect("capture group 0 always matches");

        let abs_start_byte = self.next_byte + full.start();
        let abs_end_byte = self.next_byte + full.end();
        let start_char = self.map.string[..abs_start_byte].chars().count();
        let end_char = self.map.string[..abs_end_byte].chars().count();

        self.next_byte = if full.end() == 0 {
            // Zero-width match: advance by one char to guarantee progress.
            self.next_byte
                + haystack
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8)
        } else {
            abs_end_byte
        };

        let match_base = self.next_byte;
        let groups = (1..caps.len())
            .map(|i| {
                caps.get(i).map(|m| {
                    let gs_char = self.map.string[..match_base + m.start()].chars().count();
                    let ge_char = self.map.string[..match_base + m.end()].chars().count();
                    (
                        m.as_str().to_string(),
                        pin_at_or_end(self.map, gs_char),
                        pin_at_or_end(self.map, ge_char.saturating_sub(1).max(gs_char)),
                    )
                })
            })
            .collect();

        Some(SearchMatch {
            text: full.as_str().to_string(),
            start: pin_at_or_end(self.map, start_char),
            end: pin_at_or_end(self.map, end_char.saturating_sub(1).max(start_char)),
            groups,
        })
    }
}

fn pin_at_or_end(map: &StringMap, char_index: usize) -> Pin {
    map.map
        .get(char_index)
        .or_else(|| map.map.last())
        .copied()
        .unwrap_or(Pin::Active { row: 0, col: 0 })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Whitespace,
    Other,
}

fn classify_char(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Whitespace
    } else if is_word_char(ch) {
        CharClass::Word
    } else {
        CharClass::Other
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/' | '\\' | ':' | '@')
}

/// Convert a [`Pin`] to a `(line, col)` pair in the store's linear line
/// space (history slots `0..scrollback.len()`, then active rows).
fn linearize(store: &PageStore, pin: Pin) -> (u64, u16) {
    match pin {
        Pin::Active { row, col } => (store.scrollback().len() as u64 + u64::from(row), col),
        Pin::History { absolute_line, col } => {
            let base = store.scrollback().base();
            (absolute_line.saturating_sub(base), col)
        }
    }
}

fn pin_for(store: &PageStore, line: u64, col: u16) -> Pin {
    let sb_len = store.scrollback().len() as u64;
    if line < sb_len {
        store
            .pin_history(line as usize, col)
            .unwrap_or(Pin::Active { row: 0, col })
    } else {
        Pin::Active {
            row: (line - sb_len) as u16,
            col,
        }
    }
}

fn cell_at(store: &PageStore, line: u64, col: u16) -> Option<Cell> {
    let sb_len = store.scrollback().len() as u64;
    if line < sb_len {
        store
            .history_line_at(line as usize)
            .and_then(|l| l.cells.get(col as usize))
            .copied()
    } else {
        let row = (line - sb_len) as u16;
        store.grid().cell(row, col).copied()
    }
}

fn cell_char(store: &PageStore, line: u64, col: u16) -> Option<char> {
    cell_at(store, line, col).map(|c| c.content())
}

fn normalize_to_wide_lead(store: &PageStore, line: u64, col: u16) -> u16 {
    if col == 0 {
        return col;
    }
    match cell_at(store, line, col) {
        Some(cell) if cell.is_wide_continuation() => col - 1,
        _ => col,
    }
}

fn wide_end_col(store: &PageStore, line: u64, lead_col: u16, cols: u16) -> u16 {
    match cell_at(store, line, lead_col) {
        Some(cell) if cell.is_wide() => lead_col.saturating_add(1).min(cols.saturating_sub(1)),
        _ => lead_col,
    }
}

fn is_soft_wrap_continuation(store: &PageStore, line: u64) -> bool {
    let sb_len = store.scrollback().len() as u64;
    if line < sb_len {
        store
            .history_line_at(line as usize)
            .map(|l| l.wrapped)
            .unwrap_or(false)
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, SgrAttrs};

    fn store_from_lines(cols: u16, history: &[(&str, bool)], viewport: &[&str]) -> PageStore {
        let mut store = PageStore::new(cols, viewport.len() as u16, 64);
        for (text, wrapped) in history {
            let cells: Vec<Cell> = text.chars().map(Cell::new).collect();
            store.scrollback_mut().push_row(&cells, *wrapped);
        }
        for (row, text) in viewport.iter().enumerate() {
            for (col, ch) in text.chars().enumerate() {
                store.write_printable(row as u16, col as u16, ch, SgrAttrs::default());
            }
        }
        store
    }

    #[test]
    fn string_map_joins_soft_wrapped_scrollback_lines_without_newline() {
        let store = store_from_lines(10, &[("foo", false), ("bar", true)], &["baz"]);
        let sel = Selection::new(
            Pin::History {
                absolute_line: 0,
                col: 0,
            },
            Pin::History {
                absolute_line: 1,
                col: 2,
            },
        );
        let map = sel.to_string_map(&store);
        assert_eq!(map.string, "foobar");
        assert_eq!(map.map.len(), "foobar".len());
    }

    #[test]
    fn string_map_spans_scrollback_and_viewport_with_newlines() {
        let store = store_from_lines(10, &[("aa", false), ("bb", false)], &["cc", "dd"]);
        let start = Pin::History {
            absolute_line: 1,
            col: 0,
        };
        let end = Pin::Active { row: 1, col: 1 };
        let map = Selection::new(start, end).to_string_map(&store);
        assert_eq!(map.string, "bb\ncc\ndd");
    }

    #[test]
    fn word_selection_is_tuned_for_paths() {
        let store = store_from_lines(40, &[], &["foo-bar/baz"]);
        let sel = Selection::word_at(Pin::Active { row: 0, col: 4 }, &store);
        assert_eq!(sel.to_string_map(&store).string, "foo-bar/baz");
    }

    #[test]
    fn word_selection_stops_at_whitespace() {
        let store = store_from_lines(40, &[], &["abc def"]);
        let sel = Selection::word_at(Pin::Active { row: 0, col: 5 }, &store);
        assert_eq!(sel.to_string_map(&store).string, "def");
    }

    #[test]
    fn line_at_selects_the_full_row() {
        let store = store_from_lines(5, &[], &["ab"]);
        let sel = Selection::line_at(Pin::Active { row: 0, col: 0 }, &store);
        let map = StringMap::build(
            &store,
            sel,
            StringMapOptions {
                trim_trailing_blanks: false,
                join_soft_wrapped: true,
            },
        );
        assert_eq!(map.string, "ab   ");
    }

    #[test]
    fn search_finds_matches_with_pin_back_reference() {
        let store = store_from_lines(20, &[], &["error: bad file"]);
        let sel = Selection::line_at(Pin::Active { row: 0, col: 0 }, &store);
        let map = sel.to_string_map(&store);
        let re = Regex::new(r"error").unwrap();
        let matches: Vec<SearchMatch> = map.search(&re).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "error");
        assert_eq!(matches[0].start, Pin::Active { row: 0, col: 0 });
    }

    #[test]
    fn search_is_lazy_and_yields_multiple_matches() {
        let store = store_from_lines(20, &[], &["foo foo foo"]);
        let sel = Selection::line_at(Pin::Active { row: 0, col: 0 }, &store);
        let map = sel.to_string_map(&store);
        let re = Regex::new(r"foo").unwrap();
        let mut search = map.search(&re);
        assert!(search.next().is_some());
        assert!(search.next().is_some());
        assert!(search.next().is_some());
        assert!(search.next().is_none());
    }

    #[test]
    fn char_at_expands_wide_glyph_to_both_columns() {
        let mut store = PageStore::new(5, 1, 8);
        store.write_printable(0, 0, '\u{1F600}', SgrAttrs::default());
        let sel = Selection::char_at(Pin::Active { row: 0, col: 0 }, &store);
        assert_eq!(sel.start, Pin::Active { row: 0, col: 0 });
        assert_eq!(sel.end, Pin::Active { row: 0, col: 1 });
    }
}
