//! Scenario tests for behavior that forks on a mode bit: the same cursor
//! motion or CSI final byte means something different depending on origin
//! mode, DECLRMM, or which screen buffer is active. Each test pins down one
//! fork so a regression in the mode check shows up as a specific failure
//! rather than a fuzzy end-to-end diff.

use vtcore::{DecModes, Executor, Screen};

#[test]
fn cup_ignores_scroll_region_unless_origin_mode_set() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 10, 100);
    executor.feed(b"\x1b[3;8r", &mut screen); // region rows [2,8)

    executor.feed(b"\x1b[1;1H", &mut screen);
    assert_eq!((screen.cursor().row, screen.cursor().col), (0, 0));

    executor.feed(b"\x1b[?6h\x1b[1;1H", &mut screen);
    assert_eq!(
        (screen.cursor().row, screen.cursor().col),
        (2, 0),
        "origin mode should anchor row 1 to the top of the scroll region"
    );
}

#[test]
fn cursor_down_clamps_to_scroll_region_bottom_under_origin_mode() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 10, 100);
    executor.feed(b"\x1b[3;6r\x1b[?6h", &mut screen); // region rows [2,6)
    executor.feed(b"\x1b[20B", &mut screen); // cursor down, way past region
    assert_eq!(screen.cursor().row, 5, "origin mode clamps CUD to the region's bottom row");
}

#[test]
fn csi_s_is_save_cursor_without_declrmm() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 5, 100);
    executor.feed(b"\x1b[2;3H", &mut screen);
    executor.feed(b"\x1b[s", &mut screen);
    executor.feed(b"\x1b[5;5H", &mut screen);
    executor.feed(b"\x1b[u", &mut screen);
    assert_eq!((screen.cursor().row, screen.cursor().col), (1, 2));
}

#[test]
fn csi_s_is_decslrm_once_declrmm_is_enabled() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 5, 100);
    executor.feed(b"\x1b[?69h", &mut screen); // DECLRMM on
    executor.feed(b"\x1b[3;7s", &mut screen); // DECSLRM: left=2, right=7
    assert_eq!(screen.scroll_region(), (0, 5, 2, 7));
}

#[test]
fn insert_mode_and_replace_mode_diverge_on_the_same_print() {
    let mut executor = Executor::new();

    let mut replace = Screen::new(10, 1, 10);
    executor.feed(b"ABCDE\x1b[1;1HZ", &mut replace);
    assert_eq!(replace.active().grid().cell(0, 0).unwrap().content(), 'Z');
    assert_eq!(replace.active().grid().cell(0, 1).unwrap().content(), 'B');

    let mut insert = Screen::new(10, 1, 10);
    executor.feed(b"ABCDE\x1b[1;1H\x1b[4hZ", &mut insert);
    assert_eq!(insert.active().grid().cell(0, 0).unwrap().content(), 'Z');
    assert_eq!(insert.active().grid().cell(0, 1).unwrap().content(), 'A');
}

#[test]
fn alt_screen_writes_are_invisible_to_primary_and_vice_versa() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 3, 100);
    executor.feed(b"primary text", &mut screen);
    executor.feed(b"\x1b[?1049h", &mut screen);
    assert!(screen.alt_screen_active());
    executor.feed(b"\x1b[2Jalt text", &mut screen);
    assert_eq!(screen.active().grid().cell(0, 0).unwrap().content(), 'a');

    executor.feed(b"\x1b[?1049l", &mut screen);
    assert!(!screen.alt_screen_active());
    assert_eq!(screen.active().grid().cell(0, 0).unwrap().content(), 'p');
}

#[test]
fn mode_1047_clears_alt_screen_on_entry_but_plain_47_does_not() {
    let mut executor = Executor::new();

    let mut via_47 = Screen::new(10, 3, 100);
    executor.feed(b"\x1b[?1049h", &mut via_47); // seed some alt-screen content first
    executor.feed(b"stale", &mut via_47);
    executor.feed(b"\x1b[?1049l\x1b[?47h", &mut via_47);
    assert_eq!(
        via_47.active().grid().cell(0, 0).unwrap().content(),
        's',
        "plain mode 47 must not clear the alt screen on entry"
    );

    let mut via_1047 = Screen::new(10, 3, 100);
    executor.feed(b"\x1b[?1049h", &mut via_1047);
    executor.feed(b"stale", &mut via_1047);
    executor.feed(b"\x1b[?1049l\x1b[?1047h", &mut via_1047);
    assert_eq!(
        via_1047.active().grid().cell(0, 0).unwrap().content(),
        ' ',
        "mode 1047 clears the alt screen on entry"
    );
}

#[test]
fn alt_and_primary_screens_track_independent_cursor_positions() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 5, 100);
    executor.feed(b"\x1b[3;3H", &mut screen);
    executor.feed(b"\x1b[?1049h", &mut screen);
    executor.feed(b"\x1b[1;1H", &mut screen);
    executor.feed(b"\x1b[?1049l", &mut screen);
    assert_eq!(
        (screen.cursor().row, screen.cursor().col),
        (2, 2),
        "returning to the primary screen restores its own cursor, untouched by alt-screen motion"
    );
}

#[test]
fn decawm_off_overwrites_at_right_margin_instead_of_wrapping() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(5, 2, 10);
    executor.feed(b"\x1b[?7l", &mut screen); // autowrap off
    executor.feed(b"abcdeZ", &mut screen);
    assert_eq!(screen.active().grid().cell(0, 4).unwrap().content(), 'Z');
    assert_eq!(screen.cursor().row, 0, "with DECAWM off the cursor never leaves row 0");
}

#[test]
fn reverse_index_scrolls_down_only_at_region_top() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 5, 100);
    executor.feed(b"existing\r\n", &mut screen);
    executor.feed(b"\x1b[1;1H", &mut screen);
    executor.feed(b"\x1bM", &mut screen); // RI at row 0: scrolls whole screen down
    assert_eq!(screen.active().grid().cell(1, 0).unwrap().content(), 'e');
    assert_eq!(screen.cursor().row, 0);
}

#[test]
fn decstbm_without_params_resets_full_screen_region() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 10, 100);
    executor.feed(b"\x1b[3;6r", &mut screen);
    assert_eq!(screen.scroll_region(), (2, 6, 0, 10));
    executor.feed(b"\x1b[r", &mut screen);
    assert_eq!(screen.scroll_region(), (0, 10, 0, 10));
}

#[test]
fn modes_struct_tracks_dec_flags_independent_of_ansi_flags() {
    let mut executor = Executor::new();
    let mut screen = Screen::new(10, 5, 100);
    executor.feed(b"\x1b[4h", &mut screen); // IRM (ANSI, no `?`)
    assert!(screen.modes().insert_mode());
    assert!(!screen.modes().dec.contains(DecModes::ORIGIN));
    executor.feed(b"\x1b[?6h", &mut screen); // DECOM (DEC private)
    assert!(screen.modes().origin_mode());
    assert!(screen.modes().insert_mode(), "unrelated DEC mode must not clear IRM");
}
