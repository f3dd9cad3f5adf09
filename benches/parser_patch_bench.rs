use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use vtcore::{Executor, Grid, GridDiff, Screen};

struct Corpus<'a> {
    id: &'a str,
    bytes: &'a [u8],
}

fn corpora() -> Vec<Corpus<'static>> {
    const DENSE_SGR: &[u8] = b"\x1b[31mRED\x1b[0m \x1b[32mGREEN\x1b[0m \x1b[33mYELLOW\x1b[0m\n\
\x1b[38;5;196mIDX196\x1b[0m \x1b[38;2;1;2;3mRGB\x1b[0m\n";

    const CURSOR_HEAVY: &[u8] = b"\x1b[1;1H\x1b[2J\x1b[1;1HABCDEFGHIJ\
\x1b[2;1HKLMNOPQRST\x1b[3;1H0123456789\
\x1b[1;5H\x1b[0K\x1b[3;8H\x1b[1P\x1b[2;3H\x1b[2@  ";

    const UNICODE_HEAVY: &[u8] = "unicode: café — 你好 — 😀\nline2: e\u{301}\n".as_bytes();

    const HYPERLINK_HEAVY: &[u8] =
        b"\x1b]8;;https://example.com\x1b\\click here\x1b]8;;\x1b\\\r\nplain text\r\n";

    vec![
        Corpus { id: "dense_sgr_v1", bytes: DENSE_SGR },
        Corpus { id: "cursor_heavy_v1", bytes: CURSOR_HEAVY },
        Corpus { id: "unicode_heavy_v1", bytes: UNICODE_HEAVY },
        Corpus { id: "hyperlink_heavy_v1", bytes: HYPERLINK_HEAVY },
    ]
}

/// Generate larger corpora by repeating base patterns to target ~64 KB, for
/// more stable throughput measurements than the small corpora above.
fn large_corpora() -> Vec<(&'static str, Vec<u8>)> {
    let sgr_line = b"\x1b[1;32m   ok\x1b[0m running a long-lived shell session \
\x1b[2m(session 42)\x1b[0m\r\n\x1b[1;33mwarning\x1b[0m: unused variable `\x1b[1mx\x1b[0m`\r\n \
\x1b[1;34m-->\x1b[0m src/lib.rs:42:9\r\n";
    let sgr_stream = sgr_line.repeat(64 * 1024 / sgr_line.len());

    let cursor_line = b"\x1b[1;1H\x1b[2J\x1b[1;1HABCDEFGHIJ\
\x1b[2;1HKLMNOPQRST\x1b[3;1H0123456789\
\x1b[1;5H\x1b[0K\x1b[3;8H\x1b[1P\x1b[2;3H\x1b[2@  ";
    let cursor_stream = cursor_line.repeat(64 * 1024 / cursor_line.len());

    let utf8_line = "你好世界 café résumé — 🦀🔥✅ line of text 日本語テスト\r\n".as_bytes();
    let utf8_stream = utf8_line.repeat(64 * 1024 / utf8_line.len());

    let ascii_line = b"The quick brown fox jumps over the lazy dog. 0123456789 ABCDEF\r\n";
    let ascii_stream = ascii_line.repeat(64 * 1024 / ascii_line.len());

    vec![
        ("sgr_64k_v1", sgr_stream),
        ("cursor_64k_v1", cursor_stream),
        ("utf8_64k_v1", utf8_stream),
        ("ascii_64k_v1", ascii_stream),
    ]
}

fn executor_feed_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("executor_feed");

    for corpus in corpora() {
        group.throughput(Throughput::Bytes(corpus.bytes.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(corpus.id), |b| {
            b.iter(|| {
                let mut executor = Executor::new();
                let mut screen = Screen::new(120, 40, 1000);
                let out = executor.feed(black_box(corpus.bytes), &mut screen);
                black_box(out);
            });
        });
    }

    for (id, bytes) in large_corpora() {
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(id), |b| {
            b.iter(|| {
                let mut executor = Executor::new();
                let mut screen = Screen::new(120, 40, 1000);
                let out = executor.feed(black_box(&bytes), &mut screen);
                black_box(out);
            });
        });
    }

    group.finish();
}

/// Simulates a steady-state render loop: feed one frame's worth of output,
/// diff against the previous frame, discard the patch (as a renderer would
/// after uploading it), repeat.
fn patch_diff_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_diff");

    let mut executor = Executor::new();
    let mut screen = Screen::new(120, 40, 1000);
    let mut baseline = Grid::new(120, 40);

    let (_, frame_bytes) = large_corpora().into_iter().next().unwrap();
    executor.feed(&frame_bytes, &mut screen);

    group.throughput(Throughput::Elements((120u64) * 40));
    group.bench_function(BenchmarkId::from_parameter("diff_full_frame"), |b| {
        b.iter(|| {
            let patch = GridDiff::diff(black_box(&baseline), black_box(screen.active().grid()));
            black_box(patch.len());
        });
    });
    group.finish();

    baseline = screen.active().grid().clone();
    let _ = baseline;
}

criterion_group!(benches, executor_feed_bench, patch_diff_bench);
criterion_main!(benches);
