use criterion::{Criterion, black_box, criterion_group, criterion_main};

use stickerkit_lib::twemoji::{emoji_to_code_point, twemoji_src};

fn bench_single_scalar(c: &mut Criterion) {
    c.bench_function("codepoint_single", |b| {
        b.iter(|| emoji_to_code_point(black_box("😀")))
    });
}

fn bench_zwj_sequence(c: &mut Criterion) {
    c.bench_function("codepoint_zwj_family", |b| {
        b.iter(|| emoji_to_code_point(black_box("👨\u{200D}👩\u{200D}👧\u{200D}👦")))
    });
}

fn bench_src(c: &mut Criterion) {
    c.bench_function("twemoji_src_selector", |b| b.iter(|| twemoji_src(black_box("❤️"))));
}

criterion_group!(benches, bench_single_scalar, bench_zwj_sequence, bench_src);
criterion_main!(benches);
