use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use weave_script::{compile_str, lexer::tokenize, AssetKind, MemorySource};

fn make_script(lines: usize) -> String {
    let mut buf = String::with_capacity(lines * 40);

    for i in 0..lines {
        match i % 7 {
            0 => buf.push_str(&format!("@knot{i}\n")),
            1 => buf.push_str("#SET_BACKGROUND \"forest\"::\"dawn\"\n"),
            2 => buf.push_str(&format!("> \"Alice\" left \"alice\"::\"idle\"\n\tHello world {i}\n")),
            3 => buf.push_str(&format!("#ASSIGN v{i} (gold + {i}) * 2 >= 10 and flag\n")),
            4 => buf.push_str(&format!(">\n\tLine {i} AUTO\n\t#PLAY_SOUND \"s{i}\"\n")),
            5 => {
                buf.push_str(&format!("#if gold > {i}\n"));
                buf.push_str("\t#HIDE_UI\n");
                buf.push_str("#else\n");
                buf.push_str("\t#SHOW_UI\n");
            }
            6 => {
                buf.push_str(">\n\tPick one\n");
                buf.push_str("\t- Left -> start\n");
                buf.push_str(&format!("\t- Right -> knot{}\n", i - 6));
            }
            _ => unreachable!(),
        }
    }

    buf.push_str("#END\n");
    buf
}

fn assets() -> MemorySource {
    MemorySource::new()
        .with(AssetKind::Character, "alice", "sheet \"alice.png\" 64 128\nidle 0 4 8\n")
        .with(AssetKind::Background, "forest", "sheet \"forest.png\" 320 180\ndawn 0 1 1\n")
}

fn bench_full(c: &mut Criterion) {
    let src = make_script(10_000);
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);
    group.bench_function("lex 10k lines", |b| {
        b.iter(|| tokenize("bench.weave", black_box(&src)))
    });
    group.bench_function("lex+parse 10k lines", |b| {
        b.iter(|| {
            let mut source = assets();
            compile_str("bench.weave", black_box(&src), &mut source)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_full);
criterion_main!(benches);
