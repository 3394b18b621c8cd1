use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use weave_core::{Ctx, Executor, StepStatus, TickInput};
use weave_script::ast::Dialog;
use weave_script::{compile_str, AssetKind, MemorySource};

/// `auto` lines finish on their own and knots fall through without a menu.
fn make_dialog(knots: usize, auto: bool) -> Dialog {
    let mut buf = String::with_capacity(knots * 200);
    buf.push_str("#ASSIGN visits 0\n");
    for i in 0..knots {
        if i > 0 {
            buf.push_str(&format!("@k{i}\n"));
        }
        buf.push_str("#ASSIGN visits visits + 1\n");
        buf.push_str("#SET_BACKGROUND \"forest\"::\"dawn\"\n");
        buf.push_str("> \"Alice\" left \"alice\"::\"idle\"\n");
        let suffix = if auto { " AUTO" } else { "" };
        buf.push_str(&format!("\tThis is line number {i} of the benchmark.{suffix}\n"));
        buf.push_str("\t#if visits > 500\n");
        buf.push_str(&format!("\t\tLate visit.{suffix}\n"));
        buf.push_str("\t#else\n");
        buf.push_str(&format!("\t\tEarly visit.{suffix}\n"));
        if !auto && i + 1 < knots {
            buf.push_str(&format!("\t- Go on -> k{}\n", i + 1));
        }
    }

    let mut source = MemorySource::new()
        .with(AssetKind::Character, "alice", "sheet \"alice.png\" 64 128\nidle 0 4 8\n")
        .with(AssetKind::Background, "forest", "sheet \"forest.png\" 320 180\ndawn 0 1 1\n");
    compile_str("bench.weave", &buf, &mut source).expect("benchmark script compiles")
}

fn run_to_end(dialog: Dialog, input: TickInput) -> u64 {
    let mut exe = Executor::new(dialog);
    let mut ctx = Ctx::default();
    while exe.step(&mut ctx, &input).expect("no runtime errors") == StepStatus::Running {
        ctx.drain();
    }
    exe.stats().ticks
}

fn bench_executor(c: &mut Criterion) {
    const KNOTS: usize = 1_000;
    let mut group = c.benchmark_group("executor");
    group.sample_size(10);

    group.bench_function("advance through 1k knots", |b| {
        b.iter_batched(|| make_dialog(KNOTS, false), |d| run_to_end(d, TickInput::advance()), BatchSize::SmallInput);
    });
    group.bench_function("reveal 1k knots of auto lines", |b| {
        b.iter_batched(|| make_dialog(KNOTS, true), |d| run_to_end(d, TickInput::default()), BatchSize::SmallInput);
    });
    group.finish();
}

criterion_group!(benches, bench_executor);
criterion_main!(benches);
