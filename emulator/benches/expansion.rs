use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use s_emulator::{execute, expand, samples, CallInlining, DebugSession};

const INPUTS: [i64; 3] = [40, 15, 25];

fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("Expand composition");
    let program = samples::composition();
    let max = program
        .max_expansion_level(CallInlining::Full)
        .expect("composition has no recursion");

    for level in 0..=max {
        group.bench_with_input(BenchmarkId::from_parameter(level), &level, |b, &level| {
            b.iter(|| expand(&program, level, CallInlining::Full).unwrap())
        });
    }

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("Execute composition");
    let program = samples::composition();
    let max = program
        .max_expansion_level(CallInlining::Full)
        .expect("composition has no recursion");

    for level in [0, max] {
        let expanded = expand(&program, level, CallInlining::Full).unwrap().program;
        group.bench_with_input(BenchmarkId::from_parameter(level), &expanded, |b, expanded| {
            b.iter(|| execute(expanded, &INPUTS).unwrap())
        });
    }

    group.finish();
}

fn bench_debug_steps(c: &mut Criterion) {
    let program = expand(&samples::addition(), 3, CallInlining::Full)
        .unwrap()
        .program;

    c.bench_function("Debug step forward and back", |b| {
        b.iter_batched(
            || {
                let mut session = DebugSession::new(program.clone(), &INPUTS).unwrap();
                session.start().unwrap();
                session
            },
            |mut session| {
                for _ in 0..100 {
                    session.step_forward().unwrap();
                }
                for _ in 0..100 {
                    session.step_backward().unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_expand, bench_execute, bench_debug_steps);
criterion_main!(benches);
