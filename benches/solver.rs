//! Benchmarks for puzzle construction, rendering, and solving.

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use polytwist::algebra::MacroLibrary;
use polytwist::project;
use polytwist::scramble::scramble_seeded;
use polytwist::solver::Solver;
use polytwist::Family;

/// Benchmark building a puzzle's geometry and move tables from scratch.
fn bench_build(c: &mut Criterion) {
    c.bench_function("build_megaminx", |b| {
        b.iter(|| black_box(Family::Megaminx).build())
    });
}

/// Benchmark a long seeded scramble.
fn bench_scramble(c: &mut Criterion) {
    let puzzle = Family::Cube3.build();
    let solved = puzzle.solved_state();

    c.bench_function("scramble_200", |b| {
        b.iter(|| scramble_seeded(&puzzle, black_box(&solved), 200, 7))
    });
}

/// Benchmark projecting and serializing one frame.
fn bench_render(c: &mut Criterion) {
    let puzzle = Family::Megaminx.build();
    let state = puzzle.solved_state();
    let camera = project::default_camera();

    c.bench_function("render_megaminx", |b| {
        b.iter(|| project::render(&puzzle, black_box(&state), &camera, 800.0, 600.0))
    });
}

/// Benchmark macro discovery, the heavy part of solver construction.
fn bench_macro_library(c: &mut Criterion) {
    let puzzle = Family::Cube2.build();
    let mut group = c.benchmark_group("macros");
    group.sample_size(10);
    group.bench_function("library_cube2_depth4", |b| {
        b.iter(|| MacroLibrary::build(black_box(&puzzle), 4))
    });
    group.finish();
}

/// Benchmark solving shallow scrambles with a prebuilt solver.
fn bench_solve(c: &mut Criterion) {
    let puzzle = Rc::new(Family::Cube2.build());
    let solver = Solver::new(Rc::clone(&puzzle));
    let (state, _) = scramble_seeded(&puzzle, &puzzle.solved_state(), 4, 3);

    let mut group = c.benchmark_group("solve");
    group.sample_size(10);
    group.bench_function("cube2_shallow", |b| {
        b.iter(|| solver.solve(black_box(&state)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_scramble,
    bench_render,
    bench_macro_library,
    bench_solve
);
criterion_main!(benches);
