//! Search and Emulation Benchmarks
//!
//! Benchmarks for grid iteration, instruction property search, rounding
//! boundaries and host-side atomic emulation.
//!
//! Run with: `cargo bench --bench testgen_ops`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hexl::prelude::*;

const TABLE: &str = r"
opcodes:
  - name: cvt
    format: mod
    primary:
      - { prop: type, all: [s8, u8, s16, u16, s32, u32, s64, u64, f16, f32, f64] }
      - { prop: stype, all: [s8, u8, s16, u16, s32, u32, s64, u64, f16, f32, f64] }
    secondary:
      - { prop: ftz, all: [0, 1] }
      - { prop: round, all: [none, near, zero, up, down, neari, zeroi, upi, downi] }
      - { prop: operand1, all: [reg, imm, wavesize] }
    implicit: { ftz: 0, round: none }
    rules:
      - when: { type: [s8, u8, s16, u16, s32, u32, s64, u64] }
        prop: round
        allowed: [none, neari, zeroi, upi, downi]
      - when: { type: [f16, f32, f64] }
        prop: round
        allowed: [none, near, zero, up, down]
";

fn bench_grid_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_iteration");

    let geometries = vec![
        (1, Dim::new(1024, 1, 1), Dim::new(256, 1, 1), "1d_1024_256"),
        (2, Dim::new(64, 64, 1), Dim::new(16, 16, 1), "2d_64x64_16x16"),
        (3, Dim::new(16, 16, 16), Dim::new(4, 4, 4), "3d_16_4"),
    ];

    for (dims, grid, workgroup, name) in geometries {
        let Ok(geometry) = GridGeometry::new(dims, grid, workgroup) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("points", name), &geometry, |bench, g| {
            bench.iter(|| {
                let sum: u64 = g.points().map(|p| g.workitem_flat_abs_id(p)).sum();
                black_box(sum);
            });
        });
        group.bench_with_input(BenchmarkId::new("workgroups", name), &geometry, |bench, g| {
            bench.iter(|| {
                let mut count = 0usize;
                for wg in 0..g.total_grid_groups() {
                    count += g.workgroup_begin(wg).count();
                }
                black_box(count);
            });
        });
    }

    group.finish();
}

fn bench_testgen_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("testgen_search");
    let Ok(set) = TableInstSet::from_yaml_str(TABLE) else {
        return;
    };

    for mode in [SearchMode::Optimal, SearchMode::Exhaustive] {
        group.bench_with_input(BenchmarkId::new("positive", mode), &mode, |bench, &mode| {
            bench.iter(|| {
                let Ok(mut search) = TestGen::create(&set, "cvt", false, mode) else {
                    return;
                };
                let mut count = 0usize;
                let mut start = true;
                while search.next_primary_set(start) {
                    start = false;
                    count += 1;
                    while search.next_secondary_set() {
                        count += 1;
                    }
                }
                black_box(count);
            });
        });
    }

    group.bench_function("negative", |bench| {
        bench.iter(|| {
            let Ok(mut search) = TestGen::create(&set, "cvt", false, SearchMode::Optimal) else {
                return;
            };
            let mut count = 0usize;
            let mut start = true;
            while search.next_primary_set(start) {
                start = false;
                search.reset_negative_set();
                while search.next_negative_set().is_some() {
                    count += 1;
                }
            }
            black_box(count);
        });
    });

    group.finish();
}

fn bench_rounding_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("rounding_data");

    for ty in [ValueType::S8, ValueType::U32, ValueType::S64] {
        group.bench_with_input(BenchmarkId::from_parameter(ty.name()), &ty, |bench, &ty| {
            bench.iter(|| {
                let data = f32_rounding_tests_data(black_box(ty), AluModifier::new(Rounding::Neari));
                black_box(data);
            });
        });
    }

    group.finish();
}

fn bench_atomic_emulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("atomic_emulation");

    let cases = vec![
        (64, 64, AtomicOp::Add, AtomicType::U64, MemoryScope::Workgroup),
        (1024, 256, AtomicOp::Add, AtomicType::U32, MemoryScope::Agent),
        (1024, 256, AtomicOp::Wrapinc, AtomicType::U32, MemoryScope::Agent),
        (1024, 256, AtomicOp::Cas, AtomicType::B64, MemoryScope::System),
    ];

    for (grid, workgroup, op, ty, scope) in cases {
        let Ok(geometry) = GridGeometry::linear(grid, workgroup) else {
            continue;
        };
        let test = AtomicTest::new(geometry, op, ty).with_scope(scope);
        group.bench_with_input(BenchmarkId::from_parameter(test.to_string()), &test, |bench, t| {
            bench.iter(|| {
                black_box(t.emulate());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_grid_iteration,
    bench_testgen_search,
    bench_rounding_data,
    bench_atomic_emulation
);
criterion_main!(benches);
