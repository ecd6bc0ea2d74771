use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use querykit::prelude::*;
use querykit::qb::{BatchInsertBuilder, BatchStrategy, SelectBuilder};

/// SELECT with `n` columns and `n` ANDed equality predicates.
fn build_select(n: usize) -> SelectBuilder {
    let t = Table::new("t");
    let mut q = qb::select().from(&t);
    for i in 0..n {
        let col = t.typed::<i64>(format!("col{i}"));
        q = q.column(&col).and_where(col.eq(i as i64));
    }
    q
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/render");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.build(&PostgresDialect)));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).build(&PostgresDialect)));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/in_list");
    let t = Table::new("t");
    let id = t.typed::<i64>("id");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let q = qb::select()
                    .from(&t)
                    .where_clause(id.in_list(values.iter().copied()));
                black_box(q.build(&PostgresDialect))
            });
        });
    }

    group.finish();
}

fn bench_batch_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/batch_multi_row");
    let t = Table::new("t");
    let a = t.typed::<i64>("a");
    let b_col = t.typed::<String>("b");

    for n in [100, 1_000, 10_000] {
        let batch: BatchInsertBuilder = qb::batch_insert(&t).rows(
            (0..n).map(|i| BatchRow::new().value(&a, i).value(&b_col, format!("v{i}"))),
        );
        group.bench_with_input(BenchmarkId::from_parameter(n), &batch, |b, batch| {
            b.iter(|| {
                black_box(batch.build_with(&PostgresDialect, BatchStrategy::MultiRow, Some(65_535)))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render,
    bench_build_and_render,
    bench_in_list,
    bench_batch_chunking
);
criterion_main!(benches);
