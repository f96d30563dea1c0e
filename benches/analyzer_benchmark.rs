//! Analyzer and aggregate benchmarks.
//!
//! Benchmarks:
//! - Analysis of a filter/project/sort/limit plan over a wide table
//! - Star expansion over tables of increasing width
//! - Sequential vs partitioned `count` accumulation

use std::sync::Arc;

use arbor::analyzer::Analyzer;
use arbor::catalog::{Catalog, ColumnDef, TableSchema, DEFAULT_DATABASE};
use arbor::expression::{AggregateExpr, AggregateFunction, Expression};
use arbor::planner::{LogicalPlan, SortExpr};
use arbor::types::{Row, Type, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Helper: catalog holding a table `wide` with `width` integer columns.
fn setup_catalog(width: usize) -> Arc<Catalog> {
    let catalog = Catalog::with_defaults();
    let columns = (0..width)
        .map(|i| ColumnDef::new(format!("c{i}"), Type::Integer).unwrap())
        .collect();
    let schema = TableSchema::new("wide", columns).unwrap();
    catalog.create_table(DEFAULT_DATABASE, schema).unwrap();
    Arc::new(catalog)
}

fn query_plan() -> LogicalPlan {
    LogicalPlan::limit(
        LogicalPlan::sort(
            LogicalPlan::project(
                LogicalPlan::filter(
                    LogicalPlan::unresolved_table("wide"),
                    Expression::greater_than(Expression::column("c3"), Expression::literal(2.5)),
                ),
                vec![
                    Expression::column("c0"),
                    Expression::alias(Expression::column("c1"), "one"),
                    Expression::cast(Expression::column("c2"), Type::String),
                ],
            ),
            vec![SortExpr::asc(Expression::column("one"))],
        ),
        100,
    )
}

fn bench_analyze(c: &mut Criterion) {
    let analyzer = Analyzer::new(setup_catalog(16));
    c.bench_function("analyze_filter_project_sort_limit", |b| {
        b.iter(|| analyzer.analyze(black_box(query_plan())).unwrap());
    });
}

fn bench_star_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_star");
    for width in [8usize, 64, 256] {
        let analyzer = Analyzer::new(setup_catalog(width));
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let plan = LogicalPlan::project(
                    LogicalPlan::unresolved_table("wide"),
                    vec![Expression::Star],
                );
                analyzer.analyze(black_box(plan)).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_accumulate(c: &mut Criterion) {
    let rows: Vec<Row> = (0..100_000)
        .map(|i| {
            let v = if i % 7 == 0 { Value::Null } else { Value::Integer(i) };
            Row::new(vec![v])
        })
        .collect();
    let count = AggregateExpr::new(
        AggregateFunction::Count,
        Expression::Column {
            index: 0,
            table: "t".to_string(),
            name: "v".to_string(),
            data_type: Type::Integer,
            nullable: true,
        },
    );

    let mut group = c.benchmark_group("count_accumulate");
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("sequential", |b| {
        b.iter(|| count.accumulate(black_box(&rows)).unwrap());
    });
    group.bench_function("partitioned_4096", |b| {
        b.iter(|| count.accumulate_partitioned(black_box(&rows), 4096).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_analyze, bench_star_expansion, bench_accumulate);
criterion_main!(benches);
