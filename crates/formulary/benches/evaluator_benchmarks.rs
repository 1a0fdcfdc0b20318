//! Evaluator performance benchmarks.
//!
//! Measures parsing and vectorized evaluation of formulas across table sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use formulary::input::Parser;
use formulary::{Expression, Ledger, Table};

/// Generate synthetic CSV data with numeric, boolean and string columns.
fn generate_csv_data(rows: usize) -> String {
    let mut data = String::from("Price,Quantity,Discount,Active,Region\n");
    for row in 0..rows {
        data.push_str(&format!(
            "{},{},{:.2},{},{}\n",
            (row % 500) + 1,
            (row % 17) + 1,
            (row % 10) as f64 * 0.05,
            if row % 3 == 0 { "true" } else { "false" },
            ["EU", "US", "APAC"][row % 3],
        ));
    }
    data
}

fn generate_table(rows: usize) -> Table {
    let data = generate_csv_data(rows);
    Parser::new()
        .parse_bytes("bench.csv", data.as_bytes())
        .unwrap()
        .0
}

/// Benchmark parsing formula text.
fn bench_parse_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_expression");

    for (label, text) in [
        ("simple", "Price * Quantity"),
        ("rule", "Price * Quantity > 100 and Region == 'EU'"),
        (
            "nested",
            "((Price - Price * Discount) * Quantity > 250 or not Active) and 0 < Quantity <= 10",
        ),
    ] {
        group.bench_with_input(BenchmarkId::new("formula", label), text, |b, text| {
            b.iter(|| black_box(Expression::parse(text).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark evaluating formulas over tables of various sizes.
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let formula = Expression::parse("(Price - Price * Discount) * Quantity > 250 and Active").unwrap();

    for rows in [100, 1_000, 10_000].iter() {
        let table = generate_table(*rows);

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, table| {
            b.iter(|| black_box(formula.evaluate(table).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark applying a derived column and a flag rule through the ledger.
fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    for rows in [1_000, 10_000].iter() {
        let table = generate_table(*rows);

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, table| {
            b.iter_with_setup(
                || (table.clone(), Ledger::new()),
                |(mut table, mut ledger)| {
                    ledger
                        .apply_derived_column(&mut table, "Total", "Price * Quantity", None)
                        .unwrap();
                    ledger.apply_flag_rule(&mut table, "Total > 1000", None).unwrap();
                    black_box(table)
                },
            )
        });
    }

    group.finish();
}

/// Benchmark CSV export.
fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_csv");

    for rows in [1_000, 10_000].iter() {
        let table = generate_table(*rows);

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &table, |b, table| {
            b.iter(|| black_box(table.to_csv_string().unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_expression,
    bench_evaluate,
    bench_apply,
    bench_export,
);
criterion_main!(benches);
