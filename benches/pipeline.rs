use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::io::Write;
use tempfile::NamedTempFile;

use ecom_analytics::table::{
    group::group_by,
    join::{join, JoinKind},
    table::Table,
    AggregateOp,
};

const ROWS: usize = 200_000;

fn synthetic_orders() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(tmp, "order_id,customer_id,order_purchase_timestamp").unwrap();
    for i in 0..ROWS {
        writeln!(
            tmp,
            "o{},c{},2023-{:02}-15 10:00:00",
            i,
            i % 1000,
            (i % 12) + 1
        )
        .unwrap();
    }
    tmp
}

fn synthetic_items() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(tmp, "order_id,order_item_id,price,freight_value").unwrap();
    for i in 0..ROWS {
        writeln!(tmp, "o{},1,{}.5,{}.25", i, i % 500, i % 30).unwrap();
    }
    tmp
}

fn pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));

    let orders_file = synthetic_orders();
    let items_file = synthetic_items();

    group.bench_function("load_csv", |b| {
        b.iter(|| Table::load_csv(orders_file.path()).unwrap())
    });

    let orders = Table::load_csv(orders_file.path()).unwrap();
    let items = Table::load_csv(items_file.path()).unwrap();

    group.bench_function("inner_join", |b| {
        b.iter(|| join(&orders, &items, "order_id", JoinKind::Inner).unwrap())
    });

    let items = items.derive_sum("revenue", "price", "freight_value").unwrap();
    let (merged, _) = join(&orders, &items, "order_id", JoinKind::Inner).unwrap();

    group.bench_function("group_by_sum", |b| {
        b.iter(|| group_by(&merged, "customer_id", "revenue", AggregateOp::Sum).unwrap())
    });

    group.finish();
}

criterion_group!(benches, pipeline);
criterion_main!(benches);
