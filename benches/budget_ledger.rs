use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kais_operator::adapters::memory::InMemoryLedgerStore;
use kais_operator::services::BudgetLedgerService;

fn bench_spend_sequence(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("budget_ledger/spend_100", |b| {
        b.to_async(&rt).iter(|| async {
            let service = BudgetLedgerService::new(Arc::new(InMemoryLedgerStore::new()));
            service.init("cell-bench").await.unwrap();
            service.top_up("cell-bench", 1_000.0, None).await.unwrap();
            for _ in 0..100 {
                service.spend(black_box("cell-bench"), black_box(1.0)).await.unwrap();
            }
        })
    });
}

fn bench_allocate_reclaim_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("budget_ledger/allocate_reclaim_50", |b| {
        b.to_async(&rt).iter(|| async {
            let service = BudgetLedgerService::new(Arc::new(InMemoryLedgerStore::new()));
            service.init("parent").await.unwrap();
            service.top_up("parent", 1_000.0, None).await.unwrap();
            for i in 0..50 {
                let child = format!("child-{i}");
                service.allocate("parent", &child, 5.0).await.unwrap();
                service.reclaim("parent", &child).await.unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_spend_sequence, bench_allocate_reclaim_cycle);
criterion_main!(benches);
