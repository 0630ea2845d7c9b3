use common::{AggregateId, TenantId};
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AppendOptions, EventEnvelope, EventStore, InMemoryEventStore, StreamId, Version,
};

fn make_envelope(tenant_id: TenantId, aggregate_id: AggregateId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .tenant_id(tenant_id)
        .aggregate_id(aggregate_id)
        .aggregate_type("Invoice")
        .event_type("InvoicePaymentRecorded")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({"payment_amount": 10000}))
        .build()
}

fn bench_append_single(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let event = make_envelope(TenantId::new(), AggregateId::new(), 1);
                store
                    .append(vec![event], AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let tenant_id = TenantId::new();
                let aggregate_id = AggregateId::new();
                let events: Vec<_> = (1..=10)
                    .map(|v| make_envelope(tenant_id, aggregate_id, v))
                    .collect();
                store
                    .append(events, AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_read_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let tenant_id = TenantId::new();
    let aggregate_id = AggregateId::new();
    let stream_id = StreamId::build(tenant_id, "Invoice", aggregate_id);

    rt.block_on(async {
        let events: Vec<_> = (1..=100)
            .map(|v| make_envelope(tenant_id, aggregate_id, v))
            .collect();
        store
            .append(events, AppendOptions::expect_new())
            .await
            .unwrap();
    });

    c.bench_function("event_store/read_stream_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.read_stream(&stream_id).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single,
    bench_append_batch,
    bench_read_stream
);
criterion_main!(benches);
