use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mzscan::datapoints::DataPointContainer;
use mzscan::store::{DataPointStore, DataPointStoreFactory, StoreKind};
use std::sync::Arc;
use tempfile::TempDir;

fn spectrum(points: usize) -> DataPointContainer {
    let mut data = DataPointContainer::with_capacity(points);
    for i in 0..points {
        data.push(100.0 + i as f64 * 0.01, (i % 97) as f32 * 100.0);
    }
    data
}

fn create_store(kind: StoreKind, dir: &TempDir) -> Arc<dyn DataPointStore> {
    DataPointStoreFactory::new()
        .create(kind, Some(dir.path()))
        .unwrap()
}

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    let data = spectrum(1000);
    group.throughput(Throughput::Elements(data.len() as u64));

    for kind in [StoreKind::Memory, StoreKind::TempFile, StoreKind::EmbeddedDb] {
        let dir = TempDir::new().unwrap();
        let store = create_store(kind, &dir);
        group.bench_with_input(BenchmarkId::new("store", kind), &data, |b, data| {
            b.iter(|| black_box(store.store(data).unwrap()))
        });
        store.dispose().unwrap();
    }

    group.finish();
}

fn bench_retrieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("retrieve");
    let data = spectrum(1000);
    group.throughput(Throughput::Elements(data.len() as u64));

    for kind in [StoreKind::Memory, StoreKind::TempFile, StoreKind::EmbeddedDb] {
        let dir = TempDir::new().unwrap();
        let store = create_store(kind, &dir);
        let handles: Vec<_> = (0..100).map(|_| store.store(&data).unwrap()).collect();
        let mut buf = DataPointContainer::new();
        let mut next = 0;

        group.bench_function(BenchmarkId::new("retrieve_into", kind), |b| {
            b.iter(|| {
                store.retrieve_into(handles[next % handles.len()], &mut buf).unwrap();
                next += 1;
                black_box(buf.len())
            })
        });
        store.dispose().unwrap();
    }

    group.finish();
}

criterion_group!(benches, bench_store, bench_retrieve);
criterion_main!(benches);
