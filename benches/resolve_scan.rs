use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use feedpack::core::cache::{Cache, MemoryCache};
use feedpack::core::catalog::{Catalog, DiskCatalog, MemoryCatalog};
use feedpack::core::naming::StoreNaming;
use feedpack::core::store::Package;
use feedpack::core::workspace::Workspace;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn seed_workspace(ws: &Workspace, stores: usize) {
    for i in 0..stores {
        let package = Package {
            name: format!("pkg {}", i),
            root_url: Some(format!("https://site{}.example.com/app", i)),
            ..Default::default()
        };
        let mut store = ws
            .create_store(Some(&format!("site{}", i)), Some(package))
            .unwrap();
        store.close();
    }
}

/// Full multi-store scan cost, which grows linearly with the number of stores.
fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_full_scan");
    group.measurement_time(Duration::from_secs(5));

    for stores in [1usize, 10, 40] {
        let tmp = TempDir::new().unwrap();
        let catalog: Arc<dyn Catalog> =
            Arc::new(DiskCatalog::new(tmp.path(), StoreNaming::default()));
        let cache = Arc::new(MemoryCache::new());
        let ws = Workspace::new(catalog, cache.clone());
        seed_workspace(&ws, stores);
        let url = format!("https://site{}.example.com/app/page", stores - 1);

        group.bench_with_input(BenchmarkId::new("disk", stores), &url, |b, url| {
            b.iter(|| {
                cache.clear().unwrap();
                black_box(ws.active_package_for_url(url).unwrap());
            });
        });
    }

    for stores in [1usize, 10, 40] {
        let catalog: Arc<dyn Catalog> = Arc::new(MemoryCatalog::default());
        let cache = Arc::new(MemoryCache::new());
        let ws = Workspace::new(catalog, cache.clone());
        seed_workspace(&ws, stores);
        let url = format!("https://site{}.example.com/app/page", stores - 1);

        group.bench_with_input(BenchmarkId::new("memory", stores), &url, |b, url| {
            b.iter(|| {
                cache.clear().unwrap();
                black_box(ws.active_package_for_url(url).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let ws = Workspace::in_memory(StoreNaming::default());
    seed_workspace(&ws, 40);
    ws.active_package_for_url("https://site7.example.com/app/x")
        .unwrap();

    c.bench_function("resolve_cache_hit", |b| {
        b.iter(|| black_box(ws.active_package_for_url("http://site7.example.com/app/y").unwrap()));
    });
}

criterion_group!(benches, bench_full_scan, bench_cache_hit);
criterion_main!(benches);
