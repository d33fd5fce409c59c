//! Read-path benchmarks for layerstack-config.
//!
//! - Path resolution latency for dotted and comma notation
//! - Snapshot cost compared to a plain `Arc` clone
//! - Concurrent readers while reloads run

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use layerstack_config::prelude::*;
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use tokio::runtime::Runtime;

fn loaded_config(rt: &Runtime) -> ConfigAccessor {
    rt.block_on(async {
        ConfigAccessor::builder()
            .with_defaults(json!({
                "server": {"port": 8080, "host": "localhost"},
                "routes": [{"path": "/a", "upstream": "one"}, {"path": "/b", "upstream": "two"}],
                "flags": {"metrics": true, "tracing": false}
            }))
            .with_value(json!({"server": {"port": 9090}}))
            .build_and_load()
            .await
            .unwrap()
    })
}

/// Benchmark single-threaded path resolution
fn benchmark_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let config = loaded_config(&rt);

    let mut group = c.benchmark_group("get");
    for path in ["server.port", "routes[1].upstream", "routes,1,upstream", "missing.key"] {
        group.bench_with_input(BenchmarkId::from_parameter(path), path, |b, path| {
            b.iter(|| black_box(config.get(path, 0).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark snapshot against a bare Arc clone
fn benchmark_snapshot(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let config = loaded_config(&rt);
    let value = Arc::new(42);

    let mut group = c.benchmark_group("snapshot");
    group.bench_function("config_snapshot", |b| {
        b.iter(|| black_box(config.snapshot().unwrap()));
    });
    group.bench_function("arc_clone", |b| {
        b.iter(|| black_box(Arc::clone(&value)));
    });
    group.finish();
}

/// Benchmark concurrent readers with varying thread counts
fn benchmark_concurrent_reads(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let config = loaded_config(&rt);

    let mut group = c.benchmark_group("concurrent_reads");
    for num_threads in [1, 2, 4, 8] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            &num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let barrier = Arc::new(Barrier::new(num_threads));
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let config = config.clone();
                            let barrier = Arc::clone(&barrier);
                            thread::spawn(move || {
                                barrier.wait();
                                for _ in 0..1000 {
                                    black_box(config.get("server.port", 0).unwrap());
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark reads while a reload is in flight
fn benchmark_reads_during_reload(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let config = loaded_config(&rt);

    c.bench_function("read_during_reload", |b| {
        b.iter(|| {
            let reload = {
                let _guard = rt.enter();
                config.load_configs()
            };
            black_box(config.get("routes[0].path", "").unwrap());
            rt.block_on(reload).unwrap();
        });
    });
}

criterion_group!(
    benches,
    benchmark_get,
    benchmark_snapshot,
    benchmark_concurrent_reads,
    benchmark_reads_during_reload
);
criterion_main!(benches);
