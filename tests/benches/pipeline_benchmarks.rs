//! # Concurrent ABCI Client Benchmarks
//!
//! | Benchmark | Measures |
//! |-----------|----------|
//! | `check_tx_pipeline` | Submit-to-resolution throughput of the ordered check_tx pipeline |
//! | `deliver_block` | deliver_tx batch followed by a commit through the barrier |
//! | `direct_query` | Read-lock path for query calls |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

use qc_concurrent::test_utils::RecordingApp;
use qc_concurrent::{AbciClient, ClientCreator, ConcurrencyConfig, LocalAsyncClientCreator};
use shared_types::RequestQuery;

fn started_client(app: RecordingApp) -> Box<dyn AbciClient> {
    let creator = LocalAsyncClientCreator::with_config(Arc::new(app), ConcurrencyConfig::default())
        .expect("recording app is concurrent");
    let client = creator.new_abci_client().expect("client");
    client.start().expect("client starts");
    client
}

fn bench_check_tx_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_tx_pipeline");
    group.measurement_time(Duration::from_secs(5));

    let client = started_client(RecordingApp::builder().build());
    for size in [1usize, 32, 256] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let handles: Vec<_> = (0..size)
                    .map(|n| client.check_tx_async(n.to_be_bytes().to_vec()).unwrap())
                    .collect();
                for handle in &handles {
                    black_box(handle.wait());
                }
            })
        });
    }
    group.finish();
    client.stop().expect("client stops");
}

fn bench_deliver_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("deliver_block");
    group.measurement_time(Duration::from_secs(5));

    let client = started_client(RecordingApp::builder().build());
    for size in [16usize, 128] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                for n in 0..size {
                    client.deliver_tx_async(n.to_be_bytes().to_vec()).unwrap();
                }
                black_box(client.commit_sync().unwrap())
            })
        });
    }
    group.finish();
    client.stop().expect("client stops");
}

fn bench_direct_query(c: &mut Criterion) {
    let client = started_client(RecordingApp::builder().build());
    c.bench_function("direct_query", |b| {
        b.iter(|| black_box(client.query_sync(RequestQuery::default()).unwrap()))
    });
    client.stop().expect("client stops");
}

criterion_group!(
    benches,
    bench_check_tx_pipeline,
    bench_deliver_block,
    bench_direct_query
);
criterion_main!(benches);
