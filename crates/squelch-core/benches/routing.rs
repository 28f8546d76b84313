//! Routing benchmarks for squelch-core.
//!
//! Measures one broadcast against populations of different sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tenvis_squelch_core::capability::Receiver;
use tenvis_squelch_core::{
    ActorRecord, ChannelDescriptor, ChannelRegistry, MemoryStore, RadioRouter, RouterConfig,
    RoutingContext, Transmission, ZoneId,
};

fn router() -> RadioRouter {
    let channels: ChannelRegistry = [
        ChannelDescriptor::new("common", "Common"),
        ChannelDescriptor::new("cc", "CentCom").long_range(),
    ]
    .into_iter()
    .collect();
    RadioRouter::with_config(
        channels,
        RouterConfig {
            verb_seed: Some(1),
            ..RouterConfig::default()
        },
    )
}

/// Receivers spread over four zones, half of them on "common".
fn population(size: usize) -> (MemoryStore, tenvis_squelch_core::ActorId) {
    let mut store = MemoryStore::new();
    for zone in 0..4 {
        store.spawn(ActorRecord::named("relay").in_zone(ZoneId(zone)).relay_for(["common"], true));
    }
    let speaker = store.spawn(ActorRecord::named("Alice").in_zone(ZoneId(0)));
    for i in 0..size {
        let channel = if i % 2 == 0 { "common" } else { "cc" };
        store.spawn(
            ActorRecord::named("radio")
                .in_zone(ZoneId((i % 4) as u32))
                .with_receiver(Receiver::on([channel])),
        );
    }
    (store, speaker)
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");

    for size in [10, 100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("short_range", size), size, |b, &size| {
            let router = router();
            let (store, speaker) = population(size);
            let ctx = RoutingContext::new();
            let tx = Transmission::new(speaker, "status green", "common");
            b.iter(|| router.route(&store, &ctx, black_box(&tx)));
        });
        group.bench_with_input(BenchmarkId::new("long_range", size), size, |b, &size| {
            let router = router();
            let (store, speaker) = population(size);
            let ctx = RoutingContext::new();
            let tx = Transmission::new(speaker, "status green", "cc");
            b.iter(|| router.route(&store, &ctx, black_box(&tx)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_broadcast);
criterion_main!(benches);
