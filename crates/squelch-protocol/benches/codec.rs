//! Codec benchmarks for squelch-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use squelch_protocol::{codec, ChatChannel, ChatRecord, Frame};

fn radio_frame(len: usize) -> Frame {
    let text = "x".repeat(len);
    let wrapped = format!("[color=#2681a5][Common] Alice says, \"{text}\"[/color]");
    Frame::chat(ChatRecord::new(ChatChannel::Radio, text, wrapped).with_sender(1))
}

fn bench_encode(c: &mut Criterion) {
    let frame = radio_frame(64);

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(64));
    group.bench_function("chat_64B", |b| b.iter(|| codec::encode(black_box(&frame))));
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let encoded = codec::encode(&radio_frame(64)).unwrap();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("chat_64B", |b| {
        b.iter(|| codec::decode(black_box(&encoded)))
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
