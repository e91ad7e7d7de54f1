use criterion::{black_box, criterion_group, criterion_main, Criterion};

use keep_protocol::core::packet::Packet;
use keep_protocol::protocol::signer::{generate_key, signed};
use keep_protocol::protocol::verifier::{verify, AllowAll};

fn sample(body_len: usize) -> Packet {
    Packet::ask(
        "bench-001",
        "human:bencher",
        "server",
        &"x".repeat(body_len),
    )
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for size in [16usize, 256, 4096] {
        let packet = sample(size);
        group.bench_function(format!("body_{size}"), |b| {
            b.iter(|| black_box(&packet).to_bytes())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in [16usize, 256, 4096] {
        let wire = sample(size).to_bytes();
        group.bench_function(format!("body_{size}"), |b| {
            b.iter(|| Packet::from_bytes(black_box(&wire)).unwrap())
        });
    }
    group.finish();
}

fn bench_sign_payload(c: &mut Criterion) {
    let packet = signed(sample(256), &generate_key());
    c.bench_function("sign_payload/body_256", |b| {
        b.iter(|| black_box(&packet).sign_payload())
    });
}

fn bench_verify(c: &mut Criterion) {
    let packet = signed(sample(256), &generate_key());
    c.bench_function("verify/body_256", |b| {
        b.iter(|| verify(black_box(packet.clone()), &AllowAll))
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_sign_payload,
    bench_verify
);
criterion_main!(benches);
