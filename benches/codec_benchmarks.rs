//! Signing and wire-encoding benchmarks.
//!
//! Measures the per-record cost paid on the flush path before upload.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rask_event_shipper::domain::{Event, EventType};
use rask_event_shipper::sender::codec::{encode_body, encode_envelope, normalize_timestamps};
use rask_event_shipper::sender::{Compress, Credentials};
use std::hint::black_box;

fn create_event(property_count: usize) -> Event {
    let properties: String = {
        let pairs: Vec<String> = (0..property_count)
            .map(|i| format!(r#""prop_{i}":"value-{i}-2024-01-01T00:00:00.123456Z""#))
            .collect();
        format!("{{{}}}", pairs.join(","))
    };

    Event {
        device_id: "benchmark-device".to_string(),
        user_id: "benchmark-user".to_string(),
        app_name: "benchmark-app".to_string(),
        platform: "ios".to_string(),
        server: 1,
        event_type: EventType::Track,
        time: "2024-01-01 00:00:00.000".to_string(),
        event_name: Some("purchase".to_string()),
        properties,
    }
}

fn bench_sign(c: &mut Criterion) {
    let credentials = Credentials::new("123333", "data", "11111111");
    let mut group = c.benchmark_group("sign");

    for property_count in [1, 10, 100] {
        let event = create_event(property_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(property_count),
            &event,
            |b, event| b.iter(|| black_box(credentials.seal(event).unwrap())),
        );
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_timestamps");

    for property_count in [1, 10, 100] {
        let envelope = Credentials::new("p", "u", "s")
            .seal(&create_event(property_count))
            .unwrap();
        let json = serde_json::to_string(&envelope).unwrap();
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(property_count),
            &json,
            |b, json| b.iter(|| black_box(normalize_timestamps(json).unwrap())),
        );
    }

    group.finish();
}

fn bench_encode_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_body");
    let envelope = Credentials::new("p", "u", "s")
        .seal(&create_event(50))
        .unwrap();
    let payload = encode_envelope(&envelope).unwrap();
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for (name, mode) in [("gzip", Compress::Gzip), ("none", Compress::None)] {
        group.bench_with_input(BenchmarkId::new("mode", name), &payload, |b, payload| {
            b.iter(|| black_box(encode_body(payload, mode).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sign, bench_normalize, bench_encode_body);
criterion_main!(benches);
