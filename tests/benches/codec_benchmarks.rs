//! # Wallet Protocol Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | wb-02 Codec | encode / decode of every frame kind |
//! | wb-02 Codec | opaque fallback for malformed input |
//! | wb-05 Session | pending-call insert and response matching |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::time::Duration;
use wb_02_message_codec::{decode, encode, Envelope};
use wb_05_session::{PendingCalls, DEFAULT_MAX_PENDING_CALLS};

// ============================================================================
// WB-02: Codec
// ============================================================================

fn frames() -> Vec<(&'static str, Envelope)> {
    vec![
        (
            "request",
            Envelope::request(
                "signTx",
                json!({"cbor": "84a4".repeat(64), "partial": false}),
                1_700_000_000_001,
            ),
        ),
        (
            "response",
            Envelope::response(
                "signTx",
                json!({"signature": "84a100", "status": "submitted"}),
                Some(1_700_000_000_001),
            ),
        ),
        ("text", Envelope::text("Hello from the dApp")),
        ("heartbeat", Envelope::ping(1_700_000_000_001)),
    ]
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("wb-02-codec");
    group.measurement_time(Duration::from_secs(5));

    for (kind, envelope) in frames() {
        let wire = encode(&envelope);
        group.throughput(Throughput::Bytes(wire.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", kind), &envelope, |b, e| {
            b.iter(|| black_box(encode(e)))
        });
        group.bench_with_input(BenchmarkId::new("decode", kind), &wire, |b, w| {
            b.iter(|| black_box(decode(w)))
        });
    }

    for (name, raw) in [
        ("not_json", "not json at all"),
        ("unknown_kind", r#"{"kind":"telemetry","value":1}"#),
    ] {
        group.bench_with_input(BenchmarkId::new("decode_opaque", name), raw, |b, raw| {
            b.iter(|| black_box(decode(raw)))
        });
    }

    group.finish();
}

// ============================================================================
// WB-05: Pending calls
// ============================================================================

fn bench_pending_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("wb-05-pending-calls");

    for outstanding in [1_usize, 16, DEFAULT_MAX_PENDING_CALLS] {
        let responses: Vec<Envelope> = (0..outstanding as u64)
            .map(|id| Envelope::response("signTx", json!({"signature": "ab"}), Some(id)))
            .collect();

        group.throughput(Throughput::Elements(outstanding as u64));
        group.bench_with_input(
            BenchmarkId::new("insert_then_match", outstanding),
            &responses,
            |b, responses| {
                b.iter(|| {
                    let mut pending = PendingCalls::new(DEFAULT_MAX_PENDING_CALLS);
                    for id in 0..outstanding as u64 {
                        pending.insert(id, "signTx");
                    }
                    for response in responses.iter().rev() {
                        if let Envelope::Response(r) = response {
                            black_box(pending.match_response(r));
                        }
                    }
                    pending.len()
                })
            },
        );
    }

    group.bench_function("overflow_evicts_oldest", |b| {
        b.iter(|| {
            let mut pending = PendingCalls::new(DEFAULT_MAX_PENDING_CALLS);
            for id in 0..(DEFAULT_MAX_PENDING_CALLS as u64 * 2) {
                black_box(pending.insert(id, "getBalance"));
            }
            pending.len()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_codec, bench_pending_calls);
criterion_main!(benches);
