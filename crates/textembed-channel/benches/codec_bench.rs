// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the channel boundary: parsing call envelopes,
// decoding them into operations, and encoding embedding responses.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use textembed_channel::{MethodCall, MethodResponse, Operation};
use textembed_core::types::EmbeddingVector;

/// A typical `embedText` envelope as a host would send it.
const EMBED_CALL: &str = r#"{"method":"embedText","arguments":{"text":"The quick brown fox jumps over the lazy dog."}}"#;

/// Benchmark parsing and validating an `embedText` call.
fn bench_decode_embed_call(c: &mut Criterion) {
    c.bench_function("decode embedText call", |b| {
        b.iter(|| {
            let call: MethodCall = serde_json::from_str(black_box(EMBED_CALL)).unwrap();
            let op = Operation::decode(&call);
            assert!(op.is_ok());
        });
    });
}

/// Benchmark rejecting a call with a missing argument.
fn bench_decode_invalid_call(c: &mut Criterion) {
    let call = MethodCall::new("calculateSimilarity", json!({ "text1": "only one" }));

    c.bench_function("decode calculateSimilarity (missing text2)", |b| {
        b.iter(|| {
            let op = Operation::decode(black_box(&call));
            assert!(op.is_err());
        });
    });
}

/// Benchmark encoding a 512-dimension embedding response (Universal Sentence
/// Encoder output size).
fn bench_encode_embedding_response(c: &mut Criterion) {
    let values: Vec<f32> = (0..512).map(|i| (i as f32 * 0.37).sin()).collect();
    let vector = EmbeddingVector::from_f32(&values);

    c.bench_function("encode 512-d embedding response", |b| {
        b.iter(|| {
            let response = MethodResponse::Success(json!(black_box(&vector)));
            let encoded = serde_json::to_string(&response).unwrap();
            assert!(!encoded.is_empty());
        });
    });
}

criterion_group!(
    benches,
    bench_decode_embed_call,
    bench_decode_invalid_call,
    bench_encode_embedding_response,
);
criterion_main!(benches);
