// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end behaviour of the embedder channel as seen by a caller.

mod common;

use std::time::Duration;

use serde_json::{Value, json};

use common::{DIMENSION, ScriptedRuntime};
use textembed_channel::{MethodCall, MethodResponse, TextEmbedderPlugin};
use textembed_core::types::EmbedderState;
use textembed_core::{BridgeConfig, ErrorCode};

fn attach(runtime: &ScriptedRuntime) -> TextEmbedderPlugin {
    TextEmbedderPlugin::attach(BridgeConfig::default(), Box::new(runtime.clone()))
        .expect("attach plugin")
}

fn call(method: &str, arguments: Value) -> MethodCall {
    MethodCall::new(method, arguments)
}

async fn initialize(plugin: &TextEmbedderPlugin) {
    let response = plugin
        .handle(&call("initialize", json!({ "modelPath": "universal_sentence_encoder.tflite" })))
        .await;
    assert_eq!(response, MethodResponse::Success(json!(true)));
}

fn vector(response: MethodResponse) -> Vec<f64> {
    match response {
        MethodResponse::Success(value) => serde_json::from_value(value).expect("list of doubles"),
        other => panic!("expected an embedding, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_arguments_never_reach_the_runtime() {
    let runtime = ScriptedRuntime::default();
    let plugin = attach(&runtime);

    let cases = [
        (call("initialize", json!({})), ErrorCode::InvalidArg),
        (call("initialize", json!({ "modelPath": 7 })), ErrorCode::InvalidArg),
        (call("embedText", Value::Null), ErrorCode::InvalidArg),
        (call("calculateSimilarity", json!({ "text1": "a" })), ErrorCode::InvalidArguments),
        (call("calculateSimilarity", json!({})), ErrorCode::InvalidArguments),
    ];
    for (call, expected) in cases {
        let response = plugin.handle(&call).await;
        assert_eq!(response.error_code(), Some(expected), "{}", call.method);
    }
    assert_eq!(runtime.native_calls(), 0);
}

#[tokio::test]
async fn calls_before_initialize_are_not_initialized() {
    let plugin = attach(&ScriptedRuntime::default());

    let embed = plugin.handle(&call("embedText", json!({ "text": "hello" }))).await;
    let similarity = plugin
        .handle(&call("calculateSimilarity", json!({ "text1": "a", "text2": "b" })))
        .await;

    assert_eq!(embed.error_code(), Some(ErrorCode::NotInitialized));
    assert_eq!(similarity.error_code(), Some(ErrorCode::NotInitialized));
}

#[tokio::test]
async fn state_follows_initialize_and_close() {
    let plugin = attach(&ScriptedRuntime::default());
    assert_eq!(plugin.state().await.unwrap(), EmbedderState::Uninitialized);

    initialize(&plugin).await;
    assert_eq!(plugin.state().await.unwrap(), EmbedderState::Ready);

    let closed = plugin.handle(&call("close", Value::Null)).await;
    assert_eq!(closed, MethodResponse::Success(Value::Null));
    assert_eq!(plugin.state().await.unwrap(), EmbedderState::Uninitialized);

    let embed = plugin.handle(&call("embedText", json!({ "text": "after close" }))).await;
    assert_eq!(embed.error_code(), Some(ErrorCode::NotInitialized));
}

#[tokio::test]
async fn initialize_failure_reports_initialization_error() {
    let plugin = attach(&ScriptedRuntime::default());
    let response = plugin
        .handle(&call("initialize", json!({ "modelPath": "model.bin" })))
        .await;

    let MethodResponse::Error(error) = response else {
        panic!("expected an error");
    };
    assert_eq!(error.code, ErrorCode::InitializationError);
    assert!(error.message.contains("Input file is not a TFLite model: model.bin"));
    assert_eq!(plugin.state().await.unwrap(), EmbedderState::Uninitialized);
}

#[tokio::test]
async fn repeated_initialize_releases_the_previous_model() {
    let runtime = ScriptedRuntime::default();
    let plugin = attach(&runtime);

    initialize(&plugin).await;
    initialize(&plugin).await;

    assert_eq!(runtime.closes(), 1);
    assert_eq!(plugin.state().await.unwrap(), EmbedderState::Ready);
}

#[tokio::test]
async fn embedding_is_deterministic() {
    let plugin = attach(&ScriptedRuntime::default());
    initialize(&plugin).await;

    let text = json!({ "text": "On-device embeddings stay on the device." });
    let first = vector(plugin.handle(&call("embedText", text.clone())).await);
    let second = vector(plugin.handle(&call("embedText", text)).await);

    assert_eq!(first.len(), DIMENSION);
    assert_eq!(first.len(), second.len());
    assert!(first.iter().zip(&second).all(|(a, b)| a.to_bits() == b.to_bits()));
}

#[tokio::test]
async fn self_similarity_is_one() {
    let plugin = attach(&ScriptedRuntime::default());
    initialize(&plugin).await;

    let response = plugin
        .handle(&call(
            "calculateSimilarity",
            json!({ "text1": "a cat sat on the mat", "text2": "a cat sat on the mat" }),
        ))
        .await;
    let MethodResponse::Success(Value::Number(score)) = response else {
        panic!("expected a score, got {response:?}");
    };
    let score = score.as_f64().unwrap();
    assert!((score - 1.0).abs() < 1e-6, "score was {score}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_complete_in_submission_order() {
    let runtime = ScriptedRuntime {
        embed_delay: Duration::from_millis(10),
        ..Default::default()
    };
    let plugin = attach(&runtime);
    initialize(&plugin).await;

    let texts = ["alpha", "beta", "gamma", "delta"];
    let pending: Vec<_> = texts
        .iter()
        .map(|t| plugin.handle(&call("embedText", json!({ "text": t }))))
        .collect();

    // Await from independent tasks; the worker still runs them in order.
    let tasks: Vec<_> = pending.into_iter().map(tokio::spawn).collect();
    for task in tasks.into_iter().rev() {
        assert!(task.await.unwrap().is_success());
    }

    let expected: Vec<String> = texts
        .iter()
        .flat_map(|t| [format!(">{t}"), format!("<{t}")])
        .collect();
    assert_eq!(runtime.trace(), expected);
}

#[tokio::test]
async fn detach_with_no_pending_work_releases_cleanly() {
    let runtime = ScriptedRuntime::default();
    let mut plugin = attach(&runtime);
    initialize(&plugin).await;

    plugin.detach().await.expect("detach");
    assert_eq!(runtime.closes(), 1);
}

#[tokio::test]
async fn detach_runs_after_queued_work() {
    let runtime = ScriptedRuntime {
        embed_delay: Duration::from_millis(20),
        ..Default::default()
    };
    let mut plugin = attach(&runtime);
    initialize(&plugin).await;

    let in_flight = plugin.handle(&call("embedText", json!({ "text": "in flight" })));
    plugin.detach().await.expect("detach");

    assert!(in_flight.await.is_success());
    assert_eq!(runtime.closes(), 1);
}

#[tokio::test]
async fn unknown_methods_are_not_implemented() {
    let runtime = ScriptedRuntime::default();
    let plugin = attach(&runtime);
    let response = plugin.handle(&call("classifyText", json!({ "text": "x" }))).await;
    assert_eq!(response, MethodResponse::NotImplemented);
    assert_eq!(runtime.native_calls(), 0);
}
