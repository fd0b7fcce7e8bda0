// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process fake of the native runtime for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use textembed_bridge::{AssetResolver, ModelRuntime, NativeTextEmbedder, PlatformBridge};
use textembed_core::error::{Result, TextEmbedError};
use textembed_core::types::{Embedding, EmbeddingResult};

#[derive(Default)]
struct Counters {
    created: AtomicUsize,
    closed: AtomicUsize,
    events: Mutex<Vec<String>>,
}

/// Deterministic fake runtime.
///
/// Paths containing `missing` do not resolve, paths containing `corrupt`
/// fail to load. Embeddings are a fixed-size byte histogram of the text.
#[derive(Clone)]
pub struct FakeBridge {
    counters: Arc<Counters>,
    heads: usize,
    quantized: bool,
    failing_close: bool,
    non_finite: bool,
    nan_similarity: bool,
    delay: Duration,
}

impl FakeBridge {
    pub const DIMENSION: usize = 8;

    pub fn new() -> Self {
        Self {
            counters: Arc::default(),
            heads: 1,
            quantized: false,
            failing_close: false,
            non_finite: false,
            nan_similarity: false,
            delay: Duration::ZERO,
        }
    }

    pub fn with_heads(mut self, heads: usize) -> Self {
        self.heads = heads;
        self
    }

    pub fn quantized(mut self) -> Self {
        self.quantized = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.failing_close = true;
        self
    }

    /// Embeddings carry NaN at index 1 and +inf at index 2.
    pub fn non_finite(mut self) -> Self {
        self.non_finite = true;
        self
    }

    /// `cosine_similarity` answers NaN.
    pub fn nan_similarity(mut self) -> Self {
        self.nan_similarity = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn created(&self) -> usize {
        self.counters.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// `start:<text>` / `end:<text>` markers in the order embeds ran.
    pub fn events(&self) -> Vec<String> {
        self.counters.events.lock().expect("events lock poisoned").clone()
    }
}

fn histogram(text: &str) -> Vec<f32> {
    let mut v = vec![1.0f32; FakeBridge::DIMENSION];
    for (i, b) in text.bytes().enumerate() {
        v[(i + b as usize) % FakeBridge::DIMENSION] += f32::from(b) / 255.0;
    }
    v
}

impl PlatformBridge for FakeBridge {
    fn platform_name(&self) -> &str {
        "Fake"
    }
}

impl AssetResolver for FakeBridge {
    fn resolve_model(&self, requested: &str) -> Result<String> {
        if requested.contains("missing") {
            return Err(TextEmbedError::ModelNotFound(requested.to_owned()));
        }
        Ok(format!("/fake/{requested}"))
    }
}

impl ModelRuntime for FakeBridge {
    fn create_embedder(&self, model_path: &str) -> Result<Box<dyn NativeTextEmbedder>> {
        if model_path.contains("corrupt") {
            return Err(TextEmbedError::Runtime("Unable to open zip archive.".into()));
        }
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEmbedder {
            bridge: self.clone(),
        }))
    }

    fn cosine_similarity(&self, a: &Embedding, b: &Embedding) -> Result<f64> {
        if self.nan_similarity {
            return Ok(f64::NAN);
        }
        let (Some(a), Some(b)) = (&a.float_embedding, &b.float_embedding) else {
            return Err(TextEmbedError::Runtime("float embeddings required".into()));
        };
        if a.len() != b.len() {
            return Err(TextEmbedError::Runtime("dimension mismatch".into()));
        }
        let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
        let na: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
        let nb: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
        Ok(dot / (na * nb))
    }
}

struct FakeEmbedder {
    bridge: FakeBridge,
}

impl NativeTextEmbedder for FakeEmbedder {
    fn embed(&mut self, text: &str) -> Result<EmbeddingResult> {
        let events = &self.bridge.counters.events;
        events.lock().expect("events lock poisoned").push(format!("start:{text}"));
        if !self.bridge.delay.is_zero() {
            std::thread::sleep(self.bridge.delay);
        }

        let mut values = histogram(text);
        if self.bridge.non_finite {
            values[1] = f32::NAN;
            values[2] = f32::INFINITY;
        }
        let embeddings = (0..self.bridge.heads)
            .map(|head| Embedding {
                float_embedding: (!self.bridge.quantized).then(|| values.clone()),
                quantized_embedding: self
                    .bridge
                    .quantized
                    .then(|| values.iter().map(|v| (*v * 16.0) as i8).collect()),
                head_index: head as i32,
                head_name: None,
            })
            .collect();

        events.lock().expect("events lock poisoned").push(format!("end:{text}"));
        Ok(EmbeddingResult {
            embeddings,
            timestamp_ms: None,
        })
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.bridge.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.bridge.failing_close {
            return Err(TextEmbedError::Runtime("graph still running".into()));
        }
        Ok(())
    }
}
