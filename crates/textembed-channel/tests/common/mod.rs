// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted runtime shared by the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use textembed_bridge::{AssetResolver, ModelRuntime, NativeTextEmbedder, PlatformBridge};
use textembed_core::error::{Result, TextEmbedError};
use textembed_core::types::{Embedding, EmbeddingResult};

pub const DIMENSION: usize = 16;

/// Counts every native call and records embed calls in execution order.
#[derive(Clone, Default)]
pub struct ScriptedRuntime {
    pub native_calls: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub trace: Arc<Mutex<Vec<String>>>,
    pub embed_delay: Duration,
}

impl ScriptedRuntime {
    pub fn native_calls(&self) -> usize {
        self.native_calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().unwrap().clone()
    }
}

impl PlatformBridge for ScriptedRuntime {
    fn platform_name(&self) -> &str {
        "Scripted"
    }
}

impl AssetResolver for ScriptedRuntime {
    fn resolve_model(&self, requested: &str) -> Result<String> {
        Ok(requested.to_owned())
    }
}

impl ModelRuntime for ScriptedRuntime {
    fn create_embedder(&self, model_path: &str) -> Result<Box<dyn NativeTextEmbedder>> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        if !model_path.ends_with(".tflite") {
            return Err(TextEmbedError::Runtime(format!(
                "Input file is not a TFLite model: {model_path}"
            )));
        }
        Ok(Box::new(ScriptedEmbedder {
            runtime: self.clone(),
        }))
    }

    fn cosine_similarity(&self, a: &Embedding, b: &Embedding) -> Result<f64> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        let a = a.float_embedding.as_deref().unwrap_or_default();
        let b = b.float_embedding.as_deref().unwrap_or_default();
        let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(x * y)).sum();
        let norm = |v: &[f32]| v.iter().map(|x| f64::from(x * x)).sum::<f64>().sqrt();
        Ok(dot / (norm(a) * norm(b)))
    }
}

struct ScriptedEmbedder {
    runtime: ScriptedRuntime,
}

impl NativeTextEmbedder for ScriptedEmbedder {
    fn embed(&mut self, text: &str) -> Result<EmbeddingResult> {
        self.runtime.native_calls.fetch_add(1, Ordering::SeqCst);
        self.runtime.trace.lock().unwrap().push(format!(">{text}"));
        std::thread::sleep(self.runtime.embed_delay);

        let mut values = vec![0.5f32; DIMENSION];
        for (i, c) in text.chars().enumerate() {
            values[i % DIMENSION] += (c as u32 % 97) as f32 / 97.0;
        }

        self.runtime.trace.lock().unwrap().push(format!("<{text}"));
        Ok(EmbeddingResult {
            embeddings: vec![Embedding::from_floats(values)],
            timestamp_ms: Some(0),
        })
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.runtime.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
