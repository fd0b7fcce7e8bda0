// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native model runtime.
//
// The runtime itself (model loading, tokenization, inference, cosine
// similarity) lives in the vendored MediaPipe library. These traits are the
// narrow seam the embedder facade calls through.

use textembed_core::error::Result;
use textembed_core::types::{Embedding, EmbeddingResult};

/// Everything the facade needs from one platform.
pub trait PlatformBridge: ModelRuntime + AssetResolver {
    /// Human-readable platform name (e.g. "Android", "iOS").
    fn platform_name(&self) -> &str;
}

/// Loads models and compares embeddings.
pub trait ModelRuntime: Send + Sync {
    /// Load the model at `model_path` and return a live embedder handle.
    ///
    /// Fails with `TextEmbedError::Runtime` carrying the native message when
    /// the file is missing, unreadable, or not a text embedding model.
    fn create_embedder(&self, model_path: &str) -> Result<Box<dyn NativeTextEmbedder>>;

    /// Cosine similarity as computed by the runtime.
    ///
    /// Both embeddings must come from the same model head; mismatched
    /// dimensions are reported by the runtime as an error.
    fn cosine_similarity(&self, a: &Embedding, b: &Embedding) -> Result<f64>;
}

/// A loaded model instance.
///
/// Handles are used from exactly one thread at a time (the serial worker),
/// so implementations only need to be `Send`.
pub trait NativeTextEmbedder: Send {
    /// Run the model on `text`.
    fn embed(&mut self, text: &str) -> Result<EmbeddingResult>;

    /// Release the native instance. The handle is consumed either way.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Maps the model path supplied by the caller to something the runtime can open.
pub trait AssetResolver: Send + Sync {
    /// Resolve `requested` to a path or asset name for [`ModelRuntime::create_embedder`].
    ///
    /// Returns `TextEmbedError::ModelNotFound` when nothing matches.
    fn resolve_model(&self, requested: &str) -> Result<String>;
}
