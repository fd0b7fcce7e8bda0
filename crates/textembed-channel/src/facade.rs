// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedder facade: owns at most one loaded model and enforces the
// Uninitialized/Ready state machine around it.
//
// The facade is synchronous and single-owner. It is moved onto
// the serial worker thread at attach time and never shared, so the handle
// inside it is only ever touched from that one thread.

use tracing::{debug, info, instrument, warn};

use textembed_bridge::{NativeTextEmbedder, PlatformBridge};
use textembed_core::error::{Result, TextEmbedError};
use textembed_core::types::{Embedding, EmbedderState, EmbeddingVector, SimilarityScore};

/// Stateful wrapper around one platform runtime and its live handle.
pub struct TextEmbedderFacade {
    platform: Box<dyn PlatformBridge>,
    /// The live embedder, if any. `Some` exactly when the state is Ready.
    handle: Option<Box<dyn NativeTextEmbedder>>,
}

impl TextEmbedderFacade {
    pub fn new(platform: Box<dyn PlatformBridge>) -> Self {
        Self {
            platform,
            handle: None,
        }
    }

    pub fn state(&self) -> EmbedderState {
        if self.handle.is_some() {
            EmbedderState::Ready
        } else {
            EmbedderState::Uninitialized
        }
    }

    /// Load the model at `model_path`, replacing any model already loaded.
    ///
    /// The previous handle is always released first, so a failed
    /// re-initialization leaves the facade Uninitialized rather than
    /// holding on to the old model.
    #[instrument(skip(self), fields(platform = self.platform.platform_name()))]
    pub fn initialize(&mut self, model_path: &str) -> Result<()> {
        if self.handle.is_some() {
            info!("re-initializing: releasing previous embedder");
            self.release();
        }

        let resolved = self.platform.resolve_model(model_path)?;
        let handle = self.platform.create_embedder(&resolved)?;
        self.handle = Some(handle);

        info!(model = %resolved, "text embedder initialized");
        Ok(())
    }

    /// Embed `text` and return the first head's vector, widened to doubles.
    #[instrument(skip_all, fields(chars = text.chars().count()))]
    pub fn embed_text(&mut self, text: &str) -> Result<EmbeddingVector> {
        let embedding = self.first_embedding(text)?;
        let vector = float_vector(&embedding)?;
        debug!(dimension = vector.dimension(), "generated embedding vector");
        Ok(vector)
    }

    /// Cosine similarity of two texts, computed by the runtime.
    ///
    /// Both inputs are embedded independently with the same handle.
    #[instrument(skip_all)]
    pub fn calculate_similarity(&mut self, text1: &str, text2: &str) -> Result<SimilarityScore> {
        let first = self.first_embedding(text1)?;
        let second = self.first_embedding(text2)?;

        let value = self.platform.cosine_similarity(&first, &second)?;
        if !value.is_finite() {
            return Err(TextEmbedError::InvalidSimilarity(value));
        }

        let score = SimilarityScore(value);
        debug!("calculated cosine similarity: {:.2}%", score.percent());
        Ok(score)
    }

    /// Release the loaded model. A no-op when nothing is loaded.
    ///
    /// The handle is consumed even when the runtime reports an error, so the
    /// facade is Uninitialized afterwards either way.
    #[instrument(skip(self))]
    pub fn close(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => {
                handle.close()?;
                info!("text embedder closed");
                Ok(())
            }
            None => {
                debug!("close requested with no embedder loaded");
                Ok(())
            }
        }
    }

    /// Close the current handle, logging rather than returning a failure.
    fn release(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to release embedder: {e}");
        }
    }

    /// Run the model and apply the extraction policy: the first embedding
    /// wins, an empty result is a failure.
    fn first_embedding(&mut self, text: &str) -> Result<Embedding> {
        let handle = self.handle.as_mut().ok_or(TextEmbedError::NotInitialized)?;
        let result = handle.embed(text)?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or(TextEmbedError::EmptyEmbedding)
    }
}

impl Drop for TextEmbedderFacade {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("facade dropped with a live embedder; releasing");
            self.release();
        }
    }
}

/// The float vector of an embedding; quantized-only or empty output is a failure.
///
/// NaN and infinities cannot be carried as JSON numbers, so any non-finite
/// component rejects the whole vector.
fn float_vector(embedding: &Embedding) -> Result<EmbeddingVector> {
    match embedding.float_embedding.as_deref() {
        Some(values) if !values.is_empty() => {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(TextEmbedError::NonFiniteEmbedding(index));
            }
            Ok(EmbeddingVector::from_f32(values))
        }
        _ => Err(TextEmbedError::EmptyEmbedding),
    }
}
