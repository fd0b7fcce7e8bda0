// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the text embedding bridge.

use serde::{Deserialize, Serialize};

/// One embedding produced by a single model head.
///
/// Mirrors the runtime's container: a model emits either a float or a
/// quantized vector per head, depending on its output options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// Float vector, present unless the model was asked to quantize.
    pub float_embedding: Option<Vec<f32>>,
    /// Scalar-quantized vector, present when quantization is enabled.
    pub quantized_embedding: Option<Vec<i8>>,
    /// Index of the output head that produced this embedding.
    pub head_index: i32,
    /// Name of the output head, if the model metadata carries one.
    pub head_name: Option<String>,
}

impl Embedding {
    /// Build a float embedding for head 0.
    pub fn from_floats(values: Vec<f32>) -> Self {
        Self {
            float_embedding: Some(values),
            quantized_embedding: None,
            head_index: 0,
            head_name: None,
        }
    }
}

/// Everything the runtime returns for one `embed` call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddingResult {
    /// One entry per model output head, in head order.
    pub embeddings: Vec<Embedding>,
    pub timestamp_ms: Option<i64>,
}

impl EmbeddingResult {
    /// The embedding from the first output head, if any.
    pub fn first(&self) -> Option<&Embedding> {
        self.embeddings.first()
    }
}

/// The vector handed back to the caller of `embedText`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(pub Vec<f64>);

impl EmbeddingVector {
    /// Widen a float embedding to doubles, preserving order.
    pub fn from_f32(values: &[f32]) -> Self {
        Self(values.iter().map(|v| f64::from(*v)).collect())
    }

    /// Number of dimensions (fixed by the loaded model).
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Cosine similarity between two embeddings, in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarityScore(pub f64);

impl SimilarityScore {
    pub fn value(self) -> f64 {
        self.0
    }

    /// Similarity as a percentage, the way it is shown in logs.
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }
}

/// Methods understood on the embedder channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    Initialize,
    EmbedText,
    CalculateSimilarity,
    Close,
}

impl Method {
    /// All methods, in the order they are documented.
    pub const ALL: [Method; 4] = [
        Method::Initialize,
        Method::EmbedText,
        Method::CalculateSimilarity,
        Method::Close,
    ];

    /// Name used on the channel.
    pub fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::EmbedText => "embedText",
            Self::CalculateSimilarity => "calculateSimilarity",
            Self::Close => "close",
        }
    }

    /// Look up a method by its channel name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle state of the embedder facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedderState {
    /// No model loaded; embedding calls fail with `NOT_INITIALIZED`.
    Uninitialized,
    /// A model is loaded and ready for embedding calls.
    Ready,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_preserves_order_and_dimension() {
        let v = EmbeddingVector::from_f32(&[0.5, -0.25, 1.0]);
        assert_eq!(v.dimension(), 3);
        assert_eq!(v.as_slice(), &[0.5, -0.25, 1.0]);
    }

    #[test]
    fn first_of_empty_result_is_none() {
        assert!(EmbeddingResult::default().first().is_none());
    }

    #[test]
    fn vector_serializes_as_plain_list() {
        let v = EmbeddingVector(vec![1.0, 2.0]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1.0,2.0]");
    }

    #[test]
    fn method_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()), Some(method));
        }
        assert_eq!(Method::from_name("embed_text"), None);
    }

    #[test]
    fn score_percent() {
        assert_eq!(SimilarityScore(0.5).percent(), 50.0);
    }
}
