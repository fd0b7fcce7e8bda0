// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire-level error codes and the mapping from internal errors to them.
//
// Callers on the far side of the channel only ever see a stable code plus a
// human-readable message. Which code a failure gets depends on the method
// that produced it: a runtime error while embedding is `EMBEDDING_ERROR`
// for `embedText` but `SIMILARITY_FAILED` for `calculateSimilarity`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TextEmbedError;
use crate::types::Method;

/// Every error code the bridge can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A required argument of `initialize`/`embedText` is absent or not a string.
    InvalidArg,
    /// A required argument of `calculateSimilarity` is absent or not a string.
    InvalidArguments,
    /// An embedding call arrived while no model is loaded.
    NotInitialized,
    /// The requested model asset could not be located on the device.
    ModelNotFound,
    /// The runtime failed to load the model.
    InitializationError,
    /// `embedText` failed or the model produced nothing.
    EmbeddingError,
    /// `calculateSimilarity` could not obtain one of its embeddings.
    NoEmbedding,
    /// `calculateSimilarity` failed inside the runtime.
    SimilarityFailed,
    /// Releasing the model failed.
    CloseError,
    /// The bridge was torn down before the call could run.
    BridgeDetached,
    /// The request envelope itself could not be decoded.
    InvalidRequest,
}

impl ErrorCode {
    /// The code string sent over the channel.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArg => "INVALID_ARG",
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::ModelNotFound => "MODEL_NOT_FOUND",
            Self::InitializationError => "INITIALIZATION_ERROR",
            Self::EmbeddingError => "EMBEDDING_ERROR",
            Self::NoEmbedding => "NO_EMBEDDING",
            Self::SimilarityFailed => "SIMILARITY_FAILED",
            Self::CloseError => "CLOSE_ERROR",
            Self::BridgeDetached => "BRIDGE_DETACHED",
            Self::InvalidRequest => "INVALID_REQUEST",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error delivered to the caller: `(code, message, details)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl MethodError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MethodError {}

/// Convert an internal error raised while serving `method` into the
/// structured error the caller sees.
pub fn method_error(method: Method, err: &TextEmbedError) -> MethodError {
    match (method, err) {
        // Lifecycle and state errors read the same for every method.
        (_, TextEmbedError::Detached) => MethodError::new(
            ErrorCode::BridgeDetached,
            "Text embedder bridge has been detached.",
        ),
        (_, TextEmbedError::NotInitialized) => {
            MethodError::new(ErrorCode::NotInitialized, "TextEmbedder not initialized.")
        }

        // -- Argument errors --
        (Method::CalculateSimilarity, TextEmbedError::MissingArgument(_)) => MethodError::new(
            ErrorCode::InvalidArguments,
            "Both text1 and text2 are required.",
        ),
        (_, TextEmbedError::MissingArgument(name)) => {
            MethodError::new(ErrorCode::InvalidArg, format!("{name} argument is missing."))
        }

        // -- initialize --
        (Method::Initialize, TextEmbedError::ModelNotFound(name)) => MethodError::new(
            ErrorCode::ModelNotFound,
            format!("Model file not found: {name}"),
        )
        .with_details(serde_json::json!({ "modelPath": name })),
        (Method::Initialize, other) => MethodError::new(
            ErrorCode::InitializationError,
            format!("Failed to initialize MediaPipe: {other}"),
        ),

        // -- embedText --
        (Method::EmbedText, TextEmbedError::EmptyEmbedding) => MethodError::new(
            ErrorCode::EmbeddingError,
            "Model failed to produce an embedding.",
        ),
        (Method::EmbedText, other) => MethodError::new(
            ErrorCode::EmbeddingError,
            format!("Failed to embed text: {other}"),
        ),

        // -- calculateSimilarity --
        (Method::CalculateSimilarity, TextEmbedError::EmptyEmbedding) => {
            MethodError::new(ErrorCode::NoEmbedding, "Failed to generate embeddings.")
        }
        (Method::CalculateSimilarity, other) => MethodError::new(
            ErrorCode::SimilarityFailed,
            format!("Failed to calculate similarity: {other}"),
        ),

        // -- close --
        (Method::Close, other) => MethodError::new(
            ErrorCode::CloseError,
            format!("Error closing TextEmbedder: {other}"),
        ),
    }
}
