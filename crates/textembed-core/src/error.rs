// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for textembed.

use thiserror::Error;

/// Top-level error type for all textembed operations.
#[derive(Debug, Error)]
pub enum TextEmbedError {
    // -- Argument errors --
    #[error("{0} argument is missing.")]
    MissingArgument(&'static str),

    // -- State errors --
    #[error("TextEmbedder not initialized.")]
    NotInitialized,

    // -- Model runtime --
    #[error("model asset not found: {0}")]
    ModelNotFound(String),

    /// The native runtime raised an error; the message is passed through verbatim.
    #[error("{0}")]
    Runtime(String),

    #[error("model produced no embedding")]
    EmptyEmbedding,

    #[error("embedding has a non-finite value at index {0}")]
    NonFiniteEmbedding(usize),

    #[error("similarity is not a finite number: {0}")]
    InvalidSimilarity(f64),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    #[error("bridge has been detached")]
    Detached,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TextEmbedError>;
