// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire shapes for the embedder channel and decoding of calls into operations.
//
// A call is decoded exactly once, here, into a closed `Operation`. Argument
// validation happens during decoding, so a call with a missing or mistyped
// argument is answered before anything reaches the worker or the runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use textembed_core::codes::{MethodError, method_error};
use textembed_core::error::TextEmbedError;
use textembed_core::types::Method;

/// An incoming call: `{ "method": ..., "arguments": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    /// Argument map. `null` or absent for methods that take none.
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// A string argument, or `None` when absent or not a string.
    pub fn string_argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// The answer to one call. Exactly one is produced per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodResponse {
    /// Success payload, typed per method (`true`, list of doubles, double, `null`).
    Success(Value),
    Error(MethodError),
    /// The method name is not part of the channel.
    NotImplemented,
}

impl MethodResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error code, if this is an error response.
    pub fn error_code(&self) -> Option<textembed_core::ErrorCode> {
        match self {
            Self::Error(e) => Some(e.code),
            _ => None,
        }
    }
}

/// A validated call.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Initialize { model_path: String },
    EmbedText { text: String },
    CalculateSimilarity { text1: String, text2: String },
    Close,
}

/// Why a call could not be turned into an [`Operation`].
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    UnknownMethod(String),
    InvalidArguments(MethodError),
}

impl DecodeError {
    /// The response the caller receives for this decode failure.
    pub fn into_response(self) -> MethodResponse {
        match self {
            Self::UnknownMethod(_) => MethodResponse::NotImplemented,
            Self::InvalidArguments(e) => MethodResponse::Error(e),
        }
    }
}

impl Operation {
    /// Decode and validate a call.
    pub fn decode(call: &MethodCall) -> Result<Self, DecodeError> {
        let method = Method::from_name(&call.method)
            .ok_or_else(|| DecodeError::UnknownMethod(call.method.clone()))?;

        let required = |key: &'static str| -> Result<String, DecodeError> {
            call.string_argument(key).map(str::to_owned).ok_or_else(|| {
                DecodeError::InvalidArguments(method_error(
                    method,
                    &TextEmbedError::MissingArgument(key),
                ))
            })
        };

        Ok(match method {
            Method::Initialize => Self::Initialize {
                model_path: required("modelPath")?,
            },
            Method::EmbedText => Self::EmbedText {
                text: required("text")?,
            },
            Method::CalculateSimilarity => Self::CalculateSimilarity {
                text1: required("text1")?,
                text2: required("text2")?,
            },
            Method::Close => Self::Close,
        })
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Initialize { .. } => Method::Initialize,
            Self::EmbedText { .. } => Method::EmbedText,
            Self::CalculateSimilarity { .. } => Method::CalculateSimilarity,
            Self::Close => Method::Close,
        }
    }
}
