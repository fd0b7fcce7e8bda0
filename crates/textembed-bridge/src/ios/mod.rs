// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// iOS model runtime via objc2.
//
// Requires the `MediaPipeTasksText` framework to be linked into the app
// (CocoaPods `MediaPipeTasksText`). Every runtime call is an Objective-C
// message send to `MPPTextEmbedder` and its result containers.
//
// This module is cfg-gated to `target_os = "ios"` and will not compile on
// other platforms. Nothing here touches UIKit, so there is no main-thread
// requirement; calls arrive on the facade's serial worker thread.
//
// ## Unsafe code
//
// 1. **ObjC message sends** (`msg_send!`): required by the objc2 runtime.
//    Selectors match the public MediaPipe Tasks headers
//    (`MPPTextEmbedder.h`, `MPPEmbedding.h`, `MPPEmbeddingResult.h`).
// 2. **`Send` for the embedder handle**: `MPPTextEmbedder` is not marked
//    thread-safe, but the facade only ever touches a handle from its one
//    worker thread, so moving it there once is sound.

#![cfg(target_os = "ios")]

use objc2::rc::{Allocated, Retained};
use objc2::runtime::AnyObject;
use objc2::{class, msg_send};
use objc2_foundation::{NSArray, NSBundle, NSError, NSNumber, NSString};

use textembed_core::error::{Result, TextEmbedError};
use textembed_core::types::{Embedding, EmbeddingResult};

use crate::traits::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Human-readable message of an `NSError` (`localizedDescription`).
fn ns_error_message(error: &NSError) -> String {
    error.localizedDescription().to_string()
}

/// Split `universal_sentence_encoder.tflite` into `("universal_sentence_encoder", Some("tflite"))`.
///
/// Only the final path component is considered, so callers may pass either
/// a bare asset name or a Flutter asset path such as `assets/models/x.tflite`.
fn split_asset_name(requested: &str) -> (&str, Option<&str>) {
    let file = requested.rsplit('/').next().unwrap_or(requested);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file, None),
    }
}

/// Look a resource up in the main bundle.
fn bundle_path(name: &str) -> Option<String> {
    let (stem, ext) = split_asset_name(name);
    let ns_stem = NSString::from_str(stem);
    let ns_ext = ext.map(NSString::from_str);
    let bundle = NSBundle::mainBundle();
    bundle
        .pathForResource_ofType(Some(&ns_stem), ns_ext.as_deref())
        .map(|p| p.to_string())
}

/// Read an `NSArray<NSNumber>` of floats.
fn read_float_array(array: &NSArray<NSNumber>) -> Vec<f32> {
    array.iter().map(|n| n.floatValue()).collect()
}

/// Read an `NSArray<NSNumber>` of signed bytes.
fn read_byte_array(array: &NSArray<NSNumber>) -> Vec<i8> {
    array.iter().map(|n| n.charValue() as i8).collect()
}

/// Convert an `MPPEmbedding` into the core type.
fn read_embedding(embedding: &AnyObject) -> Embedding {
    // SAFETY: MPPEmbedding properties, see MPPEmbedding.h. Both arrays are
    // nullable; headIndex is NSInteger; headName is nullable.
    unsafe {
        let floats: Option<Retained<NSArray<NSNumber>>> = msg_send![embedding, floatEmbedding];
        let quantized: Option<Retained<NSArray<NSNumber>>> =
            msg_send![embedding, quantizedEmbedding];
        let head_index: isize = msg_send![embedding, headIndex];
        let head_name: Option<Retained<NSString>> = msg_send![embedding, headName];

        Embedding {
            float_embedding: floats.map(|a| read_float_array(&a)),
            quantized_embedding: quantized.map(|a| read_byte_array(&a)),
            head_index: head_index as i32,
            head_name: head_name.map(|n| n.to_string()),
        }
    }
}

/// Rebuild an `MPPEmbedding` for `cosineSimilarityBetweenEmbedding1:andEmbedding2:error:`.
fn new_mpp_embedding(embedding: &Embedding) -> Result<Retained<AnyObject>> {
    let floats: Option<Retained<NSArray<NSNumber>>> = embedding.float_embedding.as_ref().map(|v| {
        let numbers: Vec<Retained<NSNumber>> = v.iter().map(|f| NSNumber::new_f32(*f)).collect();
        NSArray::from_retained_slice(&numbers)
    });
    let quantized: Option<Retained<NSArray<NSNumber>>> =
        embedding.quantized_embedding.as_ref().map(|v| {
            let numbers: Vec<Retained<NSNumber>> =
                v.iter().map(|b| NSNumber::new_i8(*b)).collect();
            NSArray::from_retained_slice(&numbers)
        });
    let head_name = embedding.head_name.as_deref().map(NSString::from_str);

    // SAFETY: designated initializer from MPPEmbedding.h:
    // -initWithFloatEmbedding:quantizedEmbedding:headIndex:headName:
    let created: Option<Retained<AnyObject>> = unsafe {
        let alloc: Allocated<AnyObject> = msg_send![class!(MPPEmbedding), alloc];
        msg_send![
            alloc,
            initWithFloatEmbedding: floats.as_deref(),
            quantizedEmbedding: quantized.as_deref(),
            headIndex: embedding.head_index as isize,
            headName: head_name.as_deref()
        ]
    };
    created.ok_or_else(|| TextEmbedError::Bridge("MPPEmbedding init returned nil".into()))
}

// ---------------------------------------------------------------------------
// IosBridge
// ---------------------------------------------------------------------------

/// Concrete iOS model runtime.
pub struct IosBridge {
    /// Bundle asset used when the caller's path does not resolve.
    default_asset: String,
}

impl IosBridge {
    /// Create a new iOS bridge that falls back to `default_asset`.
    pub fn new(default_asset: &str) -> Self {
        Self {
            default_asset: default_asset.to_owned(),
        }
    }
}

impl PlatformBridge for IosBridge {
    fn platform_name(&self) -> &str {
        "iOS"
    }
}

impl AssetResolver for IosBridge {
    /// Resolution order: an existing file path, then a bundle resource named
    /// like the request, then the bundled default model.
    fn resolve_model(&self, requested: &str) -> Result<String> {
        if requested.starts_with('/') && std::path::Path::new(requested).is_file() {
            return Ok(requested.to_owned());
        }
        if let Some(path) = bundle_path(requested) {
            return Ok(path);
        }
        if let Some(path) = bundle_path(&self.default_asset) {
            tracing::warn!(
                requested,
                fallback = %self.default_asset,
                "iOS: requested model not in bundle, using default asset"
            );
            return Ok(path);
        }
        Err(TextEmbedError::ModelNotFound(requested.to_owned()))
    }
}

impl ModelRuntime for IosBridge {
    /// `-[MPPTextEmbedder initWithModelPath:error:]`.
    fn create_embedder(&self, model_path: &str) -> Result<Box<dyn NativeTextEmbedder>> {
        tracing::info!(model_path, "iOS: creating MPPTextEmbedder");

        let ns_path = NSString::from_str(model_path);
        // SAFETY: convenience initializer from MPPTextEmbedder.h; returns nil
        // and fills the error out-parameter on failure.
        let embedder: std::result::Result<Retained<AnyObject>, Retained<NSError>> = unsafe {
            let alloc: Allocated<AnyObject> = msg_send![class!(MPPTextEmbedder), alloc];
            msg_send![alloc, initWithModelPath: &*ns_path, error: _]
        };
        let embedder = embedder.map_err(|e| TextEmbedError::Runtime(ns_error_message(&e)))?;

        Ok(Box::new(IosTextEmbedder {
            embedder: Some(embedder),
        }))
    }

    /// `+[MPPTextEmbedder cosineSimilarityBetweenEmbedding1:andEmbedding2:error:]`.
    fn cosine_similarity(&self, a: &Embedding, b: &Embedding) -> Result<f64> {
        let mpp_a = new_mpp_embedding(a)?;
        let mpp_b = new_mpp_embedding(b)?;

        // SAFETY: class method from MPPTextEmbedder.h returning a nullable
        // NSNumber with an NSError out-parameter.
        let similarity: std::result::Result<Retained<NSNumber>, Retained<NSError>> = unsafe {
            msg_send![
                class!(MPPTextEmbedder),
                cosineSimilarityBetweenEmbedding1: &*mpp_a,
                andEmbedding2: &*mpp_b,
                error: _
            ]
        };
        similarity
            .map(|n| n.doubleValue())
            .map_err(|e| TextEmbedError::Runtime(ns_error_message(&e)))
    }
}

// ---------------------------------------------------------------------------
// Loaded model handle
// ---------------------------------------------------------------------------

/// A live `MPPTextEmbedder`.
pub struct IosTextEmbedder {
    embedder: Option<Retained<AnyObject>>,
}

// SAFETY: see the module notes; the facade confines each handle to its
// serial worker thread after the single move that installs it.
unsafe impl Send for IosTextEmbedder {}

impl NativeTextEmbedder for IosTextEmbedder {
    /// `-[MPPTextEmbedder embedText:error:]`, then `.embeddingResult.embeddings`.
    fn embed(&mut self, text: &str) -> Result<EmbeddingResult> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(TextEmbedError::NotInitialized)?;
        let ns_text = NSString::from_str(text);

        // SAFETY: instance method from MPPTextEmbedder.h returning a
        // nullable MPPTextEmbedderResult with an NSError out-parameter.
        let result: std::result::Result<Retained<AnyObject>, Retained<NSError>> =
            unsafe { msg_send![&**embedder, embedText: &*ns_text, error: _] };
        let result = result.map_err(|e| TextEmbedError::Runtime(ns_error_message(&e)))?;

        // SAFETY: MPPTextEmbedderResult.embeddingResult (nonnull) and
        // MPPEmbeddingResult.embeddings (nonnull NSArray<MPPEmbedding *>),
        // timestampInMilliseconds (NSInteger) from MPPTaskResult.
        let (embeddings, timestamp_ms) = unsafe {
            let container: Retained<AnyObject> = msg_send![&*result, embeddingResult];
            let list: Retained<NSArray<AnyObject>> = msg_send![&*container, embeddings];
            let timestamp: isize = msg_send![&*result, timestampInMilliseconds];
            let embeddings: Vec<Embedding> = list.iter().map(|e| read_embedding(&e)).collect();
            (embeddings, timestamp as i64)
        };

        if let Some(first) = embeddings.first() {
            if let Some(floats) = &first.float_embedding {
                tracing::debug!(dimension = floats.len(), "iOS: embedding computed");
            }
        }

        Ok(EmbeddingResult {
            embeddings,
            timestamp_ms: Some(timestamp_ms),
        })
    }

    /// MPPTextEmbedder has no explicit close; releasing the last reference
    /// frees the underlying graph.
    fn close(mut self: Box<Self>) -> Result<()> {
        drop(self.embedder.take());
        tracing::info!("iOS: MPPTextEmbedder released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_name_splitting() {
        assert_eq!(
            split_asset_name("universal_sentence_encoder.tflite"),
            ("universal_sentence_encoder", Some("tflite"))
        );
        assert_eq!(
            split_asset_name("assets/models/bert.tflite"),
            ("bert", Some("tflite"))
        );
        assert_eq!(split_asset_name("model"), ("model", None));
    }
}
