// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where the MediaPipe runtime is unavailable.
//
// Model loading and similarity return `PlatformUnavailable`; the real
// implementations live in the `ios` and `android` modules.

use textembed_core::error::{Result, TextEmbedError};
use textembed_core::types::Embedding;

use crate::traits::*;

/// No-op bridge returned on non-mobile platforms.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl ModelRuntime for StubBridge {
    fn create_embedder(&self, model_path: &str) -> Result<Box<dyn NativeTextEmbedder>> {
        tracing::warn!(model_path, "ModelRuntime::create_embedder called on stub bridge");
        Err(TextEmbedError::PlatformUnavailable)
    }

    fn cosine_similarity(&self, _a: &Embedding, _b: &Embedding) -> Result<f64> {
        tracing::warn!("ModelRuntime::cosine_similarity called on stub bridge");
        Err(TextEmbedError::PlatformUnavailable)
    }
}

impl AssetResolver for StubBridge {
    /// Paths pass through untouched; there is no bundle to search.
    fn resolve_model(&self, requested: &str) -> Result<String> {
        Ok(requested.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_cannot_load_models() {
        let bridge = StubBridge;
        assert!(matches!(
            bridge.create_embedder("model.tflite"),
            Err(TextEmbedError::PlatformUnavailable)
        ));
    }

    #[test]
    fn stub_resolves_paths_verbatim() {
        assert_eq!(StubBridge.resolve_model("/data/m.tflite").unwrap(), "/data/m.tflite");
    }

    #[test]
    fn platform_bridge_is_the_stub_on_desktop() {
        let bridge = crate::platform_bridge(&textembed_core::BridgeConfig::default());
        assert_eq!(bridge.platform_name(), "Desktop (stub)");
    }
}
