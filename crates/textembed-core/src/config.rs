// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Channel name shared by the Android and iOS hosts.
pub const DEFAULT_CHANNEL_NAME: &str = "mediapipe_text_embedder";

/// Model bundled with the iOS app when the caller's path cannot be resolved.
pub const DEFAULT_MODEL_ASSET: &str = "universal_sentence_encoder.tflite";

/// Settings for one bridge instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the method channel the host registers.
    pub channel_name: String,
    /// Name given to the serial worker thread (shows up in traces and crash dumps).
    pub worker_thread_name: String,
    /// Bundle asset used when the requested model path does not resolve.
    pub default_model_asset: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.into(),
            worker_thread_name: "text-embedder-worker".into(),
            default_model_asset: DEFAULT_MODEL_ASSET.into(),
        }
    }
}

impl BridgeConfig {
    /// Read a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&data)?;
        debug!(path = %path.as_ref().display(), "bridge config loaded");
        Ok(config)
    }

    /// Like [`BridgeConfig::load`], but falls back to defaults when the file
    /// is absent or unreadable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.as_ref().display(), "using default bridge config: {e}");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
