// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// textembed: Native model runtime bridge.
//
// Defines the traits the embedder facade calls into and picks the concrete
// implementation for the target OS: MediaPipe through JNI on Android,
// MediaPipe through Objective-C message sends on iOS, and a stub everywhere
// else so desktop and CI builds still link.

pub mod traits;

#[cfg(target_os = "ios")]
pub mod ios;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(any(target_os = "ios", target_os = "android")))]
pub mod stub;

use textembed_core::BridgeConfig;

pub use traits::{AssetResolver, ModelRuntime, NativeTextEmbedder, PlatformBridge};

/// Returns the bridge implementation for the target operating system.
///
/// Each call creates a fresh bridge; bridges hold no model state of their
/// own, so one per channel adapter is fine.
pub fn platform_bridge(config: &BridgeConfig) -> Box<dyn PlatformBridge> {
    #[cfg(target_os = "ios")]
    {
        Box::new(ios::IosBridge::new(&config.default_model_asset))
    }
    #[cfg(target_os = "android")]
    {
        let _ = config;
        Box::new(android::AndroidBridge::new())
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        let _ = config;
        Box::new(stub::StubBridge)
    }
}
