// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// textembed: Core types, error definitions and wire error codes shared
// across all crates.

pub mod codes;
pub mod config;
pub mod error;
pub mod types;

pub use codes::{ErrorCode, MethodError};
pub use config::BridgeConfig;
pub use error::TextEmbedError;
pub use types::*;
