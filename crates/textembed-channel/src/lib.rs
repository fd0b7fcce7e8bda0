// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// textembed Channel: the method-channel contract for the on-device text
// embedder. Calls are decoded once at the boundary, run one at a time on a
// dedicated worker thread that owns the embedder, and answered with either
// a value or a structured `(code, message, details)` error.

pub mod codec;
pub mod facade;
pub mod plugin;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use codec::{DecodeError, MethodCall, MethodResponse, Operation};
pub use facade::TextEmbedderFacade;
pub use plugin::{PendingResponse, TextEmbedderPlugin};
pub use worker::{Completion, SerialWorker};
