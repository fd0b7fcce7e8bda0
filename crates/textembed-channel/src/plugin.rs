// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge adapter: the method-channel endpoint.
//
// Lifecycle mirrors a host plugin: `attach` when the engine registers the
// channel, `detach` when it goes away. In between, every call is decoded
// and validated on the caller's side, queued onto the serial worker, and
// answered through a `PendingResponse` the caller awaits.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use textembed_bridge::PlatformBridge;
use textembed_core::codes::method_error;
use textembed_core::config::BridgeConfig;
use textembed_core::error::{Result, TextEmbedError};
use textembed_core::types::{EmbedderState, Method};

use crate::codec::{MethodCall, MethodResponse, Operation};
use crate::facade::TextEmbedderFacade;
use crate::worker::{Completion, SerialWorker};

/// One channel endpoint with its own worker and embedder.
///
/// Instances are fully independent; two plugins never share a handle.
pub struct TextEmbedderPlugin {
    config: BridgeConfig,
    platform_name: String,
    worker: Option<SerialWorker>,
}

impl TextEmbedderPlugin {
    /// Register the channel: spawn the worker and hand it a fresh facade.
    #[instrument(skip_all, fields(channel = %config.channel_name))]
    pub fn attach(config: BridgeConfig, platform: Box<dyn PlatformBridge>) -> Result<Self> {
        let platform_name = platform.platform_name().to_owned();
        let facade = TextEmbedderFacade::new(platform);
        let worker = SerialWorker::spawn(&config.worker_thread_name, facade)?;

        info!(platform = %platform_name, "text embedder channel attached");
        Ok(Self {
            config,
            platform_name,
            worker: Some(worker),
        })
    }

    /// Attach using the runtime for the target OS.
    pub fn attach_native(config: BridgeConfig) -> Result<Self> {
        let platform = textembed_bridge::platform_bridge(&config);
        Self::attach(config, platform)
    }

    pub fn channel_name(&self) -> &str {
        &self.config.channel_name
    }

    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }

    pub fn is_attached(&self) -> bool {
        self.worker.is_some()
    }

    /// Answer one channel call.
    ///
    /// Decoding, validation and enqueueing happen before this returns; the
    /// returned future only waits for the worker. Argument errors and
    /// unknown methods resolve immediately without touching the worker.
    pub fn handle(&self, call: &MethodCall) -> PendingResponse {
        match Operation::decode(call) {
            Ok(op) => self.dispatch(op),
            Err(e) => {
                debug!(method = %call.method, "rejected call: {e:?}");
                PendingResponse::ready(e.into_response())
            }
        }
    }

    /// Queue an already-decoded operation.
    pub fn dispatch(&self, op: Operation) -> PendingResponse {
        let method = op.method();
        let Some(worker) = &self.worker else {
            return PendingResponse::ready(MethodResponse::Error(method_error(
                method,
                &TextEmbedError::Detached,
            )));
        };

        debug!(%method, "queueing operation");
        let completion = worker.submit(move |facade| execute(facade, op));
        PendingResponse {
            state: PendingState::Waiting { method, completion },
        }
    }

    /// Current facade state, as seen after every call queued so far.
    pub async fn state(&self) -> Result<EmbedderState> {
        let worker = self.worker.as_ref().ok_or(TextEmbedError::Detached)?;
        worker.submit(|facade| facade.state()).await
    }

    /// Unregister the channel: release the embedder behind any queued work,
    /// then stop the worker.
    ///
    /// Later calls resolve to `BRIDGE_DETACHED`. Detaching twice is a no-op.
    #[instrument(skip(self), fields(channel = %self.config.channel_name))]
    pub async fn detach(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let result = worker.shutdown().await;
        match &result {
            Ok(()) => info!("text embedder channel detached"),
            Err(e) => warn!("error releasing embedder on detach: {e}"),
        }
        result
    }
}

/// Run one operation against the facade and shape its success payload.
fn execute(facade: &mut TextEmbedderFacade, op: Operation) -> Result<Value> {
    match op {
        Operation::Initialize { model_path } => {
            facade.initialize(&model_path)?;
            Ok(Value::Bool(true))
        }
        Operation::EmbedText { text } => {
            let vector = facade.embed_text(&text)?;
            Ok(json!(vector))
        }
        Operation::CalculateSimilarity { text1, text2 } => {
            let score = facade.calculate_similarity(&text1, &text2)?;
            Ok(json!(score.value()))
        }
        Operation::Close => {
            facade.close()?;
            Ok(Value::Null)
        }
    }
}

/// The response to a call, delivered once the worker has run it.
///
/// Always resolves to exactly one `MethodResponse`.
#[must_use = "a pending response does nothing unless awaited"]
pub struct PendingResponse {
    state: PendingState,
}

enum PendingState {
    Ready(Option<MethodResponse>),
    Waiting {
        method: Method,
        completion: Completion<Result<Value>>,
    },
}

impl PendingResponse {
    fn ready(response: MethodResponse) -> Self {
        Self {
            state: PendingState::Ready(Some(response)),
        }
    }
}

impl Future for PendingResponse {
    type Output = MethodResponse;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            PendingState::Ready(response) => Poll::Ready(
                response
                    .take()
                    .expect("PendingResponse polled after completion"),
            ),
            PendingState::Waiting { method, completion } => {
                let method = *method;
                Pin::new(completion).poll(cx).map(|outcome| {
                    match outcome.and_then(|r| r) {
                        Ok(value) => MethodResponse::Success(value),
                        Err(e) => {
                            let error = method_error(method, &e);
                            warn!(%method, code = %error.code, "{}", error.message);
                            MethodResponse::Error(error)
                        }
                    }
                })
            }
        }
    }
}
