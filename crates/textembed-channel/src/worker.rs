// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serial worker: one dedicated OS thread that owns the embedder facade.
//
// Every embedder operation is a job queued onto this thread and executed
// strictly in submission order. Runtime calls block the worker, never the
// caller: each submission hands back a `Completion` future that resolves
// exactly once, with the job's value or with `Detached` if the worker went
// away before answering.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use textembed_core::error::{Result, TextEmbedError};

use crate::facade::TextEmbedderFacade;

type Job = Box<dyn FnOnce(&mut TextEmbedderFacade) + Send>;

enum Message {
    Run(Job),
    /// Stop after every job queued before this one has run.
    Shutdown,
}

/// Handle to the worker thread.
///
/// Dropping the handle asks the worker to stop once its queue drains; it
/// does not wait for that to happen. Use [`SerialWorker::shutdown`] to wait.
pub struct SerialWorker {
    sender: mpsc::UnboundedSender<Message>,
    thread: Option<JoinHandle<()>>,
    name: String,
}

impl SerialWorker {
    /// Spawn the worker thread and move `facade` onto it.
    pub fn spawn(name: &str, facade: TextEmbedderFacade) -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();
        let thread_name = name.to_owned();

        let thread = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut facade = facade;
                debug!(worker = %thread_name, "embedder worker started");
                while let Some(message) = receiver.blocking_recv() {
                    match message {
                        Message::Run(job) => job(&mut facade),
                        Message::Shutdown => break,
                    }
                }
                // Releases any live handle before the thread exits.
                drop(facade);
                debug!(worker = %thread_name, "embedder worker stopped");
            })?;

        info!(worker = name, "spawned embedder worker");
        Ok(Self {
            sender,
            thread: Some(thread),
            name: name.to_owned(),
        })
    }

    /// Queue `job` behind everything already submitted.
    ///
    /// The job is enqueued before this returns, so submission order is call
    /// order even if the returned futures are awaited in a different order.
    pub fn submit<T, F>(&self, job: F) -> Completion<T>
    where
        F: FnOnce(&mut TextEmbedderFacade) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();
        let job: Job = Box::new(move |facade| {
            // The caller may have stopped waiting; nothing else to do then.
            let _ = reply.send(job(facade));
        });

        if self.sender.send(Message::Run(job)).is_err() {
            // The job (and its reply sender) came back inside the error and
            // was dropped, so the completion resolves to `Detached`.
            debug!(worker = %self.name, "submit after worker exit");
        }
        Completion { receiver }
    }

    /// Release the embedder, stop the worker and wait for the thread to exit.
    ///
    /// Returns the result of closing the embedder. The thread join runs on
    /// the blocking pool, never on an executor thread.
    pub async fn shutdown(mut self) -> Result<()> {
        let released = self.submit(|facade| facade.close());
        let _ = self.sender.send(Message::Shutdown);
        let result = released.await.and_then(|r| r);

        if let Some(thread) = self.thread.take() {
            let joined = tokio::task::spawn_blocking(move || thread.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                error!(worker = %self.name, "embedder worker panicked");
                return Err(TextEmbedError::Bridge("embedder worker panicked".into()));
            }
        }

        info!(worker = %self.name, "embedder worker shut down");
        result
    }
}

impl Drop for SerialWorker {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.sender.send(Message::Shutdown);
        }
    }
}

/// The eventual result of one submitted job.
///
/// Resolves exactly once: to the job's value, or to
/// `TextEmbedError::Detached` when the worker dropped the job unanswered.
#[must_use = "a completion does nothing unless awaited"]
pub struct Completion<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Completion<T> {
    /// Wait on the current thread. Must not be called from async code.
    pub fn wait(self) -> Result<T> {
        self.receiver
            .blocking_recv()
            .map_err(|_| TextEmbedError::Detached)
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|r| r.map_err(|_| TextEmbedError::Detached))
    }
}
