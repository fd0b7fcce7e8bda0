// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON-lines session: one `MethodCall` object per input line, one
// `MethodResponse` object per output line, in the same order.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use textembed_channel::{MethodCall, MethodResponse, TextEmbedderPlugin};
use textembed_core::error::Result;
use textembed_core::{ErrorCode, MethodError};

/// Serve calls from `reader` until EOF. Returns the number of lines answered.
///
/// Blank lines are skipped. A line that is not a valid call envelope is
/// answered with `INVALID_REQUEST` and the session carries on.
pub async fn serve<R, W>(plugin: &TextEmbedderPlugin, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<MethodCall>(line) {
            Ok(call) => {
                debug!(method = %call.method, "call received");
                plugin.handle(&call).await
            }
            Err(e) => {
                warn!("malformed call: {e}");
                MethodResponse::Error(MethodError::new(
                    ErrorCode::InvalidRequest,
                    format!("Malformed method call: {e}"),
                ))
            }
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        answered += 1;
    }

    Ok(answered)
}
