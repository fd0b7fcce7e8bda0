// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// textembed host: drives the embedder channel from a JSON-lines stream.
//
// Entry point. Initialises logging, loads the bridge config, attaches the
// channel with the runtime for this OS, and serves stdin -> stdout until EOF.

mod session;

use std::process::ExitCode;

use textembed_channel::TextEmbedderPlugin;
use textembed_core::BridgeConfig;

/// Environment variable naming an optional JSON config file.
const CONFIG_ENV: &str = "TEXTEMBED_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries nothing but responses.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("textembed host starting");

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => BridgeConfig::load_or_default(path),
        Err(_) => BridgeConfig::default(),
    };

    let mut plugin = match TextEmbedderPlugin::attach_native(config) {
        Ok(plugin) => plugin,
        Err(e) => {
            tracing::error!("failed to attach embedder channel: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        channel = plugin.channel_name(),
        platform = plugin.platform_name(),
        "serving method calls on stdin"
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let served = session::serve(&plugin, stdin, stdout).await;

    if let Err(e) = plugin.detach().await {
        tracing::warn!("error while detaching: {e}");
    }

    match served {
        Ok(count) => {
            tracing::info!(calls = count, "textembed host finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("session failed: {e}");
            ExitCode::FAILURE
        }
    }
}
