// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugline serve` command implementation.
//!
//! Wires storage, both Gemini backends, the WhatsApp channel, and the menu
//! context into one dispatcher, then runs the webhook gateway and the agent
//! loop until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Instant;

use plugline_agent::{AgentLoop, AppContext, Collaborators, Dispatcher, SystemClock, shutdown};
use plugline_config::PluglineConfig;
use plugline_context::{ContextEngine, FileMenuSource};
use plugline_core::{InboundEvent, PluginAdapter, PluglineError, StorageAdapter};
use plugline_gateway::{GatewayState, HealthState, ServerConfig};
use plugline_gemini::GeminiProvider;
use plugline_storage::SqliteStorage;
use plugline_whatsapp::WhatsAppChannel;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Bound on events accepted by the gateway but not yet picked up.
const INBOUND_QUEUE_CAPACITY: usize = 256;

/// Runs the `plugline serve` command.
pub async fn run_serve(config: PluglineConfig) -> Result<(), PluglineError> {
    init_tracing(&config.agent.log_level);

    info!(name = %config.agent.name, "starting plugline serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let (primary, fallback) = GeminiProvider::pair(&config.gemini)?;
    info!(
        primary = %config.gemini.primary_model,
        fallback = %config.gemini.fallback_model,
        "generative backends configured"
    );

    let channel = Arc::new(WhatsAppChannel::new(&config.whatsapp)?);
    if config.whatsapp.verify_token.is_none() {
        warn!("whatsapp.verify_token is not set; webhook subscription handshakes will be rejected");
    }

    let menu_source = Arc::new(FileMenuSource::new(&config.menu.file));
    let context = Arc::new(ContextEngine::new(&config.agent, menu_source).await?);
    match context.sync_menu().await {
        Ok(len) => info!(bytes = len, file = %config.menu.file, "menu context loaded"),
        Err(e) => error!(error = %e, "menu sync failed at startup; running with empty menu context"),
    }

    let app = Arc::new(AppContext::new(
        &config,
        Collaborators {
            channel,
            primary: Arc::new(primary),
            fallback: Arc::new(fallback),
            storage: storage.clone(),
            context,
        },
        Arc::new(SystemClock),
    )?);
    let dispatcher = Arc::new(Dispatcher::new(app));

    let cancel = shutdown::install_signal_handler();

    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundEvent>(INBOUND_QUEUE_CAPACITY);
    let gateway_state = GatewayState {
        inbound_tx,
        verify_token: config.whatsapp.verify_token.clone(),
        health: HealthState {
            start_time: Instant::now(),
        },
    };
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let gateway_cancel = cancel.clone();
    let gateway = tokio::spawn(async move {
        if let Err(e) =
            plugline_gateway::start_server(&server_config, gateway_state, gateway_cancel.clone())
                .await
        {
            error!(error = %e, "gateway server failed");
            gateway_cancel.cancel();
        }
    });

    AgentLoop::new(dispatcher, inbound_rx).run(cancel).await;

    if let Err(e) = gateway.await {
        warn!(error = %e, "gateway task ended abnormally");
    }
    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }

    info!("plugline serve shutdown complete");
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plugline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
