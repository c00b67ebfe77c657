// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `promptlab serve` command implementation.
//!
//! Checks secrets and the model table, opens SQLite storage, wires the
//! provider, identity service, dispatchers and scorers into the gateway, and
//! serves until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use promptlab_auth::{RemoteAuthAdapter, SessionValidator};
use promptlab_config::PromptlabConfig;
use promptlab_core::{PromptlabError, StorageAdapter};
use promptlab_dispatch::{
    CancelRegistry, DispatchContext, MultiTestDispatcher, SingleTestDispatcher,
};
use promptlab_gateway::{GatewayState, ServerConfig, start_server};
use promptlab_openai::OpenAiProvider;
use promptlab_scoring::{AiAnalyzer, ScoreResolver, TechniqueEngine};
use promptlab_storage::SqliteStorage;
use tracing::{error, info};

use crate::shutdown;

/// Runs the `promptlab serve` command.
pub async fn run_serve(config: PromptlabConfig) -> Result<(), PromptlabError> {
    init_tracing(&config.server.log_level);

    info!("starting promptlab serve");

    if let Err(errors) = promptlab_config::require_secrets(&config) {
        promptlab_config::render_errors(&errors);
        return Err(PromptlabError::Config(format!(
            "{} required secret(s) missing",
            errors.len()
        )));
    }
    promptlab_cost::registry::verify()?;

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let provider = Arc::new(OpenAiProvider::new(&config.provider)?);
    let auth = Arc::new(RemoteAuthAdapter::new(&config.auth)?);
    let validator = Arc::new(
        SessionValidator::new(auth)
            .with_refresh_margin(Duration::from_secs(config.auth.refresh_margin_secs)),
    );

    let ctx = DispatchContext {
        provider: provider.clone(),
        storage: storage.clone(),
        validator: validator.clone(),
        defaults: config.defaults.clone(),
    };
    let single = SingleTestDispatcher::new(ctx.clone())
        .with_timeout(Duration::from_secs(config.provider.single_timeout_secs));
    let multi = MultiTestDispatcher::new(ctx)
        .with_timeout(Duration::from_secs(config.provider.batch_timeout_secs));

    let engine = TechniqueEngine::new();
    let analyzer = AiAnalyzer::new(
        provider.clone(),
        storage.clone(),
        &config.analysis.model,
        config.analysis.max_tokens,
    )?;

    let state = GatewayState {
        single: Arc::new(single),
        multi: Arc::new(multi),
        storage: storage.clone(),
        validator,
        resolver: Arc::new(ScoreResolver::new(storage.clone(), engine)),
        analyzer: Arc::new(analyzer),
        engine,
        scopes: Arc::new(CancelRegistry::new()),
        start_time: std::time::Instant::now(),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let cancel = shutdown::install_signal_handler();
    let served = start_server(&server_config, state, cancel).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway stopped with an error");
    }

    storage.close().await?;
    info!("promptlab stopped");
    served
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("promptlab={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serve_refuses_to_start_without_secrets() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = PromptlabConfig::default();
        config.storage.database_path = dir.path().join("p.db").to_string_lossy().into_owned();
        let err = run_serve(config).await.unwrap_err();
        assert!(matches!(err, PromptlabError::Config(_)));
        assert!(!dir.path().join("p.db").exists());
    }
}
