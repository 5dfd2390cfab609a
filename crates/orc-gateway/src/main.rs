use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use orc_agents::{build_agents, TransferController};
use orc_domain::config::{Config, ShellMode};
use orc_gateway::api;
use orc_gateway::runtime::cancel::CancelMap;
use orc_gateway::runtime::ha_tools;
use orc_gateway::runtime::session_lock::SessionLockMap;
use orc_gateway::state::AppState;
use orc_ha::{HaClient, HaClientConfig, ReconnectBackoff, StateCache};
use orc_providers::ProviderRegistry;
use orc_sessions::{LifecycleManager, SessionStore, TranscriptWriter};
use orc_tools::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("ORC_CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Arc::new(match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{config_path}: {e} — falling back to defaults");
            Config::default()
        }
    });

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "orchestrator starting");

    run_server(config).await
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,orc_gateway=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.observability.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    // ── Tool registry ────────────────────────────────────────────────
    let workspace_root = std::env::current_dir().context("resolving workspace root")?;
    let (shell_mode, shell_allow) = derive_shell_policy(&config);
    let mut tools = ToolRegistry::build(workspace_root, shell_mode, shell_allow, config.tools.clone());
    tracing::info!(tools = tools.all().len(), "tool registry ready");

    // ── Home Assistant client + cache ────────────────────────────────
    let (ha_cache, ha_client) = if config.home_assistant.enabled {
        let cache = Arc::new(StateCache::new());
        let client = HaClient::new(
            HaClientConfig {
                url: config.home_assistant.url.clone(),
                token: config.home_assistant.token.clone(),
                request_timeout: Duration::from_secs(config.home_assistant.request_timeout_secs),
                registry_timeout: Duration::from_secs(config.home_assistant.registry_timeout_secs),
                backoff: ReconnectBackoff::default(),
            },
            cache.clone(),
        );

        // The background reconnect loop (`connect_and_run`) performs the
        // subscribe + registry/state fetch sequence itself after every
        // successful connection, including the first — nothing further to
        // do here but start it and register the tools against the cache it
        // feeds.
        let shutdown = tokio_util::sync::CancellationToken::new();
        {
            let client = client.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { client.run(shutdown).await });
        }

        tools.register_home_assistant(ha_tools::descriptors(cache.clone(), client.clone()));
        tracing::info!(url = %config.home_assistant.url, "Home Assistant client ready");
        (Some(cache), Some(client))
    } else {
        tracing::info!("Home Assistant integration disabled");
        (None, None)
    };
    let tools = Arc::new(tools);

    // ── Agent hierarchy + transfer controller ────────────────────────
    let agents = build_agents(&config.agent, &tools).context("building agent hierarchy")?;
    let transfer = Arc::new(TransferController::new(agents).context("building transfer controller")?);
    tracing::info!(root = %config.agent.root, "agent hierarchy ready");

    // ── LLM providers ─────────────────────────────────────────────────
    // Adapters are external collaborators (spec §1); none are registered
    // here, only the empty registry the turn loop resolves models against.
    let llm = Arc::new(ProviderRegistry::new());
    tracing::warn!("no LLM providers registered — wire adapters in before serving real traffic");

    // ── Sessions ──────────────────────────────────────────────────────
    let state_dir = std::env::var("ORC_STATE_DIR").unwrap_or_else(|_| "./state".to_string());
    let transcripts = TranscriptWriter::new(std::path::Path::new(&state_dir));
    let lifecycle = LifecycleManager::new(config.sessions.clone());
    let sessions = Arc::new(SessionStore::new(transcripts, lifecycle, 1000));
    tracing::info!(path = %state_dir, "session store ready");

    let session_locks = Arc::new(SessionLockMap::new());
    let cancel_map = Arc::new(CancelMap::new());

    let state = AppState {
        config: config.clone(),
        llm,
        tools,
        transfer,
        sessions,
        session_locks: session_locks.clone(),
        cancel_map,
        ha_cache,
        ha_client,
        session_names: Arc::new(parking_lot::Mutex::new(std::collections::HashMap::new())),
    };

    if state.root_agent().is_none() {
        anyhow::bail!("agent.root '{}' is not a known agent", config.agent.root);
    }

    // ── Periodic session-lock pruning ─────────────────────────────────
    {
        let session_locks = session_locks.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                session_locks.prune_idle();
            }
        });
    }

    let app = api::router(state.clone()).with_state(state);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "orchestrator gateway listening");

    axum::serve(listener, app).await.context("axum server error")?;
    Ok(())
}

/// Derive one global shell-tool policy from every agent's `tool_policy`:
/// permissive if any agent asks for it (the registry builds one shared
/// shell handler, not one per agent — see DESIGN.md), allow-lists unioned.
fn derive_shell_policy(config: &Config) -> (ShellMode, Vec<String>) {
    let mode = if config.agent.agents.values().any(|a| a.tool_policy.shell_mode == ShellMode::Permissive) {
        ShellMode::Permissive
    } else {
        ShellMode::Strict
    };
    let mut allow: Vec<String> = config.agent.agents.values().flat_map(|a| a.tool_policy.allow.iter().cloned()).collect();
    allow.sort();
    allow.dedup();
    (mode, allow)
}
