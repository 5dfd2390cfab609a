//! Reconnecting duplex client for the Home Assistant WebSocket API
//! (spec §4.3). Authenticates, multiplexes request/response pairs keyed by
//! a monotonic message id, and dispatches unsolicited `state_changed`
//! events to the shared [`StateCache`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use orc_domain::error::{Error, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::backoff::ReconnectBackoff;
use crate::cache::StateCache;
use crate::types::{DeviceRegistryEntry, EntityRegistryEntry, HaState};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// Configuration for one `HaClient` instance.
#[derive(Debug, Clone)]
pub struct HaClientConfig {
    pub url: String,
    pub token: String,
    pub request_timeout: Duration,
    pub registry_timeout: Duration,
    pub backoff: ReconnectBackoff,
}

/// A handle to the running client. Dropping the handle does not stop the
/// client — call [`HaClient::stop`] explicitly.
pub struct HaClient {
    config: HaClientConfig,
    cache: Arc<StateCache>,
    is_running: Arc<AtomicBool>,
    id_counter: Arc<AtomicU64>,
    pending: PendingMap,
    outbound: tokio::sync::Mutex<Option<tokio::sync::mpsc::UnboundedSender<Message>>>,
    listener_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl HaClient {
    pub fn new(config: HaClientConfig, cache: Arc<StateCache>) -> Arc<Self> {
        Arc::new(Self {
            config,
            cache,
            is_running: Arc::new(AtomicBool::new(true)),
            id_counter: Arc::new(AtomicU64::new(1)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            outbound: tokio::sync::Mutex::new(None),
            listener_task: Mutex::new(None),
        })
    }

    /// Run the reconnect loop until `stop()` is called. Intended to be
    /// spawned as a background task.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut attempt: u32 = 0;
        while self.is_running.load(Ordering::SeqCst) && !shutdown.is_cancelled() {
            match self.connect_and_run(&shutdown).await {
                Ok(()) => attempt = 0,
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "HA connection lost");
                }
            }

            self.fail_all_pending(Error::ConnectionReset("HA socket dropped".into()));

            if !self.is_running.load(Ordering::SeqCst) || shutdown.is_cancelled() {
                break;
            }
            if self.config.backoff.should_give_up(attempt) {
                tracing::error!(attempts = attempt, "HA reconnect attempts exhausted");
                break;
            }
            let delay = self.config.backoff.delay_for_attempt(attempt);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.cancelled() => break,
            }
            attempt += 1;
        }
    }

    /// Stop the client: cancels the listener, closes the socket, and
    /// returns once shutdown is observed.
    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.listener_task.lock().take() {
            handle.abort();
        }
    }

    async fn connect_and_run(&self, shutdown: &CancellationToken) -> Result<()> {
        let (ws, _) = tokio_tungstenite::connect_async(&self.config.url)
            .await
            .map_err(|e| Error::ConnectionReset(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        // ── auth_required → auth → auth_ok/auth_invalid ─────────────
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let v: Value = serde_json::from_str(&text)?;
                if v.get("type").and_then(|t| t.as_str()) != Some("auth_required") {
                    return Err(Error::ConnectionReset("expected auth_required".into()));
                }
            }
            _ => return Err(Error::ConnectionReset("closed before auth_required".into())),
        }

        let auth = json!({"type": "auth", "access_token": self.config.token});
        sink.send(Message::Text(auth.to_string()))
            .await
            .map_err(|e| Error::ConnectionReset(e.to_string()))?;

        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                let v: Value = serde_json::from_str(&text)?;
                match v.get("type").and_then(|t| t.as_str()) {
                    Some("auth_ok") => {
                        tracing::info!(
                            ha_version = ?v.get("ha_version"),
                            "HA authenticated"
                        );
                    }
                    Some("auth_invalid") => {
                        self.is_running.store(false, Ordering::SeqCst);
                        return Err(Error::AuthRejected(
                            v.get("message")
                                .and_then(|m| m.as_str())
                                .unwrap_or("auth_invalid")
                                .to_string(),
                        ));
                    }
                    other => {
                        return Err(Error::ConnectionReset(format!(
                            "unexpected auth response: {other:?}"
                        )))
                    }
                }
            }
            _ => return Err(Error::ConnectionReset("closed during auth".into())),
        }

        // Message-id counter resets to 1 after auth_ok.
        self.id_counter.store(1, Ordering::SeqCst);

        let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel::<Message>();
        *self.outbound.lock().await = Some(out_tx.clone());

        let writer = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
        });

        let pending = self.pending.clone();
        let cache = self.cache.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let msg = match frame {
                    Ok(m) => m,
                    Err(_) => break,
                };
                let text = match msg {
                    Message::Text(t) => t,
                    Message::Close(_) => break,
                    _ => continue,
                };
                let v: Value = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                match v.get("type").and_then(|t| t.as_str()) {
                    Some("event") => dispatch_event(&cache, &v),
                    Some("result") => {
                        if let Some(id) = v.get("id").and_then(|i| i.as_u64()) {
                            if let Some(tx) = pending.lock().remove(&id) {
                                let _ = tx.send(v);
                            } else {
                                tracing::debug!(id, "result for unknown/expired request id");
                            }
                        }
                    }
                    Some("pong") => {}
                    _ => {}
                }
            }
        });

        // Re-subscribe and re-fetch registries on every fresh connection
        // (spec §4.3): the reader task above is already running, so these
        // calls' `result` responses are routed back through the pending map
        // like any other request.
        if let Err(e) = self.subscribe_events("state_changed").await {
            tracing::warn!(error = %e, "re-subscribe after reconnect failed");
        }
        match self.get_states().await {
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "re-fetch of states after reconnect failed"),
        }
        if let Err(e) = self.get_entity_registry_for_display().await {
            tracing::warn!(error = %e, "re-fetch of entity registry after reconnect failed");
        }
        if let Err(e) = self.get_device_registry().await {
            tracing::warn!(error = %e, "re-fetch of device registry after reconnect failed");
        }

        tokio::select! {
            _ = reader => {}
            _ = shutdown.cancelled() => {}
        }
        writer.abort();
        *self.outbound.lock().await = None;

        Ok(())
    }

    fn fail_all_pending(&self, err: Error) {
        let mut pending = self.pending.lock();
        for (_, tx) in pending.drain() {
            let _ = tx.send(json!({"success": false, "error": {"message": err.to_string()}}));
        }
    }

    async fn call(&self, payload: Value, timeout: Duration) -> Result<Value> {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut payload = payload;
        payload["id"] = json!(id);

        let sender = {
            let guard = self.outbound.lock().await;
            guard.clone()
        };
        let sender = sender.ok_or_else(|| Error::ConnectionReset("not connected".into()))?;
        sender
            .send(Message::Text(payload.to_string()))
            .map_err(|_| Error::ConnectionReset("outbound channel closed".into()))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(v)) => {
                if v.get("success").and_then(|s| s.as_bool()) == Some(false) {
                    let msg = v
                        .get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .unwrap_or("unknown HA error");
                    Err(Error::Internal(msg.to_string()))
                } else {
                    Ok(v)
                }
            }
            Ok(Err(_)) => Err(Error::ConnectionReset("request cancelled".into())),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(Error::RequestTimeout { elapsed_ms: timeout.as_millis() as u64 })
            }
        }
    }

    pub async fn subscribe_events(&self, event_type: &str) -> Result<()> {
        self.call(
            json!({"type": "subscribe_events", "event_type": event_type}),
            self.config.request_timeout,
        )
        .await
        .map(|_| ())
    }

    pub async fn get_states(&self) -> Result<Vec<HaState>> {
        let v = self
            .call(json!({"type": "get_states"}), self.config.request_timeout)
            .await?;
        let states: Vec<HaState> = serde_json::from_value(
            v.get("result").cloned().unwrap_or(Value::Array(vec![])),
        )?;
        for state in &states {
            self.cache
                .apply_state_changed(&state.entity_id, Some(state.clone()));
        }
        Ok(states)
    }

    pub async fn get_entity_registry_for_display(&self) -> Result<Vec<EntityRegistryEntry>> {
        let v = self
            .call(
                json!({"type": "config/entity_registry/list_for_display"}),
                self.config.registry_timeout,
            )
            .await?;
        let entries: Vec<EntityRegistryEntry> = serde_json::from_value(
            v.get("result")
                .and_then(|r| r.get("entities"))
                .cloned()
                .unwrap_or(v.get("result").cloned().unwrap_or(Value::Array(vec![]))),
        )?;
        self.cache.replace_entity_registry(entries.clone());
        Ok(entries)
    }

    pub async fn get_entity_registry(&self) -> Result<Vec<EntityRegistryEntry>> {
        let v = self
            .call(
                json!({"type": "config/entity_registry/list"}),
                self.config.registry_timeout,
            )
            .await?;
        let entries: Vec<EntityRegistryEntry> = serde_json::from_value(
            v.get("result").cloned().unwrap_or(Value::Array(vec![])),
        )?;
        self.cache.replace_entity_registry(entries.clone());
        Ok(entries)
    }

    pub async fn get_device_registry(&self) -> Result<Vec<DeviceRegistryEntry>> {
        let v = self
            .call(
                json!({"type": "config/device_registry/list"}),
                self.config.registry_timeout,
            )
            .await?;
        let entries: Vec<DeviceRegistryEntry> = serde_json::from_value(
            v.get("result").cloned().unwrap_or(Value::Array(vec![])),
        )?;
        self.cache.replace_device_registry(entries.clone());
        Ok(entries)
    }

    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: &str,
        service_data: Value,
    ) -> Result<Value> {
        let mut data = service_data;
        if let Value::Object(ref mut map) = data {
            map.insert("entity_id".to_string(), json!(entity_id));
        }
        self.call(
            json!({"type": "call_service", "domain": domain, "service": service, "service_data": data}),
            self.config.request_timeout,
        )
        .await
    }
}

fn dispatch_event(cache: &StateCache, frame: &Value) {
    let event = match frame.get("event") {
        Some(e) => e,
        None => return,
    };
    if event.get("event_type").and_then(|t| t.as_str()) != Some("state_changed") {
        return;
    }
    let data = match event.get("data") {
        Some(d) => d,
        None => return,
    };
    let entity_id = match data.get("entity_id").and_then(|e| e.as_str()) {
        Some(e) => e.to_string(),
        None => return,
    };
    let new_state = data
        .get("new_state")
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value::<HaState>(v.clone()).ok());
    cache.apply_state_changed(&entity_id, new_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_clone_preserves_timeouts() {
        let cfg = HaClientConfig {
            url: "ws://localhost:8123/api/websocket".into(),
            token: "tok".into(),
            request_timeout: Duration::from_secs(10),
            registry_timeout: Duration::from_secs(30),
            backoff: ReconnectBackoff::default(),
        };
        let cloned = cfg.clone();
        assert_eq!(cloned.request_timeout, Duration::from_secs(10));
        assert_eq!(cloned.registry_timeout, Duration::from_secs(30));
    }

    #[test]
    fn dispatch_event_upserts_cache() {
        let cache = StateCache::new();
        let frame = json!({
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {
                    "entity_id": "light.kitchen",
                    "new_state": {
                        "entity_id": "light.kitchen",
                        "state": "on",
                        "attributes": {},
                        "last_changed": "2024-01-01T00:00:00Z",
                    }
                }
            }
        });
        dispatch_event(&cache, &frame);
        assert!(cache.get_state("light.kitchen").is_some());
    }

    #[test]
    fn dispatch_event_with_null_new_state_removes() {
        let cache = StateCache::new();
        cache.apply_state_changed(
            "light.kitchen",
            Some(HaState {
                entity_id: "light.kitchen".into(),
                state: "on".into(),
                attributes: Default::default(),
                last_changed: chrono::Utc::now(),
            }),
        );
        let frame = json!({
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {"entity_id": "light.kitchen", "new_state": null}
            }
        });
        dispatch_event(&cache, &frame);
        assert!(cache.get_state("light.kitchen").is_none());
    }
}
