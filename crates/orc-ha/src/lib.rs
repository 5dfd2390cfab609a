//! Home Assistant integration: a reconnecting WebSocket client, the
//! concurrent state cache it feeds, and the scored entity resolver built on
//! top of it (spec §4.3, §4.4).

pub mod backoff;
pub mod cache;
pub mod client;
pub mod resolver;
pub mod types;

pub use backoff::ReconnectBackoff;
pub use cache::StateCache;
pub use client::{HaClient, HaClientConfig};
pub use resolver::{search, SearchResult};
