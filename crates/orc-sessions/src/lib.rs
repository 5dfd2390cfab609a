//! Session Manager & Session Runner state (spec §3, §4.5).
//!
//! Owns the `Session`/`Turn`/`Event`/`Artifact` data model, the append-only
//! JSONL transcript sink, and the idle-timeout lifecycle rule. The turn
//! loop itself (dispatching tool calls, agent transfers) lives in the
//! gateway, which drives these types.

pub mod lifecycle;
pub mod store;
pub mod transcript;
pub mod types;

pub use lifecycle::LifecycleManager;
pub use store::{SessionStore, SessionSummary};
pub use transcript::TranscriptWriter;
pub use types::{Artifact, ArtifactMap, EventBuffer, Role, Session, Turn};
