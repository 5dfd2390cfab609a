//! Agent hierarchy construction and the transfer controller (spec §4.1).

pub mod hierarchy;
pub mod transfer;

pub use hierarchy::{build_agents, Agent};
pub use transfer::{TransferController, TRANSFER_TOOL_NAME};
