//! Cross-crate integration flows driven through the engine facade.

pub mod engine_flows;
pub mod state_flows;
