// SideTabs shared type definitions
// Each submodule defines types used across the crate.

pub mod bookmark;
pub mod errors;
pub mod events;
pub mod frame;
pub mod session;
pub mod settings;
pub mod tab;
