//! SideTabs: tab lifecycle, background frame loading and bookmarks for a
//! side panel hosting several embedded chat sessions.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
