//! Storage infrastructure: configuration and layout persistence.
//!
//! - `config`      – the TOML settings file in the platform config directory.
//! - `layout_file` – the JSON layout snapshot, written atomically.
//! - `memory`      – an in-process repository for tests and ephemeral sessions.

pub mod config;
pub mod layout_file;
pub mod memory;
