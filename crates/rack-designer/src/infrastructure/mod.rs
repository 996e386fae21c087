//! Infrastructure layer for Rack Designer.
//!
//! Contains the file-system adapters (TOML config, JSON layout file) and the
//! command bridge consumed by interactive hosts and the CLI.
//!
//! **Dependency rule**: this layer may depend on `application` and `rack_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod storage;
pub mod ui_bridge;
