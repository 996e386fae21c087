//! Domain entities for Rack Designer.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: no file I/O, no async runtime, no rendering.
//!
//! The host application (CLI, desktop shell, or tests) depends on this
//! module, but the domain never depends on the host.  That keeps the
//! occupancy and cabling rules testable in isolation.

/// Rack-unit arithmetic and the shared overlap test.
pub mod geometry;

/// Static hardware catalog entries.
pub mod catalog;

/// Device placement and repositioning.
///
/// See [`layout::LayoutStore`] for the main type.
pub mod layout;

/// Cable connections and the port selection state machine.
pub mod connections;

/// Persisted snapshot shape and restore-time sanitisation.
pub mod snapshot;
