//! # rack-core
//!
//! Shared library for Rack Designer containing the rack slot geometry, the
//! hardware catalog, and the two stores that make up the layout engine.
//!
//! This crate has zero dependencies on UI frameworks, file systems, or
//! async runtimes.  Every operation is synchronous and runs to completion.
//!
//! # Architecture overview
//!
//! Rack Designer plans the equipment inside a single 42U rack and the patch
//! cables between device ports.  The engine is split into:
//!
//! - **`domain::geometry`** – Rack-unit arithmetic.  The one and only
//!   closed-interval overlap test lives here and is shared by placement and
//!   move validation.
//!
//! - **`domain::catalog`** – The read-only hardware catalog (firewalls,
//!   switches, servers, patch panels).
//!
//! - **`domain::layout`** – The `LayoutStore`: placed devices, their start
//!   units and their ports.
//!
//! - **`domain::connections`** – The `ConnectionStore`: cables between ports
//!   and the two-click port selection state machine.
//!
//! - **`domain::snapshot`** – Conversion between the stores and the
//!   persisted snapshot shape, including sanitisation on restore.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `rack_core::LayoutStore` instead of `rack_core::domain::layout::LayoutStore`.
pub use domain::catalog::{Catalog, CatalogError, Category, HardwareModel};
pub use domain::connections::{
    Connection, ConnectionError, ConnectionId, ConnectionStore, SelectionOutcome, SelectionState,
    DEFAULT_CABLE_COLOR,
};
pub use domain::geometry::{intervals_overlap, SlotRange, U_MAX};
pub use domain::layout::{Device, DeviceId, LayoutError, LayoutStore, Port, PortRef};
pub use domain::snapshot::{LayoutSnapshot, RestoreReport, RestoredLayout};
