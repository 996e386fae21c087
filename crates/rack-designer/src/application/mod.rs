//! Application layer for Rack Designer.
//!
//! Use cases here orchestrate the `rack_core` stores to fulfil one user
//! action at a time.  They depend on the [`repository::LayoutRepository`]
//! abstraction rather than on the file system, so the storage adapter can be
//! swapped (or mocked in tests) without touching this code.
//!
//! - **`editor`**     – The editing session: one layout, one set of cables, one
//!   catalog, and the removal cascade that keeps them consistent.
//! - **`repository`** – The persistence port the session loads from and saves to.

pub mod editor;
pub mod repository;
