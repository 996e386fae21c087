//! Hardware catalog.
//!
//! The catalog is read-only configuration: a keyed list of hardware models a
//! user can mount in the rack.  Devices copy the fields they need out of the
//! model at placement time, so later catalog edits never reach devices that
//! are already placed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or validating a catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// A model must occupy at least one rack unit.
    #[error("catalog entry {key:?} has zero height")]
    ZeroHeight { key: String },

    /// Catalog keys are used in persisted layouts and must not be blank.
    #[error("catalog entry key must not be empty")]
    EmptyKey,
}

/// Broad equipment family, used by hosts for grouping and styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Firewalls, routers, switches.
    #[serde(rename = "NET")]
    Net,
    /// Compute and storage servers.
    #[serde(rename = "SERVER", alias = "SRV")]
    Server,
    /// Passive patch panels.
    #[serde(rename = "PATCH")]
    Patch,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Net => "NET",
            Category::Server => "SERVER",
            Category::Patch => "PATCH",
        };
        f.write_str(s)
    }
}

/// A catalog entry describing one kind of rack-mountable hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareModel {
    /// Human-readable model name.
    pub name: String,
    /// Height in rack units.  Always ≥ 1 in a validated catalog.
    pub height_units: u32,
    /// Number of front ports.  May be zero (blanking plates, shelves).
    pub port_count: u32,
    /// Opaque styling token handed back to the renderer untouched.
    pub display_color: String,
    pub category: Category,
}

impl HardwareModel {
    pub fn new(
        name: impl Into<String>,
        height_units: u32,
        port_count: u32,
        display_color: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            name: name.into(),
            height_units,
            port_count,
            display_color: display_color.into(),
            category,
        }
    }
}

/// An ordered, keyed collection of [`HardwareModel`]s.
///
/// Insertion order is preserved so hosts can list the catalog the way it was
/// configured.  The catalog is small (a handful of entries), so lookups are a
/// linear scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<(String, HardwareModel)>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog shipped with Rack Designer.
    pub fn builtin() -> Self {
        let entries = vec![
            (
                "FIREWALL".to_string(),
                HardwareModel::new("NextGen Firewall", 1, 8, "bg-red-900", Category::Net),
            ),
            (
                "SWITCH_24".to_string(),
                HardwareModel::new("Layer 3 24-Port", 1, 24, "bg-slate-800", Category::Net),
            ),
            (
                "SERVER_2U".to_string(),
                HardwareModel::new("Storage Server", 2, 4, "bg-blue-900", Category::Server),
            ),
            (
                "PATCH_PANEL".to_string(),
                HardwareModel::new("Cat6 Patch Panel", 1, 24, "bg-zinc-900", Category::Patch),
            ),
        ];
        Self { entries }
    }

    /// Adds or replaces the model stored under `key`.
    ///
    /// A replaced entry keeps its original position in the listing order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyKey`] for a blank key and
    /// [`CatalogError::ZeroHeight`] for a model with `height_units == 0`.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        model: HardwareModel,
    ) -> Result<(), CatalogError> {
        let key = key.into();
        validate_entry(&key, &model)?;
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = model,
            None => self.entries.push((key, model)),
        }
        Ok(())
    }

    /// Looks up a model by key.
    pub fn get(&self, key: &str) -> Option<&HardwareModel> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    /// Iterates `(key, model)` pairs in listing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HardwareModel)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks every entry against the catalog rules.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.entries
            .iter()
            .try_for_each(|(key, model)| validate_entry(key, model))
    }
}

fn validate_entry(key: &str, model: &HardwareModel) -> Result<(), CatalogError> {
    if key.trim().is_empty() {
        return Err(CatalogError::EmptyKey);
    }
    if model.height_units == 0 {
        return Err(CatalogError::ZeroHeight {
            key: key.to_string(),
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
