//! EditorSession: one rack being edited.
//!
//! The session owns the catalog, the [`LayoutStore`] and the
//! [`ConnectionStore`], and is the only place where operations that span both
//! stores live.  Removing a device is the main one: the layout reports which
//! port identities died with the device and the session cascades each of them
//! into the connection store before returning.
//!
//! Every method either applies its whole effect or returns an error with the
//! session unchanged.

use rack_core::{
    Catalog, CatalogError, Connection, ConnectionError, ConnectionId, ConnectionStore, Device,
    DeviceId, LayoutError, LayoutSnapshot, LayoutStore, Port, PortRef, RestoreReport,
    SelectionOutcome,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::repository::{LayoutRepository, StorageError};

/// Error type for editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The catalog has no model under this key.
    #[error("unknown hardware model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("layout storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Result of removing a device.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedDevice {
    pub device: Device,
    /// Connections deleted because they touched one of the device's ports.
    pub removed_connections: Vec<ConnectionId>,
}

/// An editing session over a single rack.
#[derive(Debug, Clone)]
pub struct EditorSession {
    catalog: Catalog,
    layout: LayoutStore,
    connections: ConnectionStore,
}

impl EditorSession {
    /// Creates an empty session whose new cables use the default color.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            layout: LayoutStore::new(),
            connections: ConnectionStore::new(),
        }
    }

    /// Creates an empty session whose new cables are colored `color`.
    pub fn with_cable_color(catalog: Catalog, color: impl Into<String>) -> Self {
        Self {
            catalog,
            layout: LayoutStore::new(),
            connections: ConnectionStore::with_default_color(color),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &LayoutStore {
        &self.layout
    }

    pub fn connections(&self) -> &ConnectionStore {
        &self.connections
    }

    // ── Devices ───────────────────────────────────────────────────────────────

    /// Places a new device of catalog model `model_key` at the lowest free unit.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownModel`] if the key is not in the catalog, or
    /// [`LayoutError::NoRoomAvailable`] if the rack has no room for it.
    pub fn place_device(&mut self, model_key: &str) -> Result<Device, EditorError> {
        let model = self
            .catalog
            .get(model_key)
            .ok_or_else(|| EditorError::UnknownModel(model_key.to_string()))?;
        Ok(self.layout.place_device(model_key, model)?)
    }

    /// Moves a device so its bottom sits at `requested_start_unit`.
    ///
    /// See [`LayoutStore::move_device`] for the clamping rules.
    pub fn move_device(
        &mut self,
        device_id: DeviceId,
        requested_start_unit: i64,
    ) -> Result<Device, EditorError> {
        Ok(self.layout.move_device(device_id, requested_start_unit)?)
    }

    /// Removes a device together with every connection touching its ports.
    ///
    /// An armed selection on one of the device's ports is cleared as well.
    pub fn remove_device(&mut self, device_id: DeviceId) -> Result<RemovedDevice, EditorError> {
        let (device, ports) = self.layout.remove_device(device_id)?;
        let removed_connections: Vec<ConnectionId> = ports
            .into_iter()
            .flat_map(|port| self.connections.cascade_remove_port(port))
            .collect();
        debug!(
            %device_id,
            removed = removed_connections.len(),
            "device removed with its connections"
        );
        Ok(RemovedDevice {
            device,
            removed_connections,
        })
    }

    // ── Ports and connections ─────────────────────────────────────────────────

    /// Feeds one port click into the selection machine.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownDevice`] or [`LayoutError::UnknownPort`] if the
    /// port does not exist; the selection is left as it was.
    pub fn select_port(&mut self, port: PortRef) -> Result<SelectionOutcome, EditorError> {
        self.layout.resolve_port(port)?;
        Ok(self.connections.select_port(port))
    }

    pub fn cancel_selection(&mut self) {
        self.connections.cancel_selection();
    }

    /// Deletes one connection by ID.
    pub fn delete_connection(&mut self, id: ConnectionId) -> Result<Connection, EditorError> {
        Ok(self.connections.delete_connection(id)?)
    }

    /// Sets or clears a port label.  Blank labels clear it.
    pub fn set_port_label(
        &mut self,
        port: PortRef,
        label: Option<String>,
    ) -> Result<Port, EditorError> {
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        Ok(self.layout.set_port_label(port, label)?.clone())
    }

    /// Sets or clears a port VLAN tag.
    pub fn set_port_vlan(&mut self, port: PortRef, vlan: Option<u16>) -> Result<Port, EditorError> {
        Ok(self.layout.set_port_vlan(port, vlan)?.clone())
    }

    /// Empties the rack: no devices, no connections, no pending selection.
    pub fn reset(&mut self) {
        self.layout.clear();
        self.connections.clear();
        info!("layout reset");
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    /// Captures the current layout for persistence.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::capture(&self.layout, &self.connections)
    }

    /// Replaces the whole layout with `snapshot`.
    ///
    /// New stores are built completely before they replace the current ones.
    /// Invalid records are dropped and listed in the returned report.
    pub fn load_snapshot(&mut self, snapshot: &LayoutSnapshot) -> RestoreReport {
        let restored = snapshot.restore(&self.catalog, self.connections.default_color());
        if !restored.report.is_clean() {
            warn!(
                dropped_devices = restored.report.dropped_devices.len(),
                dropped_connections = restored.report.dropped_connections.len(),
                "layout loaded with invalid records removed"
            );
        }
        self.layout = restored.layout;
        self.connections = restored.connections;
        restored.report
    }

    /// Loads the layout stored in `repository`.
    ///
    /// Returns `None` and leaves the session untouched when nothing has been
    /// stored yet.
    ///
    /// # Errors
    ///
    /// [`EditorError::Storage`] if the repository cannot be read.
    pub fn load_from(
        &mut self,
        repository: &dyn LayoutRepository,
    ) -> Result<Option<RestoreReport>, EditorError> {
        match repository.load()? {
            Some(snapshot) => Ok(Some(self.load_snapshot(&snapshot))),
            None => Ok(None),
        }
    }

    /// Writes the current layout to `repository`.
    ///
    /// # Errors
    ///
    /// [`EditorError::Storage`] if the repository cannot be written.
    pub fn save_to(&self, repository: &dyn LayoutRepository) -> Result<(), EditorError> {
        repository.save(&self.snapshot())?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
