//! Rack layout domain entity.
//!
//! The [`LayoutStore`] owns every placed [`Device`] and resolves each
//! placement or move request against the occupancy invariant: no two devices
//! may share a rack unit, and every device lies inside `[1, U_MAX]`.
//!
//! Every mutating operation validates first and commits second.  A rejected
//! request leaves the store exactly as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::catalog::HardwareModel;
use super::geometry::{highest_start, intervals_overlap, SlotRange, U_MAX};

/// Unique identifier for a placed device, derived from UUID v4.
pub type DeviceId = Uuid;

/// Errors that can occur when editing the layout.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    /// No free run of units is tall enough for the model.
    #[error("no room available: no free run of {height} unit(s) in the rack")]
    NoRoomAvailable { height: u32 },

    /// The requested position would overlap another device.
    #[error("slot occupied: units {requested_start}..={requested_top} overlap device {blocking}")]
    SlotOccupied {
        requested_start: u32,
        requested_top: u32,
        blocking: DeviceId,
    },

    /// The requested start unit is below the bottom of the rack.
    #[error("start unit {0} is out of bounds (units are numbered from 1)")]
    OutOfBounds(i64),

    /// The specified device does not exist in the layout.
    #[error("device not found: {0}")]
    UnknownDevice(DeviceId),

    /// The device exists but has no port with that index.
    #[error("device {device_id} has no port {port_index}")]
    UnknownPort { device_id: DeviceId, port_index: u32 },
}

/// Global identity of a port: the owning device plus the 1-based port index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    pub device_id: DeviceId,
    pub port_index: u32,
}

impl PortRef {
    pub fn new(device_id: DeviceId, port_index: u32) -> Self {
        Self {
            device_id,
            port_index,
        }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.device_id, self.port_index)
    }
}

/// A numbered connection point on a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// 1-based index, unique within the owning device.
    pub index: u32,
    /// Free-form label (e.g. "uplink", "ILO").
    pub label: Option<String>,
    /// Free-form VLAN tag.  Carries no protocol semantics.
    pub vlan: Option<u16>,
}

impl Port {
    fn numbered(index: u32) -> Self {
        Self {
            index,
            label: None,
            vlan: None,
        }
    }
}

/// A placed instance of a [`HardwareModel`].
///
/// The model's fields are copied in at placement time; the device is
/// self-contained afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    /// Catalog key the device was created from.
    pub model_key: String,
    pub name: String,
    pub height_units: u32,
    pub display_color: String,
    /// Bottom-most unit occupied.
    pub start_unit: u32,
    /// Ports `1..=port_count`, in index order.  Never resized.
    pub ports: Vec<Port>,
}

impl Device {
    /// Builds a device from a catalog model, allocating its ports.
    pub(crate) fn from_model(
        id: DeviceId,
        model_key: &str,
        model: &HardwareModel,
        start_unit: u32,
    ) -> Self {
        Self {
            id,
            model_key: model_key.to_string(),
            name: model.name.clone(),
            height_units: model.height_units,
            display_color: model.display_color.clone(),
            start_unit,
            ports: (1..=model.port_count).map(Port::numbered).collect(),
        }
    }

    /// The units this device occupies.
    pub fn slots(&self) -> SlotRange {
        SlotRange::new(self.start_unit, self.height_units)
    }

    /// Returns the top-most unit occupied (inclusive).
    pub fn top_unit(&self) -> u32 {
        self.slots().top()
    }

    pub fn port_count(&self) -> u32 {
        // Port vectors are built from a u32 count, so this cannot truncate.
        self.ports.len() as u32
    }

    /// Looks up a port by its 1-based index.
    pub fn port(&self, index: u32) -> Option<&Port> {
        index
            .checked_sub(1)
            .and_then(|i| self.ports.get(i as usize))
    }

    fn port_mut(&mut self, index: u32) -> Option<&mut Port> {
        index
            .checked_sub(1)
            .and_then(|i| self.ports.get_mut(i as usize))
    }

    /// Returns the [`PortRef`] of every port on this device.
    pub fn port_refs(&self) -> impl Iterator<Item = PortRef> + '_ {
        self.ports.iter().map(|p| PortRef::new(self.id, p.index))
    }
}

/// The rack layout.
///
/// Devices are kept in creation order; that order is what
/// [`LayoutStore::list_devices`] reports and what gets persisted.
#[derive(Debug, Clone, Default)]
pub struct LayoutStore {
    devices: Vec<Device>,
}

impl LayoutStore {
    /// Creates an empty rack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a new device built from `model` at the lowest free start unit.
    ///
    /// Candidate start units are scanned bottom-up from 1 to
    /// `U_MAX - height + 1`; the first one whose interval overlaps no existing
    /// device wins.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoRoomAvailable`] when no candidate is free,
    /// including models taller than the rack.  The layout is unchanged.
    pub fn place_device(
        &mut self,
        model_key: &str,
        model: &HardwareModel,
    ) -> Result<Device, LayoutError> {
        let height = model.height_units;
        let start_unit = self
            .lowest_free_start(height)
            .ok_or(LayoutError::NoRoomAvailable { height })?;

        let device = Device::from_model(Uuid::new_v4(), model_key, model, start_unit);
        debug!(
            device_id = %device.id,
            model_key,
            start_unit,
            height,
            "placed device"
        );
        self.devices.push(device.clone());
        Ok(device)
    }

    /// Moves a device so that its bottom sits at `requested_start_unit`.
    ///
    /// A request that would push the top of the device above [`U_MAX`] is
    /// clamped down to the highest legal start unit.  A request below unit 1
    /// is rejected.  The (possibly clamped) interval is then tested against
    /// every other device.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::UnknownDevice`] if no device has that ID.
    /// - [`LayoutError::OutOfBounds`] if `requested_start_unit < 1`.
    /// - [`LayoutError::SlotOccupied`] if the new interval overlaps another device.
    pub fn move_device(
        &mut self,
        device_id: DeviceId,
        requested_start_unit: i64,
    ) -> Result<Device, LayoutError> {
        let height = self
            .device(device_id)
            .map(|d| d.height_units)
            .ok_or(LayoutError::UnknownDevice(device_id))?;

        if requested_start_unit < 1 {
            return Err(LayoutError::OutOfBounds(requested_start_unit));
        }
        // Placed devices always fit, so `highest_start` is Some here.
        let ceiling = highest_start(height).unwrap_or(1);
        let start_unit = u32::try_from(requested_start_unit)
            .unwrap_or(u32::MAX)
            .min(ceiling);

        if let Some(blocking) = self.first_collision(start_unit, height, Some(device_id)) {
            return Err(LayoutError::SlotOccupied {
                requested_start: start_unit,
                requested_top: start_unit + height - 1,
                blocking,
            });
        }

        let device = self
            .devices
            .iter_mut()
            .find(|d| d.id == device_id)
            .ok_or(LayoutError::UnknownDevice(device_id))?;
        if device.start_unit != start_unit {
            debug!(%device_id, from = device.start_unit, to = start_unit, "moved device");
        }
        device.start_unit = start_unit;
        Ok(device.clone())
    }

    /// Removes a device and reports the port identities that became invalid.
    ///
    /// The caller is responsible for cascading the removal into the
    /// connection store.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownDevice`] if no device has that ID.
    pub fn remove_device(
        &mut self,
        device_id: DeviceId,
    ) -> Result<(Device, Vec<PortRef>), LayoutError> {
        let pos = self
            .devices
            .iter()
            .position(|d| d.id == device_id)
            .ok_or(LayoutError::UnknownDevice(device_id))?;
        let device = self.devices.remove(pos);
        let invalidated = device.port_refs().collect();
        debug!(%device_id, "removed device");
        Ok((device, invalidated))
    }

    /// Sets or clears the free-form label of one port.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownDevice`] or [`LayoutError::UnknownPort`].
    pub fn set_port_label(
        &mut self,
        port: PortRef,
        label: Option<String>,
    ) -> Result<&Port, LayoutError> {
        let slot = self.port_mut(port)?;
        slot.label = label;
        Ok(&*slot)
    }

    /// Sets or clears the VLAN tag of one port.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownDevice`] or [`LayoutError::UnknownPort`].
    pub fn set_port_vlan(&mut self, port: PortRef, vlan: Option<u16>) -> Result<&Port, LayoutError> {
        let slot = self.port_mut(port)?;
        slot.vlan = vlan;
        Ok(&*slot)
    }

    /// Returns all devices in creation order.
    pub fn list_devices(&self) -> &[Device] {
        &self.devices
    }

    /// Looks up a device by ID.
    pub fn device(&self, device_id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    /// Returns the device occupying `unit`, if any.
    pub fn device_at(&self, unit: u32) -> Option<&Device> {
        self.devices.iter().find(|d| d.slots().contains(unit))
    }

    /// Checks that `port` names an existing port.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::UnknownDevice`] or [`LayoutError::UnknownPort`].
    pub fn resolve_port(&self, port: PortRef) -> Result<&Port, LayoutError> {
        let device = self
            .device(port.device_id)
            .ok_or(LayoutError::UnknownDevice(port.device_id))?;
        device.port(port.port_index).ok_or(LayoutError::UnknownPort {
            device_id: port.device_id,
            port_index: port.port_index,
        })
    }

    /// Returns `true` if `port` names an existing port.
    pub fn contains_port(&self, port: PortRef) -> bool {
        self.resolve_port(port).is_ok()
    }

    /// Total number of units taken by devices.
    pub fn occupied_units(&self) -> u32 {
        self.devices.iter().map(|d| d.height_units).sum()
    }

    /// Number of units not taken by any device.
    pub fn free_units(&self) -> u32 {
        U_MAX.saturating_sub(self.occupied_units())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Removes every device.
    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Inserts an already-built device after checking bounds and overlap.
    ///
    /// Used by snapshot restore, which must keep persisted IDs and positions.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::OutOfBounds`] if the device does not fit in the
    /// rack, or [`LayoutError::SlotOccupied`] if it overlaps a device already
    /// present.
    pub(crate) fn insert_existing(&mut self, device: Device) -> Result<(), LayoutError> {
        if !device.slots().fits_in_rack() {
            return Err(LayoutError::OutOfBounds(i64::from(device.start_unit)));
        }
        if let Some(blocking) = self.first_collision(device.start_unit, device.height_units, None) {
            return Err(LayoutError::SlotOccupied {
                requested_start: device.start_unit,
                requested_top: device.top_unit(),
                blocking,
            });
        }
        self.devices.push(device);
        Ok(())
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn lowest_free_start(&self, height: u32) -> Option<u32> {
        let last = highest_start(height)?;
        (1..=last).find(|&start| self.first_collision(start, height, None).is_none())
    }

    /// Returns the first device (other than `exclude`) whose interval overlaps
    /// `[start, start + height - 1]`.
    fn first_collision(&self, start: u32, height: u32, exclude: Option<DeviceId>) -> Option<DeviceId> {
        self.devices
            .iter()
            .filter(|d| Some(d.id) != exclude)
            .find(|d| intervals_overlap(start, height, d.start_unit, d.height_units))
            .map(|d| d.id)
    }

    fn port_mut(&mut self, port: PortRef) -> Result<&mut Port, LayoutError> {
        let device = self
            .devices
            .iter_mut()
            .find(|d| d.id == port.device_id)
            .ok_or(LayoutError::UnknownDevice(port.device_id))?;
        device.port_mut(port.port_index).ok_or(LayoutError::UnknownPort {
            device_id: port.device_id,
            port_index: port.port_index,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
