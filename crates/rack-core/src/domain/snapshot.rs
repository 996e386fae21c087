//! Persisted layout snapshot.
//!
//! A snapshot is the plain-data shape written to durable storage:
//!
//! ```json
//! {
//!   "devices": [
//!     {"id": "…", "modelKey": "SERVER_2U", "startUnit": 3,
//!      "ports": [{"index": 1, "label": "eth0"}, {"index": 2}]}
//!   ],
//!   "connections": [
//!     {"id": "…", "endpointA": {"deviceId": "…", "portIndex": 1},
//!      "endpointB": {"deviceId": "…", "portIndex": 2}, "color": "#38bdf8"}
//!   ]
//! }
//! ```
//!
//! Restoring never fails as a whole.  Records that would break a layout
//! invariant are dropped and listed in the [`RestoreReport`]; everything else
//! is kept with its persisted IDs and positions.  The new stores are built
//! from scratch, so a caller can swap them in atomically.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::Catalog;
use super::connections::{Connection, ConnectionId, ConnectionStore};
use super::layout::{Device, DeviceId, LayoutStore, PortRef};

/// One port as persisted.  Only ports with metadata carry optional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
}

/// One placed device as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub model_key: String,
    pub start_unit: u32,
    #[serde(default)]
    pub ports: Vec<PortRecord>,
}

/// One cable as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub endpoint_a: PortRef,
    pub endpoint_b: PortRef,
    pub color: String,
}

/// The full persisted layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

/// Records dropped while restoring a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub dropped_devices: Vec<DeviceId>,
    pub dropped_connections: Vec<ConnectionId>,
}

impl RestoreReport {
    /// `true` when nothing had to be dropped.
    pub fn is_clean(&self) -> bool {
        self.dropped_devices.is_empty() && self.dropped_connections.is_empty()
    }
}

/// Stores rebuilt from a snapshot.
#[derive(Debug, Clone)]
pub struct RestoredLayout {
    pub layout: LayoutStore,
    pub connections: ConnectionStore,
    pub report: RestoreReport,
}

impl LayoutSnapshot {
    /// Captures the current contents of both stores.
    ///
    /// The pending port selection is transient and is not captured.
    pub fn capture(layout: &LayoutStore, connections: &ConnectionStore) -> Self {
        let devices = layout
            .list_devices()
            .iter()
            .map(|d| DeviceRecord {
                id: d.id,
                model_key: d.model_key.clone(),
                start_unit: d.start_unit,
                ports: d
                    .ports
                    .iter()
                    .map(|p| PortRecord {
                        index: p.index,
                        label: p.label.clone(),
                        vlan: p.vlan,
                    })
                    .collect(),
            })
            .collect();

        let connections = connections
            .list_connections()
            .iter()
            .map(|c| ConnectionRecord {
                id: c.id,
                endpoint_a: c.a,
                endpoint_b: c.b,
                color: c.color.clone(),
            })
            .collect();

        Self {
            devices,
            connections,
        }
    }

    /// Rebuilds both stores, resolving model keys against `catalog`.
    ///
    /// Devices are dropped when their model key is unknown, their ID repeats
    /// an earlier device, or their position is outside the rack or overlaps an
    /// earlier device.  Connections are dropped when either endpoint does not
    /// resolve to a surviving port, both endpoints are the same port, or the
    /// ID repeats.  Port records whose index the model does not have are
    /// ignored.
    pub fn restore(&self, catalog: &Catalog, default_color: &str) -> RestoredLayout {
        let mut layout = LayoutStore::new();
        let mut connections = ConnectionStore::with_default_color(default_color);
        let mut report = RestoreReport::default();
        let mut seen_devices = HashSet::new();

        for record in &self.devices {
            let Some(model) = catalog.get(&record.model_key) else {
                warn!(device_id = %record.id, model_key = %record.model_key, "dropping device with unknown model");
                report.dropped_devices.push(record.id);
                continue;
            };
            if !seen_devices.insert(record.id) {
                warn!(device_id = %record.id, "dropping device with duplicate id");
                report.dropped_devices.push(record.id);
                continue;
            }

            let mut device = Device::from_model(record.id, &record.model_key, model, record.start_unit);
            apply_port_records(&mut device, &record.ports);

            if let Err(e) = layout.insert_existing(device) {
                warn!(device_id = %record.id, "dropping device: {e}");
                seen_devices.remove(&record.id);
                report.dropped_devices.push(record.id);
            }
        }

        for record in &self.connections {
            let dangling = [record.endpoint_a, record.endpoint_b]
                .into_iter()
                .find(|p| !layout.contains_port(*p));
            if let Some(port) = dangling {
                warn!(connection_id = %record.id, %port, "dropping connection with dangling endpoint");
                report.dropped_connections.push(record.id);
                continue;
            }

            let connection = Connection {
                id: record.id,
                a: record.endpoint_a,
                b: record.endpoint_b,
                color: record.color.clone(),
            };
            if let Err(e) = connections.insert_existing(connection) {
                warn!(connection_id = %record.id, "dropping connection: {e}");
                report.dropped_connections.push(record.id);
            }
        }

        RestoredLayout {
            layout,
            connections,
            report,
        }
    }
}

fn apply_port_records(device: &mut Device, records: &[PortRecord]) {
    for record in records {
        let slot = record
            .index
            .checked_sub(1)
            .and_then(|i| device.ports.get_mut(i as usize));
        match slot {
            Some(port) => {
                port.label = record.label.clone();
                port.vlan = record.vlan;
            }
            None => warn!(
                device_id = %device.id,
                port_index = record.index,
                "ignoring record for port the model does not have"
            ),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connections::{SelectionOutcome, DEFAULT_CABLE_COLOR};
    use uuid::Uuid;

    /// Three devices, two cables, one labelled port.
    fn populated() -> (LayoutStore, ConnectionStore) {
        let catalog = Catalog::builtin();
        let mut layout = LayoutStore::new();
        let mut connections = ConnectionStore::new();

        let fw = layout
            .place_device("FIREWALL", catalog.get("FIREWALL").unwrap())
            .unwrap();
        let sw = layout
            .place_device("SWITCH_24", catalog.get("SWITCH_24").unwrap())
            .unwrap();
        let srv = layout
            .place_device("SERVER_2U", catalog.get("SERVER_2U").unwrap())
            .unwrap();
        layout.move_device(srv.id, 20).unwrap();
        layout
            .set_port_label(PortRef::new(sw.id, 24), Some("uplink".to_string()))
            .unwrap();

        for (p, q) in [
            (PortRef::new(fw.id, 1), PortRef::new(sw.id, 24)),
            (PortRef::new(sw.id, 1), PortRef::new(srv.id, 1)),
        ] {
            connections.select_port(p);
            assert!(matches!(connections.select_port(q), SelectionOutcome::Connected(_)));
        }
        (layout, connections)
    }

    #[test]
    fn test_capture_then_restore_yields_equivalent_stores() {
        // Arrange
        let (layout, connections) = populated();
        let snapshot = LayoutSnapshot::capture(&layout, &connections);

        // Act
        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        // Assert
        assert!(restored.report.is_clean());
        assert_eq!(restored.layout.list_devices(), layout.list_devices());
        assert_eq!(restored.connections.list_connections(), connections.list_connections());
    }

    #[test]
    fn test_snapshot_json_round_trip_is_identity() {
        let (layout, connections) = populated();
        let snapshot = LayoutSnapshot::capture(&layout, &connections);

        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let parsed: LayoutSnapshot = serde_json::from_str(&json).unwrap();
        let restored = parsed.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);
        let again = LayoutSnapshot::capture(&restored.layout, &restored.connections);

        assert_eq!(parsed, snapshot);
        assert_eq!(again, snapshot);
    }

    #[test]
    fn test_snapshot_json_uses_camel_case_field_names() {
        let (layout, connections) = populated();
        let json = serde_json::to_string(&LayoutSnapshot::capture(&layout, &connections)).unwrap();
        for field in ["modelKey", "startUnit", "endpointA", "endpointB", "deviceId", "portIndex"] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
        assert!(json.contains("\"label\":\"uplink\""));
    }

    #[test]
    fn test_unlabelled_ports_omit_optional_fields() {
        let record = PortRecord {
            index: 1,
            label: None,
            vlan: None,
        };
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"index":1}"#);
    }

    #[test]
    fn test_capture_does_not_include_pending_selection() {
        let (layout, mut connections) = populated();
        let first = layout.list_devices()[0].id;
        connections.select_port(PortRef::new(first, 2));

        let restored = LayoutSnapshot::capture(&layout, &connections)
            .restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        assert!(restored.connections.pending().is_none());
    }

    #[test]
    fn test_restore_drops_connection_with_missing_device() {
        // Arrange
        let (layout, connections) = populated();
        let mut snapshot = LayoutSnapshot::capture(&layout, &connections);
        let removed = snapshot.devices.remove(0); // the firewall
        let dangling = snapshot.connections[0].id;

        // Act
        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        // Assert
        assert_eq!(restored.layout.len(), 2);
        assert!(restored.layout.device(removed.id).is_none());
        assert_eq!(restored.report.dropped_connections, vec![dangling]);
        assert_eq!(restored.connections.len(), 1);
    }

    #[test]
    fn test_restore_drops_connection_to_nonexistent_port_index() {
        let (layout, connections) = populated();
        let mut snapshot = LayoutSnapshot::capture(&layout, &connections);
        snapshot.connections[1].endpoint_b.port_index = 99;

        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        assert_eq!(restored.report.dropped_connections, vec![snapshot.connections[1].id]);
    }

    #[test]
    fn test_restore_drops_self_loop_and_duplicate_connection_ids() {
        let (layout, connections) = populated();
        let mut snapshot = LayoutSnapshot::capture(&layout, &connections);
        let mut looped = snapshot.connections[0].clone();
        looped.id = Uuid::new_v4();
        looped.endpoint_b = looped.endpoint_a;
        let duplicate = snapshot.connections[0].clone();
        snapshot.connections.push(looped.clone());
        snapshot.connections.push(duplicate.clone());

        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        assert_eq!(restored.connections.len(), 2);
        assert_eq!(restored.report.dropped_connections, vec![looped.id, duplicate.id]);
    }

    #[test]
    fn test_restore_drops_device_with_unknown_model_and_its_cables() {
        let (layout, connections) = populated();
        let mut snapshot = LayoutSnapshot::capture(&layout, &connections);
        snapshot.devices[2].model_key = "MAINFRAME".to_string();

        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        assert_eq!(restored.report.dropped_devices, vec![snapshot.devices[2].id]);
        assert_eq!(restored.connections.len(), 1);
    }

    #[test]
    fn test_restore_drops_overlapping_and_out_of_rack_devices() {
        let (layout, connections) = populated();
        let mut snapshot = LayoutSnapshot::capture(&layout, &connections);
        snapshot.devices[1].start_unit = snapshot.devices[0].start_unit; // collide with firewall
        snapshot.devices[2].start_unit = 42; // 2U server poking out of the top

        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        assert_eq!(
            restored.report.dropped_devices,
            vec![snapshot.devices[1].id, snapshot.devices[2].id]
        );
        assert_eq!(restored.layout.len(), 1);
        assert!(restored.connections.is_empty());
    }

    #[test]
    fn test_restore_drops_repeated_device_id() {
        let (layout, connections) = populated();
        let mut snapshot = LayoutSnapshot::capture(&layout, &connections);
        let mut twin = snapshot.devices[0].clone();
        twin.start_unit = 30;
        snapshot.devices.push(twin.clone());

        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);

        assert_eq!(restored.report.dropped_devices, vec![twin.id]);
        assert_eq!(restored.layout.device(twin.id).unwrap().start_unit, 1);
    }

    #[test]
    fn test_restore_ignores_port_records_beyond_model_port_count() {
        let (layout, connections) = populated();
        let mut snapshot = LayoutSnapshot::capture(&layout, &connections);
        snapshot.devices[0].ports.push(PortRecord {
            index: 500,
            label: Some("ghost".to_string()),
            vlan: None,
        });

        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);
        let fw = restored.layout.device(snapshot.devices[0].id).unwrap();

        assert_eq!(fw.port_count(), 8);
        assert!(restored.report.is_clean());
    }

    #[test]
    fn test_empty_json_object_restores_empty_layout() {
        let snapshot: LayoutSnapshot = serde_json::from_str("{}").unwrap();
        let restored = snapshot.restore(&Catalog::builtin(), DEFAULT_CABLE_COLOR);
        assert!(restored.layout.is_empty());
        assert!(restored.connections.is_empty());
    }
}
