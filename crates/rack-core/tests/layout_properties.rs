//! Integration tests for the layout and connection stores.
//!
//! These exercise the public `rack_core` API the way a host would: place and
//! move devices, click ports, remove devices and cascade the removal into the
//! connection store by hand.

use rack_core::{
    Catalog, Category, ConnectionStore, HardwareModel, LayoutError, LayoutSnapshot, LayoutStore,
    PortRef, SelectionOutcome, SelectionState, DEFAULT_CABLE_COLOR, U_MAX,
};

fn builtin(key: &str) -> HardwareModel {
    Catalog::builtin()
        .get(key)
        .cloned()
        .expect("built-in model must exist")
}

fn assert_pairwise_disjoint(layout: &LayoutStore) {
    let devices = layout.list_devices();
    for (i, a) in devices.iter().enumerate() {
        for b in &devices[i + 1..] {
            assert!(
                !rack_core::intervals_overlap(a.start_unit, a.height_units, b.start_unit, b.height_units),
                "devices {} and {} overlap",
                a.id,
                b.id
            );
        }
    }
}

/// Removes a device and cascades into the connection store, the way the
/// editor session does.
fn remove_with_cascade(
    layout: &mut LayoutStore,
    connections: &mut ConnectionStore,
    device_id: rack_core::DeviceId,
) -> usize {
    let (_, ports) = layout.remove_device(device_id).expect("device exists");
    ports
        .into_iter()
        .map(|p| connections.cascade_remove_port(p).len())
        .sum()
}

#[test]
fn test_lowest_free_start_for_one_then_two_unit_devices() {
    let mut layout = LayoutStore::new();

    let fw = layout.place_device("FIREWALL", &builtin("FIREWALL")).unwrap();
    let srv = layout.place_device("SERVER_2U", &builtin("SERVER_2U")).unwrap();

    assert_eq!(fw.start_unit, 1);
    assert_eq!(srv.start_unit, 2);
}

#[test]
fn test_mixed_heights_pack_without_overlap_until_full() {
    let mut layout = LayoutStore::new();
    let heights = [1u32, 2, 3, 1, 4, 2];
    let mut placed = 0;
    let mut i = 0;
    loop {
        let h = heights[i % heights.len()];
        let model = HardwareModel::new("box", h, 0, "c", Category::Server);
        match layout.place_device("BOX", &model) {
            Ok(_) => placed += h,
            Err(LayoutError::NoRoomAvailable { .. }) => break,
            Err(e) => panic!("unexpected error {e}"),
        }
        i += 1;
        assert_pairwise_disjoint(&layout);
    }
    assert!(placed <= U_MAX);
    assert_eq!(layout.occupied_units(), placed);
}

#[test]
fn test_failed_move_leaves_every_device_untouched() {
    let mut layout = LayoutStore::new();
    let a = layout.place_device("SERVER_2U", &builtin("SERVER_2U")).unwrap();
    let b = layout.place_device("SERVER_2U", &builtin("SERVER_2U")).unwrap();
    let before = layout.list_devices().to_vec();

    let err = layout.move_device(a.id, i64::from(b.start_unit)).unwrap_err();

    assert!(matches!(err, LayoutError::SlotOccupied { .. }));
    assert_eq!(layout.list_devices(), before.as_slice());
}

#[test]
fn test_select_same_port_twice_creates_nothing() {
    let mut layout = LayoutStore::new();
    let mut connections = ConnectionStore::new();
    let sw = layout.place_device("SWITCH_24", &builtin("SWITCH_24")).unwrap();
    let p = PortRef::new(sw.id, 5);

    connections.select_port(p);
    connections.select_port(p);

    assert_eq!(connections.selection(), SelectionState::Idle);
    assert!(connections.list_connections().is_empty());
}

#[test]
fn test_select_two_ports_creates_one_connection() {
    let mut layout = LayoutStore::new();
    let mut connections = ConnectionStore::new();
    let fw = layout.place_device("FIREWALL", &builtin("FIREWALL")).unwrap();
    let sw = layout.place_device("SWITCH_24", &builtin("SWITCH_24")).unwrap();
    let (p, q) = (PortRef::new(fw.id, 1), PortRef::new(sw.id, 24));

    assert_eq!(connections.select_port(p), SelectionOutcome::Armed(p));
    let outcome = connections.select_port(q);

    let SelectionOutcome::Connected(connection) = outcome else {
        panic!("expected a connection, got {outcome:?}");
    };
    assert!(connection.links(p, q));
    assert_eq!(connection.color, DEFAULT_CABLE_COLOR);
    assert_eq!(connections.list_connections().len(), 1);
    assert_eq!(connections.selection(), SelectionState::Idle);
}

#[test]
fn test_removing_device_cascades_to_all_its_connections_and_pending_port() {
    // Arrange: patch panel wired to a switch on three ports, plus an armed
    // selection on a fourth panel port
    let mut layout = LayoutStore::new();
    let mut connections = ConnectionStore::new();
    let panel = layout.place_device("PATCH_PANEL", &builtin("PATCH_PANEL")).unwrap();
    let sw = layout.place_device("SWITCH_24", &builtin("SWITCH_24")).unwrap();
    let fw = layout.place_device("FIREWALL", &builtin("FIREWALL")).unwrap();
    for i in 1..=3 {
        connections.select_port(PortRef::new(panel.id, i));
        connections.select_port(PortRef::new(sw.id, i));
    }
    connections.select_port(PortRef::new(sw.id, 24));
    connections.select_port(PortRef::new(fw.id, 1));
    connections.select_port(PortRef::new(panel.id, 4));

    // Act
    let removed = remove_with_cascade(&mut layout, &mut connections, panel.id);

    // Assert
    assert_eq!(removed, 3);
    assert_eq!(connections.list_connections().len(), 1);
    assert_eq!(connections.selection(), SelectionState::Idle);
    assert!(connections
        .list_connections()
        .iter()
        .all(|c| c.a.device_id != panel.id && c.b.device_id != panel.id));
}

#[test]
fn test_round_trip_of_three_devices_and_two_connections_through_json() {
    // Arrange
    let catalog = Catalog::builtin();
    let mut layout = LayoutStore::new();
    let mut connections = ConnectionStore::new();
    let fw = layout.place_device("FIREWALL", &builtin("FIREWALL")).unwrap();
    let sw = layout.place_device("SWITCH_24", &builtin("SWITCH_24")).unwrap();
    let srv = layout.place_device("SERVER_2U", &builtin("SERVER_2U")).unwrap();
    layout.move_device(srv.id, 30).unwrap();
    connections.select_port(PortRef::new(fw.id, 2));
    connections.select_port(PortRef::new(sw.id, 1));
    connections.select_port(PortRef::new(sw.id, 2));
    connections.select_port(PortRef::new(srv.id, 4));

    // Act
    let json = serde_json::to_string(&LayoutSnapshot::capture(&layout, &connections)).unwrap();
    let snapshot: LayoutSnapshot = serde_json::from_str(&json).unwrap();
    let restored = snapshot.restore(&catalog, DEFAULT_CABLE_COLOR);

    // Assert
    assert!(restored.report.is_clean());
    assert_eq!(restored.layout.list_devices(), layout.list_devices());
    assert_eq!(
        restored.connections.list_connections(),
        connections.list_connections()
    );
}

#[test]
fn test_model_taller_than_rack_is_never_placed() {
    let mut layout = LayoutStore::new();
    let tower = HardwareModel::new("Tower", U_MAX + 5, 0, "c", Category::Server);
    assert_eq!(
        layout.place_device("TOWER", &tower),
        Err(LayoutError::NoRoomAvailable { height: U_MAX + 5 })
    );
    assert!(layout.is_empty());
}

#[test]
fn test_forty_two_firewalls_fill_rack_exactly() {
    let mut layout = LayoutStore::new();
    let fw = builtin("FIREWALL");
    for _ in 0..U_MAX {
        layout.place_device("FIREWALL", &fw).expect("rack not yet full");
    }
    assert_eq!(layout.free_units(), 0);
    assert!(matches!(
        layout.place_device("FIREWALL", &fw),
        Err(LayoutError::NoRoomAvailable { height: 1 })
    ));
}
