//! Command bridge: exposes editor operations to interactive hosts.
//!
//! Every command is an `async fn` taking the shared [`AppState`] and returning
//! a [`CommandResult`], so a desktop shell, a web front end or the CLI can
//! drive the editor through one surface and always receive the same JSON
//! shape: `{ success: bool, data: T | null, error: string | null }`.
//!
//! # Data Transfer Objects (DTOs)
//!
//! DTOs carry only JSON-friendly fields.  Device, connection and port IDs
//! cross the bridge as strings and are parsed back into UUIDs here; a
//! malformed ID is reported as a normal command error.
//!
//! # Persistence
//!
//! Every command that changes the layout saves it through the configured
//! [`LayoutRepository`] before returning.  If that save fails the session is
//! rolled back to its state before the command and the storage error is
//! reported, so a failed command never leaves a change behind.

use std::sync::Arc;

use rack_core::{
    Connection, ConnectionStore, Device, DeviceId, LayoutStore, Port, PortRef, SelectionOutcome,
    SelectionState, U_MAX,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::editor::{EditorError, EditorSession, RemovedDevice};
use crate::application::repository::LayoutRepository;
use crate::infrastructure::storage::config::AppConfig;

// ── Shared application state ──────────────────────────────────────────────────

/// State shared between commands.
///
/// Wrapped in `Arc<>` by [`AppState::new`]; each field is a Tokio mutex so
/// commands issued concurrently by an async host run one at a time.
pub struct AppState {
    /// The rack being edited.
    pub session: Mutex<EditorSession>,
    /// Effective configuration the session was built from.
    pub config: Mutex<AppConfig>,
    /// Where the layout is loaded from and saved to.
    pub repository: Box<dyn LayoutRepository>,
}

impl AppState {
    /// Builds the session from `config` and loads the stored layout.
    ///
    /// # Errors
    ///
    /// [`EditorError::Catalog`] if a configured catalog entry is invalid, or
    /// [`EditorError::Storage`] if the stored layout cannot be read.
    pub fn new(
        config: AppConfig,
        repository: Box<dyn LayoutRepository>,
    ) -> Result<Arc<Self>, EditorError> {
        let catalog = config.build_catalog()?;
        let mut session =
            EditorSession::with_cable_color(catalog, config.editor.default_cable_color.clone());
        match session.load_from(repository.as_ref())? {
            Some(report) if !report.is_clean() => warn!(
                dropped_devices = report.dropped_devices.len(),
                dropped_connections = report.dropped_connections.len(),
                "stored layout contained invalid records"
            ),
            Some(_) => info!(devices = session.layout().len(), "layout loaded"),
            None => info!("starting with an empty rack"),
        }

        Ok(Arc::new(Self {
            session: Mutex::new(session),
            config: Mutex::new(config),
            repository,
        }))
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// A catalog entry as listed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntryDto {
    pub key: String,
    pub name: String,
    pub height_units: u32,
    pub port_count: u32,
    pub display_color: String,
    pub category: String,
}

/// One port of a placed device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDto {
    pub index: u32,
    pub label: Option<String>,
    pub vlan: Option<u16>,
}

impl From<&Port> for PortDto {
    fn from(p: &Port) -> Self {
        Self {
            index: p.index,
            label: p.label.clone(),
            vlan: p.vlan,
        }
    }
}

/// A placed device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDto {
    pub id: String,
    pub model_key: String,
    pub name: String,
    pub height_units: u32,
    pub display_color: String,
    pub start_unit: u32,
    pub top_unit: u32,
    pub ports: Vec<PortDto>,
}

impl From<&Device> for DeviceDto {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.to_string(),
            model_key: d.model_key.clone(),
            name: d.name.clone(),
            height_units: d.height_units,
            display_color: d.display_color.clone(),
            start_unit: d.start_unit,
            top_unit: d.top_unit(),
            ports: d.ports.iter().map(PortDto::from).collect(),
        }
    }
}

/// A port identity as sent by the host: device ID string plus port index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRefDto {
    pub device_id: String,
    pub port_index: u32,
}

impl From<PortRef> for PortRefDto {
    fn from(p: PortRef) -> Self {
        Self {
            device_id: p.device_id.to_string(),
            port_index: p.port_index,
        }
    }
}

impl PortRefDto {
    fn parse(&self) -> Result<PortRef, String> {
        Ok(PortRef::new(parse_id(&self.device_id, "device")?, self.port_index))
    }
}

/// A cable between two ports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub id: String,
    pub a: PortRefDto,
    pub b: PortRefDto,
    pub color: String,
}

impl From<&Connection> for ConnectionDto {
    fn from(c: &Connection) -> Self {
        Self {
            id: c.id.to_string(),
            a: c.a.into(),
            b: c.b.into(),
            color: c.color.clone(),
        }
    }
}

/// The port selection machine as seen by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionDto {
    /// `"idle"` or `"armed"`.
    pub state: String,
    pub pending: Option<PortRefDto>,
}

impl From<SelectionState> for SelectionDto {
    fn from(s: SelectionState) -> Self {
        match s {
            SelectionState::Idle => Self {
                state: "idle".to_string(),
                pending: None,
            },
            SelectionState::Armed(port) => Self {
                state: "armed".to_string(),
                pending: Some(port.into()),
            },
        }
    }
}

/// Everything a renderer needs to draw the rack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDto {
    pub rack_units: u32,
    pub devices: Vec<DeviceDto>,
    pub connections: Vec<ConnectionDto>,
    pub selection: SelectionDto,
}

impl LayoutDto {
    fn build(layout: &LayoutStore, connections: &ConnectionStore) -> Self {
        Self {
            rack_units: U_MAX,
            devices: layout.list_devices().iter().map(DeviceDto::from).collect(),
            connections: connections
                .list_connections()
                .iter()
                .map(ConnectionDto::from)
                .collect(),
            selection: connections.selection().into(),
        }
    }
}

/// Result of one port click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectPortDto {
    /// `"armed"`, `"cancelled"` or `"connected"`.
    pub outcome: String,
    /// The new cable when `outcome` is `"connected"`.
    pub connection: Option<ConnectionDto>,
    pub selection: SelectionDto,
}

/// A removed device plus the cables removed with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedDeviceDto {
    pub device: DeviceDto,
    pub removed_connections: Vec<String>,
}

impl From<&RemovedDevice> for RemovedDeviceDto {
    fn from(r: &RemovedDevice) -> Self {
        Self {
            device: DeviceDto::from(&r.device),
            removed_connections: r.removed_connections.iter().map(Uuid::to_string).collect(),
        }
    }
}

/// Editor settings shown by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDto {
    pub log_level: String,
    pub default_cable_color: String,
    pub layout_file: String,
}

/// Unified response wrapper used by every command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, String> {
    raw.trim()
        .parse::<Uuid>()
        .map_err(|e| format!("invalid {what} id {raw:?}: {e}"))
}

/// Saves the session, turning a failure into a command error message.
fn persist(state: &AppState, session: &EditorSession) -> Result<(), String> {
    session.save_to(state.repository.as_ref()).map_err(|e| {
        warn!("layout change not saved: {e}");
        e.to_string()
    })
}

/// Runs `op` on the locked session and persists the result on success.
///
/// A failed save restores the session as it was before `op`.
async fn mutate<T, F>(state: &AppState, op: F) -> CommandResult<T>
where
    T: Serialize,
    F: FnOnce(&mut EditorSession) -> Result<T, EditorError>,
{
    let mut session = state.session.lock().await;
    let before = session.clone();
    let data = match op(&mut *session) {
        Ok(data) => data,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    match persist(state, &session) {
        Ok(()) => CommandResult::ok(data),
        Err(e) => {
            *session = before;
            CommandResult::err(e)
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Lists the hardware models that can be placed.
pub async fn get_catalog(state: Arc<AppState>) -> CommandResult<Vec<CatalogEntryDto>> {
    let session = state.session.lock().await;
    let dtos = session
        .catalog()
        .iter()
        .map(|(key, m)| CatalogEntryDto {
            key: key.to_string(),
            name: m.name.clone(),
            height_units: m.height_units,
            port_count: m.port_count,
            display_color: m.display_color.clone(),
            category: m.category.to_string(),
        })
        .collect();
    CommandResult::ok(dtos)
}

/// Returns the full rack: devices, cables and the pending selection.
pub async fn get_layout(state: Arc<AppState>) -> CommandResult<LayoutDto> {
    let session = state.session.lock().await;
    CommandResult::ok(LayoutDto::build(session.layout(), session.connections()))
}

/// Returns the editor settings in effect.
pub async fn get_settings(state: Arc<AppState>) -> CommandResult<SettingsDto> {
    let config = state.config.lock().await;
    CommandResult::ok(SettingsDto {
        log_level: config.editor.log_level.clone(),
        default_cable_color: config.editor.default_cable_color.clone(),
        layout_file: config.storage.layout_file.display().to_string(),
    })
}

/// Places a device of `model_key` at the lowest free unit.
pub async fn place_device(state: Arc<AppState>, model_key: String) -> CommandResult<DeviceDto> {
    mutate(&state, |s| s.place_device(&model_key).map(|d| DeviceDto::from(&d))).await
}

/// Moves a device to `start_unit`, clamping at the top of the rack.
pub async fn move_device(
    state: Arc<AppState>,
    device_id: String,
    start_unit: i64,
) -> CommandResult<DeviceDto> {
    let id: DeviceId = match parse_id(&device_id, "device") {
        Ok(id) => id,
        Err(e) => return CommandResult::err(e),
    };
    mutate(&state, |s| s.move_device(id, start_unit).map(|d| DeviceDto::from(&d))).await
}

/// Removes a device and every cable attached to it.
pub async fn remove_device(state: Arc<AppState>, device_id: String) -> CommandResult<RemovedDeviceDto> {
    let id = match parse_id(&device_id, "device") {
        Ok(id) => id,
        Err(e) => return CommandResult::err(e),
    };
    mutate(&state, |s| s.remove_device(id).map(|r| RemovedDeviceDto::from(&r))).await
}

/// Feeds one port click into the selection machine.
///
/// Only a completed connection changes the persisted layout.
pub async fn select_port(state: Arc<AppState>, port: PortRefDto) -> CommandResult<SelectPortDto> {
    let port = match port.parse() {
        Ok(p) => p,
        Err(e) => return CommandResult::err(e),
    };
    let mut session = state.session.lock().await;
    let before = session.clone();
    let outcome = match session.select_port(port) {
        Ok(outcome) => outcome,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    let (label, connection) = match &outcome {
        SelectionOutcome::Armed(_) => ("armed", None),
        SelectionOutcome::Cancelled(_) => ("cancelled", None),
        SelectionOutcome::Connected(c) => ("connected", Some(ConnectionDto::from(c))),
    };
    if connection.is_some() {
        if let Err(e) = persist(&state, &session) {
            *session = before;
            return CommandResult::err(e);
        }
    }
    CommandResult::ok(SelectPortDto {
        outcome: label.to_string(),
        connection,
        selection: session.connections().selection().into(),
    })
}

/// Drops the pending port selection.
pub async fn cancel_selection(state: Arc<AppState>) -> CommandResult<SelectionDto> {
    let mut session = state.session.lock().await;
    session.cancel_selection();
    CommandResult::ok(session.connections().selection().into())
}

/// Deletes one cable.
pub async fn delete_connection(
    state: Arc<AppState>,
    connection_id: String,
) -> CommandResult<ConnectionDto> {
    let id = match parse_id(&connection_id, "connection") {
        Ok(id) => id,
        Err(e) => return CommandResult::err(e),
    };
    mutate(&state, |s| s.delete_connection(id).map(|c| ConnectionDto::from(&c))).await
}

/// Sets or clears (`None` or blank) a port label.
pub async fn set_port_label(
    state: Arc<AppState>,
    port: PortRefDto,
    label: Option<String>,
) -> CommandResult<PortDto> {
    let port = match port.parse() {
        Ok(p) => p,
        Err(e) => return CommandResult::err(e),
    };
    mutate(&state, |s| s.set_port_label(port, label).map(|p| PortDto::from(&p))).await
}

/// Sets or clears a port VLAN tag.
pub async fn set_port_vlan(
    state: Arc<AppState>,
    port: PortRefDto,
    vlan: Option<u16>,
) -> CommandResult<PortDto> {
    let port = match port.parse() {
        Ok(p) => p,
        Err(e) => return CommandResult::err(e),
    };
    mutate(&state, |s| s.set_port_vlan(port, vlan).map(|p| PortDto::from(&p))).await
}

/// Empties the rack.
pub async fn reset_layout(state: Arc<AppState>) -> CommandResult<LayoutDto> {
    mutate(&state, |s| {
        s.reset();
        Ok(LayoutDto::build(s.layout(), s.connections()))
    })
    .await
}

/// Saves the current layout explicitly.
pub async fn save_layout(state: Arc<AppState>) -> CommandResult<()> {
    let session = state.session.lock().await;
    match persist(&state, &session) {
        Ok(()) => CommandResult::ok(()),
        Err(e) => CommandResult::err(e),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
