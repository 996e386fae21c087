//! Cable connections and the two-click port selection state machine.
//!
//! # Selection protocol
//!
//! ```text
//!            select_port(p)                  select_port(q), q != p
//!   IDLE ────────────────────► ARMED(p) ─────────────────────────────► IDLE
//!     ▲                           │          (creates Connection {p, q})
//!     └───────────────────────────┘
//!            select_port(p)   (toggle-off, no connection)
//! ```
//!
//! The machine has no terminal state.  It is driven purely by discrete
//! `select_port` events, so it works the same for pointer, touch, and
//! keyboard hosts.
//!
//! The store holds connections by [`PortRef`], which is a lookup key into the
//! layout, not an owning reference.  Whoever removes a device must call
//! [`ConnectionStore::cascade_remove_port`] for each of its ports.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::layout::PortRef;

/// Display color given to new cables unless the store is configured otherwise.
pub const DEFAULT_CABLE_COLOR: &str = "#38bdf8";

/// Unique identifier for a connection, derived from UUID v4.
pub type ConnectionId = Uuid;

/// Errors that can occur when editing connections.
#[derive(Debug, Error, PartialEq)]
pub enum ConnectionError {
    /// The specified connection does not exist.
    #[error("connection not found: {0}")]
    UnknownConnection(ConnectionId),

    /// A connection must join two distinct ports.
    #[error("a connection cannot join port {0} to itself")]
    SelfLoop(PortRef),

    /// Another connection already uses this ID.
    #[error("duplicate connection id: {0}")]
    DuplicateId(ConnectionId),
}

/// A cable between two ports.
///
/// The pair is unordered: `{a, b}` and `{b, a}` describe the same cable
/// geometry.  `a` is whichever port was selected first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub a: PortRef,
    pub b: PortRef,
    /// Display color handed to the renderer untouched.
    pub color: String,
}

impl Connection {
    /// Returns `true` if either end is `port`.
    pub fn touches(&self, port: PortRef) -> bool {
        self.a == port || self.b == port
    }

    /// Returns `true` if this connection joins `p` and `q`, in either order.
    pub fn links(&self, p: PortRef, q: PortRef) -> bool {
        (self.a == p && self.b == q) || (self.a == q && self.b == p)
    }

    /// Returns the far end when `port` is one end of this connection.
    pub fn other_end(&self, port: PortRef) -> Option<PortRef> {
        if self.a == port {
            Some(self.b)
        } else if self.b == port {
            Some(self.a)
        } else {
            None
        }
    }
}

/// State of the port selection machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// No pending selection.
    #[default]
    Idle,
    /// One port selected, waiting for its pair.
    Armed(PortRef),
}

/// What a single `select_port` event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The port is now the pending selection.
    Armed(PortRef),
    /// The pending port was selected again and the selection was dropped.
    Cancelled(PortRef),
    /// A second, different port completed a new connection.
    Connected(Connection),
}

/// Owns every connection plus the pending port selection.
#[derive(Debug, Clone)]
pub struct ConnectionStore {
    connections: Vec<Connection>,
    selection: SelectionState,
    default_color: String,
}

impl Default for ConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStore {
    /// Creates an empty store that colors new cables [`DEFAULT_CABLE_COLOR`].
    pub fn new() -> Self {
        Self::with_default_color(DEFAULT_CABLE_COLOR)
    }

    /// Creates an empty store that colors new cables `color`.
    pub fn with_default_color(color: impl Into<String>) -> Self {
        Self {
            connections: Vec::new(),
            selection: SelectionState::Idle,
            default_color: color.into(),
        }
    }

    /// Feeds one port-click event into the selection machine.
    ///
    /// The caller is expected to have checked that `port` exists.
    pub fn select_port(&mut self, port: PortRef) -> SelectionOutcome {
        match self.selection {
            SelectionState::Idle => {
                self.selection = SelectionState::Armed(port);
                debug!(%port, "port armed");
                SelectionOutcome::Armed(port)
            }
            SelectionState::Armed(pending) if pending == port => {
                self.selection = SelectionState::Idle;
                debug!(%port, "selection cancelled");
                SelectionOutcome::Cancelled(port)
            }
            SelectionState::Armed(pending) => {
                let connection = Connection {
                    id: Uuid::new_v4(),
                    a: pending,
                    b: port,
                    color: self.default_color.clone(),
                };
                self.connections.push(connection.clone());
                self.selection = SelectionState::Idle;
                debug!(connection_id = %connection.id, a = %pending, b = %port, "connection created");
                SelectionOutcome::Connected(connection)
            }
        }
    }

    /// Drops the pending selection, if any.
    pub fn cancel_selection(&mut self) {
        self.selection = SelectionState::Idle;
    }

    /// Removes one connection.  The pending selection is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::UnknownConnection`] if no connection has that ID.
    pub fn delete_connection(&mut self, id: ConnectionId) -> Result<Connection, ConnectionError> {
        let pos = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or(ConnectionError::UnknownConnection(id))?;
        debug!(connection_id = %id, "connection deleted");
        Ok(self.connections.remove(pos))
    }

    /// Removes every connection touching `port` and clears an `ARMED(port)`
    /// selection.  Returns the IDs of the removed connections.
    pub fn cascade_remove_port(&mut self, port: PortRef) -> Vec<ConnectionId> {
        let mut removed = Vec::new();
        self.connections.retain(|c| {
            if c.touches(port) {
                removed.push(c.id);
                false
            } else {
                true
            }
        });
        if self.selection == SelectionState::Armed(port) {
            self.selection = SelectionState::Idle;
        }
        if !removed.is_empty() {
            debug!(%port, count = removed.len(), "cascaded connection removal");
        }
        removed
    }

    /// All connections in creation order.
    pub fn list_connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Looks up a connection by ID.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Connections with either end on `port`.
    pub fn connections_for_port(&self, port: PortRef) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.touches(port))
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    /// The pending port, if the machine is armed.
    pub fn pending(&self) -> Option<PortRef> {
        match self.selection {
            SelectionState::Idle => None,
            SelectionState::Armed(port) => Some(port),
        }
    }

    pub fn default_color(&self) -> &str {
        &self.default_color
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Removes every connection and the pending selection.
    pub fn clear(&mut self) {
        self.connections.clear();
        self.selection = SelectionState::Idle;
    }

    /// Inserts an already-built connection, keeping its ID and color.
    ///
    /// Used by snapshot restore.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::SelfLoop`] if both ends are the same port,
    /// or [`ConnectionError::DuplicateId`] if the ID is already in use.
    pub(crate) fn insert_existing(&mut self, connection: Connection) -> Result<(), ConnectionError> {
        if connection.a == connection.b {
            return Err(ConnectionError::SelfLoop(connection.a));
        }
        if self.connection(connection.id).is_some() {
            return Err(ConnectionError::DuplicateId(connection.id));
        }
        self.connections.push(connection);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
