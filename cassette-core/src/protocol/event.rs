//! Server-pushed event payloads (frames on stream −1).

use crate::error::{CqlError, Result};
use crate::serialization::CqlRead;

use super::result::SchemaChange;

use std::fmt;
use std::net::SocketAddr;

/// Event categories a client can REGISTER for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Nodes joining or leaving the cluster.
    TopologyChange,
    /// Nodes going up or down.
    StatusChange,
    /// Schema alterations.
    SchemaChange,
}

impl EventType {
    /// Returns the `[string]` name used on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::TopologyChange => "TOPOLOGY_CHANGE",
            Self::StatusChange => "STATUS_CHANGE",
            Self::SchemaChange => "SCHEMA_CHANGE",
        }
    }

    /// Parses the wire name of an event category.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "TOPOLOGY_CHANGE" => Some(Self::TopologyChange),
            "STATUS_CHANGE" => Some(Self::StatusChange),
            "SCHEMA_CHANGE" => Some(Self::SchemaChange),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The kind of topology change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChange {
    /// A node joined the cluster.
    NewNode,
    /// A node left the cluster.
    RemovedNode,
    /// A node changed token ownership (v2).
    MovedNode,
}

impl TopologyChange {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "NEW_NODE" => Some(Self::NewNode),
            "REMOVED_NODE" => Some(Self::RemovedNode),
            "MOVED_NODE" => Some(Self::MovedNode),
            _ => None,
        }
    }
}

/// The kind of status change an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The node is up.
    Up,
    /// The node is down.
    Down,
}

impl StatusChange {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(Self::Up),
            "DOWN" => Some(Self::Down),
            _ => None,
        }
    }
}

/// A decoded server-pushed event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterEvent {
    /// A node joined, left or moved.
    Topology {
        /// What changed.
        change: TopologyChange,
        /// The node concerned.
        node: SocketAddr,
    },
    /// A node went up or down.
    Status {
        /// What changed.
        change: StatusChange,
        /// The node concerned.
        node: SocketAddr,
    },
    /// The schema was altered.
    Schema(SchemaChange),
}

impl ClusterEvent {
    /// Decodes an EVENT frame body.
    pub fn decode(input: &mut impl CqlRead) -> Result<Self> {
        let event_type = input.read_string()?;
        match EventType::from_wire(&event_type) {
            Some(EventType::TopologyChange) => {
                let change_name = input.read_string()?;
                let change = TopologyChange::from_wire(&change_name).ok_or_else(|| {
                    CqlError::Protocol(format!("unknown topology change {:?}", change_name))
                })?;
                let node = input.read_inet()?;
                Ok(Self::Topology { change, node })
            }
            Some(EventType::StatusChange) => {
                let change_name = input.read_string()?;
                let change = StatusChange::from_wire(&change_name).ok_or_else(|| {
                    CqlError::Protocol(format!("unknown status change {:?}", change_name))
                })?;
                let node = input.read_inet()?;
                Ok(Self::Status { change, node })
            }
            Some(EventType::SchemaChange) => Ok(Self::Schema(SchemaChange::decode(input)?)),
            None => Err(CqlError::Protocol(format!(
                "unknown event type {:?}",
                event_type
            ))),
        }
    }
}
