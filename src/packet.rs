use std::fmt::Display;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A line read from the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IncomingPacket {
    /// The line, without its terminator.
    pub line: String,
}

/// The subscription edge a relayed send was triggered by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPacketOrigin {
    /// The port the relayed line was read on.
    pub name: String,
}

/// Why bytes were written to a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum PacketOrigin {
    /// A user-initiated send to this port.
    Direct,

    /// A send-to-all-open-ports.
    Broadcast,

    /// A relay triggered by a subscription edge.
    Subscription(SubscriptionPacketOrigin),
}

impl Display for PacketOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketOrigin::Direct => write!(f, "direct"),
            PacketOrigin::Broadcast => write!(f, "broadcast"),
            PacketOrigin::Subscription(origin) => write!(f, "subscription from {}", origin.name),
        }
    }
}

/// Bytes written to the wire, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingPacket {
    /// See [`PacketOrigin`].
    pub packet_origin: PacketOrigin,

    /// The bytes put on the wire.
    pub bytes: Bytes,
}

/// Which way a packet travelled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum PacketDirection {
    /// Read from the wire.
    Incoming(IncomingPacket),

    /// Written to the wire.
    Outgoing(OutgoingPacket),
}

impl Display for PacketDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketDirection::Incoming(incoming) => {
                let line = incoming.line.chars().take(48).collect::<String>();
                write!(f, "incoming: {}", line.trim())
            }
            PacketDirection::Outgoing(outgoing) => {
                write!(
                    f,
                    "outgoing ({}): [{:?}]..",
                    outgoing.packet_origin,
                    &outgoing.bytes[0..outgoing.bytes.len().min(16)]
                )
            }
        }
    }
}

/// A packet observed on a port, as pushed by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Packet {
    /// See [`PacketDirection`].
    pub packet_direction: PacketDirection,

    /// The port the packet is attributed to.
    pub port_name: String,

    /// Backend-assigned capture time, in milliseconds.
    pub timestamp_millis: u64,
}

impl Packet {
    /// An incoming packet.
    pub fn incoming(port_name: &str, line: &str, timestamp_millis: u64) -> Self {
        Self {
            packet_direction: PacketDirection::Incoming(IncomingPacket { line: line.into() }),
            port_name: port_name.into(),
            timestamp_millis,
        }
    }

    /// An outgoing packet with the given origin.
    pub fn outgoing(
        port_name: &str,
        packet_origin: PacketOrigin,
        bytes: Bytes,
        timestamp_millis: u64,
    ) -> Self {
        Self {
            packet_direction: PacketDirection::Outgoing(OutgoingPacket {
                packet_origin,
                bytes,
            }),
            port_name: port_name.into(),
            timestamp_millis,
        }
    }

    /// File this packet under its port, dropping the redundant name.
    pub fn into_record(self) -> (String, PacketRecord) {
        (
            self.port_name,
            PacketRecord {
                packet_direction: self.packet_direction,
                timestamp_millis: self.timestamp_millis,
            },
        )
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.port_name, self.packet_direction)
    }
}

/// A [`Packet`] as filed in the packet log, keyed under its port name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PacketRecord {
    /// See [`PacketDirection`].
    pub packet_direction: PacketDirection,

    /// Backend-assigned capture time, in milliseconds.
    pub timestamp_millis: u64,
}

impl PacketRecord {
    /// Whether this record is an incoming line.
    pub fn is_incoming(&self) -> bool {
        matches!(self.packet_direction, PacketDirection::Incoming(_))
    }

    /// The origin, if this record is an outgoing packet.
    pub fn origin(&self) -> Option<&PacketOrigin> {
        match &self.packet_direction {
            PacketDirection::Incoming(_) => None,
            PacketDirection::Outgoing(outgoing) => Some(&outgoing.packet_origin),
        }
    }
}
