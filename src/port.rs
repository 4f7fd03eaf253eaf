use std::collections::BTreeSet;
use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Whether an open port is currently reading lines from the wire.
///
/// Only meaningful while a port is open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ReadState {
    /// Lines arriving on the wire are read and observed.
    Read,

    /// The read side is paused. Lines arriving on the wire are dropped.
    Stop,
}

impl ReadState {
    /// The opposite read state.
    pub fn toggled(self) -> Self {
        match self {
            ReadState::Read => ReadState::Stop,
            ReadState::Stop => ReadState::Read,
        }
    }
}

impl Display for ReadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadState::Read => write!(f, "read"),
            ReadState::Stop => write!(f, "stop"),
        }
    }
}

/// The payload of an open port's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenStatus {
    /// See [`ReadState`].
    pub read_state: ReadState,
}

/// The state a managed port is in.
///
/// On the wire this is adjacently tagged:
/// `{"type":"closed"}` or `{"type":"open","content":{"readState":"read"}}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "content", rename_all = "camelCase")]
pub enum Status {
    /// The port is not open.
    Closed,

    /// The port is open, with a read sub-state.
    Open(OpenStatus),
}

impl Status {
    /// An open status with the given read state.
    pub fn open(read_state: ReadState) -> Self {
        Self::Open(OpenStatus { read_state })
    }

    /// The read state, if open.
    pub fn read_state(&self) -> Option<ReadState> {
        match self {
            Status::Closed => None,
            Status::Open(open) => Some(open.read_state),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Closed => write!(f, "closed"),
            Status::Open(open) => write!(f, "open ({})", open.read_state),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DataBits {
    /// Five data bits.
    Five,

    /// Six data bits.
    Six,

    /// Seven data bits.
    Seven,

    /// Eight data bits.
    #[default]
    Eight,
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FlowControl {
    /// No flow control.
    #[default]
    None,

    /// XON/XOFF.
    Software,

    /// RTS/CTS.
    Hardware,
}

/// Parity bit mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Parity {
    /// No parity bit.
    #[default]
    None,

    /// Odd parity.
    Odd,

    /// Even parity.
    Even,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StopBits {
    /// One stop bit.
    #[default]
    One,

    /// Two stop bits.
    Two,
}

/// The options used to open a port.
///
/// All fields except `baud_rate` and `initial_read_state` have defaults.
/// The open timeout is interpreted by the backend; zero means no timeout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenOptions {
    /// The baud rate.
    pub baud_rate: u32,

    /// See [`DataBits`].
    #[serde(default)]
    pub data_bits: DataBits,

    /// See [`FlowControl`].
    #[serde(default)]
    pub flow_control: FlowControl,

    /// See [`Parity`].
    #[serde(default)]
    pub parity: Parity,

    /// See [`StopBits`].
    #[serde(default)]
    pub stop_bits: StopBits,

    /// The read state the port starts out in once open.
    pub initial_read_state: ReadState,

    /// How long the backend may spend acquiring the device.
    /// Serialized as `{secs, nanos}`.
    #[serde(default)]
    pub timeout: Duration,
}

impl OpenOptions {
    /// Options with the given baud rate, reading immediately,
    /// and everything else at its default.
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::default(),
            flow_control: FlowControl::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            initial_read_state: ReadState::Read,
            timeout: Duration::ZERO,
        }
    }

    /// Start out with the read side paused.
    pub fn start_stopped(mut self) -> Self {
        self.initial_read_state = ReadState::Stop;
        self
    }
}

/// A named serial device tracked by the registry.
///
/// The name is assigned by device enumeration and is the stable,
/// case-sensitive key of the registry entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPort {
    /// The unique port name, e.g. `COM1` or `/dev/ttyACM0`.
    pub name: String,

    /// See [`Status`].
    pub status: Status,

    /// Names of ports this port relays its incoming lines to.
    pub subscriptions: BTreeSet<String>,

    /// Names of ports this port receives relayed lines from.
    /// The converse of [`ManagedPort::subscriptions`], kept for O(1) reverse lookup.
    pub subscribed_to: BTreeSet<String>,

    /// The options last used (or attempted) to open this port.
    /// Retained after close for re-open convenience. Not persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_open_options: Option<OpenOptions>,
}

impl ManagedPort {
    /// A closed port with no edges.
    pub fn closed(name: &str) -> Self {
        Self {
            name: name.into(),
            status: Status::Closed,
            subscriptions: BTreeSet::new(),
            subscribed_to: BTreeSet::new(),
            last_used_open_options: None,
        }
    }

    /// Whether the port is open.
    pub fn is_open(&self) -> bool {
        matches!(self.status, Status::Open(_))
    }

    /// Whether the port is open and currently reading.
    pub fn is_reading(&self) -> bool {
        self.status.read_state() == Some(ReadState::Read)
    }
}

impl Display for ManagedPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_wire_shape() {
        let closed = serde_json::to_value(Status::Closed).unwrap();
        assert_eq!(closed, serde_json::json!({ "type": "closed" }));

        let open = serde_json::to_value(Status::open(ReadState::Read)).unwrap();
        assert_eq!(
            open,
            serde_json::json!({ "type": "open", "content": { "readState": "read" } })
        );
    }

    #[test]
    fn open_options_defaults() {
        let options: OpenOptions = serde_json::from_value(serde_json::json!({
            "baudRate": 9600,
            "initialReadState": "stop",
        }))
        .unwrap();

        assert_eq!(options.baud_rate, 9600);
        assert_eq!(options.data_bits, DataBits::Eight);
        assert_eq!(options.flow_control, FlowControl::None);
        assert_eq!(options.parity, Parity::None);
        assert_eq!(options.stop_bits, StopBits::One);
        assert_eq!(options.initial_read_state, ReadState::Stop);
        assert_eq!(options.timeout, Duration::ZERO);
    }

    #[test]
    fn open_options_timeout_wire_shape() {
        let options = serde_json::to_value(OpenOptions::new(115_200)).unwrap();

        assert_eq!(
            options["timeout"],
            serde_json::json!({ "secs": 0, "nanos": 0 })
        );
    }

    #[test]
    fn toggling() {
        assert_eq!(ReadState::Read.toggled(), ReadState::Stop);
        assert_eq!(ReadState::Stop.toggled(), ReadState::Read);
    }
}
