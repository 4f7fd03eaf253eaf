//! A mock backend, useful to exercise the session machinery without
//! actual serial ports.
//!
//! It serves the whole command surface over an authoritative [`Registry`]
//! and pushes events the way a real backend would: a full snapshot when a
//! device appears or disappears, a packet when a line is read, written,
//! relayed or broadcast.
//!
//! [`MockWire`] stands in for the physical side: it can make lines arrive
//! on a port, plug and unplug devices, mark a device busy, raise a fault
//! and switch the host theme.

use std::collections::HashSet;

use bytes::Bytes;
use futures::{channel::mpsc, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::{
    backend::{BackendHandle, BackendLink, BackendRequest},
    config::Config,
    error::Error,
    events::{BackendEvent, Theme},
    packet::{Packet, PacketOrigin, SubscriptionPacketOrigin},
    port::{ManagedPort, OpenOptions},
    registry::Registry,
};

type SnapshotResult = Result<Vec<ManagedPort>, Error>;

#[derive(Debug)]
enum WireMessage {
    Line { port: String, line: String },
    Attach(String),
    Detach(String),
    SetAvailable { port: String, available: bool },
    Fault(String),
    Theme(Theme),
}

/// The physical side of the mock: injects what the outside world would do.
#[derive(Debug, Clone)]
pub struct MockWire(mpsc::UnboundedSender<WireMessage>);

impl MockWire {
    /// Make a line arrive on the given port, as if read from the device.
    pub fn receive_line(&self, port: &str, line: &str) {
        self.send(WireMessage::Line {
            port: port.into(),
            line: line.into(),
        });
    }

    /// Plug in a device. Pushes a snapshot if it was new.
    pub fn attach(&self, port: &str) {
        self.send(WireMessage::Attach(port.into()));
    }

    /// Unplug a device. Pushes a snapshot if it was known.
    pub fn detach(&self, port: &str) {
        self.send(WireMessage::Detach(port.into()));
    }

    /// Mark a device as acquirable or busy.
    /// Only observable at open time, so no snapshot is pushed.
    pub fn set_available(&self, port: &str, available: bool) {
        self.send(WireMessage::SetAvailable {
            port: port.into(),
            available,
        });
    }

    /// Raise a standalone backend error.
    pub fn fault(&self, problem: &str) {
        self.send(WireMessage::Fault(problem.into()));
    }

    /// Switch the host theme.
    pub fn set_theme(&self, theme: Theme) {
        self.send(WireMessage::Theme(theme));
    }

    fn send(&self, message: WireMessage) {
        if self.0.unbounded_send(message).is_err() {
            warn!("Mock backend is gone, dropping wire message");
        }
    }
}

#[derive(Debug)]
enum Input {
    Request(BackendRequest),
    Wire(WireMessage),
}

/// The mock backend actor.
pub struct MockBackend {
    events: broadcast::Sender<BackendEvent>,
    registry: Registry,
    unavailable: HashSet<String>,
}

impl MockBackend {
    /// Spawn a mock backend enumerating the configured devices.
    pub fn spawn(config: &Config) -> (BackendHandle, MockWire) {
        let (handle, link) = BackendHandle::channel();
        let (wire_tx, wire_rx) = mpsc::unbounded();

        let BackendLink { requests, events } = link;

        let names = config
            .ports
            .iter()
            .map(|port| port.name.as_str())
            .collect::<Vec<_>>();
        let unavailable = config
            .ports
            .iter()
            .filter(|port| !port.available)
            .map(|port| port.name.clone())
            .collect::<HashSet<_>>();

        info!(ports = names.len(), "Running mock backend");

        let mut backend = Self {
            events,
            registry: Registry::with_devices(&names),
            unavailable,
        };

        let mut inputs =
            futures::stream::select(requests.map(Input::Request), wire_rx.map(Input::Wire));

        tokio::spawn(async move {
            while let Some(input) = inputs.next().await {
                match input {
                    Input::Request(request) => backend.handle_request(request),
                    Input::Wire(message) => backend.handle_wire(message),
                }
            }

            debug!("All backend handles and wires dropped, mock backend stopping");
        });

        (handle, MockWire(wire_tx))
    }

    fn handle_request(&mut self, request: BackendRequest) {
        debug!("Got request: `{request}`");

        // A caller may have discarded interest in the result,
        // so failing to reply is not an error.
        match request {
            BackendRequest::ListPorts { reply } => {
                let _ = reply.send(Ok(self.registry.snapshot()));
            }
            BackendRequest::OpenPort {
                name,
                options,
                reply,
            } => {
                let _ = reply.send(self.open(&name, options));
            }
            BackendRequest::ClosePort { name, reply } => {
                let _ = reply.send(self.close(&name));
            }
            BackendRequest::Subscribe { from, to, reply } => {
                let _ = reply.send(self.snapshot_after(|registry| registry.subscribe(&from, &to)));
            }
            BackendRequest::Unsubscribe { from, to, reply } => {
                let _ =
                    reply.send(self.snapshot_after(|registry| registry.unsubscribe(&from, &to)));
            }
            BackendRequest::ToggleReadState { name, reply } => {
                let _ = reply.send(
                    self.snapshot_after(|registry| registry.toggle_read_state(&name).map(|_| ())),
                );
            }
            BackendRequest::SendToPort { name, value, reply } => {
                let _ = reply.send(self.send_to_port(&name, &value));
            }
            BackendRequest::SendToAllPorts { value, reply } => {
                for name in self.registry.open_ports() {
                    self.emit_outgoing(&name, PacketOrigin::Broadcast, &value);
                }
                let _ = reply.send(Ok(()));
            }
        }
    }

    fn open(&mut self, name: &str, options: OpenOptions) -> SnapshotResult {
        if !self.registry.contains(name) {
            return Err(Error::PortNotFound(name.into()));
        }
        if self.unavailable.contains(name) {
            return Err(Error::device_unavailable(name, "device is busy"));
        }

        self.registry.open(name, options)?;
        Ok(self.registry.snapshot())
    }

    fn close(&mut self, name: &str) -> SnapshotResult {
        let port = self
            .registry
            .get(name)
            .ok_or_else(|| Error::PortNotFound(name.into()))?;

        // The registry absorbs a redundant close; the backend does not.
        if !port.is_open() {
            return Err(Error::NotOpen(name.into()));
        }

        self.registry.close(name)?;
        Ok(self.registry.snapshot())
    }

    fn snapshot_after(
        &mut self,
        operation: impl FnOnce(&mut Registry) -> Result<(), Error>,
    ) -> SnapshotResult {
        operation(&mut self.registry)?;
        Ok(self.registry.snapshot())
    }

    fn send_to_port(&self, name: &str, value: &str) -> Result<(), Error> {
        let port = self
            .registry
            .get(name)
            .ok_or_else(|| Error::PortNotFound(name.into()))?;

        if !port.is_open() {
            return Err(Error::NotOpen(name.into()));
        }

        self.emit_outgoing(name, PacketOrigin::Direct, value);
        Ok(())
    }

    fn handle_wire(&mut self, message: WireMessage) {
        match message {
            WireMessage::Line { port, line } => self.receive_line(&port, &line),
            WireMessage::Attach(name) => {
                if self.registry.contains(&name) {
                    trace!(%name, "Already attached");
                    return;
                }
                self.registry.attach_device(&name);
                self.emit_snapshot();
            }
            WireMessage::Detach(name) => {
                if !self.registry.contains(&name) {
                    trace!(%name, "Not attached");
                    return;
                }
                self.registry.detach_device(&name);
                self.emit_snapshot();
            }
            WireMessage::SetAvailable { port, available } => {
                if available {
                    self.unavailable.remove(&port);
                } else {
                    self.unavailable.insert(port);
                }
            }
            WireMessage::Fault(problem) => {
                self.emit(BackendEvent::Error(problem));
            }
            WireMessage::Theme(theme) => {
                self.emit(BackendEvent::ThemeChanged(theme));
            }
        }
    }

    fn receive_line(&mut self, port: &str, line: &str) {
        let Some(managed) = self.registry.get(port) else {
            self.emit(BackendEvent::Error(format!(
                "Read a line on unknown port `{port}`"
            )));
            return;
        };

        // A closed or stopped port reads nothing, so nothing is observed
        // and nothing is relayed.
        if !managed.is_reading() {
            trace!(%port, "Dropping line, port is not reading");
            return;
        }

        self.emit(BackendEvent::PacketObserved(Packet::incoming(
            port,
            line,
            timestamp_millis(),
        )));

        for target in self.registry.relay_targets(port) {
            self.emit_outgoing(
                &target,
                PacketOrigin::Subscription(SubscriptionPacketOrigin { name: port.into() }),
                line,
            );
        }
    }

    fn emit_outgoing(&self, port: &str, origin: PacketOrigin, value: &str) {
        self.emit(BackendEvent::PacketObserved(Packet::outgoing(
            port,
            origin,
            Bytes::copy_from_slice(value.as_bytes()),
            timestamp_millis(),
        )));
    }

    fn emit_snapshot(&self) {
        self.emit(BackendEvent::PortListChanged(self.registry.snapshot()));
    }

    fn emit(&self, event: BackendEvent) {
        match self.events.send(event) {
            Ok(listeners) => trace!("Pushed event to {listeners} listener(s)"),
            Err(_) => trace!("No listeners for event"),
        }
    }
}

fn timestamp_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
