//! The channel protocol between this core and the backend which owns the
//! actual device handles.
//!
//! Commands are request/oneshot-response round trips; every state-changing
//! command answers with the full authoritative port list, never a delta.
//! Push notifications travel the other way on a broadcast channel.

use std::fmt::Display;

use futures::channel::mpsc;
use tokio::sync::{broadcast, oneshot};

use crate::{
    error::Error,
    events::BackendEvent,
    port::{ManagedPort, OpenOptions},
};

/// The capacity of the backend's push-event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// A snapshot-returning response channel.
pub type SnapshotReply = oneshot::Sender<Result<Vec<ManagedPort>, Error>>;

/// A response channel for commands with no state to report.
pub type UnitReply = oneshot::Sender<Result<(), Error>>;

/// Requests a backend must serve.
#[derive(Debug)]
pub enum BackendRequest {
    /// List the managed ports.
    ListPorts {
        /// Where the snapshot goes.
        reply: SnapshotReply,
    },

    /// Open a port with the given options.
    OpenPort {
        /// The port to open.
        name: String,

        /// How to open it.
        options: OpenOptions,

        /// Where the snapshot goes.
        reply: SnapshotReply,
    },

    /// Close a port.
    ClosePort {
        /// The port to close.
        name: String,

        /// Where the snapshot goes.
        reply: SnapshotReply,
    },

    /// Add the subscription edge `from → to`.
    Subscribe {
        /// The port lines are read on.
        from: String,

        /// The port lines are relayed to.
        to: String,

        /// Where the snapshot goes.
        reply: SnapshotReply,
    },

    /// Remove the subscription edge `from → to`.
    Unsubscribe {
        /// The port lines are read on.
        from: String,

        /// The port lines were relayed to.
        to: String,

        /// Where the snapshot goes.
        reply: SnapshotReply,
    },

    /// Toggle a port between reading and stopped.
    ToggleReadState {
        /// The port to toggle.
        name: String,

        /// Where the snapshot goes.
        reply: SnapshotReply,
    },

    /// Write a value to one port.
    SendToPort {
        /// The port to write to.
        name: String,

        /// What to write.
        value: String,

        /// Success or failure, nothing more.
        reply: UnitReply,
    },

    /// Write a value to every open port.
    SendToAllPorts {
        /// What to write.
        value: String,

        /// Success or failure, nothing more.
        reply: UnitReply,
    },
}

impl Display for BackendRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendRequest::ListPorts { .. } => write!(f, "list ports"),
            BackendRequest::OpenPort { name, options, .. } => {
                write!(f, "open port: {name} at {} baud", options.baud_rate)
            }
            BackendRequest::ClosePort { name, .. } => write!(f, "close port: {name}"),
            BackendRequest::Subscribe { from, to, .. } => write!(f, "subscribe: {from} → {to}"),
            BackendRequest::Unsubscribe { from, to, .. } => {
                write!(f, "unsubscribe: {from} → {to}")
            }
            BackendRequest::ToggleReadState { name, .. } => {
                write!(f, "toggle read state: {name}")
            }
            BackendRequest::SendToPort { name, .. } => write!(f, "send to port: {name}"),
            BackendRequest::SendToAllPorts { .. } => write!(f, "send to all ports"),
        }
    }
}

/// The backend side of the protocol: the request mailbox to drain and the
/// broadcast sender to push events on.
#[derive(Debug)]
pub struct BackendLink {
    /// Requests made via the matching [`BackendHandle`].
    pub requests: mpsc::UnboundedReceiver<BackendRequest>,

    /// Push events to the matching handle's subscribers here.
    pub events: broadcast::Sender<BackendEvent>,
}

/// A cheap-to-clone handle for talking to a backend.
#[derive(Debug, Clone)]
pub struct BackendHandle {
    requests: mpsc::UnboundedSender<BackendRequest>,
    events: broadcast::Sender<BackendEvent>,
}

impl BackendHandle {
    /// A connected handle/link pair.
    /// The backend drives the link; everyone else clones the handle.
    pub fn channel() -> (Self, BackendLink) {
        let (requests_tx, requests_rx) = mpsc::unbounded();
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        (
            Self {
                requests: requests_tx,
                events: events_tx.clone(),
            },
            BackendLink {
                requests: requests_rx,
                events: events_tx,
            },
        )
    }

    /// Subscribe to the backend's push events.
    ///
    /// Each call yields an independent receiver; events sent after the
    /// call will be seen on it.
    pub fn events(&self) -> broadcast::Receiver<BackendEvent> {
        self.events.subscribe()
    }

    /// List the managed ports.
    pub async fn list_ports(&self) -> Result<Vec<ManagedPort>, Error> {
        self.roundtrip(|reply| BackendRequest::ListPorts { reply })
            .await
    }

    /// Open a port with the given options.
    pub async fn open_port(
        &self,
        name: &str,
        options: OpenOptions,
    ) -> Result<Vec<ManagedPort>, Error> {
        self.roundtrip(|reply| BackendRequest::OpenPort {
            name: name.into(),
            options,
            reply,
        })
        .await
    }

    /// Close a port.
    pub async fn close_port(&self, name: &str) -> Result<Vec<ManagedPort>, Error> {
        self.roundtrip(|reply| BackendRequest::ClosePort {
            name: name.into(),
            reply,
        })
        .await
    }

    /// Add the subscription edge `from → to`.
    pub async fn subscribe(&self, from: &str, to: &str) -> Result<Vec<ManagedPort>, Error> {
        self.roundtrip(|reply| BackendRequest::Subscribe {
            from: from.into(),
            to: to.into(),
            reply,
        })
        .await
    }

    /// Remove the subscription edge `from → to`.
    pub async fn unsubscribe(&self, from: &str, to: &str) -> Result<Vec<ManagedPort>, Error> {
        self.roundtrip(|reply| BackendRequest::Unsubscribe {
            from: from.into(),
            to: to.into(),
            reply,
        })
        .await
    }

    /// Toggle a port between reading and stopped.
    pub async fn toggle_read_state(&self, name: &str) -> Result<Vec<ManagedPort>, Error> {
        self.roundtrip(|reply| BackendRequest::ToggleReadState {
            name: name.into(),
            reply,
        })
        .await
    }

    /// Write a value to one port.
    pub async fn send_to_port(&self, name: &str, value: &str) -> Result<(), Error> {
        self.roundtrip(|reply| BackendRequest::SendToPort {
            name: name.into(),
            value: value.into(),
            reply,
        })
        .await
    }

    /// Write a value to every open port.
    pub async fn send_to_all_ports(&self, value: &str) -> Result<(), Error> {
        self.roundtrip(|reply| BackendRequest::SendToAllPorts {
            value: value.into(),
            reply,
        })
        .await
    }

    async fn roundtrip<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<Result<T, Error>>) -> BackendRequest,
    ) -> Result<T, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.requests
            .unbounded_send(request(reply_tx))
            .map_err(|_| Error::TransportFailure("The backend is gone".into()))?;

        reply_rx
            .await
            .map_err(|_| Error::TransportFailure("The backend dropped the request".into()))?
    }
}
