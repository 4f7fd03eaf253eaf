//! The session owns the port registry and the packet log.
//!
//! It is an actor: all mutation happens on its single task, one mailbox
//! message at a time, so command responses and pushed events can never
//! interleave mid-mutation. Reads go through the same mailbox and hand
//! out owned copies.
//!
//! The reconciliation policy lives in [`Session::reconcile`]:
//!
//! 1. Any full snapshot, whether it came from a command response or a
//!    `PortListChanged` event, replaces the registry wholesale. Last
//!    writer wins by arrival order; fields are never merged, so a stale
//!    partial state cannot be resurrected.
//! 2. An observed packet only appends to the packet log, keyed by the
//!    packet's port name. It never touches the port list.
//! 3. Arrival order is whatever the transport delivers. Snapshots carry
//!    no revision numbers, so an out-of-order stale snapshot cannot be
//!    detected here.

use futures::{channel::mpsc, StreamExt};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    log::PacketLog,
    packet::{Packet, PacketRecord},
    port::ManagedPort,
    registry::Registry,
};

/// An update for the reconciler to arbitrate.
#[derive(Debug)]
pub enum Update {
    /// A full authoritative snapshot of the port list.
    Snapshot(Vec<ManagedPort>),

    /// A packet observed on some port.
    Packet(Packet),
}

#[derive(Debug)]
enum Query {
    Ports(oneshot::Sender<Vec<ManagedPort>>),
    Port(String, oneshot::Sender<Option<ManagedPort>>),
    Packets(String, oneshot::Sender<Vec<PacketRecord>>),
}

#[derive(Debug)]
enum SessionMessage {
    Update(Update),
    Query(Query),
}

/// The actor owning the registry and packet log.
pub struct Session {
    messages: mpsc::UnboundedReceiver<SessionMessage>,
    registry: Registry,
    log: PacketLog,
}

impl Session {
    fn new(messages: mpsc::UnboundedReceiver<SessionMessage>) -> Self {
        Self {
            messages,
            registry: Registry::new(),
            log: PacketLog::new(),
        }
    }

    fn reconcile(&mut self, update: Update) {
        match update {
            Update::Snapshot(snapshot) => self.registry.replace_all(snapshot),
            Update::Packet(packet) => {
                debug!(%packet, "Recording packet");
                let (port_name, record) = packet.into_record();
                self.log.record(&port_name, record);
            }
        }
    }

    fn answer(&self, query: Query) {
        // A dropped query receiver means the asker lost interest. Fine.
        match query {
            Query::Ports(reply) => {
                let _ = reply.send(self.registry.snapshot());
            }
            Query::Port(name, reply) => {
                let _ = reply.send(self.registry.get(&name).cloned());
            }
            Query::Packets(name, reply) => {
                let _ = reply.send(self.log.for_port(&name));
            }
        }
    }

    async fn run(&mut self) {
        while let Some(message) = self.messages.next().await {
            match message {
                SessionMessage::Update(update) => self.reconcile(update),
                SessionMessage::Query(query) => self.answer(query),
            }
        }

        debug!("All session handles dropped, session stopping");
    }
}

/// Write access into the session, for whoever has an authoritative
/// update to deliver: the command gateway and the event intake.
#[derive(Debug, Clone)]
pub struct SessionUpdater(mpsc::UnboundedSender<SessionMessage>);

impl SessionUpdater {
    /// Queue a full snapshot for wholesale application.
    pub fn apply_snapshot(&self, snapshot: Vec<ManagedPort>) {
        self.send(Update::Snapshot(snapshot));
    }

    /// Queue an observed packet for the packet log.
    pub fn record_packet(&self, packet: Packet) {
        self.send(Update::Packet(packet));
    }

    fn send(&self, update: Update) {
        if self
            .0
            .unbounded_send(SessionMessage::Update(update))
            .is_err()
        {
            warn!("Session is gone, dropping update");
        }
    }
}

/// A cheap-to-clone handle for reading the session's state.
#[derive(Debug, Clone)]
pub struct SessionHandle(mpsc::UnboundedSender<SessionMessage>);

impl SessionHandle {
    /// Spawn a session actor with an empty registry and log.
    pub fn spawn() -> Self {
        let (messages_tx, messages_rx) = mpsc::unbounded();

        let mut session = Session::new(messages_rx);
        tokio::spawn(async move { session.run().await });

        Self(messages_tx)
    }

    /// An updater feeding this session.
    pub fn updater(&self) -> SessionUpdater {
        SessionUpdater(self.0.clone())
    }

    /// The current port list, sorted by name.
    pub async fn ports(&self) -> Vec<ManagedPort> {
        self.query(Query::Ports).await
    }

    /// The port with the given name, if the registry knows it.
    pub async fn port(&self, name: &str) -> Option<ManagedPort> {
        self.query(|reply| Query::Port(name.into(), reply)).await
    }

    /// The packet history of the given port, oldest first.
    pub async fn packets(&self, name: &str) -> Vec<PacketRecord> {
        self.query(|reply| Query::Packets(name.into(), reply)).await
    }

    async fn query<T>(&self, query: impl FnOnce(oneshot::Sender<T>) -> Query) -> T {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.0
            .unbounded_send(SessionMessage::Query(query(reply_tx)))
            .expect("Session should outlive its handles");

        reply_rx.await.expect("Session should always answer")
    }
}
