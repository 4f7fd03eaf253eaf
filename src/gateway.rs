//! The command gateway issues user intents to the backend.
//!
//! Every state-changing command is a round trip which answers with the
//! full authoritative port list; the gateway feeds that snapshot into the
//! session and hands the caller the same list. On failure the error is
//! returned and the session is left untouched: there is no speculative
//! transition on command issuance, only on command result.

use tracing::debug;

use crate::{
    backend::BackendHandle,
    error::Error,
    port::{ManagedPort, OpenOptions},
    session::SessionUpdater,
};

/// Issues commands to the backend and reconciles their snapshots
/// into the session.
#[derive(Debug, Clone)]
pub struct CommandGateway {
    backend: BackendHandle,
    session: SessionUpdater,
}

impl CommandGateway {
    /// A gateway between the given backend and session.
    pub fn new(backend: BackendHandle, session: SessionUpdater) -> Self {
        Self { backend, session }
    }

    /// Fetch the current port list.
    pub async fn list_ports(&self) -> Result<Vec<ManagedPort>, Error> {
        self.reconciled(self.backend.list_ports().await)
    }

    /// Open a port. The options become its last used open options
    /// on success.
    pub async fn open_port(
        &self,
        name: &str,
        options: OpenOptions,
    ) -> Result<Vec<ManagedPort>, Error> {
        debug!(%name, "Opening port");
        self.reconciled(self.backend.open_port(name, options).await)
    }

    /// Close a port.
    pub async fn close_port(&self, name: &str) -> Result<Vec<ManagedPort>, Error> {
        debug!(%name, "Closing port");
        self.reconciled(self.backend.close_port(name).await)
    }

    /// Make `to` receive lines read on `from`.
    pub async fn subscribe(&self, from: &str, to: &str) -> Result<Vec<ManagedPort>, Error> {
        self.reconciled(self.backend.subscribe(from, to).await)
    }

    /// Stop `to` from receiving lines read on `from`.
    pub async fn unsubscribe(&self, from: &str, to: &str) -> Result<Vec<ManagedPort>, Error> {
        self.reconciled(self.backend.unsubscribe(from, to).await)
    }

    /// Toggle a port between reading and stopped.
    pub async fn toggle_read_state(&self, name: &str) -> Result<Vec<ManagedPort>, Error> {
        self.reconciled(self.backend.toggle_read_state(name).await)
    }

    /// Write a value to one port. No port state changes, so no snapshot.
    pub async fn send_to_port(&self, name: &str, value: &str) -> Result<(), Error> {
        self.backend.send_to_port(name, value).await
    }

    /// Write a value to every open port. No port state changes,
    /// so no snapshot.
    pub async fn send_to_all_ports(&self, value: &str) -> Result<(), Error> {
        self.backend.send_to_all_ports(value).await
    }

    /// Apply a successful command's snapshot to the session.
    /// A failed command applies nothing.
    fn reconciled(
        &self,
        response: Result<Vec<ManagedPort>, Error>,
    ) -> Result<Vec<ManagedPort>, Error> {
        let snapshot = response?;
        self.session.apply_snapshot(snapshot.clone());
        Ok(snapshot)
    }
}
