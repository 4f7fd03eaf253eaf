//! The registry is the in-memory table of managed ports.
//!
//! It is used on both sides of the command surface:
//! the backend owns one as the source of truth and drives the status
//! state machine on it, while the session owns one as a mirror and only
//! ever replaces it wholesale with authoritative snapshots.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    error::Error,
    port::{ManagedPort, OpenOptions, ReadState, Status},
};

/// The table of managed ports, keyed by port name.
///
/// Subscription edges are embedded in the entries and kept symmetric:
/// `B ∈ A.subscriptions` if and only if `A ∈ B.subscribed_to`.
#[derive(Debug, Default)]
pub struct Registry {
    ports: HashMap<String, ManagedPort>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry enumerating the given devices, all closed.
    pub fn with_devices<S: AsRef<str>>(names: &[S]) -> Self {
        let mut registry = Self::new();
        for name in names {
            registry.attach_device(name.as_ref());
        }
        registry
    }

    /// The port with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&ManagedPort> {
        self.ports.get(name)
    }

    /// Whether the registry has an entry for the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.ports.contains_key(name)
    }

    /// All ports, sorted by name.
    ///
    /// This is the snapshot shape every command responds with.
    pub fn snapshot(&self) -> Vec<ManagedPort> {
        let mut ports = self.ports.values().cloned().collect::<Vec<_>>();
        ports.sort_by(|a, b| a.name.cmp(&b.name));
        ports
    }

    /// Names of all currently open ports.
    pub fn open_ports(&self) -> Vec<String> {
        let mut names = self
            .ports
            .values()
            .filter(|port| port.is_open())
            .map(|port| port.name.clone())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Replace the whole table with an authoritative snapshot.
    ///
    /// Last writer wins. No merging of individual fields: a port present
    /// before but absent from the snapshot is gone afterwards.
    ///
    /// Snapshots are taken as given. An asymmetric subscription edge is a
    /// backend contract violation; it is logged and not repaired.
    pub fn replace_all(&mut self, snapshot: Vec<ManagedPort>) {
        debug!(ports = snapshot.len(), "Applying snapshot");

        self.ports = snapshot
            .into_iter()
            .map(|port| (port.name.clone(), port))
            .collect();

        for (name, port) in &self.ports {
            for target in &port.subscriptions {
                let converse_present = self
                    .ports
                    .get(target)
                    .map(|target_port| target_port.subscribed_to.contains(name))
                    .unwrap_or(false);

                if !converse_present {
                    warn!(from = %name, to = %target, "Snapshot contains an asymmetric subscription edge");
                }
            }
        }
    }

    /// Add a newly enumerated device as a closed entry.
    ///
    /// Re-attaching a known name is a no-op so a device watcher may
    /// report the same device more than once.
    pub fn attach_device(&mut self, name: &str) {
        if self.ports.contains_key(name) {
            return;
        }

        debug!(%name, "Device attached");
        self.ports
            .insert(name.to_string(), ManagedPort::closed(name));
    }

    /// Drop a device's entry, along with every edge referencing it,
    /// so remaining entries stay symmetric.
    pub fn detach_device(&mut self, name: &str) {
        if self.ports.remove(name).is_none() {
            return;
        }

        debug!(%name, "Device detached");
        for port in self.ports.values_mut() {
            port.subscriptions.remove(name);
            port.subscribed_to.remove(name);
        }
    }

    /// `Closed → Open(options.initial_read_state)`.
    ///
    /// The options become the port's last used open options on success.
    pub fn open(&mut self, name: &str, options: OpenOptions) -> Result<(), Error> {
        let port = self
            .ports
            .get_mut(name)
            .ok_or_else(|| Error::PortNotFound(name.into()))?;

        if port.is_open() {
            return Err(Error::AlreadyOpen(name.into()));
        }

        port.status = Status::open(options.initial_read_state);
        port.last_used_open_options = Some(options);

        Ok(())
    }

    /// `Open(*) → Closed`.
    ///
    /// Closing an already closed port is absorbed as a no-op here;
    /// whether that deserves an error is the backend's call.
    pub fn close(&mut self, name: &str) -> Result<(), Error> {
        let port = self
            .ports
            .get_mut(name)
            .ok_or_else(|| Error::PortNotFound(name.into()))?;

        port.status = Status::Closed;

        Ok(())
    }

    /// `Open(Read) ⇄ Open(Stop)`. Returns the new read state.
    pub fn toggle_read_state(&mut self, name: &str) -> Result<ReadState, Error> {
        let port = self
            .ports
            .get_mut(name)
            .ok_or_else(|| Error::PortNotFound(name.into()))?;

        match port.status.read_state() {
            Some(read_state) => {
                let toggled = read_state.toggled();
                port.status = Status::open(toggled);
                Ok(toggled)
            }
            None => Err(Error::NotOpen(name.into())),
        }
    }

    /// Add the edge `from → to`: lines read on `from` will be relayed to `to`.
    ///
    /// Both endpoints must exist as entries; their open state does not matter.
    /// Subscribing an existing edge is a no-op.
    /// Both sides of the edge are updated in this single call.
    pub fn subscribe(&mut self, from: &str, to: &str) -> Result<(), Error> {
        if from == to {
            return Err(Error::SelfSubscription(from.into()));
        }
        self.require(from)?;
        self.require(to)?;

        debug!(%from, %to, "Subscribing");

        self.ports
            .get_mut(from)
            .expect("Presence checked above")
            .subscriptions
            .insert(to.to_string());
        self.ports
            .get_mut(to)
            .expect("Presence checked above")
            .subscribed_to
            .insert(from.to_string());

        Ok(())
    }

    /// Remove the edge `from → to`. Removing an absent edge is a no-op.
    pub fn unsubscribe(&mut self, from: &str, to: &str) -> Result<(), Error> {
        self.require(from)?;
        self.require(to)?;

        debug!(%from, %to, "Unsubscribing");

        self.ports
            .get_mut(from)
            .expect("Presence checked above")
            .subscriptions
            .remove(to);
        self.ports
            .get_mut(to)
            .expect("Presence checked above")
            .subscribed_to
            .remove(from);

        Ok(())
    }

    /// The ports a line read on `from` should fan out to: subscription
    /// targets which are currently open.
    ///
    /// The graph itself moves no bytes; this lookup feeds the relay logic.
    pub fn relay_targets(&self, from: &str) -> Vec<String> {
        let Some(port) = self.ports.get(from) else {
            return vec![];
        };

        port.subscriptions
            .iter()
            .filter(|target| {
                self.ports
                    .get(*target)
                    .map(|target_port| target_port.is_open())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn require(&self, name: &str) -> Result<(), Error> {
        if self.ports.contains_key(name) {
            Ok(())
        } else {
            Err(Error::PortNotFound(name.into()))
        }
    }

    #[cfg(test)]
    fn edges_are_symmetric(&self) -> bool {
        self.ports.iter().all(|(name, port)| {
            port.subscriptions.iter().all(|target| {
                self.ports
                    .get(target)
                    .map(|target_port| target_port.subscribed_to.contains(name))
                    .unwrap_or(false)
            }) && port.subscribed_to.iter().all(|source| {
                self.ports
                    .get(source)
                    .map(|source_port| source_port.subscriptions.contains(name))
                    .unwrap_or(false)
            })
        })
    }
}
