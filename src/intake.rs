//! The event intake receives the backend's push notifications and routes
//! them into the session and the notification stream.
//!
//! Each of the four push topics gets its own scoped listener: starting the
//! intake establishes all of them, and each can be revoked independently
//! and idempotently. After revocation no further events of that topic are
//! delivered anywhere.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::{
    backend::BackendHandle,
    events::{BackendEvent, Notification},
    session::SessionUpdater,
};

/// The capacity of the notification broadcast channel.
const NOTIFICATION_CHANNEL_CAPACITY: usize = 256;

/// A revocable subscription to one push topic.
///
/// Revoking stops the topic's forwarding task. Revoking twice, or after
/// the backend is gone, is a no-op.
#[derive(Debug)]
pub struct ListenerHandle {
    token: CancellationToken,
}

impl ListenerHandle {
    /// Stop listening. Idempotent.
    pub fn revoke(&self) {
        self.token.cancel();
    }

    /// Whether this listener has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// The active listeners of a started intake, one per push topic.
#[derive(Debug)]
pub struct EventListeners {
    /// Listener for `port_list_changed`.
    pub port_list: ListenerHandle,

    /// Listener for `packet_observed`.
    pub packets: ListenerHandle,

    /// Listener for `error`.
    pub errors: ListenerHandle,

    /// Listener for `theme_changed`.
    pub theme: ListenerHandle,
}

impl EventListeners {
    /// Revoke every listener. Safe to call more than once.
    pub fn revoke_all(&self) {
        self.port_list.revoke();
        self.packets.revoke();
        self.errors.revoke();
        self.theme.revoke();
    }
}

/// Routes backend push events into the session and notification stream.
#[derive(Debug, Clone)]
pub struct EventIntake {
    backend: BackendHandle,
    session: SessionUpdater,
    notifications: broadcast::Sender<Notification>,
}

impl EventIntake {
    /// An intake between the given backend and session.
    pub fn new(backend: BackendHandle, session: SessionUpdater) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);

        Self {
            backend,
            session,
            notifications,
        }
    }

    /// Subscribe to standalone notifications: backend errors and theme
    /// changes. These are surfaced, not retried.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Establish all four topic listeners.
    ///
    /// Snapshots go to the session wholesale, packets go to the packet
    /// log, errors and theme changes go to the notification stream.
    pub fn start(&self) -> EventListeners {
        let session = self.session.clone();
        let port_list = self.listen(move |event| {
            if let BackendEvent::PortListChanged(ports) = event {
                session.apply_snapshot(ports);
            }
        });

        let session = self.session.clone();
        let packets = self.listen(move |event| {
            if let BackendEvent::PacketObserved(packet) = event {
                session.record_packet(packet);
            }
        });

        let notifications = self.notifications.clone();
        let errors = self.listen(move |event| {
            if let BackendEvent::Error(problem) = event {
                error!(%problem, "Backend reported an error");
                let _ = notifications.send(Notification::BackendError(problem));
            }
        });

        let notifications = self.notifications.clone();
        let theme = self.listen(move |event| {
            if let BackendEvent::ThemeChanged(theme) = event {
                let _ = notifications.send(Notification::ThemeChanged(theme));
            }
        });

        EventListeners {
            port_list,
            packets,
            errors,
            theme,
        }
    }

    fn listen(
        &self,
        mut on_event: impl FnMut(BackendEvent) + Send + 'static,
    ) -> ListenerHandle {
        let mut events = self.backend.events();
        let token = CancellationToken::new();
        let task_token = token.clone();

        tokio::spawn(async move {
            loop {
                // Biased so that revocation always wins over a
                // simultaneously ready event.
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => {
                        debug!("Listener revoked");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(event) => on_event(event),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, "Listener lagged behind the backend");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Backend event stream closed");
                            break;
                        }
                    }
                }
            }
        });

        ListenerHandle { token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revocation_is_idempotent() {
        let handle = ListenerHandle {
            token: CancellationToken::new(),
        };

        assert!(!handle.is_revoked());
        handle.revoke();
        handle.revoke();
        assert!(handle.is_revoked());
    }
}
