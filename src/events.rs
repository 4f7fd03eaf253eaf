use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{packet::Packet, port::ManagedPort};

/// The host theme, pushed alongside backend events.
/// Presentation concern; the session passes it through untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    /// Dark theme.
    Dark,

    /// Light theme.
    Light,
}

impl Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

/// Asynchronous push notifications from the backend.
///
/// These arrive independently of any command round trip, e.g. when a
/// device is unplugged or a line is read on an open port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum BackendEvent {
    /// The port list changed without a direct command echo.
    /// Carries a full snapshot, same shape as command responses.
    PortListChanged(Vec<ManagedPort>),

    /// A packet was observed on some port.
    PacketObserved(Packet),

    /// Something failed in the backend, not tied to a specific command.
    Error(String),

    /// The host theme changed.
    ThemeChanged(Theme),
}

impl Display for BackendEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendEvent::PortListChanged(ports) => {
                write!(f, "port list changed: {} port(s)", ports.len())
            }
            BackendEvent::PacketObserved(packet) => write!(f, "packet observed: {packet}"),
            BackendEvent::Error(error) => write!(f, "backend error: {error}"),
            BackendEvent::ThemeChanged(theme) => write!(f, "theme changed: {theme}"),
        }
    }
}

/// Standalone notifications surfaced to presentation.
///
/// Errors arriving here are not tied to any command and are not retried;
/// they are meant to be logged or toasted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A standalone backend error.
    BackendError(String),

    /// The host theme changed.
    ThemeChanged(Theme),
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::BackendError(error) => write!(f, "backend error: {error}"),
            Notification::ThemeChanged(theme) => write!(f, "theme changed: {theme}"),
        }
    }
}
