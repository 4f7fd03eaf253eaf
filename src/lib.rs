#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

/// Managed ports: names, statuses, open options.
pub mod port;

/// Packet envelopes: direction, origin, log records.
pub mod packet;

/// The table of managed ports and its state machine,
/// including the subscription graph embedded in the entries.
pub mod registry;

/// Per-port packet history.
pub mod log;

/// Push events from the backend, and the notifications surfaced
/// to presentation.
pub mod events;

/// The request/response and push-event protocol to the backend.
pub mod backend;

/// The actor owning registry and packet log, and the reconciliation
/// policy between command responses and pushed events.
pub mod session;

/// Issues user intents to the backend and reconciles the resulting
/// snapshots into the session.
pub mod gateway;

/// Scoped, revocable listeners routing backend events into the session.
pub mod intake;

/// A backend implementation without real serial ports, for tests and demos.
pub mod mock;

/// Relates to config files.
pub mod config;

/// Possible errors in this library.
pub mod error;

/// Logging/tracing setup.
pub mod logging;

/// The command line interface.
pub mod cli;
