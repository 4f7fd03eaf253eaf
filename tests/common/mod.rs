#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use serial_switch::{
    config::Config,
    gateway::CommandGateway,
    intake::{EventIntake, EventListeners},
    mock::{MockBackend, MockWire},
    session::SessionHandle,
};
use tokio::time::sleep;

/// A fully wired stack: mock backend, session, gateway and intake with
/// all listeners established.
pub struct Stack {
    pub session: SessionHandle,
    pub gateway: CommandGateway,
    pub intake: EventIntake,
    pub listeners: EventListeners,
    pub wire: MockWire,
}

/// Start a stack over the example config:
/// COM1-COM3 available, COM4 held busy.
pub async fn start_stack() -> Stack {
    start_stack_with_config(Config::example()).await
}

pub async fn start_stack_with_config(config: Config) -> Stack {
    let (backend, wire) = MockBackend::spawn(&config);
    let session = SessionHandle::spawn();
    let gateway = CommandGateway::new(backend.clone(), session.updater());
    let intake = EventIntake::new(backend, session.updater());
    let listeners = intake.start();

    // Prime the session the way a UI would on startup.
    gateway
        .list_ports()
        .await
        .expect("The mock backend should list ports");

    Stack {
        session,
        gateway,
        intake,
        listeners,
        wire,
    }
}

/// Poll until the check passes, panicking after a few seconds.
/// Pushed events cross two tasks before they are visible in the session,
/// so tests await visibility instead of assuming it.
pub async fn eventually<F, Fut>(what: &str, check: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }

    panic!("Timed out waiting until: {what}");
}

/// Sleep long enough for anything already queued to have been handled.
/// Only for asserting that something did NOT happen.
pub async fn settle() {
    sleep(Duration::from_millis(100)).await;
}
