mod common;

use common::*;
use pretty_assertions::assert_eq;
use serial_switch::{
    events::{Notification, Theme},
    port::OpenOptions,
};
use tokio::time::{timeout, Duration};

async fn next_notification(
    notifications: &mut tokio::sync::broadcast::Receiver<Notification>,
) -> Notification {
    timeout(Duration::from_secs(5), notifications.recv())
        .await
        .expect("A notification should arrive in time")
        .expect("The notification stream should stay open")
}

#[tokio::test]
async fn backend_errors_surface_as_notifications() {
    let stack = start_stack().await;
    let mut notifications = stack.intake.notifications();

    stack.wire.fault("something came loose");

    assert_eq!(
        next_notification(&mut notifications).await,
        Notification::BackendError("something came loose".into())
    );
}

#[tokio::test]
async fn a_line_on_an_unknown_port_is_a_backend_error() {
    let stack = start_stack().await;
    let mut notifications = stack.intake.notifications();

    stack.wire.receive_line("COM99", "from nowhere");

    let notification = next_notification(&mut notifications).await;
    let Notification::BackendError(problem) = notification else {
        panic!("Expected an error notification, got {notification}");
    };
    assert!(problem.contains("COM99"));
}

#[tokio::test]
async fn theme_changes_pass_through() {
    let stack = start_stack().await;
    let mut notifications = stack.intake.notifications();

    stack.wire.set_theme(Theme::Dark);

    assert_eq!(
        next_notification(&mut notifications).await,
        Notification::ThemeChanged(Theme::Dark)
    );
}

#[tokio::test]
async fn a_revoked_packet_listener_records_nothing() {
    let stack = start_stack().await;

    stack
        .gateway
        .open_port("COM1", OpenOptions::new(9600))
        .await
        .unwrap();

    stack.listeners.packets.revoke();
    assert!(stack.listeners.packets.is_revoked());

    stack.wire.receive_line("COM1", "into the void");

    settle().await;
    assert!(stack.session.packets("COM1").await.is_empty());
}

#[tokio::test]
async fn a_revoked_port_list_listener_goes_stale() {
    let stack = start_stack().await;

    stack.listeners.port_list.revoke();
    stack.wire.attach("COM9");

    settle().await;
    assert!(stack.session.port("COM9").await.is_none());

    // Commands still reconcile: their snapshots do not travel the
    // revoked event path.
    stack.gateway.list_ports().await.unwrap();
    assert!(stack.session.port("COM9").await.is_some());
}

#[tokio::test]
async fn revoking_twice_is_a_no_op() {
    let stack = start_stack().await;

    stack.listeners.revoke_all();
    stack.listeners.revoke_all();

    assert!(stack.listeners.port_list.is_revoked());
    assert!(stack.listeners.packets.is_revoked());
    assert!(stack.listeners.errors.is_revoked());
    assert!(stack.listeners.theme.is_revoked());
}

#[tokio::test]
async fn a_late_command_response_still_wins_by_arrival() {
    // Deliberate last-arrival-wins: a snapshot from a command response
    // applied after a newer event's snapshot replaces it wholesale.
    let stack = start_stack().await;

    stack.wire.attach("COM9");
    eventually("COM9 appears via the event path", || async {
        stack.session.port("COM9").await.is_some()
    })
    .await;

    // This response reflects the backend's current state, so COM9
    // remains; what matters is that the registry equals the last
    // arrival exactly.
    let snapshot = stack.gateway.list_ports().await.unwrap();
    assert_eq!(stack.session.ports().await, snapshot);
}
