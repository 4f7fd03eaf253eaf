mod common;

use common::*;
use pretty_assertions::assert_eq;
use serial_switch::{
    error::Error,
    packet::PacketOrigin,
    port::{OpenOptions, ReadState, Status},
};

#[tokio::test]
async fn the_port_list_is_primed_on_startup() {
    let stack = start_stack().await;

    let ports = stack.session.ports().await;

    let names = ports.iter().map(|port| port.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["COM1", "COM2", "COM3", "COM4"]);
    assert!(ports.iter().all(|port| port.status == Status::Closed));
}

#[tokio::test]
async fn open_toggle_close() {
    let stack = start_stack().await;

    stack
        .gateway
        .open_port("COM1", OpenOptions::new(9600))
        .await
        .unwrap();
    let port = stack.session.port("COM1").await.unwrap();
    assert_eq!(port.status, Status::open(ReadState::Read));
    assert_eq!(port.last_used_open_options, Some(OpenOptions::new(9600)));

    stack.gateway.toggle_read_state("COM1").await.unwrap();
    let port = stack.session.port("COM1").await.unwrap();
    assert_eq!(port.status, Status::open(ReadState::Stop));

    stack.gateway.close_port("COM1").await.unwrap();
    let port = stack.session.port("COM1").await.unwrap();
    assert_eq!(port.status, Status::Closed);
}

#[tokio::test]
async fn a_failed_open_leaves_the_session_untouched() {
    let stack = start_stack().await;

    let response = stack.gateway.open_port("COM4", OpenOptions::new(9600)).await;

    assert!(matches!(response, Err(Error::DeviceUnavailable { .. })));
    assert_eq!(
        stack.session.port("COM4").await.unwrap().status,
        Status::Closed
    );
}

#[tokio::test]
async fn an_unknown_port_is_rejected() {
    let stack = start_stack().await;
    let before = stack.session.ports().await;

    let response = stack.gateway.open_port("COM99", OpenOptions::new(9600)).await;

    assert_eq!(response, Err(Error::PortNotFound("COM99".into())));
    assert_eq!(stack.session.ports().await, before);
}

#[tokio::test]
async fn subscribing_updates_both_edge_sets() {
    let stack = start_stack().await;

    stack.gateway.subscribe("COM1", "COM2").await.unwrap();

    let com1 = stack.session.port("COM1").await.unwrap();
    let com2 = stack.session.port("COM2").await.unwrap();
    assert!(com1.subscriptions.contains("COM2"));
    assert!(com2.subscribed_to.contains("COM1"));

    stack.gateway.unsubscribe("COM1", "COM2").await.unwrap();

    let com1 = stack.session.port("COM1").await.unwrap();
    let com2 = stack.session.port("COM2").await.unwrap();
    assert!(com1.subscriptions.is_empty());
    assert!(com2.subscribed_to.is_empty());
}

#[tokio::test]
async fn self_subscription_is_rejected() {
    let stack = start_stack().await;

    let response = stack.gateway.subscribe("COM1", "COM1").await;

    assert_eq!(response, Err(Error::SelfSubscription("COM1".into())));
    assert!(stack
        .session
        .port("COM1")
        .await
        .unwrap()
        .subscriptions
        .is_empty());
}

#[tokio::test]
async fn a_received_line_is_logged_and_relayed() {
    let stack = start_stack().await;

    stack
        .gateway
        .open_port("COM1", OpenOptions::new(9600))
        .await
        .unwrap();
    stack
        .gateway
        .open_port("COM2", OpenOptions::new(9600))
        .await
        .unwrap();
    stack.gateway.subscribe("COM1", "COM2").await.unwrap();

    stack.wire.receive_line("COM1", "hello");

    eventually("the line shows up in COM1's log", || async {
        stack.session.packets("COM1").await.len() == 1
    })
    .await;
    assert!(stack.session.packets("COM1").await[0].is_incoming());

    eventually("the relay shows up in COM2's log", || async {
        stack.session.packets("COM2").await.len() == 1
    })
    .await;
    let relayed = &stack.session.packets("COM2").await[0];
    assert!(matches!(
        relayed.origin(),
        Some(PacketOrigin::Subscription(origin)) if origin.name == "COM1"
    ));
}

#[tokio::test]
async fn a_closed_subscriber_is_skipped() {
    let stack = start_stack().await;

    stack
        .gateway
        .open_port("COM1", OpenOptions::new(9600))
        .await
        .unwrap();
    // COM2 stays closed; the edge exists anyway.
    stack.gateway.subscribe("COM1", "COM2").await.unwrap();

    stack.wire.receive_line("COM1", "hello");

    eventually("the line shows up in COM1's log", || async {
        stack.session.packets("COM1").await.len() == 1
    })
    .await;

    settle().await;
    assert!(stack.session.packets("COM2").await.is_empty());
}

#[tokio::test]
async fn a_stopped_port_observes_nothing() {
    let stack = start_stack().await;

    stack
        .gateway
        .open_port("COM1", OpenOptions::new(9600).start_stopped())
        .await
        .unwrap();

    stack.wire.receive_line("COM1", "unseen");

    settle().await;
    assert!(stack.session.packets("COM1").await.is_empty());
}

#[tokio::test]
async fn direct_sends_are_attributed() {
    let stack = start_stack().await;

    stack
        .gateway
        .open_port("COM1", OpenOptions::new(9600))
        .await
        .unwrap();

    stack.gateway.send_to_port("COM1", "hi there").await.unwrap();

    eventually("the send shows up in COM1's log", || async {
        stack.session.packets("COM1").await.len() == 1
    })
    .await;
    assert_eq!(
        stack.session.packets("COM1").await[0].origin(),
        Some(&PacketOrigin::Direct)
    );
}

#[tokio::test]
async fn broadcast_reaches_every_open_port_only() {
    let stack = start_stack().await;

    stack
        .gateway
        .open_port("COM1", OpenOptions::new(9600))
        .await
        .unwrap();
    stack
        .gateway
        .open_port("COM2", OpenOptions::new(9600))
        .await
        .unwrap();

    stack.gateway.send_to_all_ports("to everyone").await.unwrap();

    for name in ["COM1", "COM2"] {
        eventually("the broadcast shows up", || async {
            stack.session.packets(name).await.len() == 1
        })
        .await;
        assert_eq!(
            stack.session.packets(name).await[0].origin(),
            Some(&PacketOrigin::Broadcast)
        );
    }

    settle().await;
    assert!(stack.session.packets("COM3").await.is_empty());
}

#[tokio::test]
async fn sending_to_a_closed_port_fails() {
    let stack = start_stack().await;

    assert_eq!(
        stack.gateway.send_to_port("COM1", "hello").await,
        Err(Error::NotOpen("COM1".into()))
    );
}

#[tokio::test]
async fn an_unplugged_device_disappears_with_its_edges() {
    let stack = start_stack().await;

    stack.gateway.subscribe("COM1", "COM2").await.unwrap();

    stack.wire.detach("COM2");

    eventually("COM2 disappears from the session", || async {
        stack.session.port("COM2").await.is_none()
    })
    .await;
    assert!(stack
        .session
        .port("COM1")
        .await
        .unwrap()
        .subscriptions
        .is_empty());
}

#[tokio::test]
async fn a_plugged_in_device_appears() {
    let stack = start_stack().await;

    stack.wire.attach("COM9");

    eventually("COM9 appears in the session", || async {
        stack.session.port("COM9").await.is_some()
    })
    .await;
    assert_eq!(
        stack.session.port("COM9").await.unwrap().status,
        Status::Closed
    );
}

#[tokio::test]
async fn a_device_can_become_available() {
    let stack = start_stack().await;

    stack.wire.set_available("COM4", true);

    eventually("COM4 can be opened", || async {
        stack
            .gateway
            .open_port("COM4", OpenOptions::new(9600))
            .await
            .is_ok()
    })
    .await;
}
