//! Integration tests driving the assembled engine through its public API.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use teamline_core::config::realtime::RealtimeConfig;
use teamline_core::traits::identity::ResolvedIdentity;
use teamline_core::types::id::UserId;
use teamline_core::types::room::RoomId;
use teamline_realtime::connection::handle::ConnectionHandle;
use teamline_realtime::message::types::{ClientEvent, ServerEvent};
use teamline_realtime::signaling::session::CallState;
use teamline_realtime::store::{MemoryMessageStore, MemoryNotificationStore};
use teamline_realtime::RealtimeEngine;

fn engine() -> RealtimeEngine {
    RealtimeEngine::new(
        RealtimeConfig::default(),
        Arc::new(MemoryMessageStore::new()),
        Arc::new(MemoryNotificationStore::new()),
    )
}

fn identity(name: &str) -> ResolvedIdentity {
    ResolvedIdentity {
        user_id: UserId::new(),
        display_name: name.to_string(),
    }
}

/// Collects everything currently queued for a connection.
fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn send(engine: &RealtimeEngine, handle: &Arc<ConnectionHandle>, event: ClientEvent) {
    let raw = serde_json::to_string(&event).unwrap();
    engine.handle_inbound(&handle.id, &raw).await;
}

#[tokio::test]
async fn test_presence_tracks_registrations_exactly() {
    let engine = engine();
    let mut presence_rx = engine.presence.subscribe();

    let u1 = identity("u1");
    let u2 = identity("u2");
    let (c1, mut _r1) = engine.connect(u1.clone());
    let (_c2, mut _r2) = engine.connect(u2.clone());

    let mut expected = vec![u1.user_id, u2.user_id];
    expected.sort();

    assert_eq!(presence_rx.recv().await.unwrap(), vec![u1.user_id]);
    assert_eq!(presence_rx.recv().await.unwrap(), expected);
    assert_eq!(engine.registry.online_users(), expected);

    // Second device for u1 changes nothing; dropping it changes nothing.
    let (c1b, mut _r1b) = engine.connect(u1.clone());
    engine.disconnect(&c1b.id);
    assert_eq!(engine.registry.online_users(), expected);

    // Last connection of u1 going away removes it from the set.
    engine.disconnect(&c1.id);
    assert_eq!(engine.registry.online_users(), vec![u2.user_id]);
}

#[tokio::test]
async fn test_multi_device_room_fanout_excludes_origin_only() {
    let engine = engine();
    let alice = identity("alice");
    let bob = identity("bob");

    let (a1, mut a1_rx) = engine.connect(alice.clone());
    let (a2, mut a2_rx) = engine.connect(alice.clone());
    let (b1, mut b1_rx) = engine.connect(bob.clone());

    let room = RoomId::call("standup");
    for conn in [&a1, &a2, &b1] {
        engine.hub.join_room(conn.id, room.clone());
    }
    drain(&mut a1_rx);
    drain(&mut a2_rx);
    drain(&mut b1_rx);

    send(
        &engine,
        &a1,
        ClientEvent::SendMessage {
            room: room.clone(),
            text: "hi".to_string(),
            kind: teamline_core::types::message::MessageKind::Text,
        },
    )
    .await;

    // Origin connection is suppressed; the same user's other device and
    // the other member both receive the message.
    assert!(!drain(&mut a1_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::ReceiveMessage { .. })));
    assert!(drain(&mut a2_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::ReceiveMessage { .. })));
    let b1_events = drain(&mut b1_rx);
    match b1_events
        .iter()
        .find(|e| matches!(e, ServerEvent::ReceiveMessage { .. }))
    {
        Some(ServerEvent::ReceiveMessage { message }) => {
            assert_eq!(message.body, "hi");
            assert_eq!(message.sender, alice.user_id);
        }
        _ => panic!("bob did not receive the message"),
    }
}

#[tokio::test]
async fn test_sender_other_device_receives_without_room_join() {
    let engine = engine();
    let alice = identity("alice");
    let bob = identity("bob");

    let (a1, mut _a1_rx) = engine.connect(alice.clone());
    // Second device has not joined the conversation room.
    let (_a2, mut a2_rx) = engine.connect(alice.clone());
    let (b1, mut _b1_rx) = engine.connect(bob.clone());

    let room = RoomId::conversation(teamline_core::types::id::ConversationId::new());
    engine.hub.join_room(a1.id, room.clone());
    engine.hub.join_room(b1.id, room.clone());
    drain(&mut a2_rx);

    send(
        &engine,
        &a1,
        ClientEvent::SendMessage {
            room,
            text: "sync me".to_string(),
            kind: teamline_core::types::message::MessageKind::Text,
        },
    )
    .await;

    assert!(drain(&mut a2_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::ReceiveMessage { .. })));
}

#[tokio::test]
async fn test_typing_relays_are_stateless_and_exclude_origin() {
    let engine = engine();
    let alice = identity("alice");
    let bob = identity("bob");

    let (a1, mut a1_rx) = engine.connect(alice.clone());
    let (b1, mut b1_rx) = engine.connect(bob.clone());

    let room = RoomId::call("standup");
    engine.hub.join_room(a1.id, room.clone());
    engine.hub.join_room(b1.id, room.clone());
    drain(&mut a1_rx);
    drain(&mut b1_rx);

    send(&engine, &a1, ClientEvent::Typing { room: room.clone() }).await;
    send(&engine, &a1, ClientEvent::StopTyping { room: room.clone() }).await;

    let b1_events = drain(&mut b1_rx);
    assert!(matches!(
        b1_events[0],
        ServerEvent::Typing { ref from, .. } if *from == alice.user_id
    ));
    assert!(matches!(b1_events[1], ServerEvent::StopTyping { .. }));
    assert!(drain(&mut a1_rx).is_empty());
}

#[tokio::test]
async fn test_candidates_queue_until_accept_then_arrive_in_order() {
    let engine = engine();
    let caller = identity("caller");
    let callee = identity("callee");

    let (c1, mut _c1_rx) = engine.connect(caller.clone());
    let (d1, mut d1_rx) = engine.connect(callee.clone());
    drain(&mut d1_rx);

    send(
        &engine,
        &c1,
        ClientEvent::CallUser {
            user_to_call: callee.user_id,
            signal: json!({ "sdp": "offer" }),
            is_video: true,
        },
    )
    .await;

    for i in 0..3 {
        send(
            &engine,
            &c1,
            ClientEvent::IceCandidate {
                to: callee.user_id,
                candidate: json!({ "seq": i }),
            },
        )
        .await;
    }

    // Only the offer has been delivered so far.
    let before_accept = drain(&mut d1_rx);
    assert_eq!(before_accept.len(), 1);
    assert!(matches!(before_accept[0], ServerEvent::IncomingCall { .. }));

    send(
        &engine,
        &d1,
        ClientEvent::AnswerCall {
            to: caller.user_id,
            signal: json!({ "sdp": "answer" }),
        },
    )
    .await;

    let after_accept = drain(&mut d1_rx);
    let seqs: Vec<i64> = after_accept
        .iter()
        .filter_map(|e| match e {
            ServerEvent::IceCandidate { candidate, .. } => candidate["seq"].as_i64(),
            _ => None,
        })
        .collect();
    assert_eq!(seqs, vec![0, 1, 2]);

    // Candidates after the drain relay immediately, no re-queueing.
    send(
        &engine,
        &c1,
        ClientEvent::IceCandidate {
            to: callee.user_id,
            candidate: json!({ "seq": 3 }),
        },
    )
    .await;
    let immediate = drain(&mut d1_rx);
    assert_eq!(immediate.len(), 1);
    assert!(matches!(
        &immediate[0],
        ServerEvent::IceCandidate { candidate, .. } if candidate["seq"] == 3
    ));
}

#[tokio::test]
async fn test_duplicate_initiate_is_rejected() {
    let engine = engine();
    let caller = identity("caller");
    let callee = identity("callee");

    let (c1, mut _c1_rx) = engine.connect(caller.clone());
    let (_d1, mut d1_rx) = engine.connect(callee.clone());

    for _ in 0..2 {
        send(
            &engine,
            &c1,
            ClientEvent::CallUser {
                user_to_call: callee.user_id,
                signal: json!({ "sdp": "offer" }),
                is_video: false,
            },
        )
        .await;
    }

    assert_eq!(engine.calls.active_count(), 1);
    let offers = drain(&mut d1_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::IncomingCall { .. }))
        .count();
    assert_eq!(offers, 1);
}

#[tokio::test]
async fn test_disconnect_cascades_into_connected_call() {
    let engine = engine();
    let caller = identity("caller");
    let callee = identity("callee");

    let (c1, mut _c1_rx) = engine.connect(caller.clone());
    let (d1, mut d1_rx) = engine.connect(callee.clone());

    send(
        &engine,
        &c1,
        ClientEvent::CallUser {
            user_to_call: callee.user_id,
            signal: json!({}),
            is_video: false,
        },
    )
    .await;
    send(
        &engine,
        &d1,
        ClientEvent::AnswerCall {
            to: caller.user_id,
            signal: json!({}),
        },
    )
    .await;
    send(
        &engine,
        &d1,
        ClientEvent::CallConnected {
            peer: caller.user_id,
        },
    )
    .await;
    assert_eq!(
        engine.calls.state_of(caller.user_id, callee.user_id),
        Some(CallState::Connected)
    );
    drain(&mut d1_rx);

    engine.disconnect(&c1.id);

    // No session left dangling, and the surviving peer was told.
    assert_eq!(engine.calls.active_count(), 0);
    let ended: Vec<_> = drain(&mut d1_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::CallEnded { .. }))
        .collect();
    assert_eq!(ended.len(), 1);
    assert!(matches!(
        &ended[0],
        ServerEvent::CallEnded { peer, reason } if *peer == caller.user_id && reason == "disconnected"
    ));
}

#[tokio::test]
async fn test_end_is_idempotent_no_signal_storm() {
    let engine = engine();
    let caller = identity("caller");
    let callee = identity("callee");

    let (c1, mut _c1_rx) = engine.connect(caller.clone());
    let (_d1, mut d1_rx) = engine.connect(callee.clone());

    send(
        &engine,
        &c1,
        ClientEvent::CallUser {
            user_to_call: callee.user_id,
            signal: json!({}),
            is_video: false,
        },
    )
    .await;
    drain(&mut d1_rx);

    for _ in 0..2 {
        send(
            &engine,
            &c1,
            ClientEvent::EndCall {
                peer: callee.user_id,
            },
        )
        .await;
    }

    let ended = drain(&mut d1_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::CallEnded { .. }))
        .count();
    assert_eq!(ended, 1);
    assert_eq!(engine.calls.active_count(), 0);
}

#[tokio::test]
async fn test_late_accept_does_not_create_session() {
    let engine = engine();
    let caller = identity("caller");
    let callee = identity("callee");

    let (_c1, mut _c1_rx) = engine.connect(caller.clone());
    let (d1, mut _d1_rx) = engine.connect(callee.clone());

    send(
        &engine,
        &d1,
        ClientEvent::AnswerCall {
            to: caller.user_id,
            signal: json!({}),
        },
    )
    .await;

    assert_eq!(engine.calls.active_count(), 0);
}

#[tokio::test]
async fn test_call_room_join_announces_peer_to_existing_members() {
    let engine = engine();
    let host = identity("host");
    let guest = identity("guest");

    let (h1, mut h1_rx) = engine.connect(host.clone());
    let (g1, mut g1_rx) = engine.connect(guest.clone());

    let room = RoomId::call("retro");
    send(&engine, &h1, ClientEvent::JoinRoom { room: room.clone() }).await;
    drain(&mut h1_rx);
    drain(&mut g1_rx);

    send(&engine, &g1, ClientEvent::JoinRoom { room: room.clone() }).await;

    // Existing member learns about the joiner and becomes the offering side.
    let h1_events = drain(&mut h1_rx);
    assert!(matches!(
        h1_events.first(),
        Some(ServerEvent::PeerJoined { user, .. }) if *user == guest.user_id
    ));
    // The joiner is not told about itself.
    assert!(drain(&mut g1_rx).is_empty());
}

#[tokio::test]
async fn test_two_user_chat_scenario() {
    let engine = engine();
    let u1 = identity("u1");
    let u2 = identity("u2");

    let (s1, mut s1_rx) = engine.connect(u1.clone());
    let (s2, mut s2_rx) = engine.connect(u2.clone());

    let room = RoomId::call("room-42");
    engine.hub.join_room(s1.id, room.clone());
    engine.hub.join_room(s2.id, room.clone());

    // Presence after both registrations is exactly {u1, u2}.
    let mut expected = vec![u1.user_id, u2.user_id];
    expected.sort();
    assert_eq!(engine.registry.online_users(), expected);
    drain(&mut s1_rx);
    drain(&mut s2_rx);

    send(
        &engine,
        &s1,
        ClientEvent::SendMessage {
            room,
            text: "hi".to_string(),
            kind: teamline_core::types::message::MessageKind::Text,
        },
    )
    .await;

    let s2_events = drain(&mut s2_rx);
    match s2_events
        .iter()
        .find(|e| matches!(e, ServerEvent::ReceiveMessage { .. }))
    {
        Some(ServerEvent::ReceiveMessage { message }) => assert_eq!(message.body, "hi"),
        _ => panic!("u2 did not receive the message"),
    }
    assert!(!drain(&mut s1_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::ReceiveMessage { .. })));
}

#[tokio::test]
async fn test_malformed_frame_gets_error_not_crash() {
    let engine = engine();
    let user = identity("user");
    let (c1, mut c1_rx) = engine.connect(user.clone());
    drain(&mut c1_rx);

    engine.handle_inbound(&c1.id, "{not json").await;
    engine.handle_inbound(&c1.id, r#"{"type":"no_such_event"}"#).await;

    let errors = drain(&mut c1_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::Error { .. }))
        .count();
    assert_eq!(errors, 2);

    // Hub still fully functional afterwards.
    assert_eq!(engine.registry.connection_count(), 1);
}

#[tokio::test]
async fn test_empty_message_rejected_without_broadcast() {
    let engine = engine();
    let alice = identity("alice");
    let bob = identity("bob");

    let (a1, mut a1_rx) = engine.connect(alice.clone());
    let (b1, mut b1_rx) = engine.connect(bob.clone());
    let room = RoomId::call("standup");
    engine.hub.join_room(a1.id, room.clone());
    engine.hub.join_room(b1.id, room.clone());
    drain(&mut a1_rx);
    drain(&mut b1_rx);

    send(
        &engine,
        &a1,
        ClientEvent::SendMessage {
            room,
            text: "   ".to_string(),
            kind: teamline_core::types::message::MessageKind::Text,
        },
    )
    .await;

    assert!(drain(&mut b1_rx).is_empty());
    assert!(drain(&mut a1_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::Error { .. })));
}

#[tokio::test]
async fn test_notification_fanout_reaches_all_devices() {
    let engine = engine();
    let user = identity("user");
    let (_c1, mut c1_rx) = engine.connect(user.clone());
    let (_c2, mut c2_rx) = engine.connect(user.clone());
    drain(&mut c1_rx);
    drain(&mut c2_rx);

    let stored = engine
        .notifications
        .publish(teamline_core::types::notification::NotificationDraft {
            recipient: user.user_id,
            category: "mention".to_string(),
            body: "you were mentioned".to_string(),
            payload: None,
        })
        .await
        .unwrap();

    for rx in [&mut c1_rx, &mut c2_rx] {
        let events = drain(rx);
        assert!(matches!(
            events.first(),
            Some(ServerEvent::NewNotification { notification }) if notification.id == stored.id
        ));
    }
}

#[tokio::test]
async fn test_media_failure_ends_call_and_notifies_peer() {
    let engine = engine();
    let caller = identity("caller");
    let callee = identity("callee");

    let (c1, mut c1_rx) = engine.connect(caller.clone());
    let (d1, mut _d1_rx) = engine.connect(callee.clone());

    send(
        &engine,
        &c1,
        ClientEvent::CallUser {
            user_to_call: callee.user_id,
            signal: json!({}),
            is_video: false,
        },
    )
    .await;
    send(
        &engine,
        &d1,
        ClientEvent::AnswerCall {
            to: caller.user_id,
            signal: json!({}),
        },
    )
    .await;
    drain(&mut c1_rx);

    // Transport layer reports an unrecoverable negotiation failure.
    engine.calls.fail(callee.user_id, caller.user_id);

    assert_eq!(engine.calls.active_count(), 0);
    assert!(drain(&mut c1_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::CallEnded { reason, .. } if reason == "failed")));
}

#[tokio::test]
async fn test_ring_timeout_expires_unanswered_call() {
    let mut config = RealtimeConfig::default();
    config.ring_timeout_seconds = 1;
    let engine = RealtimeEngine::new(
        config,
        Arc::new(MemoryMessageStore::new()),
        Arc::new(MemoryNotificationStore::new()),
    );

    let caller = identity("caller");
    let callee = identity("callee");
    let (c1, mut c1_rx) = engine.connect(caller.clone());
    let (_d1, mut _d1_rx) = engine.connect(callee.clone());

    send(
        &engine,
        &c1,
        ClientEvent::CallUser {
            user_to_call: callee.user_id,
            signal: json!({}),
            is_video: false,
        },
    )
    .await;
    drain(&mut c1_rx);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    engine.calls.expire_stale(std::time::Duration::from_secs(1));

    assert_eq!(engine.calls.active_count(), 0);
    assert!(drain(&mut c1_rx)
        .iter()
        .any(|e| matches!(e, ServerEvent::CallEnded { reason, .. } if reason == "timeout")));
}
