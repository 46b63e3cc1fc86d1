//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use teamline_core::config::realtime::RealtimeConfig;
use teamline_core::traits::identity::ResolvedIdentity;
use teamline_core::traits::store::{MessageStore, NotificationStore};
use teamline_core::types::message::MessageDraft;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::registry::ConnectionRegistry;
use crate::message::types::{ClientEvent, ServerEvent};
use crate::metrics::HubMetrics;
use crate::notification::fanout::NotificationFanout;
use crate::presence::tracker::PresenceTracker;
use crate::room::hub::RoomHub;
use crate::signaling::coordinator::CallCoordinator;

/// Central real-time engine that coordinates all hub subsystems.
///
/// One engine instance per process; every inbound event is handled in
/// isolation with its own failure boundary, so a malformed frame or a
/// store error never takes the hub down or corrupts unrelated sessions.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Presence tracker.
    pub presence: Arc<PresenceTracker>,
    /// Room/chat hub.
    pub hub: Arc<RoomHub>,
    /// Call signaling coordinator.
    pub calls: Arc<CallCoordinator>,
    /// Notification fan-out.
    pub notifications: Arc<NotificationFanout>,
    /// Metrics collector.
    pub metrics: Arc<HubMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
    /// Configuration.
    config: RealtimeConfig,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new engine with all subsystems wired together.
    pub fn new(
        config: RealtimeConfig,
        message_store: Arc<dyn MessageStore>,
        notification_store: Arc<dyn NotificationStore>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(HubMetrics::new());
        let presence = Arc::new(PresenceTracker::new(config.presence_buffer_size));
        let registry = Arc::new(ConnectionRegistry::new(
            config.clone(),
            presence.clone(),
            metrics.clone(),
        ));
        let hub = Arc::new(RoomHub::new(
            registry.clone(),
            message_store,
            config.echo_window_size,
            metrics.clone(),
        ));
        let calls = Arc::new(CallCoordinator::new(hub.clone(), metrics.clone()));
        let notifications = Arc::new(NotificationFanout::new(
            hub.clone(),
            notification_store,
            metrics.clone(),
        ));

        info!("Real-time engine initialized");

        Self {
            registry,
            presence,
            hub,
            calls,
            notifications,
            metrics,
            shutdown_tx,
            config,
        }
    }

    /// Registers a connection for a resolved identity.
    pub fn connect(
        &self,
        identity: ResolvedIdentity,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        self.registry.register(identity)
    }

    /// Tears down a connection: room memberships, presence, and any call
    /// sessions whose participant just lost their last connection.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        if let Some(outcome) = self.registry.unregister(conn_id) {
            if outcome.was_last {
                self.calls.handle_disconnect(outcome.user_id);
            }
        }
    }

    /// Processes one inbound frame from a client.
    ///
    /// Parse failures are answered with an `error` frame; handler
    /// failures are logged. Nothing here panics or propagates.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.registry.get(conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };

        HubMetrics::inc(&self.metrics.events_received);

        let event: ClientEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "Malformed frame");
                handle.send(ServerEvent::Error {
                    code: "INVALID_MESSAGE".to_string(),
                    message: format!("Failed to parse frame: {e}"),
                });
                return;
            }
        };

        self.dispatch(&handle, event).await;
    }

    /// Routes a parsed client event to its subsystem.
    pub async fn dispatch(&self, handle: &Arc<ConnectionHandle>, event: ClientEvent) {
        match event {
            ClientEvent::Typing { room } => {
                self.hub.typing(room, handle.id, handle.user_id, true);
            }
            ClientEvent::StopTyping { room } => {
                self.hub.typing(room, handle.id, handle.user_id, false);
            }
            ClientEvent::SendMessage { room, text, kind } => {
                let draft = MessageDraft {
                    room,
                    sender: handle.user_id,
                    body: text,
                    kind,
                };
                if let Err(e) = self.hub.send_message(handle.id, draft).await {
                    warn!(conn_id = %handle.id, error = %e, "Message send failed");
                    handle.send(ServerEvent::Error {
                        code: e.kind.to_string(),
                        message: e.message,
                    });
                }
            }
            ClientEvent::JoinRoom { room } => {
                self.hub.join_room(handle.id, room);
            }
            ClientEvent::LeaveRoom { room } => {
                self.hub.leave_room(handle.id, &room);
            }
            ClientEvent::CallUser {
                user_to_call,
                signal,
                is_video,
            } => {
                self.calls.initiate(
                    handle.user_id,
                    &handle.display_name,
                    user_to_call,
                    signal,
                    is_video,
                );
            }
            ClientEvent::AnswerCall { to, signal } => {
                self.calls.accept(handle.user_id, to, signal);
            }
            ClientEvent::IceCandidate { to, candidate } => {
                self.calls.relay_candidate(handle.user_id, to, candidate);
            }
            ClientEvent::CallConnected { peer } => {
                self.calls.mark_connected(handle.user_id, peer);
            }
            ClientEvent::EndCall { peer } => {
                self.calls.end(handle.user_id, peer);
            }
        }
    }

    /// Spawns the session maintenance sweep (stuck-ringing collection).
    ///
    /// A `ring_timeout_seconds` of 0 disables expiry; the task still
    /// parks on the shutdown signal so the engine owns its lifecycle.
    pub fn spawn_maintenance(&self) -> tokio::task::JoinHandle<()> {
        let calls = self.calls.clone();
        let ring_timeout = Duration::from_secs(self.config.ring_timeout_seconds);
        let sweep_every = Duration::from_secs(self.config.sweep_interval_seconds.max(1));
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_every);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if !ring_timeout.is_zero() {
                            calls.expire_stale(ring_timeout);
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
            debug!("Maintenance sweep stopped");
        })
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the engine.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.registry.close_all();
        info!("Real-time engine shut down");
    }
}
