//! Connection registry — connection lifecycle, room membership, and the
//! presence side effects of both.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use teamline_core::config::realtime::RealtimeConfig;
use teamline_core::traits::identity::ResolvedIdentity;
use teamline_core::types::id::UserId;
use teamline_core::types::room::RoomId;

use crate::message::types::ServerEvent;
use crate::metrics::HubMetrics;
use crate::presence::tracker::PresenceTracker;

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;
use super::rooms::RoomTable;

/// Outcome of unregistering a connection.
#[derive(Debug, Clone)]
pub struct Disconnect {
    /// The user who owned the connection.
    pub user_id: UserId,
    /// Whether this was the user's last live connection.
    pub was_last: bool,
}

/// Tracks live connections, their owning users, and their room
/// memberships. All mutation goes through these entry points; operations
/// on unknown connection ids are no-ops, never errors.
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// Connection pool.
    pool: ConnectionPool,
    /// Room membership table.
    rooms: RoomTable,
    /// Presence tracker.
    presence: Arc<PresenceTracker>,
    /// Metrics.
    metrics: Arc<HubMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionRegistry {
    /// Creates a new registry.
    pub fn new(
        config: RealtimeConfig,
        presence: Arc<PresenceTracker>,
        metrics: Arc<HubMetrics>,
    ) -> Self {
        Self {
            pool: ConnectionPool::new(),
            rooms: RoomTable::new(),
            presence,
            metrics,
            config,
        }
    }

    /// Registers a new connection for a resolved identity.
    ///
    /// Returns the handle and the receiver for its outbound queue. The
    /// connection is auto-joined to the user's personal room, and if it
    /// is the user's first connection the presence change is broadcast.
    pub fn register(
        &self,
        identity: ResolvedIdentity,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(
            identity.user_id,
            identity.display_name,
            tx,
        ));

        let came_online = !self.pool.is_user_connected(&identity.user_id);
        self.pool.add(handle.clone());
        self.rooms.join(handle.id, RoomId::user(identity.user_id));
        HubMetrics::inc(&self.metrics.connections_opened);

        info!(
            conn_id = %handle.id,
            user_id = %identity.user_id,
            "Connection registered"
        );

        if came_online {
            self.broadcast_presence();
        }

        (handle, rx)
    }

    /// Unregisters a connection and cleans up its room memberships.
    ///
    /// Returns `None` for an unknown connection id (the transport already
    /// disconnected).
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Disconnect> {
        let handle = self.pool.remove(conn_id)?;
        handle.mark_dead();
        self.rooms.leave_all(*conn_id);
        HubMetrics::inc(&self.metrics.connections_closed);

        let was_last = !self.pool.is_user_connected(&handle.user_id);

        info!(
            conn_id = %conn_id,
            user_id = %handle.user_id,
            was_last,
            "Connection unregistered"
        );

        if was_last {
            self.broadcast_presence();
        }

        Some(Disconnect {
            user_id: handle.user_id,
            was_last,
        })
    }

    /// Joins a connection to a room. Unknown connection ids are no-ops.
    pub fn join_room(&self, conn_id: ConnectionId, room: RoomId) {
        if self.pool.get(&conn_id).is_none() {
            debug!(conn_id = %conn_id, "Join from unknown connection ignored");
            return;
        }
        self.rooms.join(conn_id, room);
    }

    /// Removes a connection from a room. Non-members and unknown
    /// connection ids are no-ops.
    pub fn leave_room(&self, conn_id: ConnectionId, room: &RoomId) {
        self.rooms.leave(conn_id, room);
    }

    /// Returns the handles currently joined to a room.
    pub fn members_of(&self, room: &RoomId) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .members_of(room)
            .into_iter()
            .filter_map(|id| self.pool.get(&id))
            .collect()
    }

    /// Checks whether a connection is joined to a room.
    pub fn is_member(&self, conn_id: ConnectionId, room: &RoomId) -> bool {
        self.rooms.is_member(conn_id, room)
    }

    /// Returns all connections of a user, in registration order.
    pub fn connections_for(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.pool.user_connections(user_id)
    }

    /// Looks up a connection handle.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Checks whether a user has at least one live connection.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.pool.is_user_connected(user_id)
    }

    /// The current online-user set, recomputed from the pool.
    pub fn online_users(&self) -> Vec<UserId> {
        self.pool.connected_user_ids()
    }

    /// Total live connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Marks every connection dead and empties the pool (shutdown path).
    pub fn close_all(&self) {
        for handle in self.pool.all_connections() {
            handle.mark_dead();
            self.rooms.leave_all(handle.id);
            self.pool.remove(&handle.id);
        }
        info!("All connections closed");
    }

    /// Publishes the recomputed online set to listeners and pushes the
    /// full list to every live connection.
    fn broadcast_presence(&self) {
        let online = self.pool.connected_user_ids();
        self.presence.publish(online.clone());

        let event = ServerEvent::OnlineUsers { users: online };
        for handle in self.pool.all_connections() {
            if handle.send(event.clone()) {
                HubMetrics::inc(&self.metrics.frames_sent);
            }
        }
    }
}
