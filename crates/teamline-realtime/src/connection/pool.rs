//! Connection pool — all active connections indexed by user and by id.

use std::sync::Arc;

use dashmap::DashMap;

use teamline_core::types::id::UserId;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of all active connections.
#[derive(Debug)]
pub struct ConnectionPool {
    /// User ID → list of connection handles, in registration order.
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self {
            by_user: DashMap::new(),
            by_id: DashMap::new(),
        }
    }

    /// Adds a connection to the pool. Re-adding the same id replaces it.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        if let Some(previous) = self.by_id.insert(handle.id, handle.clone()) {
            if let Some(mut connections) = self.by_user.get_mut(&previous.user_id) {
                connections.retain(|c| c.id != previous.id);
            }
        }
        self.by_user.entry(handle.user_id).or_default().push(handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user.remove(&handle.user_id);
            }
        }
        Some(handle)
    }

    /// Gets a specific connection by id.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Gets all connections for a user, in registration order.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Checks whether a user has at least one live connection.
    pub fn is_user_connected(&self, user_id: &UserId) -> bool {
        self.by_user
            .get(user_id)
            .map(|entry| !entry.value().is_empty())
            .unwrap_or(false)
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns all connected user ids, sorted for stable broadcasts.
    pub fn connected_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.by_user.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new()
    }
}
