//! Room membership table — which connections are joined to which rooms.
//!
//! Membership is purely in-memory and does not survive a restart;
//! clients rejoin on reconnect.

use std::collections::HashSet;

use dashmap::DashMap;

use teamline_core::types::room::RoomId;

use super::handle::ConnectionId;

/// Tracks room membership with a forward and reverse index.
#[derive(Debug)]
pub struct RoomTable {
    /// Room → set of joined connection ids.
    members: DashMap<RoomId, HashSet<ConnectionId>>,
    /// Connection id → set of joined rooms.
    joined: DashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomTable {
    /// Creates an empty room table.
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
            joined: DashMap::new(),
        }
    }

    /// Joins a connection to a room. Joining twice is a no-op.
    pub fn join(&self, conn_id: ConnectionId, room: RoomId) {
        self.members
            .entry(room.clone())
            .or_default()
            .insert(conn_id);
        self.joined.entry(conn_id).or_default().insert(room);
    }

    /// Removes a connection from a room. Leaving a non-joined room is a no-op.
    pub fn leave(&self, conn_id: ConnectionId, room: &RoomId) {
        if let Some(mut members) = self.members.get_mut(room) {
            members.remove(&conn_id);
            if members.is_empty() {
                drop(members);
                self.members.remove(room);
            }
        }
        if let Some(mut rooms) = self.joined.get_mut(&conn_id) {
            rooms.remove(room);
        }
    }

    /// Removes a connection from every room it joined.
    pub fn leave_all(&self, conn_id: ConnectionId) -> HashSet<RoomId> {
        let rooms = self
            .joined
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default();
        for room in &rooms {
            if let Some(mut members) = self.members.get_mut(room) {
                members.remove(&conn_id);
                if members.is_empty() {
                    drop(members);
                    self.members.remove(room);
                }
            }
        }
        rooms
    }

    /// Returns the connection ids currently joined to a room.
    pub fn members_of(&self, room: &RoomId) -> Vec<ConnectionId> {
        self.members
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Checks whether a connection is joined to a room.
    pub fn is_member(&self, conn_id: ConnectionId, room: &RoomId) -> bool {
        self.members
            .get(room)
            .map(|members| members.contains(&conn_id))
            .unwrap_or(false)
    }

    /// Returns the number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.members.len()
    }
}

impl Default for RoomTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_join_is_idempotent() {
        let table = RoomTable::new();
        let conn = Uuid::new_v4();
        let room = RoomId::call("standup");

        table.join(conn, room.clone());
        table.join(conn, room.clone());

        assert_eq!(table.members_of(&room).len(), 1);
    }

    #[test]
    fn test_leave_non_joined_is_noop() {
        let table = RoomTable::new();
        table.leave(Uuid::new_v4(), &RoomId::call("standup"));
        assert_eq!(table.room_count(), 0);
    }

    #[test]
    fn test_leave_all_clears_both_indexes() {
        let table = RoomTable::new();
        let conn = Uuid::new_v4();
        let a = RoomId::call("a");
        let b = RoomId::call("b");
        table.join(conn, a.clone());
        table.join(conn, b.clone());

        let left = table.leave_all(conn);

        assert_eq!(left.len(), 2);
        assert!(table.members_of(&a).is_empty());
        assert!(table.members_of(&b).is_empty());
        assert_eq!(table.room_count(), 0);
    }

    #[test]
    fn test_empty_rooms_are_dropped() {
        let table = RoomTable::new();
        let conn = Uuid::new_v4();
        let room = RoomId::call("standup");
        table.join(conn, room.clone());
        table.leave(conn, &room);
        assert_eq!(table.room_count(), 0);
    }
}
