//! Per-pair call session state machine.
//!
//! One session exists per unordered identity pair at a time. Each
//! direction keeps its own pending-candidate queue: candidates that
//! arrive before the recipient side has applied a remote description are
//! held in FIFO order and drained exactly once at accept time; after the
//! drain the queue is never appended to again and later candidates relay
//! immediately.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use teamline_core::types::id::UserId;

/// Lifecycle state of a call session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Offer relayed, waiting for the callee.
    Ringing,
    /// Answer relayed, media negotiation in progress.
    Accepted,
    /// Transport-level link reported established.
    Connected,
    /// Ended by hang-up, disconnect, or timeout.
    Ended,
    /// Media/negotiation failure reported.
    Failed,
}

impl CallState {
    /// Whether the session still occupies its pair slot.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Ringing | Self::Accepted | Self::Connected)
    }
}

/// What to do with a candidate offered for relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateAction {
    /// Recipient side has its remote description; relay now.
    Relay,
    /// Queued until the accept drains this direction.
    Queued,
}

/// One direction of candidate flow within a session.
#[derive(Debug, Default)]
struct CandidateLane {
    /// Whether the recipient of this lane has applied a remote description.
    remote_applied: bool,
    /// Candidates received before the remote description, FIFO.
    pending: VecDeque<serde_json::Value>,
}

/// A single signaling attempt between two identities.
#[derive(Debug)]
pub struct CallSession {
    /// Offering side.
    pub caller: UserId,
    /// Answering side.
    pub callee: UserId,
    /// Whether video was requested.
    pub is_video: bool,
    /// Current lifecycle state.
    pub state: CallState,
    /// When the session was created (Ringing).
    pub created_at: DateTime<Utc>,
    /// Set on the transition to Connected.
    pub started_at: Option<DateTime<Utc>>,
    /// Candidates flowing toward the caller.
    to_caller: CandidateLane,
    /// Candidates flowing toward the callee.
    to_callee: CandidateLane,
}

impl CallSession {
    /// Creates a new session in `Ringing`.
    pub fn new(caller: UserId, callee: UserId, is_video: bool) -> Self {
        Self {
            caller,
            callee,
            is_video,
            state: CallState::Ringing,
            created_at: Utc::now(),
            started_at: None,
            to_caller: CandidateLane::default(),
            to_callee: CandidateLane::default(),
        }
    }

    /// The other participant, if `user` is part of this session.
    pub fn peer_of(&self, user: UserId) -> Option<UserId> {
        if user == self.caller {
            Some(self.callee)
        } else if user == self.callee {
            Some(self.caller)
        } else {
            None
        }
    }

    /// Ringing → Accepted. Returns `false` if the session is not ringing
    /// (late or duplicate accept).
    pub fn accept(&mut self) -> bool {
        if self.state != CallState::Ringing {
            return false;
        }
        self.state = CallState::Accepted;
        true
    }

    /// Accepted → Connected; records the start timestamp.
    pub fn connect(&mut self) -> bool {
        if self.state != CallState::Accepted {
            return false;
        }
        self.state = CallState::Connected;
        self.started_at = Some(Utc::now());
        true
    }

    /// Any active state → Ended. Returns whether a transition happened.
    pub fn end(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state = CallState::Ended;
        true
    }

    /// Any active state → Failed.
    pub fn fail(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state = CallState::Failed;
        true
    }

    /// Accepts a candidate addressed to `to`: relayed immediately once
    /// that side has its remote description, queued in order otherwise.
    pub fn offer_candidate(
        &mut self,
        to: UserId,
        candidate: serde_json::Value,
    ) -> Option<CandidateAction> {
        let lane = self.lane_towards(to)?;
        if lane.remote_applied {
            Some(CandidateAction::Relay)
        } else {
            lane.pending.push_back(candidate);
            Some(CandidateAction::Queued)
        }
    }

    /// Marks the lane toward `to` as having its remote description
    /// applied and returns the queued candidates in receipt order. The
    /// queue is cleared permanently; this is called exactly once per
    /// direction, at accept time.
    pub fn drain_towards(&mut self, to: UserId) -> Vec<serde_json::Value> {
        match self.lane_towards(to) {
            Some(lane) => {
                lane.remote_applied = true;
                lane.pending.drain(..).collect()
            }
            None => Vec::new(),
        }
    }

    /// Number of candidates currently queued toward `to`.
    pub fn pending_towards(&self, to: UserId) -> usize {
        if to == self.caller {
            self.to_caller.pending.len()
        } else if to == self.callee {
            self.to_callee.pending.len()
        } else {
            0
        }
    }

    fn lane_towards(&mut self, to: UserId) -> Option<&mut CandidateLane> {
        if to == self.caller {
            Some(&mut self.to_caller)
        } else if to == self.callee {
            Some(&mut self.to_callee)
        } else {
            None
        }
    }
}

/// Normalizes an identity pair into the session map key.
pub fn pair_key(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> (CallSession, UserId, UserId) {
        let caller = UserId::new();
        let callee = UserId::new();
        (CallSession::new(caller, callee, true), caller, callee)
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let (mut s, ..) = session();
        assert_eq!(s.state, CallState::Ringing);
        assert!(s.accept());
        assert_eq!(s.state, CallState::Accepted);
        assert!(s.connect());
        assert_eq!(s.state, CallState::Connected);
        assert!(s.started_at.is_some());
        assert!(s.end());
        assert_eq!(s.state, CallState::Ended);
    }

    #[test]
    fn test_accept_requires_ringing() {
        let (mut s, ..) = session();
        s.accept();
        assert!(!s.accept());
        s.end();
        assert!(!s.accept());
    }

    #[test]
    fn test_end_is_idempotent() {
        let (mut s, ..) = session();
        assert!(s.end());
        assert!(!s.end());
        assert_eq!(s.state, CallState::Ended);
    }

    #[test]
    fn test_connect_requires_accept() {
        let (mut s, ..) = session();
        assert!(!s.connect());
        assert!(s.started_at.is_none());
    }

    #[test]
    fn test_candidates_queue_in_fifo_order_until_drain() {
        let (mut s, _caller, callee) = session();

        for i in 0..3 {
            let action = s.offer_candidate(callee, json!({ "seq": i })).unwrap();
            assert_eq!(action, CandidateAction::Queued);
        }
        assert_eq!(s.pending_towards(callee), 3);

        let drained = s.drain_towards(callee);
        let seqs: Vec<i64> = drained.iter().map(|c| c["seq"].as_i64().unwrap()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(s.pending_towards(callee), 0);

        // After the drain, candidates relay immediately and never re-queue.
        let action = s.offer_candidate(callee, json!({ "seq": 3 })).unwrap();
        assert_eq!(action, CandidateAction::Relay);
        assert_eq!(s.pending_towards(callee), 0);
    }

    #[test]
    fn test_lanes_are_independent() {
        let (mut s, caller, callee) = session();
        s.offer_candidate(caller, json!({ "dir": "to_caller" }));
        s.offer_candidate(callee, json!({ "dir": "to_callee" }));

        assert_eq!(s.pending_towards(caller), 1);
        assert_eq!(s.pending_towards(callee), 1);

        s.drain_towards(caller);
        assert_eq!(s.pending_towards(caller), 0);
        assert_eq!(s.pending_towards(callee), 1);
    }

    #[test]
    fn test_candidate_from_stranger_is_rejected() {
        let (mut s, ..) = session();
        assert!(s.offer_candidate(UserId::new(), json!({})).is_none());
    }

    #[test]
    fn test_pair_key_is_order_insensitive() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(pair_key(a, b), pair_key(b, a));
    }

    #[test]
    fn test_fail_from_any_active_state() {
        let (mut s, ..) = session();
        s.accept();
        s.connect();
        assert!(s.fail());
        assert_eq!(s.state, CallState::Failed);
        assert!(!s.fail());
    }
}
