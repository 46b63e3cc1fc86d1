//! Call signaling coordinator — owns every live call session and is its
//! sole mutator.
//!
//! Signals are best-effort: state conflicts (duplicate initiate, late
//! accept, double end) are logged no-ops rather than errors, and the
//! higher-level retry UX recovers anything missed. Session map guards
//! are always released before frames are relayed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use teamline_core::types::id::UserId;

use crate::message::types::ServerEvent;
use crate::metrics::HubMetrics;
use crate::room::hub::RoomHub;

use super::session::{pair_key, CallSession, CallState, CandidateAction};

/// End reasons carried on `call_ended` frames.
mod reason {
    pub const HANGUP: &str = "hangup";
    pub const DISCONNECTED: &str = "disconnected";
    pub const TIMEOUT: &str = "timeout";
    pub const FAILED: &str = "failed";
}

/// Coordinates 1:1 call sessions between identities.
///
/// Multi-party call rooms reuse these primitives pairwise: room
/// membership drives which pairs get initiated, and the coordinator
/// never special-cases N>2.
pub struct CallCoordinator {
    /// Unordered identity pair → live session.
    sessions: DashMap<(UserId, UserId), CallSession>,
    /// Hub for relaying frames to identities.
    hub: Arc<RoomHub>,
    /// Metrics.
    metrics: Arc<HubMetrics>,
}

impl std::fmt::Debug for CallCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallCoordinator")
            .field("active", &self.sessions.len())
            .finish()
    }
}

impl CallCoordinator {
    /// Creates a new coordinator.
    pub fn new(hub: Arc<RoomHub>, metrics: Arc<HubMetrics>) -> Self {
        Self {
            sessions: DashMap::new(),
            hub,
            metrics,
        }
    }

    /// Creates a session in `Ringing` and relays the offer to every
    /// connection of the callee.
    ///
    /// A second initiate while a session for the pair is active is a
    /// logged no-op: exactly one session per unordered pair.
    pub fn initiate(
        &self,
        caller: UserId,
        caller_name: &str,
        callee: UserId,
        signal: serde_json::Value,
        is_video: bool,
    ) {
        if caller == callee {
            warn!(user_id = %caller, "Self-call rejected");
            return;
        }

        let key = pair_key(caller, callee);
        let created = match self.sessions.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().state.is_active() {
                    warn!(
                        caller = %caller,
                        callee = %callee,
                        state = ?occupied.get().state,
                        "Duplicate initiate for active pair ignored"
                    );
                    false
                } else {
                    // Defunct session still in the slot; replace it.
                    occupied.insert(CallSession::new(caller, callee, is_video));
                    true
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(CallSession::new(caller, callee, is_video));
                true
            }
        };

        if !created {
            return;
        }

        HubMetrics::inc(&self.metrics.calls_initiated);
        info!(caller = %caller, callee = %callee, is_video, "Call initiated");

        self.hub.relay_to_user(
            &callee,
            &ServerEvent::IncomingCall {
                from: caller,
                name: caller_name.to_string(),
                signal,
                is_video,
            },
        );
    }

    /// Accepts a ringing call: relays the answer to the caller, then
    /// drains both pending-candidate queues in FIFO order.
    ///
    /// A late or duplicate accept (no ringing session for the pair) is a
    /// no-op; it never creates a session.
    pub fn accept(&self, callee: UserId, caller: UserId, signal: serde_json::Value) {
        let key = pair_key(caller, callee);

        // Mutate under the guard, relay after releasing it.
        let drained = {
            let Some(mut session) = self.sessions.get_mut(&key) else {
                debug!(caller = %caller, callee = %callee, "Accept for unknown session ignored");
                return;
            };
            if session.callee != callee || !session.accept() {
                debug!(
                    caller = %caller,
                    callee = %callee,
                    state = ?session.state,
                    "Late or misdirected accept ignored"
                );
                return;
            }
            let to_caller = session.drain_towards(caller);
            let to_callee = session.drain_towards(callee);
            (to_caller, to_callee)
        };

        info!(caller = %caller, callee = %callee, "Call accepted");

        self.hub.relay_to_user(
            &caller,
            &ServerEvent::CallAccepted {
                from: callee,
                signal,
            },
        );

        let (to_caller, to_callee) = drained;
        for candidate in to_caller {
            self.hub.relay_to_user(
                &caller,
                &ServerEvent::IceCandidate {
                    from: callee,
                    candidate,
                },
            );
        }
        for candidate in to_callee {
            self.hub.relay_to_user(
                &callee,
                &ServerEvent::IceCandidate {
                    from: caller,
                    candidate,
                },
            );
        }
    }

    /// Relays an ICE candidate, queuing it if the recipient side has not
    /// yet applied a remote description. Candidates for unknown or ended
    /// sessions are dropped.
    pub fn relay_candidate(&self, from: UserId, to: UserId, candidate: serde_json::Value) {
        let key = pair_key(from, to);

        let action = {
            let Some(mut session) = self.sessions.get_mut(&key) else {
                debug!(from = %from, to = %to, "Candidate for unknown session dropped");
                return;
            };
            if !session.state.is_active() {
                debug!(from = %from, to = %to, "Candidate for ended session dropped");
                return;
            }
            session.offer_candidate(to, candidate.clone())
        };

        match action {
            Some(CandidateAction::Relay) => {
                self.hub
                    .relay_to_user(&to, &ServerEvent::IceCandidate { from, candidate });
            }
            Some(CandidateAction::Queued) => {
                HubMetrics::inc(&self.metrics.candidates_queued);
            }
            None => {
                warn!(from = %from, to = %to, "Candidate between non-participants dropped");
            }
        }
    }

    /// Records the transport-level connected signal.
    pub fn mark_connected(&self, user: UserId, peer: UserId) {
        let key = pair_key(user, peer);
        if let Some(mut session) = self.sessions.get_mut(&key) {
            if session.connect() {
                info!(caller = %session.caller, callee = %session.callee, "Call connected");
            }
        }
    }

    /// Ends a call from either side. Safe to call twice: the second call
    /// finds no session and is a no-op, so the peer sees exactly one
    /// `call_ended` frame.
    pub fn end(&self, user: UserId, peer: UserId) {
        let key = pair_key(user, peer);
        let notify = match self.sessions.remove(&key) {
            Some((_, mut session)) => {
                let was_active = session.end();
                was_active.then(|| session.peer_of(user)).flatten()
            }
            None => None,
        };

        if let Some(peer) = notify {
            info!(user = %user, peer = %peer, "Call ended");
            self.hub.relay_to_user(
                &peer,
                &ServerEvent::CallEnded {
                    peer: user,
                    reason: reason::HANGUP.to_string(),
                },
            );
        }
    }

    /// Marks a session failed (media/negotiation failure reported by the
    /// transport layer) and notifies the peer.
    pub fn fail(&self, user: UserId, peer: UserId) {
        let key = pair_key(user, peer);
        let notify = match self.sessions.remove(&key) {
            Some((_, mut session)) => {
                let was_active = session.fail();
                was_active.then(|| session.peer_of(user)).flatten()
            }
            None => None,
        };

        if let Some(peer) = notify {
            warn!(user = %user, peer = %peer, "Call failed");
            self.hub.relay_to_user(
                &peer,
                &ServerEvent::CallEnded {
                    peer: user,
                    reason: reason::FAILED.to_string(),
                },
            );
        }
    }

    /// Ends every session involving a user whose last connection dropped.
    ///
    /// An abruptly closed transport never gets to call `end` explicitly,
    /// so this is driven by the registry's disconnect outcome.
    pub fn handle_disconnect(&self, user: UserId) {
        let affected: Vec<(UserId, UserId)> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().peer_of(user).is_some())
            .map(|entry| *entry.key())
            .collect();

        for key in affected {
            let notify = match self.sessions.remove(&key) {
                Some((_, mut session)) => {
                    let was_active = session.end();
                    was_active.then(|| session.peer_of(user)).flatten()
                }
                None => None,
            };

            if let Some(peer) = notify {
                info!(user = %user, peer = %peer, "Call ended by disconnect");
                self.hub.relay_to_user(
                    &peer,
                    &ServerEvent::CallEnded {
                        peer: user,
                        reason: reason::DISCONNECTED.to_string(),
                    },
                );
            }
        }
    }

    /// Garbage-collects sessions still ringing after `ring_timeout`,
    /// notifying both sides.
    pub fn expire_stale(&self, ring_timeout: Duration) {
        let Ok(cutoff) = chrono::Duration::from_std(ring_timeout) else {
            return;
        };
        let now = Utc::now();

        let overdue: Vec<(UserId, UserId)> = self
            .sessions
            .iter()
            .filter(|entry| {
                entry.value().state == CallState::Ringing
                    && now - entry.value().created_at > cutoff
            })
            .map(|entry| *entry.key())
            .collect();

        for key in overdue {
            if let Some((_, mut session)) = self.sessions.remove(&key) {
                if !session.end() {
                    continue;
                }
                info!(
                    caller = %session.caller,
                    callee = %session.callee,
                    "Unanswered call expired"
                );
                for (user, peer) in [
                    (session.caller, session.callee),
                    (session.callee, session.caller),
                ] {
                    self.hub.relay_to_user(
                        &user,
                        &ServerEvent::CallEnded {
                            peer,
                            reason: reason::TIMEOUT.to_string(),
                        },
                    );
                }
            }
        }
    }

    /// State of the session for a pair, if one exists (diagnostics/tests).
    pub fn state_of(&self, a: UserId, b: UserId) -> Option<CallState> {
        self.sessions
            .get(&pair_key(a, b))
            .map(|session| session.state)
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
