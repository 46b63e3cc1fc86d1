//! Real-time hub configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound buffer size.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Presence broadcast channel capacity.
    #[serde(default = "default_presence_buffer")]
    pub presence_buffer_size: usize,
    /// Size of the rolling origin-echo suppression window (message ids).
    #[serde(default = "default_echo_window")]
    pub echo_window_size: usize,
    /// Seconds before an unanswered call is garbage-collected.
    ///
    /// 0 disables the sweep; unanswered calls then only end on an
    /// explicit hang-up or a participant disconnect.
    #[serde(default)]
    pub ring_timeout_seconds: u64,
    /// Interval of the session maintenance sweep in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            presence_buffer_size: default_presence_buffer(),
            echo_window_size: default_echo_window(),
            ring_timeout_seconds: 0,
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_presence_buffer() -> usize {
    64
}

fn default_echo_window() -> usize {
    1024
}

fn default_sweep_interval() -> u64 {
    10
}
