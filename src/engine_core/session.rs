// Copyright 2026 ContextGuard Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-session gateway state.
//!
//! One `SessionState` is created at gateway start and lives for the lifetime
//! of the child process. Both interceptor pipelines consult it through a
//! single mutex, which linearizes the rate-window mutations against the
//! policy check that reads them.

use sha2::{Digest, Sha256};

use crate::engine_core::constants::limits;

/// Length of the hex session discriminator.
const SESSION_ID_CHARS: usize = 8;

#[derive(Debug)]
pub struct SessionState {
    session_id: String,
    /// Milliseconds timestamps of accepted `tools/call` requests within the
    /// rolling window, oldest first.
    tool_call_timestamps: Vec<i64>,
}

impl SessionState {
    /// Create state for a session starting at `start_ms` (wall-clock millis).
    pub fn new(start_ms: i64) -> Self {
        Self {
            session_id: derive_session_id(start_ms),
            tool_call_timestamps: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Drop window entries at or older than `now_ms - 60000`.
    pub fn prune_rate_window(&mut self, now_ms: i64) {
        let window_start = now_ms - limits::RATE_WINDOW_MS;
        self.tool_call_timestamps.retain(|&t| t > window_start);
    }

    /// The accepted `tools/call` timestamps currently in the window.
    pub fn rate_window(&self) -> &[i64] {
        &self.tool_call_timestamps
    }

    /// Record an accepted `tools/call`. Called before the forwarded bytes
    /// reach the child, so the window always reflects the accepted count.
    pub fn record_tool_call(&mut self, now_ms: i64) {
        self.tool_call_timestamps.push(now_ms);
    }
}

/// Session id: SHA-256 over the decimal startup timestamp, first 8 hex chars.
fn derive_session_id(start_ms: i64) -> String {
    let digest = Sha256::digest(start_ms.to_string().as_bytes());
    let mut hex = String::with_capacity(SESSION_ID_CHARS);
    for byte in digest.iter().take(SESSION_ID_CHARS.div_ceil(2)) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex.truncate(SESSION_ID_CHARS);
    hex
}
