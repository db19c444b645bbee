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

//! Append-only structured event log.
//!
//! Every recorded event lands in three places: a bounded in-memory ring
//! (capacity 1000, oldest evicted), a JSON-lines file, and, when a remote
//! sink is configured, a fire-and-forget dispatch channel. HIGH and
//! CRITICAL events additionally produce a `[SECURITY ALERT]` line on
//! standard error. All auxiliary failures are swallowed: a log that cannot
//! be written never stops the gateway.

use std::collections::{BTreeMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use crate::engine_core::constants::limits;
use crate::engine_core::events::{EventKind, EventStats, SecurityEvent, Severity};

pub struct EventLog {
    session_id: String,
    ring: Mutex<VecDeque<SecurityEvent>>,
    file: Mutex<Option<File>>,
    remote_tx: Option<mpsc::UnboundedSender<SecurityEvent>>,
}

impl EventLog {
    /// Open the log. A file that cannot be opened is reported once on
    /// stderr and file logging is disabled for the session.
    pub fn new(
        log_path: &Path,
        session_id: String,
        remote_tx: Option<mpsc::UnboundedSender<SecurityEvent>>,
    ) -> Self {
        let file = match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(f) => Some(f),
            Err(e) => {
                eprintln!(
                    "contextguard: cannot open event log {}: {}",
                    log_path.display(),
                    e
                );
                None
            }
        };
        Self {
            session_id,
            ring: Mutex::new(VecDeque::with_capacity(limits::EVENT_RING_CAPACITY)),
            file: Mutex::new(file),
            remote_tx,
        }
    }

    /// Record one event. Returns the stamped event for callers that need it.
    pub fn record(
        &self,
        event_type: EventKind,
        severity: Severity,
        details: serde_json::Value,
    ) -> SecurityEvent {
        let event = SecurityEvent {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event_type,
            severity,
            details,
            session_id: self.session_id.clone(),
        };

        self.push_ring(event.clone());
        self.append_file(&event);

        if severity.is_alerting() {
            eprintln!("[SECURITY ALERT] {}: {}", event_type, event.details);
        }

        if let Some(tx) = &self.remote_tx {
            if tx.send(event.clone()).is_err() {
                warn!("remote event dispatcher is gone; event not mirrored");
            }
        }

        event
    }

    fn push_ring(&self, event: SecurityEvent) {
        let mut ring = self.ring.lock().unwrap_or_else(|p| p.into_inner());
        ring.push_back(event);
        while ring.len() > limits::EVENT_RING_CAPACITY {
            ring.pop_front();
        }
    }

    fn append_file(&self, event: &SecurityEvent) {
        let mut guard = self.file.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(file) = guard.as_mut() {
            // One write_all per event keeps the line append atomic.
            let mut line = match serde_json::to_string(event) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("contextguard: failed to serialize event: {}", e);
                    return;
                }
            };
            line.push('\n');
            if let Err(e) = file.write_all(line.as_bytes()) {
                eprintln!("contextguard: failed to write event log: {}", e);
            }
        }
    }

    /// Statistics over the in-memory ring only.
    pub fn stats(&self) -> EventStats {
        let ring = self.ring.lock().unwrap_or_else(|p| p.into_inner());
        let mut events_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut events_by_severity: BTreeMap<String, usize> = BTreeMap::new();
        for event in ring.iter() {
            *events_by_type
                .entry(event.event_type.as_str().to_string())
                .or_insert(0) += 1;
            *events_by_severity
                .entry(event.severity.as_str().to_string())
                .or_insert(0) += 1;
        }
        let recent_events = ring
            .iter()
            .rev()
            .take(limits::RECENT_EVENTS)
            .rev()
            .cloned()
            .collect();
        EventStats {
            total_events: ring.len(),
            events_by_type,
            events_by_severity,
            recent_events,
        }
    }

    /// Snapshot of the ring, newest last. Test and statistics support.
    pub fn ring_snapshot(&self) -> Vec<SecurityEvent> {
        let ring = self.ring.lock().unwrap_or_else(|p| p.into_inner());
        ring.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_log() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        (dir, path)
    }

    #[test]
    fn events_append_as_json_lines() {
        let (_dir, path) = temp_log();
        let log = EventLog::new(&path, "cafe0123".to_string(), None);
        log.record(EventKind::ClientRequest, Severity::Low, json!({"method": "tools/list"}));
        log.record(EventKind::ServerResponse, Severity::Low, json!({"id": 1}));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let event: SecurityEvent = serde_json::from_str(line).unwrap();
            assert_eq!(event.session_id, "cafe0123");
        }
    }

    #[test]
    fn ring_evicts_oldest_beyond_capacity() {
        let (_dir, path) = temp_log();
        let log = EventLog::new(&path, "cafe0123".to_string(), None);
        for i in 0..(limits::EVENT_RING_CAPACITY + 5) {
            log.record(EventKind::ClientRequest, Severity::Low, json!({ "i": i }));
        }
        let ring = log.ring_snapshot();
        assert_eq!(ring.len(), limits::EVENT_RING_CAPACITY);
        assert_eq!(ring[0].details["i"], 5);
    }

    #[test]
    fn stats_count_by_type_and_severity() {
        let (_dir, path) = temp_log();
        let log = EventLog::new(&path, "cafe0123".to_string(), None);
        log.record(EventKind::ClientRequest, Severity::Low, json!({}));
        log.record(EventKind::ClientRequest, Severity::Low, json!({}));
        log.record(EventKind::SecurityViolation, Severity::Critical, json!({}));

        let stats = log.stats();
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.events_by_type["CLIENT_REQUEST"], 2);
        assert_eq!(stats.events_by_type["SECURITY_VIOLATION"], 1);
        assert_eq!(stats.events_by_severity["LOW"], 2);
        assert_eq!(stats.events_by_severity["CRITICAL"], 1);
        assert_eq!(stats.recent_events.len(), 3);
    }

    #[test]
    fn recent_events_are_the_last_ten_newest_last() {
        let (_dir, path) = temp_log();
        let log = EventLog::new(&path, "cafe0123".to_string(), None);
        for i in 0..15 {
            log.record(EventKind::ClientRequest, Severity::Low, json!({ "i": i }));
        }
        let stats = log.stats();
        assert_eq!(stats.recent_events.len(), 10);
        assert_eq!(stats.recent_events[0].details["i"], 5);
        assert_eq!(stats.recent_events[9].details["i"], 14);
    }

    #[test]
    fn unwritable_log_path_does_not_panic() {
        let log = EventLog::new(
            Path::new("/nonexistent-dir/events.log"),
            "cafe0123".to_string(),
            None,
        );
        log.record(EventKind::ClientRequest, Severity::Low, json!({}));
        assert_eq!(log.stats().total_events, 1);
    }

    #[test]
    fn events_are_mirrored_to_the_remote_channel() {
        let (_dir, path) = temp_log();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let log = EventLog::new(&path, "cafe0123".to_string(), Some(tx));
        log.record(EventKind::ToolCall, Severity::High, json!({"toolName": "x"}));
        let mirrored = rx.try_recv().unwrap();
        assert_eq!(mirrored.event_type, EventKind::ToolCall);
    }
}
