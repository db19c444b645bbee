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

//! Security event model.
//!
//! Pure data structures for the structured event log: the event taxonomy,
//! severities, the logged event record, and the on-demand statistics view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Event severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    /// HIGH and CRITICAL events additionally produce a stderr alert line.
    pub fn is_alerting(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The event taxonomy. Symbolic names are wire- and log-visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "SERVER_START")]
    ServerStart,
    #[serde(rename = "SERVER_EXIT")]
    ServerExit,
    #[serde(rename = "SERVER_ERROR")]
    ServerError,
    #[serde(rename = "CLIENT_REQUEST")]
    ClientRequest,
    #[serde(rename = "TOOL_CALL")]
    ToolCall,
    #[serde(rename = "RATE_LIMIT_EXCEEDED")]
    RateLimitExceeded,
    #[serde(rename = "SECURITY_VIOLATION")]
    SecurityViolation,
    #[serde(rename = "SENSITIVE_DATA_LEAK")]
    SensitiveDataLeak,
    #[serde(rename = "SERVER_RESPONSE")]
    ServerResponse,
    #[serde(rename = "PARSE_ERROR")]
    ParseError,
    #[serde(rename = "SERVER_PARSE_ERROR")]
    ServerParseError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ServerStart => "SERVER_START",
            EventKind::ServerExit => "SERVER_EXIT",
            EventKind::ServerError => "SERVER_ERROR",
            EventKind::ClientRequest => "CLIENT_REQUEST",
            EventKind::ToolCall => "TOOL_CALL",
            EventKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            EventKind::SecurityViolation => "SECURITY_VIOLATION",
            EventKind::SensitiveDataLeak => "SENSITIVE_DATA_LEAK",
            EventKind::ServerResponse => "SERVER_RESPONSE",
            EventKind::ParseError => "PARSE_ERROR",
            EventKind::ServerParseError => "SERVER_PARSE_ERROR",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged observation. Serialized as a single JSON line in the log file
/// and mirrored to the remote sink when configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    #[serde(rename = "eventType")]
    pub event_type: EventKind,
    pub severity: Severity,
    pub details: serde_json::Value,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Materialized view over the in-memory event ring.
#[derive(Debug, Clone, Serialize)]
pub struct EventStats {
    #[serde(rename = "totalEvents")]
    pub total_events: usize,
    #[serde(rename = "eventsByType")]
    pub events_by_type: BTreeMap<String, usize>,
    #[serde(rename = "eventsBySeverity")]
    pub events_by_severity: BTreeMap<String, usize>,
    #[serde(rename = "recentEvents")]
    pub recent_events: Vec<SecurityEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serializes_with_symbolic_names() {
        let event = SecurityEvent {
            timestamp: "2026-08-02T12:00:00.000Z".to_string(),
            event_type: EventKind::RateLimitExceeded,
            severity: Severity::High,
            details: json!({ "id": 3 }),
            session_id: "a1b2c3d4".to_string(),
        };
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains(r#""eventType":"RATE_LIMIT_EXCEEDED""#));
        assert!(line.contains(r#""severity":"HIGH""#));
        assert!(line.contains(r#""sessionId":"a1b2c3d4""#));
    }

    #[test]
    fn severity_alerting_threshold() {
        assert!(!Severity::Low.is_alerting());
        assert!(!Severity::Medium.is_alerting());
        assert!(Severity::High.is_alerting());
        assert!(Severity::Critical.is_alerting());
    }
}
