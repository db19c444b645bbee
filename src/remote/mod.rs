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

//! Remote collaborator adapter.
//!
//! Optional Supabase-backed sink with three operations: fetch the agent's
//! policy at startup, mirror security events, and publish agent status.
//! Every failure here is reported and swallowed; the gateway never degrades
//! its local behavior because the dashboard is unreachable.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::PolicyPatch;
use crate::engine_core::constants::config as config_consts;
use crate::engine_core::errors::GatewayError;
use crate::engine_core::events::SecurityEvent;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment-derived adapter settings. The adapter is active only when
/// both the service URL and key are present; the agent id falls back to
/// `default-agent`.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub url: String,
    pub service_key: String,
    pub agent_id: String,
}

impl RemoteSettings {
    pub fn from_env() -> Option<Self> {
        let url = std::env::var(config_consts::ENV_SUPABASE_URL).ok()?;
        let service_key = std::env::var(config_consts::ENV_SUPABASE_SERVICE_KEY).ok()?;
        let agent_id = std::env::var(config_consts::ENV_AGENT_ID)
            .unwrap_or_else(|_| config_consts::DEFAULT_AGENT_ID.to_string());
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            service_key,
            agent_id,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Online,
    Offline,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Online => "online",
            AgentStatus::Offline => "offline",
            AgentStatus::Error => "error",
        }
    }
}

/// Row shape of `agent_policies` as returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PolicyRow {
    policy: PolicyPatch,
}

#[derive(Debug, Serialize)]
struct EventRow<'a> {
    agent_id: &'a str,
    session_id: &'a str,
    event_type: &'a str,
    severity: &'a str,
    details: &'a serde_json::Value,
    timestamp: &'a str,
}

#[derive(Debug, Serialize)]
struct StatusRow<'a> {
    agent_id: &'a str,
    status: &'a str,
    last_seen: String,
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    settings: RemoteSettings,
}

impl SupabaseClient {
    pub fn new(settings: RemoteSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, settings }
    }

    pub fn agent_id(&self) -> &str {
        &self.settings.agent_id
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.settings.url, table)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.settings.service_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.settings.service_key),
            )
    }

    /// Fetch the policy row for this agent. `Ok(None)` means no row exists.
    pub async fn fetch_policy(&self) -> Result<Option<PolicyPatch>, GatewayError> {
        let url = format!(
            "{}?agent_id=eq.{}&select=policy",
            self.endpoint("agent_policies"),
            self.settings.agent_id
        );
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| GatewayError::Remote(format!("policy fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GatewayError::Remote(format!(
                "policy fetch returned HTTP {}",
                response.status()
            )));
        }

        let rows: Vec<PolicyRow> = response
            .json()
            .await
            .map_err(|e| GatewayError::Remote(format!("malformed policy row: {}", e)))?;
        Ok(rows.into_iter().next().map(|r| r.policy))
    }

    /// Append one event row. Fire-and-forget from the caller's perspective.
    pub async fn report_event(&self, event: &SecurityEvent) -> Result<(), GatewayError> {
        let row = EventRow {
            agent_id: &self.settings.agent_id,
            session_id: &event.session_id,
            event_type: event.event_type.as_str(),
            severity: event.severity.as_str(),
            details: &event.details,
            timestamp: &event.timestamp,
        };
        let response = self
            .authed(self.client.post(self.endpoint("security_events")))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| GatewayError::Remote(format!("event report failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GatewayError::Remote(format!(
                "event report returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Upsert this agent's status row.
    pub async fn update_agent_status(&self, status: AgentStatus) -> Result<(), GatewayError> {
        let row = StatusRow {
            agent_id: &self.settings.agent_id,
            status: status.as_str(),
            last_seen: chrono::Utc::now().to_rfc3339(),
        };
        let url = format!("{}?on_conflict=agent_id", self.endpoint("agent_status"));
        let response = self
            .authed(self.client.post(&url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(|e| GatewayError::Remote(format!("status update failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GatewayError::Remote(format!(
                "status update returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Drain mirrored events into the remote store. Failures are reported to
/// stderr and do not back-pressure the gateway (the channel is unbounded
/// and this task never blocks the pipelines).
pub fn spawn_event_dispatcher(
    client: SupabaseClient,
    mut rx: mpsc::UnboundedReceiver<SecurityEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = client.report_event(&event).await {
                eprintln!("contextguard: remote event dispatch failed: {}", e);
                warn!("remote event dispatch failed: {}", e);
            }
        }
        info!("remote event dispatcher drained");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_require_url_and_key() {
        // Env-var driven; exercised indirectly. Here we pin the trailing
        // slash normalization and the default agent id constant.
        let settings = RemoteSettings {
            url: "https://proj.supabase.co".to_string(),
            service_key: "key".to_string(),
            agent_id: config_consts::DEFAULT_AGENT_ID.to_string(),
        };
        let client = SupabaseClient::new(settings);
        assert_eq!(
            client.endpoint("security_events"),
            "https://proj.supabase.co/rest/v1/security_events"
        );
        assert_eq!(client.agent_id(), "default-agent");
    }

    #[test]
    fn status_strings_match_store_schema() {
        assert_eq!(AgentStatus::Online.as_str(), "online");
        assert_eq!(AgentStatus::Offline.as_str(), "offline");
        assert_eq!(AgentStatus::Error.as_str(), "error");
    }

    #[test]
    fn policy_row_deserializes_from_postgrest_shape() {
        let rows: Vec<PolicyRow> =
            serde_json::from_str(r#"[{"policy":{"maxToolCallsPerMinute":5}}]"#).unwrap();
        assert_eq!(rows[0].policy.max_tool_calls_per_minute, Some(5));
    }
}
