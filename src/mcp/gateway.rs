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

//! Gateway assembly and lifecycle.
//!
//! Startup order: merge the policy, derive the session id, bootstrap the
//! remote policy (remote fields win), spawn the child, then start both
//! pipelines. The gateway runs until the child exits, prints the session
//! statistics block, and propagates the child's exit code.

use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::PolicyConfig;
use crate::engine::PolicyEngine;
use crate::engine_core::audit::EventLog;
use crate::engine_core::constants::limits;
use crate::engine_core::errors::GatewayError;
use crate::engine_core::events::{EventKind, Severity};
use crate::engine_core::session::SessionState;
use crate::mcp::pipeline::{self, InterceptContext};
use crate::mcp::process::ChildSupervisor;
use crate::remote::{self, AgentStatus, RemoteSettings, SupabaseClient};

pub struct Gateway {
    config: PolicyConfig,
    argv: Vec<String>,
}

impl Gateway {
    pub fn new(config: PolicyConfig, argv: Vec<String>) -> Self {
        Self { config, argv }
    }

    /// Run to completion. Returns the exit code to propagate to the caller.
    pub async fn run(mut self) -> Result<i32, GatewayError> {
        let state = SessionState::new(chrono::Utc::now().timestamp_millis());
        let session_id = state.session_id().to_string();
        eprintln!(
            "ContextGuard v{} (session {})",
            env!("CARGO_PKG_VERSION"),
            session_id
        );

        // Remote-policy bootstrap: remote fields win over local config.
        let remote = RemoteSettings::from_env().map(SupabaseClient::new);
        if let Some(client) = &remote {
            match client.fetch_policy().await {
                Ok(Some(patch)) => {
                    self.config.apply(patch);
                    eprintln!(
                        "ContextGuard: loaded remote policy for agent '{}'",
                        client.agent_id()
                    );
                }
                Ok(None) => {
                    info!("no remote policy row for agent '{}'", client.agent_id());
                }
                Err(e) => {
                    eprintln!("ContextGuard: remote policy fetch failed, using local config: {}", e);
                }
            }
            if let Err(e) = client.update_agent_status(AgentStatus::Online).await {
                warn!("agent status update failed: {}", e);
            }
        }

        let (remote_tx, dispatcher) = match remote.clone() {
            Some(client) => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Some(tx), Some(remote::spawn_event_dispatcher(client, rx)))
            }
            None => (None, None),
        };

        let log = Arc::new(EventLog::new(
            &self.config.log_path,
            session_id.clone(),
            remote_tx,
        ));

        // Spawn the child. A spawn failure is fatal after it is logged.
        let (exit_tx, mut exit_rx) = mpsc::channel(1);
        let (mut supervisor, io) = match ChildSupervisor::spawn(&self.argv, exit_tx) {
            Ok(spawned) => spawned,
            Err(e) => {
                log.record(
                    EventKind::ServerError,
                    Severity::High,
                    json!({ "error": e.to_string(), "command": self.argv }),
                );
                if let Some(client) = &remote {
                    let _ = client.update_agent_status(AgentStatus::Error).await;
                }
                return Err(e);
            }
        };
        log.record(
            EventKind::ServerStart,
            Severity::Low,
            json!({ "command": self.argv }),
        );

        let ctx = InterceptContext {
            engine: Arc::new(PolicyEngine::new(self.config.clone())),
            log: Arc::clone(&log),
            state: Arc::new(Mutex::new(state)),
        };

        // Writer tasks serialize all output to each stream; both pipelines
        // feed the client writer (synthetic errors and genuine responses).
        let (child_tx, child_rx) = mpsc::channel(limits::WRITER_CHANNEL_CAPACITY);
        let (client_tx, client_rx) = mpsc::channel(limits::WRITER_CHANNEL_CAPACITY);
        let child_stdin_writer = pipeline::spawn_writer(io.stdin, child_rx);
        let client_stdout_writer = pipeline::spawn_writer(tokio::io::stdout(), client_rx);

        let c2s = tokio::spawn(pipeline::run_client_to_server(
            tokio::io::stdin(),
            ctx.clone(),
            child_tx,
            client_tx.clone(),
        ));
        let s2c = tokio::spawn(pipeline::run_server_to_client(
            io.stdout,
            ctx.clone(),
            client_tx,
        ));

        // Child stderr is a passthrough channel.
        let mut child_stderr = io.stderr;
        let stderr_drain = tokio::spawn(async move {
            let _ = tokio::io::copy(&mut child_stderr, &mut tokio::io::stderr()).await;
        });

        let exit_code = exit_rx.recv().await.flatten();
        log.record(
            EventKind::ServerExit,
            Severity::Medium,
            json!({ "code": exit_code }),
        );

        // Let the in-flight output drain before reporting.
        let _ = s2c.await;
        let _ = stderr_drain.await;
        c2s.abort();
        let _ = c2s.await;
        let _ = child_stdin_writer.await;
        let _ = client_stdout_writer.await;

        self.print_statistics(&log);

        if let Some(client) = &remote {
            let _ = client.update_agent_status(AgentStatus::Offline).await;
        }
        if let Some(dispatcher) = dispatcher {
            drop(log);
            drop(ctx);
            let _ = dispatcher.await;
        }

        supervisor.kill();
        // Killed by a signal maps to a clean exit for the caller.
        Ok(exit_code.unwrap_or(0))
    }

    fn print_statistics(&self, log: &EventLog) {
        let stats = log.stats();
        eprintln!("--- ContextGuard session statistics ---");
        match serde_json::to_string_pretty(&stats) {
            Ok(rendered) => eprintln!("{}", rendered),
            Err(e) => eprintln!("(statistics unavailable: {})", e),
        }
    }
}
