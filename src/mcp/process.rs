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

//! Child-process supervisor.
//!
//! Spawns the real MCP server with all three stdio channels piped and
//! observes its exit. On Linux the child is bound to the gateway with
//! `PR_SET_PDEATHSIG` so a crashed gateway cannot leave an orphaned server
//! holding the pipes open.

use std::process::Stdio;

use tokio::process::{ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::engine_core::errors::GatewayError;

pub struct ChildIo {
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

pub struct ChildSupervisor {
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ChildSupervisor {
    /// Spawn `argv[0]` with `argv[1..]` as arguments. The exit status code
    /// (or `None` when killed by a signal) is delivered once on `exit_tx`.
    pub fn spawn(
        argv: &[String],
        exit_tx: mpsc::Sender<Option<i32>>,
    ) -> Result<(Self, ChildIo), GatewayError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| GatewayError::Process("empty server command".to_string()))?;
        debug!("spawning server process '{}' with args {:?}", program, args);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(target_os = "linux")]
        // SAFETY: PR_SET_PDEATHSIG with SIGKILL is the standard Linux
        // mechanism to terminate the child when the parent dies; the
        // constants come from libc and are valid for this platform.
        unsafe {
            command.pre_exec(|| {
                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = command.spawn().map_err(|e| {
            GatewayError::Process(format!("failed to spawn server process: {}", e))
        })?;

        let io = ChildIo {
            stdin: child
                .stdin
                .take()
                .ok_or_else(|| GatewayError::Process("child stdin not captured".to_string()))?,
            stdout: child
                .stdout
                .take()
                .ok_or_else(|| GatewayError::Process("child stdout not captured".to_string()))?,
            stderr: child
                .stderr
                .take()
                .ok_or_else(|| GatewayError::Process("child stderr not captured".to_string()))?,
        };

        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(async move {
            tokio::select! {
                _ = kill_rx => {
                    let _ = child.kill().await;
                    let _ = exit_tx.send(None).await;
                }
                status = child.wait() => {
                    let code = status.ok().and_then(|s| s.code());
                    let _ = exit_tx.send(code).await;
                }
            }
        });

        Ok((Self { kill_tx: Some(kill_tx) }, io))
    }

    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ChildSupervisor {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_failure_is_an_error() {
        let (tx, _rx) = mpsc::channel(1);
        let argv = vec!["/nonexistent/definitely-not-a-binary".to_string()];
        assert!(matches!(
            ChildSupervisor::spawn(&argv, tx),
            Err(GatewayError::Process(_))
        ));
    }

    #[tokio::test]
    async fn empty_argv_is_an_error() {
        let (tx, _rx) = mpsc::channel(1);
        assert!(matches!(
            ChildSupervisor::spawn(&[], tx),
            Err(GatewayError::Process(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_code_is_observed() {
        let (tx, mut rx) = mpsc::channel(1);
        let argv = vec!["true".to_string()];
        let (_supervisor, _io) = ChildSupervisor::spawn(&argv, tx).unwrap();
        assert_eq!(rx.recv().await, Some(Some(0)));
    }
}
