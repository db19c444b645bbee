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

//! Domain error types.

use thiserror::Error;

/// Main error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Bad configuration (non-existent path, malformed JSON). Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Child process could not be spawned or managed.
    #[error("Server process error: {0}")]
    Process(String),

    /// Stream-level failure on one of the stdio channels.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote collaborator failure (never fatal; callers warn and continue).
    #[error("Remote adapter error: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
