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

//! Gateway constants - single source of truth for wire codes and limits.

/// JSON-RPC 2.0 error codes emitted by the gateway.
pub mod jsonrpc {
    /// Request blocked by policy (custom code, wire-visible).
    pub const ERROR_REQUEST_BLOCKED: i32 = -32000;
    /// Response blocked by policy (custom code, wire-visible).
    pub const ERROR_RESPONSE_BLOCKED: i32 = -32001;
}

/// Synthetic error messages, bit-exact on the wire.
pub mod blocking {
    pub const REQUEST_BLOCKED_MESSAGE: &str = "Security violation: Request blocked";
    pub const RESPONSE_BLOCKED_MESSAGE: &str =
        "Security violation: Response contains sensitive data";
    /// Violation string recorded when the rate window is exhausted.
    pub const RATE_LIMIT_VIOLATION: &str = "Rate limit exceeded for tool calls";
}

/// MCP protocol methods the gateway dispatches on.
pub mod methods {
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Transport limits (DoS protection).
pub mod limits {
    /// Maximum allowed length of a single newline-delimited frame (16 MiB).
    pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;
    /// In-memory event ring capacity.
    pub const EVENT_RING_CAPACITY: usize = 1000;
    /// Rolling rate-limit window in milliseconds.
    pub const RATE_WINDOW_MS: i64 = 60_000;
    /// Number of events reported in the statistics view.
    pub const RECENT_EVENTS: usize = 10;
    /// Number of characters of a raw line preserved in parse-error events.
    pub const PARSE_ERROR_EXCERPT_CHARS: usize = 100;
    /// Capacity of the bounded writer channels.
    pub const WRITER_CHANNEL_CAPACITY: usize = 64;
}

/// Configuration environment variables.
pub mod config {
    pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
    pub const ENV_SUPABASE_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
    pub const ENV_AGENT_ID: &str = "AGENT_ID";
    pub const DEFAULT_AGENT_ID: &str = "default-agent";
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
    pub const DEFAULT_LOG_PATH: &str = "mcp_security.log";
}
