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

//! contextguard: a transparent security gateway for MCP servers.
//!
//! This library provides the core logic for the contextguard proxy, which
//! spawns a Model Context Protocol (MCP) server as a child process,
//! interposes on both directions of its newline-delimited JSON-RPC stream,
//! and forwards, rewrites, or blocks messages according to a configurable
//! security policy.

pub mod config;
pub mod engine;
pub mod engine_core;
pub mod mcp;
pub mod remote;
