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

//! Policy configuration.
//!
//! `PolicyConfig` holds the recognized options with their defaults. A local
//! JSON file (via `--config`) and a remotely fetched policy both deserialize
//! into `PolicyPatch`, whose set fields win over the values underneath.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine_core::constants::config as config_consts;
use crate::engine_core::errors::GatewayError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    /// Upper bound on `tools/call` requests per rolling 60 s window.
    pub max_tool_calls_per_minute: u32,
    /// Literal substrings banned in serialized `tools/call` parameters,
    /// matched case-insensitively.
    pub blocked_patterns: Vec<String>,
    /// Whitelist prefixes for file-path parameters; empty means no
    /// prefix restriction.
    pub allowed_file_paths: Vec<String>,
    /// Accepted for schema compatibility; no enforced semantics.
    pub alert_threshold: u32,
    pub enable_prompt_injection_detection: bool,
    pub enable_sensitive_data_detection: bool,
    /// Append target for the event log.
    pub log_path: PathBuf,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_tool_calls_per_minute: 30,
            blocked_patterns: Vec::new(),
            allowed_file_paths: Vec::new(),
            alert_threshold: 5,
            enable_prompt_injection_detection: true,
            enable_sensitive_data_detection: true,
            log_path: PathBuf::from(config_consts::DEFAULT_LOG_PATH),
        }
    }
}

impl PolicyConfig {
    /// Load a policy from a JSON file, merged over the defaults.
    /// A missing or malformed file is fatal.
    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let patch: PolicyPatch = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::Configuration(format!("malformed JSON in {}: {}", path.display(), e))
        })?;
        let mut config = Self::default();
        config.apply(patch);
        Ok(config)
    }

    /// Overlay a patch; set fields in the patch win.
    pub fn apply(&mut self, patch: PolicyPatch) {
        if let Some(v) = patch.max_tool_calls_per_minute {
            self.max_tool_calls_per_minute = v;
        }
        if let Some(v) = patch.blocked_patterns {
            self.blocked_patterns = v;
        }
        if let Some(v) = patch.allowed_file_paths {
            self.allowed_file_paths = v;
        }
        if let Some(v) = patch.alert_threshold {
            self.alert_threshold = v;
        }
        if let Some(v) = patch.enable_prompt_injection_detection {
            self.enable_prompt_injection_detection = v;
        }
        if let Some(v) = patch.enable_sensitive_data_detection {
            self.enable_sensitive_data_detection = v;
        }
        if let Some(v) = patch.log_path {
            self.log_path = v;
        }
    }
}

/// A partial policy document. Unknown fields are tolerated so that older
/// gateways keep working against newer remote policy rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyPatch {
    pub max_tool_calls_per_minute: Option<u32>,
    pub blocked_patterns: Option<Vec<String>>,
    pub allowed_file_paths: Option<Vec<String>>,
    pub alert_threshold: Option<u32>,
    pub enable_prompt_injection_detection: Option<bool>,
    pub enable_sensitive_data_detection: Option<bool>,
    pub log_path: Option<PathBuf>,
}
