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

// Main entry point for the ContextGuard MCP gateway.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use tracing::info;

use contextguard::config::PolicyConfig;
use contextguard::engine_core::constants::config as config_consts;
use contextguard::mcp::gateway::Gateway;

#[derive(Parser, Debug)]
#[command(
    name = "contextguard",
    version,
    about = "Transparent security gateway for MCP servers",
    long_about = "Spawns the real MCP server as a child process, inspects every \
JSON-RPC message on both directions of its stdio stream, and forwards, \
rewrites, or blocks messages according to a configurable security policy."
)]
struct Cli {
    /// The MCP server command to wrap, split on whitespace into argv
    /// (e.g. "node server.js")
    #[arg(short, long)]
    server: Option<String>,

    /// Path to a JSON policy configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    install_panic_hook();
    init_tracing();

    let cli = Cli::parse();

    let Some(server) = cli.server else {
        if std::env::args().len() <= 1 {
            // Bare invocation prints usage and succeeds.
            let _ = Cli::command().print_long_help();
            std::process::exit(0);
        }
        eprintln!("Error: --server is required");
        std::process::exit(1);
    };

    let argv: Vec<String> = server.split_ascii_whitespace().map(String::from).collect();
    if argv.is_empty() {
        eprintln!("Error: --server command is empty");
        std::process::exit(1);
    }

    let config = match &cli.config {
        Some(path) => match PolicyConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => PolicyConfig::default(),
    };

    info!("starting gateway for server command {:?}", argv);
    match Gateway::new(config, argv).run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info.payload();
        let what = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Unknown panic".to_string());
        let at = match panic_info.location() {
            Some(l) => format!("{}:{}:{}", l.file(), l.line(), l.column()),
            None => "unknown".to_string(),
        };
        eprintln!("PANIC: {} at {}", what, at);
    }));
}

fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let level = std::env::var(config_consts::ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Stdout belongs to the JSON-RPC channel; all diagnostics go to stderr.
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let format = std::env::var(config_consts::ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string());
    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
