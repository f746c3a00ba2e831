// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! courier: talk to the user-session agent from a shell.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod exit_error;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use courier_client::AgentClient;
use courier_wire::Endpoint;

use crate::commands::Command;
use crate::exit_error::{ExitError, EXIT_FAILURE};

#[derive(Debug, Parser)]
#[command(name = "courier", version, about = "Run session-bound operations through the courier agent")]
struct Cli {
    /// Agent endpoint name [default: $COURIER_ENDPOINT or courier-agent]
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// How long to keep trying to reach the agent
    #[arg(long, global = true, value_name = "MS")]
    connect_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn client(&self) -> AgentClient {
        let endpoint = match &self.endpoint {
            Some(name) => Endpoint::new(name.as_str()),
            None => courier_client::env::endpoint(),
        };
        let client = AgentClient::new(endpoint);
        match self.connect_timeout_ms {
            Some(ms) => client.with_connect_timeout(Duration::from_millis(ms)),
            None => client,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        let code = match err.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("courier: {}", exit.message);
                }
                exit.code
            }
            None => {
                eprintln!("courier: {:#}", err);
                EXIT_FAILURE
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = cli.client();
    commands::execute(&client, cli.command).await
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
