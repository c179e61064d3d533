// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::info;

use crate::api::http_server::{self, AppState};
use crate::ratelimit::RateLimiter;
use crate::version;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
}

impl ServeArgs {
    /// Defaults for the bare invocation with no subcommand. Reads the
    /// same HOST and PORT variables the parsed flags honor.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }
}

/// Run the HTTP service until interrupted
pub async fn run(args: ServeArgs) -> Result<()> {
    println!("🚀 Starting Activity Search Service...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let parts = super::assemble_service().await?;
    let sweeper = RateLimiter::start_sweeper(
        Arc::clone(&parts.limiter),
        parts.rate_config.sweep_interval(),
    );

    let ip: IpAddr = args.host.parse()?;
    http_server::serve(AppState::new(parts.service), SocketAddr::new(ip, args.port)).await?;

    // The serve loop has drained; stop the sweeper before exiting
    sweeper.shutdown().await;
    info!("shutdown complete");
    Ok(())
}
