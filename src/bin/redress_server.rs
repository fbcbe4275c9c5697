//!
//! redress server binary
//! ---------------------
//! Command-line entry point for the auth HTTP service. Configuration comes from
//! environment variables; CLI flags override them (see `--help`).

use anyhow::Result;
use std::env;

use redress::config::{has_flag, ServerConfig, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter if provided
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let cfg = ServerConfig::from_env_and_args(&args)?;
    println!("redress starting on {} (role policy: {:?})", cfg.addr(), cfg.role_policy);
    tracing::info!("Using addr={}, role_policy={:?}", cfg.addr(), cfg.role_policy);
    redress::server::run(cfg).await
}
