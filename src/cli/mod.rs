pub mod search;
pub mod serve;

use anyhow::{Error, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use crate::activities::{ActivityService, GroundedActivityPrompts};
use crate::auth::{
    AccessConfig, AccessGate, AppCheckVerifier, AttestationVerifier, DisabledVerifier,
};
use crate::gemini::{GeminiClient, GeminiConfig};
use crate::ratelimit::{RateLimitConfig, RateLimiter};
use crate::secrets::{EnvSecrets, GoogleSecretManager, SecretProvider};

/// Activity Search Service CLI
#[derive(Parser, Debug)]
#[command(name = "activity-search-service")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Search-grounded activity discovery service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service (default when no command is given)
    Serve(serve::ServeArgs),

    /// Run one search from the command line, skipping admission checks
    Search(search::SearchArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli
        .command
        .unwrap_or_else(|| Commands::Serve(serve::ServeArgs::from_env()))
    {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Search(args) => search::run(args).await,
    }
}

/// Wired service plus the pieces whose lifecycle the caller owns
pub(crate) struct ServiceParts {
    pub service: Arc<ActivityService>,
    pub limiter: Arc<RateLimiter>,
    pub rate_config: RateLimitConfig,
}

/// Build the fully wired service from environment configuration
pub(crate) async fn assemble_service() -> Result<ServiceParts> {
    let gemini_config = GeminiConfig::from_env();
    gemini_config.validate().map_err(Error::msg)?;
    let access_config = AccessConfig::from_env();
    access_config.validate().map_err(Error::msg)?;
    let rate_config = RateLimitConfig::from_env();
    rate_config.validate().map_err(Error::msg)?;

    let secrets: Box<dyn SecretProvider> = match gemini_config.project_id.clone() {
        Some(project_id) => {
            info!(project = %project_id, "credentials come from Google Secret Manager");
            Box::new(GoogleSecretManager::new(project_id)?)
        }
        None => {
            warn!("GOOGLE_CLOUD_PROJECT not set, reading credentials from the environment");
            Box::new(EnvSecrets)
        }
    };
    let generator = Arc::new(GeminiClient::new(&gemini_config, secrets.as_ref()).await?);
    info!(model = generator.model(), "generative client ready");

    let verifier: Arc<dyn AttestationVerifier> =
        match access_config.app_check_project_number.clone() {
            Some(project_number) => Arc::new(AppCheckVerifier::new(project_number)?),
            // validate() only lets this through when attestation is skipped
            None => Arc::new(DisabledVerifier),
        };
    let gate = AccessGate::new(access_config, verifier);

    let limiter = Arc::new(RateLimiter::new(&rate_config));
    let service = Arc::new(ActivityService::new(
        Arc::clone(&limiter),
        gate,
        generator,
        Arc::new(GroundedActivityPrompts),
    ));

    Ok(ServiceParts {
        service,
        limiter,
        rate_config,
    })
}
