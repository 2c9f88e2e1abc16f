//! CLI helper functions

use crate::{
    client::{GapiClient, ReqwestTransport, TokenProvider},
    config::TapConfig,
    engine::ExtractionEngine,
    storage::{NdjsonDirectorySink, RecordSink, SingerSink},
    streams::StreamRegistry,
    tap::{RunReport, TapPipeline},
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source a dotenv file into the process environment
///
/// A missing file is fine; variables may come from the real environment.
pub fn load_dotenv(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match dotenvy::from_filename(path) {
        Ok(_) => {
            log::debug!("Sourced {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => {
            log::debug!("No dotenv file at {}", path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read dotenv file: {}", path.display())),
    }
}

/// Load and validate the tap configuration
///
/// Reads the optional config file, then `TAP_GAPI_*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<TapConfig> {
    let config = TapConfig::load(path).context("Invalid tap configuration")?;
    log::debug!("{:?}", config);
    Ok(config)
}

/// Build the extraction engine for a validated config
pub fn build_engine(config: &TapConfig) -> Result<ExtractionEngine<ReqwestTransport>> {
    let transport = Arc::new(ReqwestTransport::try_new(config.request_timeout())?);
    let tokens = Arc::new(TokenProvider::new(transport.clone(), config.credentials()?));
    let mut client = GapiClient::new(config.base_url()?, transport, tokens);
    if let Some(user_agent) = &config.user_agent {
        client = client.with_user_agent(user_agent.clone());
    }
    Ok(ExtractionEngine::new(client, config.retry_policy()))
}

/// Mint a token to prove the credentials work
pub async fn test_auth(config: &TapConfig) -> Result<()> {
    let engine = build_engine(config)?;
    let token = engine
        .client()
        .tokens()
        .get_token()
        .await
        .context("Authorization failed")?;
    log::info!(
        "Authorized against {} for scope {}",
        config.access_token_url.bright_black(),
        token.scope().cyan()
    );
    Ok(())
}

/// Describe the streams registered for `scope`, one line each
pub fn list_streams(registry: &StreamRegistry, scope: &str) -> Vec<String> {
    registry
        .streams_for(scope)
        .iter()
        .map(|d| {
            format!(
                "{:<36} {:<6} keys={:<24} {}",
                d.name(),
                d.pagination_mode(),
                d.primary_keys().join(","),
                d.path()
            )
        })
        .collect()
}

/// Options of the `run` command
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Write `<stream>.ndjson` files here instead of Singer messages to stdout
    pub output_dir: Option<PathBuf>,
    pub streams: Vec<String>,
    pub all_or_nothing: bool,
}

/// Run the extraction for the configured scope
pub async fn run_extraction(config: &TapConfig, options: RunOptions) -> Result<RunReport> {
    let tap = TapPipeline::new(build_engine(config)?, StreamRegistry::builtin()?)
        .with_streams(options.streams)
        .all_or_nothing(options.all_or_nothing || config.all_or_nothing);

    let mut sink: Box<dyn RecordSink> = match &options.output_dir {
        Some(dir) => {
            log::info!("Writing NDJSON to {}", dir.display().bright_black());
            Box::new(NdjsonDirectorySink::new(dir)?)
        }
        None => Box::new(SingerSink::stdout()),
    };

    let report = tap.run(&config.scope, &mut sink).await?;
    log::debug!("Run report: {}", serde_json::to_string(&report)?);
    Ok(report)
}
