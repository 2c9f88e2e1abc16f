use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tap_gapi::cli::{self, RunOptions};
use tap_gapi::streams::StreamRegistry;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// GAPI tap: extract records from GAPI as Singer messages or NDJSON files
#[derive(Parser)]
#[command(name = "tap-gapi", version, styles = STYLES)]
struct Cli {
    /// JSON or YAML config file; TAP_GAPI_* variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// The dotenv file to source credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test authorization against the token endpoint
    Auth,

    /// List the streams registered for a scope
    Streams {
        /// Scope to list; defaults to the configured one
        #[arg(short, long)]
        scope: Option<String>,
    },

    /// Extract every stream of the configured scope
    Run {
        /// Write one <stream>.ndjson per stream here instead of Singer messages to stdout
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Only run this stream (repeatable)
        #[arg(short = 'n', long = "stream")]
        streams: Vec<String>,

        /// Stop at the first failing stream
        #[arg(long)]
        all_or_nothing: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    cli::load_dotenv(&cli.env)?;

    match cli.command {
        Commands::Auth => {
            log::info!("Testing authorization");
            let config = cli::load_config(cli.config.as_deref())?;
            cli::test_auth(&config).await?;
        }
        Commands::Streams { scope } => {
            let scope = match scope {
                Some(scope) => scope,
                None => cli::load_config(cli.config.as_deref())?.scope,
            };
            let registry = StreamRegistry::builtin()?;
            let lines = cli::list_streams(&registry, &scope);
            if lines.is_empty() {
                log::warn!("No streams registered for scope {}", scope.bright_black());
            }
            for line in lines {
                println!("{line}");
            }
        }
        Commands::Run {
            output_dir,
            streams,
            all_or_nothing,
        } => {
            let config = cli::load_config(cli.config.as_deref())?;
            log::info!("Running scope {}", config.scope.cyan());
            let report = cli::run_extraction(
                &config,
                RunOptions {
                    output_dir,
                    streams,
                    all_or_nothing,
                },
            )
            .await?;

            let failed: Vec<&str> = report.failed().map(|s| s.summary.stream.as_str()).collect();
            if !failed.is_empty() {
                eyre::bail!("{} stream(s) failed: {}", failed.len(), failed.join(", "));
            }
        }
    }

    Ok(())
}
