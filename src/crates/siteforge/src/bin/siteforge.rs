//! Siteforge CLI
//!
//! Runs intake submissions through the generation graph and inspects
//! persisted runs.

use clap::{Parser, Subcommand};
use siteforge::cli::{self, OutputFormat};
use siteforge::config::ConfigLoader;
use siteforge::environment::store_from_config;
use siteforge::{Engine, Environment};
use std::path::PathBuf;
use tooling::logging::{bootstrap_tracing, init_tracing, LogFormat};

#[derive(Parser)]
#[command(name = "siteforge")]
#[command(about = "Siteforge - turn intake submissions into published single-page sites", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SITEFORGE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a submission through the full graph
    Run {
        /// Path to the submission JSON
        #[arg(short, long)]
        submission: PathBuf,
        /// Path to a pre-rendered brief; formatted from the submission if omitted
        #[arg(short, long)]
        brief: Option<PathBuf>,
        /// Revision number; anything above zero consumes a credit
        #[arg(short, long, default_value_t = 0)]
        revision: u32,
        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Continue a persisted run from where it stopped
    Resume {
        /// Session ID
        session: String,
        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the persisted state of a run
    Show {
        /// Session ID
        session: String,
        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the deploy project slug for a business name
    Slug {
        /// Business name
        name: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Slug { name } => {
            cli::handle_slug(name);
            return Ok(());
        }
        Commands::Version => {
            println!("siteforge {}", siteforge::version());
            return Ok(());
        }
        _ => {}
    }

    let config = {
        let _bootstrap = bootstrap_tracing(cli.log_level.as_deref().unwrap_or("info"))?;
        ConfigLoader::new().load().await?
    };
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, config.logging.format.parse::<LogFormat>()?)?;

    match cli.command {
        Commands::Run {
            submission,
            brief,
            revision,
            format,
        } => {
            let format: OutputFormat = format.parse()?;
            let (submission, brief) = cli::read_submission(&submission, brief.as_deref()).await?;
            let engine = Engine::new(Environment::from_config(&config)?);
            cli::handle_run(&engine, submission, brief, revision, format).await?;
        }
        Commands::Resume { session, format } => {
            let format: OutputFormat = format.parse()?;
            let engine = Engine::new(Environment::from_config(&config)?);
            cli::handle_resume(&engine, &session, format).await?;
        }
        Commands::Show { session, format } => {
            let format: OutputFormat = format.parse()?;
            let store = store_from_config(&config.store)?
                .ok_or_else(|| anyhow::anyhow!("No durable store configured (set KV_REST_API_URL and KV_REST_API_TOKEN)"))?;
            cli::handle_show(&store, &session, format).await?;
        }
        Commands::Slug { .. } | Commands::Version => {}
    }

    Ok(())
}
