use access_hub::{
    RecommendationEngine, SurveyResponse, build_state,
    config::{self, Config, RuntimeConfig},
    extract_responses, http, survey,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "access-hub", version, about = "Accessibility survey and profile API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Override server.bind
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Override database.path
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the adaptation plan for a survey response JSON file ("-" for stdin)
    Recommend {
        input: PathBuf,
        /// Also list the rules that fired
        #[arg(long)]
        explain: bool,
    },
    /// Print the survey questions
    Questions,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading survey response from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Subscriber first so warnings from config loading are not dropped
    config::load_env_file();
    init_tracing(&RuntimeConfig::load_from_env().log_level);
    let mut config = Config::load()?;

    match cli.command {
        Command::Serve { bind, db } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(db) = db {
                config.database.path = db;
            }
            tracing::info!("Starting access-hub {}", env!("CARGO_PKG_VERSION"));
            let state = build_state(config)?;
            http::serve(state).await?;
        }
        Command::Recommend { input, explain } => {
            let raw = read_input(&input)?;
            let document: serde_json::Value =
                serde_json::from_str(&raw).context("survey response is not valid JSON")?;
            let responses = SurveyResponse::from_value(extract_responses(&document));
            let engine = RecommendationEngine::new();
            let plan = engine.generate(&responses);
            let output = if explain {
                serde_json::json!({
                    "recommendations": plan,
                    "rules_fired": engine.explain(&responses),
                })
            } else {
                serde_json::to_value(&plan)?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Questions => {
            println!("{}", serde_json::to_string_pretty(survey::questions())?);
        }
    }

    Ok(())
}
