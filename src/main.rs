//! prompt-relay - forward a prompt to a local or OpenAI-compatible LLM
//!
//! A single-endpoint HTTP relay: `POST /run` with `{"prompt": "..."}` and get
//! `{"result": "..."}` back from the provider selected by `LLM_PROVIDER`.
//! Settings are read from the environment and from `.env` in the working
//! directory; exported variables take precedence.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prompt_relay::config::{Config, ProviderPolicy};

#[derive(Parser)]
#[command(name = "prompt-relay")]
#[command(about = "Forward prompts to a local or OpenAI-compatible LLM over HTTP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Start even if LLM_PROVIDER is not recognized, answering every
        /// request with a fallback message
        #[arg(long)]
        allow_unconfigured: bool,
    },

    /// Validate configuration from the environment and .env
    Check {
        /// Accept an unrecognized LLM_PROVIDER
        #[arg(long)]
        allow_unconfigured: bool,
    },
}

fn provider_policy(allow_unconfigured: bool) -> ProviderPolicy {
    if allow_unconfigured {
        ProviderPolicy::AllowUnconfigured
    } else {
        ProviderPolicy::Strict
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prompt_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { allow_unconfigured } => {
            tracing::info!("Starting prompt relay");
            let config = Config::from_env_or_dotenv(provider_policy(allow_unconfigured))?;
            prompt_relay::proxy::run_server(config).await
        }

        Commands::Check { allow_unconfigured } => {
            let config = Config::from_env_or_dotenv(provider_policy(allow_unconfigured))?;

            println!("Configuration OK");
            println!(
                "  provider:        {}",
                config.provider.map(|p| p.as_str()).unwrap_or("none (fallback)")
            );
            println!("  base url:        {}", config.base_url);
            println!("  model:           {}", config.model);
            println!(
                "  api key:         {}",
                if config.api_key.is_some() { "set" } else { "not set" }
            );
            println!("  timeout:         {}s", config.request_timeout.as_secs());
            println!("  connect timeout: {}s", config.connect_timeout.as_secs());
            println!("  max concurrency: {}", config.max_concurrency);
            println!("  listen:          {}", prompt_relay::proxy::LISTEN_ADDR);
            Ok(())
        }
    }
}
