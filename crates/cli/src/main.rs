mod provider_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use tessera_config::TesseraConfig;

#[derive(Parser)]
#[command(name = "tessera", about = "Tessera: provider plugins on demand")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./tessera.toml and ~/.config/tessera/).
    #[arg(long, global = true, env = "TESSERA_CONFIG")]
    config: Option<PathBuf>,

    /// Provider directory (overrides config value).
    #[arg(long, global = true, env = "TESSERA_PROVIDERS_DIR")]
    providers_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List providers found in the provider directory.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show a provider's options and their defaults.
    Options {
        /// Provider identifier.
        name: String,
    },
    /// Install the packages a provider requires.
    Provision {
        /// Provider identifier.
        name: String,
        /// Keyword argument for the provider, as key=value (repeatable).
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Only report what is missing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Send a prompt to a provider and print the reply.
    Instruct {
        /// Provider identifier.
        name: String,
        #[arg(short, long)]
        prompt: String,
        /// Maximum tokens to generate (0 = provider default).
        #[arg(long, default_value_t = 0)]
        tokens: usize,
        /// Keyword argument for the provider, as key=value (repeatable).
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Install missing requirements before sending the prompt.
        #[arg(long)]
        provision: bool,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<TesseraConfig> {
    let mut config = match &cli.config {
        Some(path) => tessera_config::load_config(path)?,
        None => tessera_config::discover_and_load(),
    };
    if let Some(dir) = &cli.providers_dir {
        config.providers.dir = dir.clone();
    }
    debug!(dir = %config.providers.dir.display(), "provider directory");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = load_config(&cli)?;

    match cli.command {
        Commands::List { json } => provider_commands::list(&config, json),
        Commands::Options { name } => provider_commands::options(&config, &name),
        Commands::Provision { name, set, dry_run } => {
            provider_commands::provision(&config, &name, &set, dry_run).await
        },
        Commands::Instruct {
            name,
            prompt,
            tokens,
            set,
            provision,
        } => provider_commands::instruct(&config, &name, &prompt, tokens, &set, provision).await,
    }
}
