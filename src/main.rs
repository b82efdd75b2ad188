use clap::{Parser, Subcommand};
use log::info;

use nano_notifier::config::AppConfig;
use nano_notifier::logging::init_logging;
use nano_notifier::monitor::{AccountChecker, Watcher};
use nano_notifier::node::NodeClient;
use nano_notifier::notify::{Notifier, RelayMailer};
use nano_notifier::state::StateStore;

#[derive(Parser)]
#[command(name = "notifier")]
#[command(about = "Email notifications for new Nano account transactions")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $CONFIG_FILE or ./config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the configured accounts until interrupted
    Run,
    /// Check every configured account once and exit
    Check,
    /// Print a sample configuration file, or write it with --output
    SampleConfig {
        /// Write the sample to this path instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::SampleConfig { output: Some(path) } => {
            AppConfig::sample().save_to_file(&path)?;
            println!("Sample configuration written to {}", path);
        }
        Commands::SampleConfig { output: None } => {
            println!("{}", AppConfig::generate_sample_config()?);
        }
        Commands::Run => {
            let watcher = build_watcher(cli.config.as_deref())?;
            watcher.start().await?;
        }
        Commands::Check => {
            let watcher = build_watcher(cli.config.as_deref())?;
            let summary = watcher.run_once().await?;
            info!("Checked {} accounts, {} failed", summary.accounts, summary.failures);
        }
    }

    Ok(())
}

fn build_watcher(config_path: Option<&str>) -> Result<Watcher, Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path)?;
    init_logging(&config.logging)?;

    info!("Starting Nano account notifier against {}", config.node.endpoint());

    let node = NodeClient::new(config.node.endpoint(), config.node.timeout_seconds)?;
    let mailer = RelayMailer::new(config.email.relay_url.clone(), config.node.timeout_seconds)?;
    let notifier = Notifier::new(Box::new(mailer), config.email.enabled);
    if !notifier.is_enabled() {
        info!("Email sending disabled, notifications will only be logged");
    }

    let checker = AccountChecker::from_config(Box::new(node), notifier, &config);
    Ok(Watcher::new(
        checker,
        StateStore::new(&config.watcher.state_path),
        config.watcher.accounts.clone(),
        config.watcher.poll_interval_seconds,
    ))
}
