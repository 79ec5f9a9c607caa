use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::info;

use uatu_sniper::SniperConfig;
use uatu_sniper::cli::Cli;
use uatu_sniper::core::WorkerPool;
use uatu_sniper::plugins::NotifierSet;
use uatu_sniper::plugins::probes::MarketplaceProbe;
use uatu_sniper::prompt::Prompter;
use uatu_sniper::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = SniperConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    let log_guard = logging::init(&config.logging)?;

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        Prompter::new(stdin.lock(), std::io::stdout()).complete(&mut config, cli.interactive)?;
    }
    config.validate().context("Invalid configuration")?;

    info!("Starting Uatu Sniper...");

    let probe = MarketplaceProbe::new(config.browser.clone())?;
    let notifier = NotifierSet::from_config(&config.notifications);
    info!(notifiers = ?notifier.names(), "Notifiers ready");

    let pool = WorkerPool::new(Arc::new(config), Arc::new(probe), Arc::new(notifier));
    let report = pool.run_all().await;

    println!("\n{}", report.summary());
    let Some(outcome) = report.first_success() else {
        println!("Failed to find and open product link in all workers.");
        // flush the file appender before exiting
        drop(log_guard);
        std::process::exit(1);
    };

    if let Some(link) = &outcome.link {
        println!("Worker {} opened {}", outcome.worker_id, link);
    }
    Ok(())
}
