mod app;
mod cli;
mod commands;
mod effects;
mod logging;
mod render;
mod repl;
mod settings;
mod terminal;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use workbench_client::{Backend, ReqwestBackend};
use workbench_logging::{bench_info, bench_warn};

use crate::cli::{Cli, Command};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?.apply(&cli.overrides());
    logging::initialize(settings.log, cli.verbose);
    bench_info!("workbench starting against {}", settings.backend_url);

    if let Command::Settings { write } = &cli.command {
        let text = settings.to_ron()?;
        println!("{text}");
        if *write {
            std::fs::write(&cli.config, text)
                .with_context(|| format!("writing {}", cli.config.display()))?;
        }
        return Ok(());
    }

    let backend = ReqwestBackend::new(&settings.backend()).context("backend url")?;
    if let Err(err) = backend.prime_csrf().await {
        bench_warn!("could not fetch a csrf token: {err}");
    }
    let backend: Arc<dyn Backend> = Arc::new(backend);

    match cli.command {
        Command::Process(args) => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });
            commands::process(backend, &settings, args, cancel).await
        }
        Command::Chat(_) => repl::chat(backend, &settings).await,
        Command::Config(command) => commands::config(backend, command).await,
        Command::Dimensions(command) => commands::dimensions(backend, command).await,
        Command::Settings { .. } => Ok(()),
    }
}
