use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use workbench_client::{
    AsyncJobPoller, Backend, ConfigStore, DimensionService, ExportClient, FileUploader,
};
use workbench_core::{JobKind, Msg, ServiceConfig};
use workbench_logging::{bench_info, bench_warn, redact};

use crate::app::Workbench;
use crate::cli::{ConfigCommand, DimensionCommand, ProcessArgs};
use crate::effects::{is_final, EffectRunner};
use crate::render;
use crate::settings::Settings;

/// Upload, process and optionally export one file, driving the state machine
/// the way the web page does.
pub async fn process(
    backend: Arc<dyn Backend>,
    settings: &Settings,
    args: ProcessArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let mut bench = Workbench::stdout();
    let kind = JobKind::from(args.kind);

    let catalog = DimensionService::new(backend.clone())
        .load()
        .await
        .context("loading dimensions")?;
    bench.dispatch(Msg::DimensionsLoaded(catalog));
    bench.dispatch(Msg::KindSelected(kind));
    if !args.dimensions.is_empty() {
        select_exactly(&mut bench, &args.dimensions);
    }
    for line in render::dimension_lines(&bench.view().dimensions) {
        println!("{line}");
    }

    match FileUploader::new(backend.clone()).upload_path(&args.file).await {
        Ok(content) => bench.dispatch(Msg::FileLoaded {
            name: args.file.display().to_string(),
            content,
        }),
        Err(err) => {
            bench.dispatch(Msg::LoadFailed(err.to_string()));
            bail!("upload failed");
        }
    };

    let mut runner = EffectRunner::new(
        AsyncJobPoller::new(backend.clone(), settings.poll()),
        settings.export_dir.clone(),
        cancel,
    );
    if args.remote_export {
        runner = runner.with_remote_export(ExportClient::new(backend));
    }

    run_to_completion(&mut bench, &runner, Msg::ProcessClicked).await;
    let view = bench.view();
    let Some(table) = view.table else {
        bail!("processing did not produce a result");
    };
    print!("{}", render::table(&table));

    if args.export {
        run_to_completion(&mut bench, &runner, Msg::ExportClicked).await;
    }
    Ok(())
}

/// Dispatches `msg`, then keeps feeding messages from started effects back
/// into the state machine until every effect has finished.
async fn run_to_completion<W: std::io::Write>(
    bench: &mut Workbench<W>,
    runner: &EffectRunner,
    msg: Msg,
) {
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let mut in_flight = start(bench.dispatch(msg), runner, &msg_tx);
    while in_flight > 0 {
        let Some(msg) = msg_rx.recv().await else {
            break;
        };
        if is_final(&msg) {
            in_flight -= 1;
        }
        in_flight += start(bench.dispatch(msg), runner, &msg_tx);
    }
}

fn start(
    effects: Vec<workbench_core::Effect>,
    runner: &EffectRunner,
    msg_tx: &mpsc::UnboundedSender<Msg>,
) -> usize {
    let count = effects.len();
    let unhandled = runner.enqueue(effects, msg_tx);
    for effect in &unhandled {
        bench_warn!("effect {effect:?} has no handler here");
    }
    count - unhandled.len()
}

fn select_exactly<W: std::io::Write>(bench: &mut Workbench<W>, wanted: &[u64]) {
    let rows = bench.view().dimensions;
    for id in wanted {
        if !rows.iter().any(|row| row.id == *id) {
            bench_warn!("dimension {id} is not a {} dimension", bench.state().kind());
            println!("Unknown dimension {id} ignored");
        }
    }
    for row in rows {
        if row.selected != wanted.contains(&row.id) {
            bench.dispatch(Msg::DimensionToggled(row.id));
        }
    }
}

pub async fn config(backend: Arc<dyn Backend>, command: ConfigCommand) -> Result<()> {
    let store = ConfigStore::new(backend);
    match command {
        ConfigCommand::Show => {
            let config = store.load().await;
            if config == ServiceConfig::default() {
                println!("No AI service configured yet.");
                return Ok(());
            }
            println!("service:       {}", config.service_type());
            if let Some(url) = config.service.base_url() {
                println!("base url:      {url}");
            }
            println!("api key:       {}", redact(&config.api_key));
            println!("system prompt: {}", config.system_prompt);
        }
        ConfigCommand::Set {
            service,
            api_key,
            base_url,
            system_prompt,
        } => {
            let config =
                service_config(&service, api_key, base_url).with_system_prompt(system_prompt);
            store.save(&config).await?;
            println!("Saved configuration for {}", config.service_type());
        }
    }
    Ok(())
}

/// `openai` needs a base URL; every other service is addressed by name.
pub fn service_config(service: &str, api_key: String, base_url: Option<String>) -> ServiceConfig {
    if service.trim() == "openai" {
        ServiceConfig::openai(api_key, base_url.unwrap_or_default())
    } else {
        ServiceConfig::other(service.trim(), api_key)
    }
}

pub async fn dimensions(backend: Arc<dyn Backend>, command: DimensionCommand) -> Result<()> {
    let service = DimensionService::new(backend);
    match command {
        DimensionCommand::List => {
            let catalog = service.load().await?;
            for kind in [JobKind::Cleaning, JobKind::Labeling] {
                println!("{kind}:");
                for dimension in catalog.for_kind(kind) {
                    let default = if dimension.is_default { " (default)" } else { "" };
                    println!("  {:>3} {}{default}", dimension.id, dimension.name);
                }
            }
        }
        DimensionCommand::Add {
            kind,
            name,
            description,
        } => {
            let dimension = service.add(kind.into(), &name, &description).await?;
            println!("Added dimension {} ({})", dimension.id, dimension.name);
        }
        DimensionCommand::Delete { kind, id } => {
            let catalog = service.load().await?;
            service.delete(&catalog, kind.into(), id).await?;
            bench_info!("dimension {id} deleted from the command line");
            println!("Deleted dimension {id}");
        }
    }
    Ok(())
}
