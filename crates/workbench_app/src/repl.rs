use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use workbench_client::{
    transcript_file_name, AtomicFileWriter, Backend, ChatSession, ConfigStore, RevealOutcome,
    SendError, TypewriterPresenter,
};
use workbench_core::{Effect, Msg};
use workbench_logging::{bench_debug, bench_info};

use crate::app::Workbench;
use crate::commands::service_config;
use crate::settings::Settings;
use crate::terminal::TerminalSurface;

const HELP: &str =
    "Commands: /clear, /export, /usage, /use <service> <api-key> [base-url], /help, /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand<'a> {
    Message(&'a str),
    Clear,
    Export,
    Usage,
    Use {
        service: &'a str,
        api_key: &'a str,
        base_url: Option<&'a str>,
    },
    Help,
    Quit,
    Invalid(String),
}

impl<'a> ReplCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return ReplCommand::Message(line);
        };
        let mut words = command.split_whitespace();
        match words.next() {
            Some("clear") => ReplCommand::Clear,
            Some("export") => ReplCommand::Export,
            Some("usage") => ReplCommand::Usage,
            Some("help") => ReplCommand::Help,
            Some("quit") | Some("exit") => ReplCommand::Quit,
            Some("use") => match (words.next(), words.next()) {
                (Some(service), Some(api_key)) => ReplCommand::Use {
                    service,
                    api_key,
                    base_url: words.next(),
                },
                _ => ReplCommand::Invalid("usage: /use <service> <api-key> [base-url]".into()),
            },
            _ => ReplCommand::Invalid(format!("unknown command {trimmed}")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Interrupted,
    Closed,
}

/// One listener for the whole session; every Ctrl-C becomes a message.
fn forward_interrupts() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

async fn next_input<R: AsyncBufRead + Unpin>(
    lines: &mut Lines<R>,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<Input> {
    tokio::select! {
        line = lines.next_line() => Ok(line?.map_or(Input::Closed, Input::Line)),
        Some(()) = interrupts.recv() => Ok(Input::Interrupted),
    }
}

/// Drives `work` to completion, cancelling it on each interrupt that arrives
/// meanwhile.
async fn until_done<F: Future>(
    work: F,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
    cancel: &CancellationToken,
) -> F::Output {
    tokio::pin!(work);
    loop {
        tokio::select! {
            output = &mut work => return output,
            Some(()) = interrupts.recv() => cancel.cancel(),
        }
    }
}

/// Interactive chat. Ctrl-C stops the request or reply in progress; at the
/// prompt it leaves, as do `/quit` and end of input.
pub async fn chat(backend: Arc<dyn Backend>, settings: &Settings) -> Result<()> {
    let presenter = TypewriterPresenter::new(TerminalSurface::stdout(), settings.presenter());
    let mut session = ChatSession::start(backend.clone(), presenter).await;
    bench_info!("chat session {} started", session.session_id());
    let store = ConfigStore::new(backend);
    let mut changes = store.subscribe();
    let mut bench = Workbench::stdout();

    println!("{HELP}");
    let mut interrupts = forward_interrupts();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let line = match next_input(&mut lines, &mut interrupts).await? {
            Input::Line(line) => line,
            Input::Interrupted => {
                println!();
                break;
            }
            Input::Closed => break,
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Invalid(message) => println!("{message}"),
            ReplCommand::Clear => session.clear().await,
            ReplCommand::Usage => match session.usage() {
                Some(usage) => println!("Tokens: {usage}"),
                None => println!("No token usage reported yet"),
            },
            ReplCommand::Export => {
                let writer = AtomicFileWriter::new(settings.export_dir.clone());
                let name = transcript_file_name(Local::now().date_naive());
                match writer.write(&name, session.export_transcript().as_bytes()) {
                    Ok(path) => println!("Transcript saved to {}", path.display()),
                    Err(err) => println!("[fail] {err}"),
                }
            }
            ReplCommand::Use {
                service,
                api_key,
                base_url,
            } => {
                let config = service_config(
                    service,
                    api_key.to_string(),
                    base_url.map(str::to_string),
                );
                if let Err(err) = store.save(&config).await {
                    println!("[fail] {err}");
                    continue;
                }
                if !changes.has_changed().unwrap_or(false) {
                    continue;
                }
                let changed = changes.borrow_and_update().clone();
                if let Some(service) = changed {
                    for effect in bench.dispatch(Msg::ServiceChanged(service)) {
                        match effect {
                            Effect::ResetChat { service } => {
                                session.reset_for_service(&service).await;
                            }
                            other => bench_debug!("chat ignores effect {other:?}"),
                        }
                    }
                }
            }
            ReplCommand::Message(text) => {
                let cancel = CancellationToken::new();
                let sent =
                    until_done(session.send(text, &cancel), &mut interrupts, &cancel).await;
                match sent {
                    Ok(reply) => {
                        if reply.outcome == RevealOutcome::Cancelled {
                            println!("\n(reply cut short)");
                        }
                        if let Some(usage) = reply.usage.filter(|u| u.is_near_limit()) {
                            println!("[info] Token usage is getting high: {usage}");
                        }
                    }
                    Err(SendError::Cancelled) => println!("(request cancelled)"),
                    Err(err) => println!("[fail] {err}"),
                }
            }
        }
    }
    Ok(())
}
