use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use workbench_core::{DimensionId, JobKind};

use crate::logging::LogDestination;
use crate::settings::{Overrides, DEFAULT_SETTINGS_FILE};

/// Terminal client for the data workbench: process files with AI cleaning and
/// labeling jobs, chat with the configured assistant, manage configuration.
#[derive(Debug, Parser)]
#[command(name = "workbench", version)]
pub struct Cli {
    /// Settings file
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// Backend base URL, e.g. http://127.0.0.1:8000/
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Where log lines go
    #[arg(long, global = true, value_enum)]
    pub log: Option<LogDestination>,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let (char_delay_ms, export_dir) = match &self.command {
            Command::Chat(args) => (args.char_delay_ms, args.export_dir.clone()),
            Command::Process(args) => (None, args.export_dir.clone()),
            _ => (None, None),
        };
        Overrides {
            backend_url: self.backend.clone(),
            char_delay_ms,
            export_dir,
            log: self.log,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a text file, run a processing job and show the result table
    Process(ProcessArgs),
    /// Interactive chat with the configured AI service
    Chat(ChatArgs),
    /// Show or change the AI service configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// List, add or delete processing dimensions
    #[command(subcommand)]
    Dimensions(DimensionCommand),
    /// Print the effective settings as RON
    Settings {
        /// Also write them to the settings file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Cleaning,
    Labeling,
}

impl From<KindArg> for JobKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Cleaning => JobKind::Cleaning,
            KindArg::Labeling => JobKind::Labeling,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct ProcessArgs {
    /// Text file to process
    pub file: PathBuf,

    #[arg(long, short = 'k', value_enum, default_value = "cleaning")]
    pub kind: KindArg,

    /// Dimension ids to apply; the default dimensions when omitted
    #[arg(long = "dimension", short = 'd')]
    pub dimensions: Vec<DimensionId>,

    /// Write the result as JSON once the job completes
    #[arg(long, short = 'e')]
    pub export: bool,

    /// Let the backend build the export document
    #[arg(long, requires = "export")]
    pub remote_export: bool,

    /// Directory for exports
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ChatArgs {
    /// Milliseconds between typed characters; 0 prints replies at once
    #[arg(long)]
    pub char_delay_ms: Option<u64>,

    /// Directory for chat transcripts
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the stored configuration
    Show,
    /// Store a new configuration
    Set {
        /// Service type: openai, zhipu, deepseek, ...
        #[arg(long)]
        service: String,
        #[arg(long)]
        api_key: String,
        /// Required for openai
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long, default_value = "")]
        system_prompt: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum DimensionCommand {
    /// List the dimensions of both job kinds
    List,
    Add {
        #[arg(long, short = 'k', value_enum)]
        kind: KindArg,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a user-defined dimension
    Delete {
        #[arg(long, short = 'k', value_enum)]
        kind: KindArg,
        id: DimensionId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_arguments_parse() {
        let cli = Cli::parse_from([
            "workbench", "--backend", "http://b/", "process", "data.txt", "-k", "labeling", "-d",
            "3", "-d", "5", "--export",
        ]);
        let Command::Process(args) = &cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.kind, KindArg::Labeling);
        assert_eq!(args.dimensions, vec![3, 5]);
        assert!(args.export);
        assert_eq!(cli.overrides().backend_url.as_deref(), Some("http://b/"));
    }

    #[test]
    fn chat_delay_becomes_an_override() {
        let cli = Cli::parse_from(["workbench", "chat", "--char-delay-ms", "0"]);
        assert_eq!(cli.overrides().char_delay_ms, Some(0));
    }
}
