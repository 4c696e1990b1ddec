//! `promptlab`: pull, validate, push and evaluate bug-to-user-story prompts.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

pub const DEFAULT_PROMPT_FILE: &str = "prompts/bug_to_user_story_v2.yml";
pub const DEFAULT_DATASET: &str = "datasets/bug_to_user_story.jsonl";

#[derive(Parser, Debug)]
#[command(name = "promptlab", version, about)]
pub struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a prompt from the hub into a local YAML file
    Pull {
        /// Hub identifier, `[owner/]name[:commit]`
        identifier: String,

        /// Directory the prompt file is written to
        #[arg(long, default_value = "prompts")]
        dir: PathBuf,
    },

    /// Validate a prompt file and publish its first prompt to the hub
    Push {
        #[arg(default_value = DEFAULT_PROMPT_FILE)]
        file: PathBuf,
    },

    /// Check prompt files against the publishing rules
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Run a prompt over a dataset and score the answers
    Evaluate(EvaluateArgs),
}

#[derive(clap::Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = DEFAULT_PROMPT_FILE)]
    pub prompt_file: PathBuf,

    /// Entry to evaluate; defaults to the file stem, then the first entry
    #[arg(long)]
    pub prompt_name: Option<String>,

    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: PathBuf,

    /// Evaluate only the first N examples (0 = all)
    #[arg(short = 'n', long, default_value_t = 0)]
    pub limit: usize,

    /// Overrides LLM_PROVIDER
    #[arg(long)]
    pub provider: Option<String>,

    /// Overrides LLM_MODEL
    #[arg(long)]
    pub model: Option<String>,

    /// Overrides EVAL_CONCURRENCY
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print the full run as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Pull { identifier, dir } => commands::pull(&identifier, &dir).await,
        Command::Push { file } => commands::push(&file).await,
        Command::Validate { files } => commands::validate(&files),
        Command::Evaluate(args) => commands::evaluate(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_evaluate_defaults() {
        let cli = Cli::try_parse_from(["promptlab", "evaluate"]).unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.prompt_file, PathBuf::from(DEFAULT_PROMPT_FILE));
        assert_eq!(args.dataset, PathBuf::from(DEFAULT_DATASET));
        assert_eq!(args.limit, 0);
        assert!(args.provider.is_none());
    }

    #[test]
    fn test_evaluate_overrides() {
        let cli = Cli::try_parse_from([
            "promptlab", "evaluate", "-n", "5", "--provider", "gemini", "--concurrency", "2", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.limit, 5);
        assert_eq!(args.provider.as_deref(), Some("gemini"));
        assert_eq!(args.concurrency, Some(2));
    }

    #[test]
    fn test_push_default_file() {
        let cli = Cli::try_parse_from(["promptlab", "push"]).unwrap();
        assert!(matches!(cli.command, Command::Push { file } if file == PathBuf::from(DEFAULT_PROMPT_FILE)));
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["promptlab", "validate"]).is_err());
        let cli = Cli::try_parse_from(["promptlab", "validate", "a.yml", "b.yml"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { files } if files.len() == 2));
    }

    #[test]
    fn test_pull_dir() {
        let cli = Cli::try_parse_from(["promptlab", "pull", "acme/story", "--dir", "out"]).unwrap();
        match cli.command {
            Command::Pull { identifier, dir } => {
                assert_eq!(identifier, "acme/story");
                assert_eq!(dir, PathBuf::from("out"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
