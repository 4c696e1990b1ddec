use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};

use promptlab_core::{load_jsonl, validate as validate_record, PromptFile, PromptRecord};
use promptlab_runtime::config::normalize_provider;
use promptlab_runtime::{
    pull_prompt, push_prompt, EvaluationRunner, LangSmithHub, ProviderRegistry, RuntimeConfig,
    RuntimeError,
};

use crate::output;
use crate::EvaluateArgs;

fn load_config() -> Result<RuntimeConfig> {
    RuntimeConfig::from_env().context("Failed to load configuration")
}

fn connect_hub(config: &RuntimeConfig) -> Result<LangSmithHub> {
    LangSmithHub::from_config(&config.hub)
        .context("LANGSMITH_API_KEY must be set to use the prompt hub")
}

pub async fn pull(identifier: &str, dir: &Path) -> Result<ExitCode> {
    let config = load_config()?;
    let hub = connect_hub(&config)?;
    let today = chrono::Local::now().date_naive();

    let pulled = pull_prompt(&hub, identifier, dir, today)
        .await
        .with_context(|| format!("Failed to pull '{}'", identifier))?;

    println!("Saved prompt '{}' to {}", pulled.name, pulled.path.display());
    Ok(ExitCode::SUCCESS)
}

pub async fn push(file: &Path) -> Result<ExitCode> {
    let config = load_config()?;
    let owner = config
        .hub
        .username
        .clone()
        .ok_or_else(|| anyhow!("USERNAME_LANGSMITH_HUB must be set to push prompts"))?;
    let hub = connect_hub(&config)?;

    match push_prompt(&hub, &owner, file).await {
        Ok(outcome) => {
            print!("{}", output::push_outcome(&outcome));
            Ok(ExitCode::SUCCESS)
        }
        Err(RuntimeError::Rejected { name, report }) => {
            eprint!("{}", output::rejection(&name, &report));
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to push {}", file.display()))),
    }
}

/// Every entry of every file is checked; any failure or unreadable file
/// fails the command.
pub fn validate(files: &[PathBuf]) -> Result<ExitCode> {
    let failures = validate_files(files);
    if failures > 0 {
        tracing::debug!(failures, "validation failed");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Print a report per entry and return how many entries or files failed.
fn validate_files(files: &[PathBuf]) -> usize {
    let mut failures = 0usize;

    for file in files {
        let prompts = match PromptFile::from_yaml_file(file) {
            Ok(prompts) => prompts,
            Err(e) => {
                println!("✗ {}: {}", file.display(), e);
                failures += 1;
                continue;
            }
        };

        for (name, record) in prompts.iter() {
            let report = validate_record(record);
            print!("{}", output::validation(file, name, &report));
            if !report.is_valid {
                failures += 1;
            }
        }
    }

    failures
}

pub async fn evaluate(args: EvaluateArgs) -> Result<ExitCode> {
    let mut config = load_config()?;
    if let Some(provider) = &args.provider {
        config.provider = normalize_provider(provider);
    }
    if let Some(model) = args.model {
        config.model = Some(model);
    }
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        config.concurrency = concurrency;
    }

    let prompts = PromptFile::from_yaml_file(&args.prompt_file)
        .with_context(|| format!("Failed to load {}", args.prompt_file.display()))?;
    let (name, record) = select_prompt(&prompts, args.prompt_name.as_deref(), &args.prompt_file)?;
    let examples = load_jsonl(&args.dataset)
        .with_context(|| format!("Failed to load {}", args.dataset.display()))?;

    let registry = ProviderRegistry::with_defaults();
    let provider = registry
        .create(&config.provider, &config.provider_json())
        .with_context(|| format!("Failed to set up provider '{}'", config.provider))?;
    let default_model = registry.default_model(&config.provider).unwrap_or_default();
    let completion = config.completion_config(&default_model);

    let run = EvaluationRunner::from_config(provider, &config, completion)
        .with_limit(args.limit)
        .run(record, &examples)
        .await
        .context("Evaluation failed")?;
    let summary = run
        .summary()
        .context("No example produced a scored answer")?;
    let verdict = config.thresholds.judge(&summary);

    if args.json {
        let report = output::JsonReport {
            prompt: &name,
            run: &run,
            summary: &summary,
            verdict: &verdict,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", output::run_report(&name, &run, &summary, &verdict, &config.thresholds));
    }

    Ok(if verdict.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// The named entry, else the entry matching the file stem, else the first.
fn select_prompt<'a>(
    prompts: &'a PromptFile,
    name: Option<&str>,
    path: &Path,
) -> Result<(String, &'a PromptRecord)> {
    if let Some(name) = name {
        let record = prompts
            .get(name)
            .with_context(|| format!("in {}", path.display()))?;
        return Ok((name.to_string(), record));
    }

    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if let Ok(record) = prompts.get(stem) {
            return Ok((stem.to_string(), record));
        }
    }

    prompts
        .first()
        .map(|(name, record)| (name.to_string(), record))
        .ok_or_else(|| anyhow!("{} contains no prompts", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PROMPTS: &str = r#"
first_prompt:
  description: "one"
  system_prompt: "You are a PM."
bug_to_user_story_v2:
  description: "two"
  system_prompt: "You are a QA lead."
"#;

    #[test]
    fn test_select_prompt_order() {
        let prompts = PromptFile::from_yaml(TWO_PROMPTS).unwrap();

        let (name, _) = select_prompt(&prompts, Some("first_prompt"), Path::new("x.yml")).unwrap();
        assert_eq!(name, "first_prompt");

        let (name, record) =
            select_prompt(&prompts, None, Path::new("prompts/bug_to_user_story_v2.yml")).unwrap();
        assert_eq!(name, "bug_to_user_story_v2");
        assert_eq!(record.description, "two");

        let (name, _) = select_prompt(&prompts, None, Path::new("other.yml")).unwrap();
        assert_eq!(name, "first_prompt");

        assert!(select_prompt(&prompts, Some("missing"), Path::new("x.yml")).is_err());
    }

    #[test]
    fn test_validate_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yml");
        std::fs::write(
            &good,
            r#"
good:
  description: "Bug report to user story"
  system_prompt: |
    You are an experienced product manager.
    Answer in Markdown using the user story format.

    Example 1:
    Input: The login button does nothing.
    Output: As a user, I want to log in so that I can reach my account.
  user_prompt: "{bug_report}"
  techniques_applied: ["few-shot", "role-playing"]
"#,
        )
        .unwrap();
        let bad = dir.path().join("bad.yml");
        std::fs::write(&bad, "bad:\n  description: \"d\"\n  system_prompt: \"TODO: write\"\n").unwrap();

        assert_eq!(validate_files(&[good.clone()]), 0);
        assert_eq!(validate_files(&[good.clone(), bad]), 1);
        assert_eq!(validate_files(&[good, dir.path().join("missing.yml")]), 1);
    }
}
