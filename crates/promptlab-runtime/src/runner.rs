//! Batch evaluation of a prompt against a dataset.
//!
//! Each example is rendered into the prompt, sent to the model and the
//! answer scored against the reference. Examples run concurrently up to a
//! fixed bound; outcomes are returned in dataset order regardless of the
//! order calls finish in.
//!
//! One failing example never aborts the run. Its outcome records why.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use promptlab_core::{
    evaluate, ChatPrompt, DatasetExample, PromptRecord, RunSummary, ScoreResult,
    DEFAULT_INPUT_KEY, DEFAULT_REFERENCE_KEY,
};

use crate::cache::{CacheKey, ResponseCache};
use crate::config::RuntimeConfig;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};
use crate::resilience::{complete_with_retry, BudgetTracker, LlmUsage, RetryPolicy};
use crate::RuntimeError;

/// Why an example was not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyInput,
    EmptyReference,
    EmptyAnswer,
    BudgetExhausted,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::EmptyInput => "empty bug report",
            SkipReason::EmptyReference => "empty reference",
            SkipReason::EmptyAnswer => "model returned an empty answer",
            SkipReason::BudgetExhausted => "token budget exhausted",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Scored(ScoreResult),
    Skipped { reason: SkipReason },
    Failed { error: String },
}

/// Result for one dataset example.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleOutcome {
    /// Position in the dataset
    pub index: usize,
    pub complexity: Option<String>,
    pub status: OutcomeStatus,
}

impl ExampleOutcome {
    pub fn score(&self) -> Option<&ScoreResult> {
        match &self.status {
            OutcomeStatus::Scored(score) => Some(score),
            _ => None,
        }
    }
}

/// Every outcome of a run plus the model usage it cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRun {
    /// Total examples in the dataset, before any limit
    pub total_examples: usize,
    pub outcomes: Vec<ExampleOutcome>,
    pub usage: LlmUsage,
}

impl EvaluationRun {
    pub fn scores(&self) -> Vec<ScoreResult> {
        self.outcomes.iter().filter_map(|o| o.score().copied()).collect()
    }

    pub fn scored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.score().is_some()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
            .count()
    }

    /// Means over the scored examples.
    pub fn summary(&self) -> Result<RunSummary, RuntimeError> {
        RunSummary::aggregate(&self.scores()).ok_or(RuntimeError::NothingEvaluated)
    }
}

/// Runs a prompt over a dataset through one provider.
pub struct EvaluationRunner {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryPolicy,
    concurrency: usize,
    input_key: String,
    reference_key: String,
    limit: Option<usize>,
    budget: BudgetTracker,
    cache: ResponseCache,
}

impl EvaluationRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
            retry: RetryPolicy::default(),
            concurrency: 4,
            input_key: DEFAULT_INPUT_KEY.to_string(),
            reference_key: DEFAULT_REFERENCE_KEY.to_string(),
            limit: None,
            budget: BudgetTracker::unlimited(),
            cache: ResponseCache::default(),
        }
    }

    /// Runner configured from runtime settings.
    pub fn from_config(
        provider: Arc<dyn LlmProvider>,
        config: &RuntimeConfig,
        completion: CompletionConfig,
    ) -> Self {
        Self::new(provider, completion)
            .with_retry_policy(config.retry_policy())
            .with_concurrency(config.concurrency)
            .with_token_budget(config.token_budget)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_keys(mut self, input_key: impl Into<String>, reference_key: impl Into<String>) -> Self {
        self.input_key = input_key.into();
        self.reference_key = reference_key.into();
        self
    }

    /// Only evaluate the first `limit` examples; 0 means all.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn with_token_budget(mut self, max_tokens: Option<u64>) -> Self {
        self.budget = BudgetTracker::new(max_tokens);
        self
    }

    pub fn completion_config(&self) -> &CompletionConfig {
        &self.completion
    }

    /// Evaluate `record` on `examples`.
    ///
    /// Fails only when the prompt itself cannot be used, such as a template
    /// with unbalanced braces.
    pub async fn run(
        &self,
        record: &PromptRecord,
        examples: &[DatasetExample],
    ) -> Result<EvaluationRun, RuntimeError> {
        let chat = record.chat_prompt();
        chat.input_variables()?;

        let selected = match self.limit {
            Some(limit) => &examples[..limit.min(examples.len())],
            None => examples,
        };

        tracing::info!(
            provider = self.provider.name(),
            model = %self.completion.model,
            examples = selected.len(),
            total = examples.len(),
            concurrency = self.concurrency,
            "starting evaluation"
        );

        let mut outcomes: Vec<ExampleOutcome> = stream::iter(selected.iter().enumerate())
            .map(|(index, example)| self.evaluate_example(&chat, index, example))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        outcomes.sort_by_key(|o| o.index);

        let run = EvaluationRun {
            total_examples: examples.len(),
            outcomes,
            usage: self.budget.get_usage(),
        };

        tracing::info!(
            scored = run.scored(),
            skipped = run.skipped(),
            failed = run.failed(),
            tokens = run.usage.total_tokens,
            "evaluation finished"
        );
        Ok(run)
    }

    async fn evaluate_example(
        &self,
        chat: &ChatPrompt,
        index: usize,
        example: &DatasetExample,
    ) -> ExampleOutcome {
        let status = self.score_example(chat, index, example).await;
        ExampleOutcome {
            index,
            complexity: example.complexity().map(str::to_string),
            status,
        }
    }

    async fn score_example(
        &self,
        chat: &ChatPrompt,
        index: usize,
        example: &DatasetExample,
    ) -> OutcomeStatus {
        let input = match example.input_text(&self.input_key) {
            Ok(text) => text.trim(),
            Err(e) => return OutcomeStatus::Failed { error: e.to_string() },
        };
        let reference = match example.output_text(&self.reference_key) {
            Ok(text) => text.trim(),
            Err(e) => return OutcomeStatus::Failed { error: e.to_string() },
        };

        if input.is_empty() {
            return self.skip(index, SkipReason::EmptyInput);
        }
        if reference.is_empty() {
            return self.skip(index, SkipReason::EmptyReference);
        }

        let rendered = match chat.render(&example.template_values()) {
            Ok(rendered) => rendered,
            Err(e) => return OutcomeStatus::Failed { error: e.to_string() },
        };
        let messages = ChatMessage::from_prompt(&rendered);
        let key = CacheKey::new(self.provider.name(), &self.completion, &messages);

        let response = match self.cache.get(&key).await {
            Some(cached) => {
                tracing::debug!(example = index, "using cached completion");
                cached
            }
            None => {
                let estimate: u64 = messages
                    .iter()
                    .map(|m| u64::from(self.provider.estimate_tokens(&m.content)))
                    .sum();
                if !self.budget.can_afford(estimate) {
                    return self.skip(index, SkipReason::BudgetExhausted);
                }

                match complete_with_retry(self.provider.as_ref(), &messages, &self.completion, self.retry)
                    .await
                {
                    Ok(response) => {
                        self.budget.record_usage(&response.usage, &response.model);
                        self.cache.insert(key, response.clone()).await;
                        response
                    }
                    Err(e) => {
                        tracing::warn!(example = index, error = %e, "model call failed");
                        return OutcomeStatus::Failed { error: e.to_string() };
                    }
                }
            }
        };

        let answer = response.content.trim();
        if answer.is_empty() {
            return self.skip(index, SkipReason::EmptyAnswer);
        }

        let score = evaluate(answer, reference, Some(input));
        tracing::debug!(
            example = index,
            recall = score.recall,
            precision = score.precision,
            f1 = score.score,
            "example scored"
        );
        OutcomeStatus::Scored(score)
    }

    fn skip(&self, index: usize, reason: SkipReason) -> OutcomeStatus {
        tracing::warn!(example = index, reason = %reason, "skipping example");
        OutcomeStatus::Skipped { reason }
    }
}
