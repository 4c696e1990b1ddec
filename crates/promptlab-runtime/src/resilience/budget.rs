//! Token usage accounting and the optional run budget.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::providers::TokenUsage;

/// Accumulated model usage for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub total_tokens: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,

    /// Completed model calls
    pub llm_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl LlmUsage {
    /// Add usage from one completion.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += u64::from(usage.prompt_tokens);
        self.completion_tokens += u64::from(usage.completion_tokens);
        self.total_tokens += u64::from(usage.total());
        self.llm_calls += 1;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    /// Cost of one completion, priced per million tokens.
    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        let (input_rate, output_rate) = match model {
            m if m.contains("gpt-4o-mini") => (0.15, 0.6),
            m if m.contains("gpt-4o") => (2.5, 10.0),
            m if m.contains("gpt-4.1-mini") => (0.4, 1.6),
            m if m.contains("gemini-2.5-flash") => (0.3, 2.5),
            m if m.contains("gemini-2.5-pro") => (1.25, 10.0),
            m if m.contains("haiku") => (1.0, 5.0),
            m if m.contains("opus") => (5.0, 25.0),
            m if m.contains("sonnet") => (3.0, 15.0),
            _ => (0.15, 0.6),
        };

        let input_cost = (usage.prompt_tokens as f64 / 1_000_000.0) * input_rate;
        let output_cost = (usage.completion_tokens as f64 / 1_000_000.0) * output_rate;
        input_cost + output_cost
    }
}

/// Tracks usage across concurrent calls and enforces an optional token cap.
///
/// The cap is checked before each call, so a call already in flight may
/// finish past it; once reached, no further calls are made.
pub struct BudgetTracker {
    max_tokens: Option<u64>,
    usage: RwLock<LlmUsage>,
}

impl BudgetTracker {
    pub fn new(max_tokens: Option<u64>) -> Self {
        Self {
            max_tokens,
            usage: RwLock::new(LlmUsage::default()),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Whether another call may be made.
    pub fn can_afford(&self, estimated_tokens: u64) -> bool {
        match self.max_tokens {
            None => true,
            Some(max) => {
                let used = self.usage.read().total_tokens;
                used < max && used + estimated_tokens <= max
            }
        }
    }

    /// Record usage after a call.
    pub fn record_usage(&self, usage: &TokenUsage, model: &str) {
        self.usage.write().add(usage, model);
    }

    pub fn remaining(&self) -> Option<u64> {
        self.max_tokens
            .map(|max| max.saturating_sub(self.usage.read().total_tokens))
    }

    /// Snapshot of the usage so far.
    pub fn get_usage(&self) -> LlmUsage {
        self.usage.read().clone()
    }
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::unlimited()
    }
}
