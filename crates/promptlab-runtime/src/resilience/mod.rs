//! Resilience around model calls.
//!
//! - Per-attempt timeout and retry with exponential backoff
//! - Token usage accounting and an optional run budget

mod budget;
mod retry;

pub use budget::{BudgetTracker, LlmUsage};
pub use retry::{complete_with_retry, RetryPolicy};
