//! In-memory cache of model completions.
//!
//! Datasets often repeat a bug report; identical rendered prompts sent to
//! the same provider and model reuse the first completion instead of paying
//! for another call.

use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse};

/// Identifies one completion request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    pub fn new(provider: &str, config: &CompletionConfig, messages: &[ChatMessage]) -> Self {
        let mut hasher = DefaultHasher::new();
        provider.hash(&mut hasher);
        config.model.hash(&mut hasher);
        config.max_tokens.hash(&mut hasher);
        config.temperature.to_bits().hash(&mut hasher);
        messages.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// Completion cache backed by moka.
pub struct ResponseCache {
    cache: Cache<CacheKey, CompletionResponse>,
}

impl ResponseCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CompletionResponse> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, response: CompletionResponse) {
        self.cache.insert(key, response).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokenUsage;

    fn response(content: &str) -> CompletionResponse {
        CompletionResponse {
            content: content.to_string(),
            usage: TokenUsage::default(),
            model: "m".to_string(),
            stop_reason: None,
        }
    }

    #[test]
    fn test_key_depends_on_every_input() {
        let config = CompletionConfig::default();
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("bug")];
        let base = CacheKey::new("openai", &config, &messages);

        assert_eq!(base, CacheKey::new("openai", &config, &messages));
        assert_ne!(base, CacheKey::new("google", &config, &messages));
        assert_ne!(
            base,
            CacheKey::new("openai", &config, &[ChatMessage::system("s"), ChatMessage::user("other")])
        );

        let warmer = CompletionConfig {
            temperature: 0.7,
            ..config.clone()
        };
        assert_ne!(base, CacheKey::new("openai", &warmer, &messages));
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = ResponseCache::default();
        let key = CacheKey::new("openai", &CompletionConfig::default(), &[ChatMessage::user("x")]);

        assert!(cache.get(&key).await.is_none());
        cache.insert(key, response("story")).await;
        assert_eq!(cache.get(&key).await.unwrap().content, "story");

        cache.invalidate_all();
        assert!(cache.get(&key).await.is_none());
    }
}
