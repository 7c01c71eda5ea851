//! Deterministic completion-client doubles (testing only).
//!
//! `ScriptedCompletionClient` replays canned responses;
//! `FlakyCompletionClient` fails a configured number of calls before
//! succeeding, for exercising the orchestrator's retry-once policy.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::agents::completion::{CompletionClient, CompletionError};

/// Replays a fixed sequence of responses, then an optional repeating
/// fallback. With no fallback, running past the script is
/// [`CompletionError::Exhausted`].
pub struct ScriptedCompletionClient {
    script: Mutex<VecDeque<String>>,
    fallback: Option<String>,
}

impl ScriptedCompletionClient {
    /// Replay `responses` in order; error once exhausted.
    pub fn from_responses(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: None,
        }
    }

    /// Always return `response`.
    pub fn repeating(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response.to_string()),
        }
    }

    /// Replay `responses` in order, then keep returning `fallback`.
    pub fn with_fallback(responses: Vec<String>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: Some(fallback.to_string()),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, CompletionError> {
        let mut script = self.script.lock().unwrap();
        if let Some(next) = script.pop_front() {
            return Ok(next);
        }
        self.fallback.clone().ok_or(CompletionError::Exhausted)
    }

    fn model_name(&self) -> String {
        "scripted".to_string()
    }
}

/// Fails the first `failures` calls, then behaves like `repeating`.
pub struct FlakyCompletionClient {
    remaining_failures: AtomicU32,
    response: String,
}

impl FlakyCompletionClient {
    pub fn new(failures: u32, response: &str) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
            response: response.to_string(),
        }
    }

    /// Fails every call.
    pub fn always_failing() -> Self {
        Self::new(u32::MAX, "")
    }
}

#[async_trait]
impl CompletionClient for FlakyCompletionClient {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, CompletionError> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(CompletionError::Http("connection refused".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> String {
        "flaky".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replays_in_order_then_exhausts() {
        let client =
            ScriptedCompletionClient::from_responses(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(client.complete("", "").await.unwrap(), "one");
        assert_eq!(client.complete("", "").await.unwrap(), "two");
        assert!(matches!(
            client.complete("", "").await.unwrap_err(),
            CompletionError::Exhausted
        ));
    }

    #[tokio::test]
    async fn test_repeating_never_exhausts() {
        let client = ScriptedCompletionClient::repeating("same");
        for _ in 0..5 {
            assert_eq!(client.complete("", "").await.unwrap(), "same");
        }
    }

    #[tokio::test]
    async fn test_flaky_fails_then_recovers() {
        let client = FlakyCompletionClient::new(1, "ok");
        assert!(client.complete("", "").await.is_err());
        assert_eq!(client.complete("", "").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_always_failing_never_recovers() {
        let client = FlakyCompletionClient::always_failing();
        for _ in 0..3 {
            assert!(client.complete("", "").await.is_err());
        }
    }
}
