//! The single funnel for all generative calls.
//!
//! Responsibilities: sliding-window rate limiting, retry with exponential
//! backoff, key/model rotation across repeated failures, deterministic
//! heuristic fallback when every endpoint is exhausted, and persisted usage
//! accounting.

use crate::domain::errors::GovernorError;
use crate::domain::ports::{Generated, GenerationBudget, SchemaHint, TextGenerator};
use crate::infrastructure::llm::heuristic;
use crate::infrastructure::llm::usage::UsageTracker;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const RATE_WINDOW: Duration = Duration::from_secs(60);
const NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GovernorSettings {
    pub base_url: String,
    pub api_keys: Vec<String>,
    pub models: Vec<String>,
    pub rate_limit_per_minute: usize,
    pub retry_max: u32,
    pub retry_base_seconds: f64,
    pub retry_multiplier: f64,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_keys: Vec::new(),
            models: vec![
                "google/gemini-2.0-flash-exp:free".to_string(),
                "mistralai/mistral-7b-instruct:free".to_string(),
                "meta-llama/llama-3.2-3b-instruct:free".to_string(),
            ],
            rate_limit_per_minute: 30,
            retry_max: 3,
            retry_base_seconds: 2.0,
            retry_multiplier: 2.0,
        }
    }
}

/// Rotation and rate state shared by every caller in the process.
struct GovernorState {
    request_times: VecDeque<Instant>,
    key_index: usize,
    model_index: usize,
}

pub struct LlmGovernor {
    settings: GovernorSettings,
    client: Client,
    state: Mutex<GovernorState>,
    usage: Option<UsageTracker>,
}

impl LlmGovernor {
    pub fn new(settings: GovernorSettings, usage: Option<UsageTracker>) -> Self {
        let client = Client::builder()
            .timeout(NETWORK_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings,
            client,
            state: Mutex::new(GovernorState {
                request_times: VecDeque::new(),
                key_index: 0,
                model_index: 0,
            }),
            usage,
        }
    }

    /// Wait for a slot in the sliding 60-second window. The lock is released
    /// while sleeping so other callers can make progress.
    async fn acquire_slot(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();

                while let Some(front) = state.request_times.front() {
                    if now.duration_since(*front) >= RATE_WINDOW {
                        state.request_times.pop_front();
                    } else {
                        break;
                    }
                }

                if state.request_times.len() < self.settings.rate_limit_per_minute {
                    state.request_times.push_back(now);
                    None
                } else {
                    // Oldest entry expiring frees the next slot.
                    state
                        .request_times
                        .front()
                        .map(|oldest| RATE_WINDOW - now.duration_since(*oldest))
                }
            };

            match wait {
                None => return,
                Some(delay) => {
                    debug!("Rate limit reached, suspending caller for {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn current_endpoint(&self) -> (String, String) {
        let state = self.state.lock().await;
        let key = self
            .settings
            .api_keys
            .get(state.key_index % self.settings.api_keys.len().max(1))
            .cloned()
            .unwrap_or_default();
        let model = self
            .settings
            .models
            .get(state.model_index % self.settings.models.len().max(1))
            .cloned()
            .unwrap_or_default();
        (key, model)
    }

    async fn rotate_key(&self) {
        if self.settings.api_keys.len() <= 1 {
            return;
        }
        let mut state = self.state.lock().await;
        state.key_index = (state.key_index + 1) % self.settings.api_keys.len();
        warn!("Rotating API key to #{}", state.key_index + 1);
    }

    async fn rotate_model(&self) {
        if self.settings.models.is_empty() {
            return;
        }
        let mut state = self.state.lock().await;
        state.model_index = (state.model_index + 1) % self.settings.models.len();
        warn!("Switching model to {}", self.settings.models[state.model_index]);
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let seconds =
            self.settings.retry_base_seconds * self.settings.retry_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(seconds)
    }

    /// One (key, model) attempt with retries on 429 and transient network
    /// errors. Non-retryable statuses surface immediately for rotation.
    async fn send_with_backoff(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        budget: GenerationBudget,
    ) -> Result<String, GovernorError> {
        let payload = json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": budget.temperature,
            "max_tokens": budget.max_output_tokens,
        });

        let mut attempt = 0u32;
        loop {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.settings.base_url))
                .bearer_auth(api_key)
                .json(&payload)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().as_u16() == 429 => {
                    if attempt >= self.settings.retry_max {
                        return Err(GovernorError::RateLimited {
                            attempts: attempt + 1,
                        });
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "429 from {}; retrying in {:?} ({}/{})",
                        model,
                        delay,
                        attempt + 1,
                        self.settings.retry_max
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Ok(resp) if resp.status().is_success() => {
                    let body: serde_json::Value =
                        resp.json().await.map_err(|e| GovernorError::Network {
                            reason: e.to_string(),
                        })?;
                    let content = body["choices"][0]["message"]["content"]
                        .as_str()
                        .map(String::from);
                    return content.ok_or_else(|| GovernorError::Network {
                        reason: "response missing message content".to_string(),
                    });
                }
                Ok(resp) => {
                    return Err(GovernorError::Endpoint {
                        model: model.to_string(),
                        status: resp.status().as_u16(),
                    });
                }
                Err(e) => {
                    if attempt >= self.settings.retry_max {
                        return Err(GovernorError::Network {
                            reason: e.to_string(),
                        });
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!("Network error calling {}: {}; retrying", model, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl TextGenerator for LlmGovernor {
    async fn generate(
        &self,
        prompt: &str,
        hint: SchemaHint,
        budget: GenerationBudget,
    ) -> Result<Generated> {
        if self.settings.api_keys.is_empty() {
            debug!("No API keys configured; using heuristic path");
            return Ok(Generated {
                text: heuristic::fallback(prompt, hint),
                degraded: true,
            });
        }

        self.acquire_slot().await;

        // Walk the model list once per call; 429 exhaustion advances the key
        // pointer instead.
        for _ in 0..self.settings.models.len().max(1) {
            let (api_key, model) = self.current_endpoint().await;

            match self
                .send_with_backoff(&api_key, &model, prompt, budget)
                .await
            {
                Ok(text) => {
                    if let Some(usage) = &self.usage
                        && let Err(e) = usage.record(&model, prompt.len(), text.len()).await
                    {
                        warn!("Failed to record LLM usage: {}", e);
                    }
                    return Ok(Generated {
                        text,
                        degraded: false,
                    });
                }
                Err(GovernorError::RateLimited { attempts }) => {
                    warn!("{} rate-limited after {} attempts", model, attempts);
                    self.rotate_key().await;
                }
                Err(e) => {
                    warn!("Endpoint failure on {}: {}", model, e);
                    self.rotate_model().await;
                }
            }
        }

        info!("All endpoints failed; answering from heuristic fallback");
        Ok(Generated {
            text: heuristic::fallback(prompt, hint),
            degraded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(rate: usize) -> LlmGovernor {
        LlmGovernor::new(
            GovernorSettings {
                api_keys: Vec::new(),
                rate_limit_per_minute: rate,
                ..GovernorSettings::default()
            },
            None,
        )
    }

    #[tokio::test]
    async fn test_keyless_governor_degrades() {
        let gov = governor(30);
        let out = gov
            .generate(
                "Production halt at TSM",
                SchemaHint::Classification,
                GenerationBudget::default(),
            )
            .await
            .unwrap();
        assert!(out.degraded);
        assert!(out.text.contains("Supply Chain"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_suspends_not_errors() {
        let gov = std::sync::Arc::new(governor(2));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let gov = gov.clone();
            handles.push(tokio::spawn(async move {
                gov.acquire_slot().await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // 5 slots at 2/min: the window never held more than 2 live entries.
        let state = gov.state.lock().await;
        assert!(state.request_times.len() <= 2);
    }
}
