use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    NarrativeOutcome, Narrator, NarratorError, NarratorSettings, ProfileSummary, RetryOutcome,
    RetryPolicy,
};

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-flash-1.5";

const TEMPERATURE: f64 = 0.4;
const SEED: u64 = 11;

const SYSTEM_PROMPT: &str = "You are a fiduciary financial advisor AND quantitative planner for \
Indian retail investors. Use only the JSON profile provided by the user. Assume annual return and \
interest rates are compounded monthly. Use standard time-value-of-money formulas (future value of \
lump sum, future value of annuity, present value with inflation discounting). All outputs are \
research / preview only; never guarantee returns. Write a detailed, structured advisor note in \
plain text that clearly uses the user's inputs (age, goals, horizon, monthly investment, current \
savings, FD rate, inflation). Focus on risk profiling, suggested allocation, expected returns, and \
inflation impact.";

/// Narrator backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenRouterNarrator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
}

impl OpenRouterNarrator {
    pub fn new(settings: NarratorSettings) -> Result<Self, NarratorError> {
        let api_key = settings
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(NarratorError::MissingCredential)?;

        let client = Client::builder()
            .timeout(settings.retry.attempt_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint,
            model: settings.model,
            api_key,
            retry: settings.retry,
        })
    }

    async fn attempt(&self, request: &ChatRequest<'_>) -> Result<String, NarratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NarratorError::Status(status.as_u16()));
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| NarratorError::MalformedResponse(e.to_string()))?;
        body.into_text().ok_or_else(|| {
            NarratorError::MalformedResponse("no advisory text in first choice".to_string())
        })
    }
}

#[async_trait]
impl Narrator for OpenRouterNarrator {
    async fn request_narrative(&self, summary: &ProfileSummary) -> NarrativeOutcome {
        let request = match ChatRequest::for_summary(&self.model, summary) {
            Ok(request) => request,
            Err(err) => {
                warn!("skipping narrator: {err}");
                return NarrativeOutcome::Absent;
            }
        };

        let request = &request;
        let outcome = self
            .retry
            .run(move |attempt| {
                debug!(attempt = attempt + 1, endpoint = %self.endpoint, "requesting advisory narrative");
                self.attempt(request)
            })
            .await;

        match outcome {
            RetryOutcome::Succeeded(text) => NarrativeOutcome::Narrative(text),
            RetryOutcome::Exhausted { attempts, .. } => {
                warn!(attempts, "advisory narrator exhausted its retries");
                NarrativeOutcome::Absent
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
    temperature: f64,
    seed: u64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl<'a> ChatRequest<'a> {
    fn for_summary(model: &'a str, summary: &ProfileSummary) -> Result<Self, NarratorError> {
        let profile_json = serde_json::to_string(summary)?;
        Ok(Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Here is the investor profile as JSON:\n{profile_json}\n\n\
                         Write only a detailed advisor note in plain text. \
                         Do NOT return JSON, just human-readable advice."
                    ),
                },
            ],
            temperature: TEMPERATURE,
            seed: SEED,
        })
    }
}

// Only the first choice's message text is read; everything else is ignored.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        let content = self.choices.into_iter().next()?.message.content?;
        let trimmed = content.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
