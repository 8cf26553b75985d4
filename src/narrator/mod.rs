//! Advisory narrative boundary.
//!
//! A [`Narrator`] turns a [`ProfileSummary`] into free-text advice. Every
//! failure mode collapses into [`NarrativeOutcome::Absent`]; callers then use
//! [`fallback_advice`], so a projection never depends on the remote service.

mod openrouter;
mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::core::{AllocationMix, InvestorProfile, RiskAssessment, RiskTier};

pub use openrouter::{DEFAULT_ENDPOINT, DEFAULT_MODEL, OpenRouterNarrator};
pub use retry::{RetryOutcome, RetryPolicy};

/// Per-attempt failure. Never escapes a narrator.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("narrator credential is not configured")]
    MissingCredential,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("could not encode profile: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeOutcome {
    Narrative(String),
    Absent,
}

impl NarrativeOutcome {
    pub fn into_text(self) -> Option<String> {
        match self {
            NarrativeOutcome::Narrative(text) => Some(text),
            NarrativeOutcome::Absent => None,
        }
    }
}

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn request_narrative(&self, summary: &ProfileSummary) -> NarrativeOutcome;
}

/// Used when no credential is configured.
pub struct DisabledNarrator;

#[async_trait]
impl Narrator for DisabledNarrator {
    async fn request_narrative(&self, _summary: &ProfileSummary) -> NarrativeOutcome {
        NarrativeOutcome::Absent
    }
}

#[derive(Debug, Clone)]
pub struct NarratorSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for NarratorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Picks the HTTP narrator when a credential is present, otherwise the
/// disabled one.
pub fn narrator_from_settings(settings: NarratorSettings) -> Arc<dyn Narrator> {
    match OpenRouterNarrator::new(settings) {
        Ok(narrator) => Arc::new(narrator),
        Err(err) => {
            info!("advisory narrator disabled ({err}); notes will use the rule-based fallback");
            Arc::new(DisabledNarrator)
        }
    }
}

/// Structured profile handed to the narrator, serialized as the user payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub age: u32,
    pub income: f64,
    pub horizon_years: u32,
    pub monthly_invest: f64,
    pub current_savings: f64,
    pub inflation_rate: f64,
    pub fd_rate: f64,
    pub goals: Vec<String>,
    pub top_goal: Option<String>,
    pub rule_based_risk: RiskTier,
    pub rule_based_risk_score: u32,
    pub rule_based_allocation: AllocationMix,
    pub rule_based_expected_return: f64,
}

impl ProfileSummary {
    pub fn new(
        profile: &InvestorProfile,
        risk: RiskAssessment,
        allocation: AllocationMix,
        expected_return: f64,
    ) -> Self {
        Self {
            age: profile.age,
            income: profile.monthly_income,
            horizon_years: profile.horizon_years,
            monthly_invest: profile.monthly_investment,
            current_savings: profile.current_savings,
            inflation_rate: profile.inflation_rate,
            fd_rate: profile.fd_rate,
            goals: profile.goals.iter().map(|g| g.label().to_string()).collect(),
            top_goal: profile.top_goal().map(|g| g.label().to_string()),
            rule_based_risk: risk.tier,
            rule_based_risk_score: risk.score,
            rule_based_allocation: allocation,
            rule_based_expected_return: expected_return,
        }
    }
}

/// Deterministic advisory sentence used whenever the narrator is absent.
pub fn fallback_advice(profile: &InvestorProfile, tier: RiskTier, expected_return: f64) -> String {
    format!(
        "Based on your age ({}), monthly investment of roughly ₹{}, current savings of about ₹{}, \
         and a {}-year horizon, this preview assumes a {} risk profile with an expected CAGR of \
         around {:.1}% per year. Use this purely as research, not as a guarantee.",
        profile.age,
        format_grouped(profile.monthly_investment),
        format_grouped(profile.current_savings),
        profile.horizon_years,
        tier.label().to_lowercase(),
        expected_return * 100.0,
    )
}

/// Whole-unit amount with comma thousands separators, e.g. `1,234,568`.
pub fn format_grouped(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && digits != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}
