use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::core::{
    AllocationMix, InvestorProfile, ProjectionResult, RiskAssessment, RiskTier, allocation_for,
    classify, expected_return_for, normalize, project,
};
use crate::narrator::{NarrativeOutcome, Narrator, ProfileSummary, fallback_advice};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSource {
    Narrator,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IllustrativeFund {
    pub name: &'static str,
    pub category: &'static str,
    pub risk: RiskTier,
    pub five_year_cagr: f64,
}

/// Placeholder shortlist shown alongside every plan. Not a recommendation.
pub fn illustrative_funds() -> Vec<IllustrativeFund> {
    vec![
        IllustrativeFund {
            name: "Index Wealth Builder Fund",
            category: "Equity Index",
            risk: RiskTier::High,
            five_year_cagr: 0.15,
        },
        IllustrativeFund {
            name: "Balanced Stability Fund",
            category: "Aggressive Hybrid",
            risk: RiskTier::Medium,
            five_year_cagr: 0.12,
        },
        IllustrativeFund {
            name: "Debt Shield Fund",
            category: "Short Duration Debt",
            risk: RiskTier::Low,
            five_year_cagr: 0.08,
        },
    ]
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryPlan {
    pub profile: InvestorProfile,
    pub risk: RiskAssessment,
    pub allocation: AllocationMix,
    pub expected_return: f64,
    pub advice: String,
    pub advice_source: AdviceSource,
    pub projection: ProjectionResult,
    pub funds: Vec<IllustrativeFund>,
}

/// One advisory run over an already validated profile.
///
/// `allocation_override` is an untrusted asset-class map; it is normalized
/// against the tier's default mix. The narrator is consulted once and any
/// absence is replaced by the rule-based sentence, so this never fails.
pub async fn run_plan(
    profile: InvestorProfile,
    allocation_override: Option<&Map<String, Value>>,
    narrator: &dyn Narrator,
) -> AdvisoryPlan {
    let risk = classify(
        profile.age,
        profile.horizon_years,
        &profile.goals,
        profile.monthly_investment,
        profile.monthly_income,
    );
    let default_mix = allocation_for(risk.tier);
    let allocation = match allocation_override {
        Some(raw) => normalize(raw, &default_mix),
        None => default_mix,
    };
    let expected_return = expected_return_for(risk.tier);

    let summary = ProfileSummary::new(&profile, risk, allocation, expected_return);
    let (advice, advice_source) = match narrator.request_narrative(&summary).await {
        NarrativeOutcome::Narrative(text) => (text, AdviceSource::Narrator),
        NarrativeOutcome::Absent => (
            fallback_advice(&profile, risk.tier, expected_return),
            AdviceSource::Fallback,
        ),
    };

    let projection = project(&profile, expected_return);
    info!(
        tier = %risk.tier,
        score = risk.score,
        horizon = profile.horizon_years,
        advice_source = ?advice_source,
        portfolio_future = projection.portfolio_future_value,
        "advisory plan ready"
    );

    AdvisoryPlan {
        profile,
        risk,
        allocation,
        expected_return,
        advice,
        advice_source,
        projection,
        funds: illustrative_funds(),
    }
}
