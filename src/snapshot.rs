use std::sync::RwLock;

use serde::Serialize;

use crate::core::{InvestmentGoal, RiskTier};
use crate::plan::AdvisoryPlan;

/// The figures the comparison view needs from the most recent run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSnapshot {
    pub years: Vec<u32>,
    pub balances_nominal: Vec<f64>,
    pub balances_real: Vec<f64>,
    pub portfolio_future: f64,
    pub portfolio_real: f64,
    pub fd_future: f64,
    pub fd_real: f64,
    pub inflation_rate: f64,
    pub fd_rate: f64,
    pub expected_return: f64,
    pub risk_tier: RiskTier,
    pub selected_goals: Vec<InvestmentGoal>,
}

impl ComparisonSnapshot {
    pub fn from_plan(plan: &AdvisoryPlan) -> Self {
        let projection = &plan.projection;
        Self {
            years: projection.years.clone(),
            balances_nominal: projection.nominal_balances.clone(),
            balances_real: projection.real_balances.clone(),
            portfolio_future: projection.portfolio_future_value,
            portfolio_real: projection.portfolio_real_value,
            fd_future: projection.fd_future_value,
            fd_real: projection.fd_real_value,
            inflation_rate: plan.profile.inflation_rate,
            fd_rate: plan.profile.fd_rate,
            expected_return: plan.expected_return,
            risk_tier: plan.risk.tier,
            selected_goals: plan.profile.goals.clone(),
        }
    }

    pub fn top_goal(&self) -> Option<InvestmentGoal> {
        self.selected_goals.first().copied()
    }

    pub fn summary_line(&self) -> String {
        let goal = self
            .top_goal()
            .map(InvestmentGoal::label)
            .unwrap_or("None");
        format!(
            "Top goal priority: {goal} with overall risk profile inferred as {}.",
            self.risk_tier
        )
    }
}

/// Holds at most one snapshot; each `set` replaces the previous one.
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    inner: RwLock<Option<ComparisonSnapshot>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, snapshot: ComparisonSnapshot) {
        let mut slot = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(snapshot);
    }

    pub fn get(&self) -> Option<ComparisonSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        let mut slot = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}
