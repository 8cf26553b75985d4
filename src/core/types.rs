use std::fmt;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum InvestmentGoal {
    #[serde(rename = "Wealth Creation")]
    WealthCreation,
    Retirement,
    Education,
    #[serde(rename = "Home Purchase")]
    HomePurchase,
    #[serde(rename = "Emergency Fund")]
    EmergencyFund,
    Other,
}

impl InvestmentGoal {
    pub const ALL: [InvestmentGoal; 6] = [
        InvestmentGoal::WealthCreation,
        InvestmentGoal::Retirement,
        InvestmentGoal::Education,
        InvestmentGoal::HomePurchase,
        InvestmentGoal::EmergencyFund,
        InvestmentGoal::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            InvestmentGoal::WealthCreation => "Wealth Creation",
            InvestmentGoal::Retirement => "Retirement",
            InvestmentGoal::Education => "Education",
            InvestmentGoal::HomePurchase => "Home Purchase",
            InvestmentGoal::EmergencyFund => "Emergency Fund",
            InvestmentGoal::Other => "Other",
        }
    }

    /// Goals that push the risk score towards growth.
    pub fn is_growth_goal(self) -> bool {
        matches!(
            self,
            InvestmentGoal::WealthCreation | InvestmentGoal::Retirement
        )
    }

    /// Case-insensitive; `-` and `_` stand in for spaces.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|goal| goal.label().eq_ignore_ascii_case(&wanted))
    }
}

impl fmt::Display for InvestmentGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validated investor inputs for a single run. Rates are fractions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorProfile {
    pub age: u32,
    pub monthly_income: f64,
    pub monthly_investment: f64,
    pub current_savings: f64,
    pub horizon_years: u32,
    pub inflation_rate: f64,
    pub fd_rate: f64,
    pub goals: Vec<InvestmentGoal>,
}

impl InvestorProfile {
    /// First selected goal; `None` only for an unvalidated profile.
    pub fn top_goal(&self) -> Option<InvestmentGoal> {
        self.goals.first().copied()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub score: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum AssetClass {
    Equity,
    Debt,
    Gold,
    Cash,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Equity,
        AssetClass::Debt,
        AssetClass::Gold,
        AssetClass::Cash,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AssetClass::Equity => "Equity",
            AssetClass::Debt => "Debt",
            AssetClass::Gold => "Gold",
            AssetClass::Cash => "Cash",
        }
    }
}

/// Fractional weights over the fixed asset universe. Weights are
/// non-negative and sum to 1.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllocationMix {
    pub equity: f64,
    pub debt: f64,
    pub gold: f64,
    pub cash: f64,
}

impl AllocationMix {
    pub fn weight(&self, class: AssetClass) -> f64 {
        match class {
            AssetClass::Equity => self.equity,
            AssetClass::Debt => self.debt,
            AssetClass::Gold => self.gold,
            AssetClass::Cash => self.cash,
        }
    }

    pub(crate) fn weight_mut(&mut self, class: AssetClass) -> &mut f64 {
        match class {
            AssetClass::Equity => &mut self.equity,
            AssetClass::Debt => &mut self.debt,
            AssetClass::Gold => &mut self.gold,
            AssetClass::Cash => &mut self.cash,
        }
    }

    pub fn total(&self) -> f64 {
        self.equity + self.debt + self.gold + self.cash
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, f64)> + '_ {
        AssetClass::ALL
            .into_iter()
            .map(move |class| (class, self.weight(class)))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub portfolio_future_value: f64,
    pub portfolio_real_value: f64,
    pub fd_future_value: f64,
    pub fd_real_value: f64,
    pub years: Vec<u32>,
    pub nominal_balances: Vec<f64>,
    pub real_balances: Vec<f64>,
}
