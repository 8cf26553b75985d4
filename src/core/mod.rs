mod allocation;
mod engine;
mod risk;
mod types;

pub use allocation::{allocation_for, expected_return_for, normalize};
pub use engine::{
    annual_to_monthly_rate, fd_equivalent_principal, future_value_annuity, future_value_lump_sum,
    inflation_adjust_series, present_value, project, project_fd_corpus, project_portfolio_corpus,
    yearly_trajectory,
};
pub use risk::classify;
pub use types::{
    AllocationMix, AssetClass, InvestmentGoal, InvestorProfile, ProjectionResult, RiskAssessment,
    RiskTier,
};
