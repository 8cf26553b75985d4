use super::types::{InvestmentGoal, RiskAssessment, RiskTier};

const LONG_HORIZON_YEARS: u32 = 15;
const HIGH_SAVINGS_RATE: f64 = 0.3;

/// Additive rule score mapped onto a tier: <=2 Low, 3-4 Medium, >=5 High.
pub fn classify(
    age: u32,
    horizon_years: u32,
    goals: &[InvestmentGoal],
    monthly_investment: f64,
    monthly_income: f64,
) -> RiskAssessment {
    let mut score = age_points(age);

    if horizon_years >= LONG_HORIZON_YEARS {
        score += 2;
    }
    if savings_rate(monthly_investment, monthly_income) >= HIGH_SAVINGS_RATE {
        score += 1;
    }
    if goals.iter().any(|goal| goal.is_growth_goal()) {
        score += 1;
    }

    RiskAssessment {
        tier: tier_for_score(score),
        score,
    }
}

fn age_points(age: u32) -> u32 {
    match age {
        0..35 => 2,
        35..=50 => 1,
        _ => 0,
    }
}

// Income is floored at 1 so zero or negative income never divides by zero.
fn savings_rate(monthly_investment: f64, monthly_income: f64) -> f64 {
    monthly_investment / monthly_income.max(1.0)
}

fn tier_for_score(score: u32) -> RiskTier {
    match score {
        0..=2 => RiskTier::Low,
        3..=4 => RiskTier::Medium,
        _ => RiskTier::High,
    }
}
