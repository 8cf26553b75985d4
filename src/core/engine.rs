use super::types::{InvestorProfile, ProjectionResult};

const MONTHS_PER_YEAR: u32 = 12;

pub fn future_value_lump_sum(principal: f64, periodic_rate: f64, num_periods: u32) -> f64 {
    principal * growth_factor(periodic_rate, num_periods)
}

pub fn future_value_annuity(payment: f64, periodic_rate: f64, num_periods: u32) -> f64 {
    if periodic_rate == 0.0 {
        return payment * num_periods as f64;
    }
    payment * ((growth_factor(periodic_rate, num_periods) - 1.0) / periodic_rate)
}

/// Monthly rate that compounds to `annual_rate` over twelve months.
pub fn annual_to_monthly_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / MONTHS_PER_YEAR as f64) - 1.0
}

pub fn present_value(future_value: f64, discount_rate: f64, years: u32) -> f64 {
    future_value / growth_factor(discount_rate, years)
}

/// Closed-form portfolio value: savings as a lump sum plus the monthly
/// contributions as an ordinary annuity, both compounded monthly.
pub fn project_portfolio_corpus(
    current_savings: f64,
    monthly_investment: f64,
    annual_return: f64,
    years: u32,
) -> f64 {
    let months = years.saturating_mul(MONTHS_PER_YEAR);
    let monthly_rate = annual_to_monthly_rate(annual_return);
    future_value_lump_sum(current_savings, monthly_rate, months)
        + future_value_annuity(monthly_investment, monthly_rate, months)
}

/// Fixed deposits compound annually, unlike the monthly portfolio projection.
pub fn project_fd_corpus(principal: f64, annual_rate: f64, years: u32) -> f64 {
    principal * growth_factor(annual_rate, years)
}

/// Month-by-month simulation: growth first, then the contribution.
/// Returns the balance at the end of each year, `years` entries.
pub fn yearly_trajectory(
    current_savings: f64,
    monthly_investment: f64,
    annual_return: f64,
    years: u32,
) -> Vec<f64> {
    let monthly_rate = annual_to_monthly_rate(annual_return);
    let mut balance = current_savings;
    let mut balances = Vec::with_capacity(years as usize);
    for _ in 0..years {
        for _ in 0..MONTHS_PER_YEAR {
            balance = balance * (1.0 + monthly_rate) + monthly_investment;
        }
        balances.push(balance);
    }
    balances
}

/// Discounts `values[i]` by `years[i]` years of inflation. Pairs beyond the
/// shorter of the two slices are dropped.
pub fn inflation_adjust_series(values: &[f64], inflation_rate: f64, years: &[u32]) -> Vec<f64> {
    values
        .iter()
        .zip(years)
        .map(|(&value, &year)| present_value(value, inflation_rate, year))
        .collect()
}

/// Fixed-deposit proxy principal: everything the investor would put in over
/// the horizon, deposited up front.
pub fn fd_equivalent_principal(profile: &InvestorProfile) -> f64 {
    profile.current_savings
        + profile.monthly_investment * MONTHS_PER_YEAR as f64 * profile.horizon_years as f64
}

pub fn project(profile: &InvestorProfile, expected_return: f64) -> ProjectionResult {
    let horizon = profile.horizon_years;
    let inflation = profile.inflation_rate;

    let portfolio_future_value = project_portfolio_corpus(
        profile.current_savings,
        profile.monthly_investment,
        expected_return,
        horizon,
    );
    let fd_future_value =
        project_fd_corpus(fd_equivalent_principal(profile), profile.fd_rate, horizon);

    let years = (1..=horizon).collect::<Vec<_>>();
    let nominal_balances = yearly_trajectory(
        profile.current_savings,
        profile.monthly_investment,
        expected_return,
        horizon,
    );
    let real_balances = inflation_adjust_series(&nominal_balances, inflation, &years);

    ProjectionResult {
        portfolio_future_value,
        portfolio_real_value: present_value(portfolio_future_value, inflation, horizon),
        fd_future_value,
        fd_real_value: present_value(fd_future_value, inflation, horizon),
        years,
        nominal_balances,
        real_balances,
    }
}

// `powi` takes an i32; periods past i32::MAX would wrap negative.
fn growth_factor(rate: f64, periods: u32) -> f64 {
    (1.0 + rate).powf(f64::from(periods))
}
