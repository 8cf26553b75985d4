use serde_json::{Map, Value};

use super::types::{AllocationMix, AssetClass, RiskTier};

pub fn allocation_for(tier: RiskTier) -> AllocationMix {
    match tier {
        RiskTier::Low => AllocationMix {
            equity: 0.20,
            debt: 0.65,
            gold: 0.10,
            cash: 0.05,
        },
        RiskTier::Medium => AllocationMix {
            equity: 0.55,
            debt: 0.30,
            gold: 0.10,
            cash: 0.05,
        },
        RiskTier::High => AllocationMix {
            equity: 0.75,
            debt: 0.15,
            gold: 0.05,
            cash: 0.05,
        },
    }
}

pub fn expected_return_for(tier: RiskTier) -> f64 {
    match tier {
        RiskTier::Low => 0.07,
        RiskTier::Medium => 0.11,
        RiskTier::High => 0.14,
    }
}

/// Coerces an untrusted asset-class map into a valid mix.
///
/// Keys are matched case-insensitively against the four asset classes.
/// Missing, non-numeric, negative or non-finite entries take the default's
/// weight. Numeric strings are accepted and booleans count as 1 or 0. The
/// result is rescaled to sum to 1. When nothing usable was supplied, or the total is not positive, `default`
/// is returned unchanged.
pub fn normalize(raw: &Map<String, Value>, default: &AllocationMix) -> AllocationMix {
    let mut mix = *default;
    let mut overridden = false;

    for class in AssetClass::ALL {
        if let Some(weight) = lookup(raw, class).and_then(coerce_weight) {
            *mix.weight_mut(class) = weight;
            overridden = true;
        }
    }

    let total = mix.total();
    if !overridden || total <= 0.0 {
        return *default;
    }

    for class in AssetClass::ALL {
        *mix.weight_mut(class) /= total;
    }
    mix
}

fn lookup(raw: &Map<String, Value>, class: AssetClass) -> Option<&Value> {
    raw.get(class.label()).or_else(|| {
        raw.iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(class.label()))
            .map(|(_, value)| value)
    })
}

fn coerce_weight(value: &Value) -> Option<f64> {
    let weight = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        _ => return None,
    };
    (weight.is_finite() && weight >= 0.0).then_some(weight)
}
