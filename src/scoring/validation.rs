use super::tables::{Model, WeightMap};
use super::weights::apply_overrides;

/// Validate weight overrides for a model at startup.
/// Returns all validation errors at once (not just the first).
///
/// Scoring itself never rejects input; this only guards the config file and
/// command-line overrides against typos.
pub fn validate_weights(model: Model, overrides: &WeightMap) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let scales = model.scales();

    for (factor, weight) in overrides {
        if !scales.contains(factor) {
            let known = scales.factor_names().collect::<Vec<_>>().join(", ");
            errors.push(format!(
                "weights.{}.{}: unknown factor (expected one of: {})",
                model, factor, known
            ));
        }
        if !weight.is_finite() {
            errors.push(format!(
                "weights.{}.{}: must be a finite number",
                model, factor
            ));
        } else if *weight < 0.0 {
            errors.push(format!(
                "weights.{}.{}: must be non-negative (got {})",
                model, factor, weight
            ));
        }
    }

    let effective = apply_overrides(&model.default_weights(), overrides);
    if !effective.is_empty() && effective.values().all(|w| *w == 0.0) {
        errors.push(format!(
            "weights.{}: every factor weight is zero, the index would always be 0",
            model
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
