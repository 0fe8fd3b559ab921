use super::tables::WeightMap;

/// Rescale weights so they sum to 100.
///
/// A zero total maps every factor to 0 instead of dividing by zero. The key
/// set is preserved exactly.
pub fn normalize_weights(weights: &WeightMap) -> WeightMap {
    let total: f64 = weights.values().sum();
    if total == 0.0 {
        return weights.keys().map(|k| (k.clone(), 0.0)).collect();
    }
    weights
        .iter()
        .map(|(k, v)| (k.clone(), (v / total) * 100.0))
        .collect()
}

/// Copy of `base` with `overrides` laid on top. Keys unknown to `base` are
/// carried over as-is.
pub fn apply_overrides(base: &WeightMap, overrides: &WeightMap) -> WeightMap {
    let mut merged = base.clone();
    for (factor, weight) in overrides {
        merged.insert(factor.clone(), *weight);
    }
    merged
}
