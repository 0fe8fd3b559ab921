use serde::{Deserialize, Serialize};

use crate::scoring::{apply_overrides, IndexRounding, Model, WeightMap};

/// Top-level configuration file.
///
/// Example YAML:
/// ```yaml
/// model: v2
/// index_rounding: round_of_sum
/// weights:
///   v2:
///     "Idade": 20
///   classic:
///     "Calorias": 10
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Model used when none is given on the command line (default: v2)
    #[serde(default)]
    pub model: Option<Model>,

    /// How the index total is derived from contributions
    #[serde(default)]
    pub index_rounding: Option<IndexRounding>,

    /// Per-model weight overrides merged onto the defaults
    #[serde(default)]
    pub weights: Option<WeightOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightOverrides {
    #[serde(default)]
    pub classic: Option<WeightMap>,
    #[serde(default)]
    pub v2: Option<WeightMap>,
}

impl Config {
    pub fn model(&self) -> Model {
        self.model.unwrap_or_default()
    }

    pub fn index_rounding(&self) -> IndexRounding {
        self.index_rounding.unwrap_or_default()
    }

    /// Overrides configured for `model`, empty when none.
    pub fn overrides_for(&self, model: Model) -> WeightMap {
        let overrides = self.weights.as_ref().and_then(|w| match model {
            Model::Classic => w.classic.as_ref(),
            Model::V2 => w.v2.as_ref(),
        });
        overrides.cloned().unwrap_or_default()
    }

    /// Effective, un-normalized weights for `model`.
    pub fn weights_for(&self, model: Model) -> WeightMap {
        apply_overrides(&model.default_weights(), &self.overrides_for(model))
    }
}
