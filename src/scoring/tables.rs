use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Factor name -> relative weight. Need not sum to anything before normalization.
pub type WeightMap = BTreeMap<String, f64>;

/// Factor name -> chosen label for one record.
pub type SelectionMap = BTreeMap<String, String>;

/// Factor name -> contribution to the index, rounded to 2 decimals.
pub type ContributionMap = BTreeMap<String, f64>;

/// Choice labels and severity scores for one factor, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScale {
    pub name: String,
    pub choices: Vec<(String, u32)>,
}

impl FactorScale {
    fn new(name: &str, choices: &[(&str, u32)]) -> Self {
        Self {
            name: name.to_string(),
            choices: choices
                .iter()
                .map(|(label, score)| (label.to_string(), *score))
                .collect(),
        }
    }

    /// Severity score for a label. Matching is exact and case-sensitive.
    pub fn score(&self, label: &str) -> Option<u32> {
        self.choices
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, s)| *s)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|(l, _)| l.as_str())
    }
}

/// Per-factor scales of one model.
///
/// Factor order is presentation order: it drives batch column order and
/// choice listings. Lookups are by exact name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleTable {
    pub factors: Vec<FactorScale>,
}

impl ScaleTable {
    pub fn factor(&self, name: &str) -> Option<&FactorScale> {
        self.factors.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factor(name).is_some()
    }

    /// Score for `label` under `factor`, `None` when either is unknown.
    pub fn score(&self, factor: &str, label: &str) -> Option<u32> {
        self.factor(factor).and_then(|f| f.score(label))
    }

    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// First choice of every factor, the same pre-selection the input form shows.
    pub fn default_selections(&self) -> SelectionMap {
        self.factors
            .iter()
            .filter_map(|f| {
                f.choices
                    .first()
                    .map(|(label, _)| (f.name.clone(), label.clone()))
            })
            .collect()
    }
}

fn weights(entries: &[(&str, f64)]) -> WeightMap {
    entries
        .iter()
        .map(|(name, w)| (name.to_string(), *w))
        .collect()
}

pub static SCALES_CLASSIC: LazyLock<ScaleTable> = LazyLock::new(|| ScaleTable {
    factors: vec![
        FactorScale::new(
            "Idade",
            &[("Jovem (18–30)", 10), ("Adulto (31–50)", 40), ("Idoso (51+)", 70)],
        ),
        FactorScale::new(
            "Tipo físico",
            &[("Ectomorfo", 50), ("Mesomorfo", 20), ("Endomorfo", 70)],
        ),
        FactorScale::new(
            "Metabolismo basal",
            &[("Alto", 10), ("Médio", 40), ("Baixo", 70)],
        ),
        FactorScale::new(
            "Doenças crônicas",
            &[
                ("Nenhuma", 0),
                ("Leve (controlada)", 20),
                ("Moderada (ex.: DM2)", 50),
                ("Grave (descompensada)", 80),
            ],
        ),
        FactorScale::new(
            "Calorias",
            &[("Manutenção", 20), ("Superávit", 40), ("Déficit", 60)],
        ),
        FactorScale::new(
            "Psicológico/ambiente",
            &[("Favorável", 10), ("Neutro", 30), ("Desfavorável", 60)],
        ),
    ],
});

pub static WEIGHTS_CLASSIC: LazyLock<WeightMap> = LazyLock::new(|| {
    weights(&[
        ("Idade", 20.0),
        ("Tipo físico", 20.0),
        ("Metabolismo basal", 15.0),
        ("Doenças crônicas", 25.0),
        ("Calorias", 15.0),
        ("Psicológico/ambiente", 5.0),
    ])
});

pub static SCALES_V2: LazyLock<ScaleTable> = LazyLock::new(|| ScaleTable {
    factors: vec![
        FactorScale::new(
            "Idade",
            &[("Jovem (18–30)", 10), ("Adulto (31–50)", 40), ("Idoso (51+)", 70)],
        ),
        FactorScale::new(
            "Sexo biológico",
            &[("Homem", 20), ("Mulher", 30), ("Mulher pós-menopausa", 50)],
        ),
        FactorScale::new(
            "Composição corporal (% gordura)",
            &[("<20%", 10), ("20–30%", 40), (">30%", 70)],
        ),
        FactorScale::new(
            "Condição metabólica/doenças",
            &[("Saudável", 0), ("Leve", 20), ("Moderada", 50), ("Grave", 80)],
        ),
        FactorScale::new(
            "Nível de atividade física",
            &[("Ativo", 10), ("Moderado", 40), ("Sedentário", 70)],
        ),
        FactorScale::new(
            "Sono & recuperação",
            &[("Bom", 10), ("Regular", 40), ("Ruim", 70)],
        ),
        FactorScale::new(
            "Psicológico/ambiente",
            &[("Favorável", 10), ("Neutro", 30), ("Desfavorável", 60)],
        ),
    ],
});

pub static WEIGHTS_V2: LazyLock<WeightMap> = LazyLock::new(|| {
    weights(&[
        ("Idade", 15.0),
        ("Sexo biológico", 10.0),
        ("Composição corporal (% gordura)", 20.0),
        ("Condição metabólica/doenças", 20.0),
        ("Nível de atividade física", 15.0),
        ("Sono & recuperação", 10.0),
        ("Psicológico/ambiente", 10.0),
    ])
});

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown model '{0}' (expected 'classic' or 'v2')")]
pub struct ModelParseError(pub String);

/// A named bundle of scale table and default weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Classic,
    #[default]
    V2,
}

impl Model {
    pub const ALL: [Model; 2] = [Model::V2, Model::Classic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Classic => "classic",
            Model::V2 => "v2",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Model::Classic => "Clássico (somatótipos)",
            Model::V2 => "Versão 2 (objetiva — recomendado)",
        }
    }

    pub fn scales(&self) -> &'static ScaleTable {
        match self {
            Model::Classic => &SCALES_CLASSIC,
            Model::V2 => &SCALES_V2,
        }
    }

    /// Owned copy of the default weights; edits never reach the shared table.
    pub fn default_weights(&self) -> WeightMap {
        match self {
            Model::Classic => WEIGHTS_CLASSIC.clone(),
            Model::V2 => WEIGHTS_V2.clone(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Model::Classic),
            "v2" => Ok(Model::V2),
            other => Err(ModelParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_cover_every_factor() {
        for model in Model::ALL {
            let scales = model.scales();
            let weights = model.default_weights();
            assert_eq!(scales.len(), weights.len(), "model {}", model);
            for name in scales.factor_names() {
                assert!(weights.contains_key(name), "{} missing weight for {}", model, name);
            }
        }
    }

    #[test]
    fn test_default_weights_sum_to_100() {
        for model in Model::ALL {
            let total: f64 = model.default_weights().values().sum();
            assert_eq!(total, 100.0);
        }
    }

    #[test]
    fn test_score_lookup() {
        assert_eq!(SCALES_V2.score("Idade", "Idoso (51+)"), Some(70));
        assert_eq!(SCALES_V2.score("Composição corporal (% gordura)", "20–30%"), Some(40));
        assert_eq!(SCALES_CLASSIC.score("Tipo físico", "Mesomorfo"), Some(20));
    }

    #[test]
    fn test_score_lookup_is_case_sensitive() {
        assert_eq!(SCALES_V2.score("Idade", "idoso (51+)"), None);
        assert_eq!(SCALES_V2.score("idade", "Idoso (51+)"), None);
    }

    #[test]
    fn test_factor_order_is_declaration_order() {
        let names: Vec<&str> = SCALES_CLASSIC.factor_names().collect();
        assert_eq!(
            names,
            vec![
                "Idade",
                "Tipo físico",
                "Metabolismo basal",
                "Doenças crônicas",
                "Calorias",
                "Psicológico/ambiente",
            ]
        );
    }

    #[test]
    fn test_shared_factors_between_models() {
        assert!(SCALES_CLASSIC.contains("Idade"));
        assert!(SCALES_V2.contains("Idade"));
        assert!(SCALES_CLASSIC.contains("Psicológico/ambiente"));
        assert!(!SCALES_V2.contains("Tipo físico"));
        assert!(!SCALES_CLASSIC.contains("Sono & recuperação"));
    }

    #[test]
    fn test_default_selections_pick_first_choice() {
        let selections = SCALES_V2.default_selections();
        assert_eq!(selections.len(), 7);
        assert_eq!(selections["Idade"], "Jovem (18–30)");
        assert_eq!(selections["Condição metabólica/doenças"], "Saudável");
    }

    #[test]
    fn test_default_weights_are_copies() {
        let mut weights = Model::V2.default_weights();
        weights.insert("Idade".to_string(), 99.0);
        assert_eq!(WEIGHTS_V2["Idade"], 15.0);
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!("classic".parse::<Model>(), Ok(Model::Classic));
        assert_eq!("V2".parse::<Model>(), Ok(Model::V2));
        assert_eq!(
            "v3".parse::<Model>(),
            Err(ModelParseError("v3".to_string()))
        );
    }

    #[test]
    fn test_model_serde_lowercase() {
        let json = serde_json::to_string(&Model::Classic).unwrap();
        assert_eq!(json, "\"classic\"");
        let parsed: Model = serde_json::from_str("\"v2\"").unwrap();
        assert_eq!(parsed, Model::V2);
    }
}
