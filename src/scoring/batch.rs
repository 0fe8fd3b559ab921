use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

use super::engine::{compute_ier_with, IndexRounding};
use super::tables::{Model, ScaleTable, SelectionMap, WeightMap};
use super::weights::normalize_weights;

pub const COLUMN_IER: &str = "IER";
pub const CONTRIB_PREFIX: &str = "Contrib:";

/// One cell of tabular input.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Column name -> cell. Extra columns are ignored.
pub type Row = HashMap<String, Cell>;

/// Scored row: the index plus one contribution per selected factor, in the
/// model's factor order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub ier: f64,
    pub contributions: Vec<(String, f64)>,
}

impl OutputRow {
    /// Look up a column by its output name (`IER` or `Contrib:<factor>`).
    pub fn column(&self, key: &str) -> Option<f64> {
        if key == COLUMN_IER {
            return Some(self.ier);
        }
        let factor = key.strip_prefix(CONTRIB_PREFIX)?;
        self.contributions
            .iter()
            .find(|(name, _)| name == factor)
            .map(|(_, v)| *v)
    }

    /// Contribution of `factor`, 0 when the row had no selection for it.
    pub fn contribution(&self, factor: &str) -> f64 {
        self.column(&format!("{}{}", CONTRIB_PREFIX, factor))
            .unwrap_or(0.0)
    }

    pub fn columns(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        std::iter::once((COLUMN_IER.to_string(), self.ier)).chain(
            self.contributions
                .iter()
                .map(|(name, v)| (format!("{}{}", CONTRIB_PREFIX, name), *v)),
        )
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.contributions.len() + 1))?;
        for (key, value) in self.columns() {
            map.serialize_entry(&key, &value)?;
        }
        map.end()
    }
}

/// Build a selection from a row: one entry per scale factor whose cell is text.
pub fn selections_from_row(row: &Row, scales: &ScaleTable) -> SelectionMap {
    scales
        .factor_names()
        .filter_map(|factor| {
            row.get(factor)
                .and_then(Cell::as_text)
                .map(|label| (factor.to_string(), label.to_string()))
        })
        .collect()
}

/// Scores rows against one model. Weights are normalized once at construction.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    scales: &'static ScaleTable,
    weights: WeightMap,
    rounding: IndexRounding,
}

impl BatchRunner {
    pub fn new(model: Model) -> Self {
        Self {
            scales: model.scales(),
            weights: normalize_weights(&model.default_weights()),
            rounding: IndexRounding::default(),
        }
    }

    /// Replace the model's default weights.
    pub fn with_weights(mut self, weights: &WeightMap) -> Self {
        self.weights = normalize_weights(weights);
        self
    }

    pub fn with_rounding(mut self, rounding: IndexRounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    pub fn run_row(&self, row: &Row) -> OutputRow {
        let selections = selections_from_row(row, self.scales);
        let result = compute_ier_with(&selections, self.scales, &self.weights, self.rounding);
        let contributions = self
            .scales
            .factor_names()
            .filter_map(|factor| {
                result
                    .contributions
                    .get(factor)
                    .map(|v| (factor.to_string(), *v))
            })
            .collect();
        OutputRow {
            ier: result.index,
            contributions,
        }
    }

    /// Lazily score rows one at a time, in input order.
    pub fn stream<'a, I>(&'a self, rows: I) -> impl Iterator<Item = OutputRow> + 'a
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: 'a,
    {
        rows.into_iter().map(move |row| self.run_row(&row))
    }

    /// Score all rows in parallel. Output order matches input order.
    pub fn run(&self, rows: &[Row]) -> Vec<OutputRow> {
        tracing::debug!(rows = rows.len(), factors = self.scales.len(), "scoring batch");
        rows.par_iter().map(|row| self.run_row(row)).collect()
    }
}

pub fn batch_compute(rows: &[Row], model: Model) -> Vec<OutputRow> {
    BatchRunner::new(model).run(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, Cell)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn full_v2_row() -> Row {
        row(&[
            ("Idade", "Adulto (31–50)".into()),
            ("Sexo biológico", "Mulher".into()),
            ("Composição corporal (% gordura)", "20–30%".into()),
            ("Condição metabólica/doenças", "Leve".into()),
            ("Nível de atividade física", "Moderado".into()),
            ("Sono & recuperação", "Regular".into()),
            ("Psicológico/ambiente", "Neutro".into()),
        ])
    }

    #[test]
    fn test_empty_batch() {
        assert!(batch_compute(&[], Model::V2).is_empty());
    }

    #[test]
    fn test_full_row() {
        let out = batch_compute(&[full_v2_row()], Model::V2);
        assert_eq!(out.len(), 1);
        // 6 + 3 + 8 + 4 + 6 + 4 + 3
        assert_eq!(out[0].ier, 34.0);
        assert_eq!(out[0].contributions.len(), 7);
        assert_eq!(out[0].column("Contrib:Idade"), Some(6.0));
    }

    #[test]
    fn test_mixed_rows_keep_order() {
        let mut unknown_label = full_v2_row();
        unknown_label.insert("Sexo biológico".to_string(), "Outro".into());

        let mut missing_column = full_v2_row();
        missing_column.remove("Idade");

        let out = batch_compute(&[full_v2_row(), unknown_label, missing_column], Model::V2);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].ier, 34.0);
        assert_eq!(out[1].column("Contrib:Sexo biológico"), Some(0.0));
        assert_eq!(out[1].ier, 31.0);
        assert_eq!(out[2].column("Contrib:Idade"), None);
        assert_eq!(out[2].contribution("Idade"), 0.0);
        assert_eq!(out[2].contribution("Sono & recuperação"), 4.0);
        assert_eq!(out[2].ier, 28.0);
        assert!(out.iter().all(|r| r.column(COLUMN_IER).is_some()));
    }

    #[test]
    fn test_non_text_cells_are_not_selections() {
        let r = row(&[
            ("Idade", Cell::Number(40.0)),
            ("Sexo biológico", Cell::Empty),
            ("Sono & recuperação", "Ruim".into()),
        ]);
        let selections = selections_from_row(&r, Model::V2.scales());
        assert_eq!(selections.len(), 1);
        assert_eq!(selections["Sono & recuperação"], "Ruim");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let mut r = full_v2_row();
        r.insert("Paciente".to_string(), "Maria".into());
        r.insert("Tipo físico".to_string(), "Endomorfo".into());
        let out = batch_compute(&[r], Model::V2);
        assert_eq!(out[0].ier, 34.0);
        assert_eq!(out[0].column("Contrib:Tipo físico"), None);
    }

    #[test]
    fn test_classic_model_reads_classic_columns() {
        let r = row(&[
            ("Idade", "Idoso (51+)".into()),
            ("Tipo físico", "Endomorfo".into()),
            ("Sexo biológico", "Mulher".into()),
        ]);
        let out = batch_compute(&[r], Model::Classic);
        // 70*20% + 70*20%
        assert_eq!(out[0].ier, 28.0);
        assert_eq!(out[0].contributions.len(), 2);
    }

    #[test]
    fn test_output_columns_follow_model_order() {
        let out = batch_compute(&[full_v2_row()], Model::V2);
        let keys: Vec<String> = out[0].columns().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "IER");
        assert_eq!(keys[1], "Contrib:Idade");
        assert_eq!(keys[2], "Contrib:Sexo biológico");
        assert_eq!(keys[7], "Contrib:Psicológico/ambiente");
    }

    #[test]
    fn test_stream_matches_run() {
        let rows = vec![full_v2_row(), Row::new(), full_v2_row()];
        let runner = BatchRunner::new(Model::V2);
        let streamed: Vec<OutputRow> = runner.stream(rows.clone()).collect();
        assert_eq!(streamed, runner.run(&rows));
        assert_eq!(streamed[1].ier, 0.0);
        assert!(streamed[1].contributions.is_empty());
    }

    #[test]
    fn test_equal_weights_round_the_exact_sum() {
        let first_choices: Row = Model::V2
            .scales()
            .default_selections()
            .into_iter()
            .map(|(factor, label)| (factor, Cell::Text(label)))
            .collect();
        let weights: WeightMap = Model::V2
            .default_weights()
            .into_keys()
            .map(|k| (k, 1.0))
            .collect();
        let runner = BatchRunner::new(Model::V2).with_weights(&weights);
        let out = runner.run(&[first_choices.clone()]);
        assert_eq!(out[0].ier, 10.0);
        assert_eq!(out[0].contribution("Idade"), 1.43);

        let summed = runner
            .with_rounding(IndexRounding::SumOfRounded)
            .run(&[first_choices]);
        assert_eq!(summed[0].ier, 10.01);
    }

    #[test]
    fn test_custom_weights() {
        let mut weights = WeightMap::new();
        weights.insert("Idade".to_string(), 1.0);
        let runner = BatchRunner::new(Model::V2).with_weights(&weights);
        let out = runner.run(&[full_v2_row()]);
        assert_eq!(out[0].ier, 40.0);
        assert_eq!(runner.weights()["Idade"], 100.0);
    }

    #[test]
    fn test_cell_deserialize() {
        let r: Row = serde_json::from_str(r#"{"Idade": "Idoso (51+)", "Sexo biológico": 3, "Sono & recuperação": null}"#)
            .unwrap();
        assert_eq!(r["Idade"], Cell::Text("Idoso (51+)".to_string()));
        assert_eq!(r["Sexo biológico"], Cell::Number(3.0));
        assert_eq!(r["Sono & recuperação"], Cell::Empty);
    }

    #[test]
    fn test_output_row_serializes_flat() {
        let out = OutputRow {
            ier: 12.5,
            contributions: vec![("Idade".to_string(), 1.5)],
        };
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"IER":12.5,"Contrib:Idade":1.5}"#);
    }
}
