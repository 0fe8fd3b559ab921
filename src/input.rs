use anyhow::{Context, Result};
use std::io::Read;
use thiserror::Error;

use crate::scoring::{Row, SelectionMap, WeightMap};

#[derive(Debug, Error, PartialEq)]
pub enum AssignmentError {
    #[error("expected FACTOR=VALUE, got '{0}'")]
    MissingEquals(String),
    #[error("empty factor name in '{0}'")]
    EmptyFactor(String),
    #[error("invalid weight '{value}' for factor '{factor}'")]
    InvalidWeight { factor: String, value: String },
}

/// Split a `FACTOR=VALUE` argument. Only the first `=` separates, so labels
/// may contain `=`. The value is kept verbatim since labels match exactly.
pub fn parse_assignment(arg: &str) -> Result<(String, String), AssignmentError> {
    let (factor, value) = arg
        .split_once('=')
        .ok_or_else(|| AssignmentError::MissingEquals(arg.to_string()))?;
    let factor = factor.trim();
    if factor.is_empty() {
        return Err(AssignmentError::EmptyFactor(arg.to_string()));
    }
    Ok((factor.to_string(), value.to_string()))
}

pub fn parse_selections(args: &[String]) -> Result<SelectionMap, AssignmentError> {
    args.iter().map(String::as_str).map(parse_assignment).collect()
}

pub fn parse_weights(args: &[String]) -> Result<WeightMap, AssignmentError> {
    args.iter()
        .map(|a| {
            let (factor, value) = parse_assignment(a)?;
            let weight = value
                .trim()
                .parse::<f64>()
                .map_err(|_| AssignmentError::InvalidWeight {
                    factor: factor.clone(),
                    value: value.clone(),
                })?;
            Ok((factor, weight))
        })
        .collect()
}

/// Read batch rows: a JSON array of objects mapping column name to a string,
/// number or null.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>> {
    serde_json::from_reader(reader).context("Failed to parse rows: expected a JSON array of objects")
}
