//! Relative Effort Index (IER).
//!
//! Scores categorical health factors (age bracket, body composition,
//! metabolic condition, activity level, ...) against a fixed scale table and
//! combines them with normalized weights into a single 0–100 index. Two
//! models are built in, `classic` and `v2`.
//!
//! ```
//! use ier::scoring::{compute_ier, SelectionMap, SCALES_V2, WEIGHTS_V2};
//!
//! let mut selections = SelectionMap::new();
//! selections.insert("Idade".to_string(), "Idoso (51+)".to_string());
//! let result = compute_ier(&selections, &SCALES_V2, &WEIGHTS_V2);
//! assert_eq!(result.index, 10.5);
//! ```

pub mod config;
pub mod input;
pub mod logging;
pub mod output;
pub mod scoring;
