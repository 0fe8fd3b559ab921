pub mod batch;
pub mod engine;
pub mod tables;
pub mod validation;
pub mod weights;

pub use batch::{batch_compute, BatchRunner, Cell, OutputRow, Row, COLUMN_IER, CONTRIB_PREFIX};
pub use engine::{compute_ier, compute_ier_with, round2, EffortBand, IerResult, IndexRounding};
pub use tables::*;
pub use validation::validate_weights;
pub use weights::{apply_overrides, normalize_weights};
