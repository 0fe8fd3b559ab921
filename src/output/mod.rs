pub mod formatter;

pub use formatter::{
    format_batch_json, format_batch_tsv, format_breakdown, format_index, format_scales,
    should_use_colors, Breakdown,
};
