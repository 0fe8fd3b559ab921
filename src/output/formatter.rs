use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::{
    EffortBand, IerResult, Model, OutputRow, ScaleTable, SelectionMap, WeightMap, COLUMN_IER,
    CONTRIB_PREFIX,
};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Index and contributions are always shown with two decimals
pub fn format_index(index: f64) -> String {
    format!("{:.2}", index)
}

/// A scored record with everything needed to explain it
pub struct Breakdown<'a> {
    pub result: &'a IerResult,
    pub selections: &'a SelectionMap,
    /// Normalized weights (sum to 100)
    pub weights: &'a WeightMap,
    pub scales: &'a ScaleTable,
}

impl Breakdown<'_> {
    /// Scored factors in the model's order, then any factor the model doesn't know
    fn ordered_factors(&self) -> Vec<&str> {
        let mut ordered: Vec<&str> = self
            .scales
            .factor_names()
            .filter(|f| self.result.contributions.contains_key(*f))
            .collect();
        for factor in self.result.contributions.keys() {
            if !self.scales.contains(factor) {
                ordered.push(factor);
            }
        }
        ordered
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a label to fit available width, accounting for Unicode
fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

fn band_line(index: f64, band: EffortBand, use_colors: bool) -> String {
    let text = format!("IER (0–100): {}  esforço relativo {}", format_index(index), band);
    if !use_colors {
        return text;
    }
    match band {
        EffortBand::Low => text.green().bold().to_string(),
        EffortBand::Moderate => text.yellow().bold().to_string(),
        EffortBand::High => text.red().bold().to_string(),
    }
}

/// Format one record as a per-factor table followed by the index line.
/// Columns: factor, choice, weight (%), contribution
pub fn format_breakdown(breakdown: &Breakdown, use_colors: bool) -> String {
    let factors = breakdown.ordered_factors();
    let factor_width = factors
        .iter()
        .map(|f| f.chars().count())
        .max()
        .unwrap_or(0);

    // Weight column: 5 chars ("100.0"), contribution column: 6 chars ("100.00")
    let separator = "  ";
    let fixed_width = factor_width + 5 + 6 + separator.len() * 3;
    let choice_width = get_terminal_width()
        .filter(|w| *w > fixed_width + 10)
        .map(|w| w - fixed_width);

    let mut lines: Vec<String> = factors
        .iter()
        .map(|factor| {
            let choice = breakdown
                .selections
                .get(*factor)
                .map(String::as_str)
                .unwrap_or("");
            let choice = match choice_width {
                Some(width) => pad(&truncate_label(choice, width), width),
                None => choice.to_string(),
            };
            let weight = breakdown.weights.get(*factor).copied().unwrap_or(0.0);
            let contribution = breakdown.result.contributions[*factor];
            let factor_padded = pad(factor, factor_width);
            let weight_str = format!("{:>5.1}", weight);
            let contribution_str = format!("{:>6.2}", contribution);

            if use_colors {
                format!(
                    "{}{}{}{}{}{}{}",
                    factor_padded.bold(),
                    separator,
                    choice.cyan(),
                    separator,
                    weight_str.dimmed(),
                    separator,
                    contribution_str
                )
            } else {
                format!(
                    "{}{}{}{}{}{}{}",
                    factor_padded, separator, choice, separator, weight_str, separator, contribution_str
                )
            }
        })
        .collect();

    if lines.is_empty() {
        lines.push("No factors selected.".to_string());
    }
    lines.push(String::new());
    lines.push(band_line(
        breakdown.result.index,
        breakdown.result.band(),
        use_colors,
    ));
    lines.join("\n")
}

/// List a model's factors with their choices, scores and default weights
pub fn format_scales(model: Model, use_colors: bool) -> String {
    let weights = model.default_weights();
    let mut out = Vec::new();

    let title = format!("{} [{}]", model.display_name(), model);
    out.push(if use_colors {
        title.bold().to_string()
    } else {
        title
    });

    for factor in &model.scales().factors {
        let weight = weights.get(&factor.name).copied().unwrap_or(0.0);
        let heading = format!("  {} (peso {})", factor.name, weight);
        out.push(if use_colors {
            heading.cyan().to_string()
        } else {
            heading
        });
        for (label, score) in &factor.choices {
            out.push(format!("    {:>3}  {}", score, label));
        }
    }
    out.join("\n")
}

/// Format batch results as tab-separated values with a header row.
/// One `IER` column, then one `Contrib:<factor>` column per factor in model
/// order. Factors a row had no selection for are left empty.
pub fn format_batch_tsv(rows: &[OutputRow], scales: &ScaleTable) -> String {
    let mut header = vec![COLUMN_IER.to_string()];
    header.extend(
        scales
            .factor_names()
            .map(|f| format!("{}{}", CONTRIB_PREFIX, f)),
    );

    let mut lines = vec![header.join("\t")];
    for row in rows {
        let mut cells = vec![format_index(row.ier)];
        for factor in scales.factor_names() {
            let key = format!("{}{}", CONTRIB_PREFIX, factor);
            cells.push(row.column(&key).map(format_index).unwrap_or_default());
        }
        lines.push(cells.join("\t"));
    }
    lines.join("\n")
}

/// Format batch results as a JSON array of flat objects
pub fn format_batch_json(rows: &[OutputRow]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}
