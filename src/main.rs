use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::time::Instant;

use ier::config::Config;
use ier::scoring::{
    apply_overrides, compute_ier_with, normalize_weights, validate_weights, BatchRunner, Model,
    WeightMap,
};

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 4;
const EXIT_INPUT: i32 = 5;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum BatchFormat {
    #[default]
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the index for one record
    Compute {
        /// Model to score with (defaults to the config file, then v2)
        #[arg(short, long, value_enum)]
        model: Option<Model>,

        /// Chosen label for a factor, e.g. --select "Idade=Idoso (51+)"
        #[arg(short, long = "select", value_name = "FACTOR=LABEL")]
        selections: Vec<String>,

        /// Override a factor weight, e.g. --weight "Idade=25"
        #[arg(short, long = "weight", value_name = "FACTOR=N")]
        weights: Vec<String>,

        /// Pre-select the first choice of every factor not given with --select
        #[arg(long)]
        fill_defaults: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score every row of a JSON array (reads stdin when FILE is omitted)
    Batch {
        #[arg(short, long, value_enum)]
        model: Option<Model>,

        #[arg(short, long, value_enum, default_value_t = BatchFormat::Tsv)]
        format: BatchFormat,

        file: Option<PathBuf>,
    },
    /// List factors, choices, scores and default weights
    Scales {
        /// Only this model (both when omitted)
        #[arg(short, long, value_enum)]
        model: Option<Model>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "ier")]
#[command(about = "Relative Effort Index calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/ier/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Effective weights for `model`: defaults, then config overrides, then CLI
/// overrides. Exits on invalid overrides.
fn resolve_weights(config: &Config, model: Model, cli_overrides: &WeightMap) -> WeightMap {
    let configured = config.overrides_for(model);
    let merged_overrides = apply_overrides(&configured, cli_overrides);
    if let Err(errors) = validate_weights(model, &merged_overrides) {
        eprintln!("Weight errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
    apply_overrides(&model.default_weights(), &merged_overrides)
}

fn open_input(file: Option<&PathBuf>) -> io::Result<Box<dyn Read>> {
    match file {
        Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn main() {
    let cli = Cli::parse();
    ier::logging::init(cli.verbose);
    let start_time = Instant::now();

    let config_path = cli.config.map(PathBuf::from);
    let config = match ier::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let use_colors = ier::output::should_use_colors();

    match cli.command {
        Commands::Compute {
            model,
            selections,
            weights,
            fill_defaults,
            json,
        } => {
            let model = model.unwrap_or_else(|| config.model());
            let scales = model.scales();

            let cli_weights = match ier::input::parse_weights(&weights) {
                Ok(w) => w,
                Err(e) => {
                    eprintln!("Invalid --weight: {}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };
            let mut selections = match ier::input::parse_selections(&selections) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Invalid --select: {}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };
            if fill_defaults {
                for (factor, label) in scales.default_selections() {
                    selections.entry(factor).or_insert(label);
                }
            }

            let weights = resolve_weights(&config, model, &cli_weights);
            let normalized = normalize_weights(&weights);
            let result = compute_ier_with(&selections, scales, &normalized, config.index_rounding());

            if cli.verbose {
                eprintln!("Model: {} ({})", model.display_name(), model);
                for (factor, label) in &selections {
                    if scales.score(factor, label).is_none() {
                        eprintln!("  No score for {} = '{}', counted as 0", factor, label);
                    }
                }
            }

            if json {
                match serde_json::to_string_pretty(&result) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Failed to serialize result: {}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                }
            } else {
                let breakdown = ier::output::Breakdown {
                    result: &result,
                    selections: &selections,
                    weights: &normalized,
                    scales,
                };
                println!("{}", ier::output::format_breakdown(&breakdown, use_colors));
            }
        }
        Commands::Batch {
            model,
            format,
            file,
        } => {
            let model = model.unwrap_or_else(|| config.model());
            let weights = resolve_weights(&config, model, &WeightMap::new());

            let reader = match open_input(file.as_ref()) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Failed to open input: {}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };
            let rows = match ier::input::read_rows(reader) {
                Ok(rows) => rows,
                Err(e) => {
                    eprintln!("Input error: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };

            let runner = BatchRunner::new(model)
                .with_weights(&weights)
                .with_rounding(config.index_rounding());
            let results = runner.run(&rows);

            match format {
                BatchFormat::Tsv => {
                    println!("{}", ier::output::format_batch_tsv(&results, model.scales()));
                }
                BatchFormat::Json => match ier::output::format_batch_json(&results) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Failed to serialize results: {}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                },
            }

            if cli.verbose {
                eprintln!("Scored {} rows in {:?}", results.len(), start_time.elapsed());
            }
        }
        Commands::Scales { model } => {
            let models: Vec<Model> = match model {
                Some(m) => vec![m],
                None => Model::ALL.to_vec(),
            };
            let sections: Vec<String> = models
                .into_iter()
                .map(|m| ier::output::format_scales(m, use_colors))
                .collect();
            println!("{}", sections.join("\n\n"));
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
