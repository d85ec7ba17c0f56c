//! Gridcalc - A spreadsheet calculator for the command line

mod config;

use anyhow::Context;
use gridcalc_core::storage::to_csv_string;
use gridcalc_core::{CellRange, CellRef, CsvValues, Document, GridcalcError};
use gridcalc_engine::engine::parse_range;
use std::env;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage: gridcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    CSV file to load");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <A1=VALUE>      Set a cell before output (can be repeated)");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula against the sheet and print it");
    eprintln!("  -o, --output <FILE>       Write the sheet to a CSV file");
    eprintln!("  --raw                     Write raw contents instead of computed values");
    eprintln!("  --range <A1:B5>           Only output this range");
    eprintln!("  --rows <N>                Minimum number of rows");
    eprintln!("  --cols <N>                Minimum number of columns");
    eprintln!("  --config <path>           Load settings from TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  --functions               List available functions");
    eprintln!("  -v, --verbose             Log recalculation details");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    edits: Vec<String>,
    command: Option<String>,
    output_file: Option<PathBuf>,
    raw: bool,
    range: Option<String>,
    rows: Option<usize>,
    cols: Option<usize>,
    config_file: Option<PathBuf>,
    no_config: bool,
    list_functions: bool,
    verbose: bool,
}

fn require_value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    match args.get(i) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires {}", flag, what);
            std::process::exit(1);
        }
    }
}

fn require_count(args: &[String], i: usize, flag: &str) -> usize {
    let value = require_value(args, i, flag, "a number");
    match value.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            eprintln!("Error: {} expects a positive number, got '{}'", flag, value);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-s" | "--set" => {
                i += 1;
                let edit = require_value(&args, i, "--set", "a CELL=VALUE pair");
                opts.edits.push(edit.to_string());
            }
            "-c" | "--command" => {
                i += 1;
                let formula = require_value(&args, i, "--command", "a formula");
                opts.command = Some(formula.to_string());
            }
            "-o" | "--output" => {
                i += 1;
                let path = require_value(&args, i, "--output", "a file path");
                opts.output_file = Some(PathBuf::from(path));
            }
            "--raw" => opts.raw = true,
            "--range" => {
                i += 1;
                opts.range = Some(require_value(&args, i, "--range", "a range").to_string());
            }
            "--rows" => {
                i += 1;
                opts.rows = Some(require_count(&args, i, "--rows"));
            }
            "--cols" => {
                i += 1;
                opts.cols = Some(require_count(&args, i, "--cols"));
            }
            "--config" => {
                i += 1;
                let path = require_value(&args, i, "--config", "a file path");
                opts.config_file = Some(PathBuf::from(path));
            }
            "--no-config" => opts.no_config = true,
            "--functions" => opts.list_functions = true,
            "-v" | "--verbose" => opts.verbose = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if opts.file_path.is_none() {
                    opts.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    if let Err(e) = run(opts) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(opts: Options) -> anyhow::Result<()> {
    let (config, warnings) = if opts.no_config {
        (config::Config::default(), Vec::new())
    } else {
        config::load_config(opts.config_file.as_deref())
    };

    let level = if opts.verbose { "debug" } else { config.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let rows = opts.rows.unwrap_or(config.rows);
    let cols = opts.cols.unwrap_or(config.cols);
    let mut doc = match opts.file_path {
        Some(ref path) => Document::with_file(Some(path.clone()), rows, cols)
            .with_context(|| format!("Failed to open {}", path.display()))?,
        None => Document::with_size(rows, cols),
    };
    log::debug!("document ready: bounds {:?}, {} cells", doc.bounds(), doc.grid.len());

    if opts.list_functions {
        for name in doc.registry.names() {
            let description = doc.registry.get(name).map_or("", |f| f.description);
            println!("{:<12} {}", name, description);
        }
        return Ok(());
    }

    for edit in &opts.edits {
        let (cell, value) = parse_edit(edit)?;
        log::debug!("set {} to {:?}", cell, value);
        doc.set_cell(cell, value)
            .with_context(|| format!("Failed to set {}", edit))?;
    }

    let range = opts.range.as_deref().map(parse_output_range).transpose()?;
    let values = if opts.raw { CsvValues::Raw } else { config.export };

    if let Some(formula) = opts.command.as_deref() {
        println!("{}", doc.evaluate_adhoc(formula));
    }

    if let Some(output_path) = opts.output_file {
        doc.export_csv(&output_path, values, range)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("Exported to {}", output_path.display());
    } else if opts.command.is_none() {
        print!("{}", to_csv_string(&doc, values, range)?);
    }
    Ok(())
}

/// Split `A1=VALUE` at the first `=`, so `B1==A1*2` stores a formula.
/// Column letters are case-insensitive here.
fn parse_edit(edit: &str) -> Result<(CellRef, &str), GridcalcError> {
    let (name, value) = edit
        .split_once('=')
        .ok_or_else(|| GridcalcError::InvalidReference(edit.to_string()))?;
    let name = name.trim().to_ascii_uppercase();
    let cell = CellRef::from_str(&name).ok_or(GridcalcError::InvalidReference(name))?;
    Ok((cell, value))
}

fn parse_output_range(text: &str) -> Result<CellRange, GridcalcError> {
    parse_range(&text.trim().to_ascii_uppercase())
        .ok_or_else(|| GridcalcError::InvalidReference(text.to_string()))
}
