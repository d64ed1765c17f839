//! # gridfill-cli
//!
//! Command-line front end for the formula tools and the fill engine.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use gridfill_autofill::{
    FillConfig, FillOperation, FillOptions, Filler, MemoryGrid, Pattern, PatternType,
};
use gridfill_formulas::{
    analyze_formula, get_reference_stats, parse_formula, tokenize, transform_for_copy,
    AdjustOptions, TokenKind,
};
use gridfill_primitives::{CellAddress, CellRange, FillDirection, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// gridfill - formula references and spreadsheet fill patterns
#[derive(Parser)]
#[command(name = "gridfill")]
#[command(author, version, long_about = None)]
#[command(about = "Formula reference tools and fill pattern detection")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Fill engine config file (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Split a formula into tokens
    Tokenize {
        #[arg(value_name = "FORMULA", allow_hyphen_values = true)]
        formula: String,
    },
    /// Parse a formula and print its canonical form
    Parse {
        #[arg(value_name = "FORMULA", allow_hyphen_values = true)]
        formula: String,
    },
    /// List the cell references in a formula
    Refs {
        #[arg(value_name = "FORMULA", allow_hyphen_values = true)]
        formula: String,
    },
    /// Rewrite a formula as if its cell were copied elsewhere
    Copy {
        #[arg(value_name = "FORMULA", allow_hyphen_values = true)]
        formula: String,

        /// Cell the formula is copied from
        #[arg(long, value_name = "A1")]
        from: String,

        /// Cell the formula is copied to
        #[arg(long, value_name = "A1")]
        to: String,

        /// Pin references that would leave the sheet to its edge
        #[arg(long)]
        clamp: bool,
    },
    /// Detect the pattern in a run of values and extend it
    Fill(FillArgs),
    /// Show what a fill would produce, with alternative patterns
    Preview(FillArgs),
}

#[derive(Args)]
struct FillArgs {
    /// Source values, comma separated, in sheet order
    #[arg(value_name = "V1,V2,...", allow_hyphen_values = true)]
    values: String,

    /// Number of cells to fill
    #[arg(short = 'n', long, default_value_t = 5)]
    count: u32,

    /// Fill direction (up, down, left, right)
    #[arg(short, long, default_value = "down")]
    direction: FillDirection,

    /// Force a pattern instead of picking the best match
    #[arg(short, long)]
    pattern: Option<PatternType>,

    /// Pin formula references that would leave the sheet to its edge
    #[arg(long)]
    clamp: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Tokenize { formula } => run_tokenize(formula, cli.json),
        Command::Parse { formula } => run_parse(formula, cli.json),
        Command::Refs { formula } => run_refs(formula, cli.json),
        Command::Copy {
            formula,
            from,
            to,
            clamp,
        } => run_copy(formula, from, to, *clamp, cli.json),
        Command::Fill(args) => run_fill(args, &load_config(cli.config.as_ref())?, cli.json),
        Command::Preview(args) => {
            run_preview(args, &load_config(cli.config.as_ref())?, cli.json)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<FillConfig> {
    let Some(path) = path else {
        return Ok(FillConfig::default());
    };
    let config = FillConfig::from_json_file(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?;
    debug!(path = %path.display(), detectors = config.detectors.len(), "loaded fill config");
    Ok(config)
}

fn run_tokenize(formula: &str, json: bool) -> Result<()> {
    let source = formula.strip_prefix('=').unwrap_or(formula);
    let tokens = tokenize(source).with_context(|| format!("Failed to tokenize: {formula}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        return Ok(());
    }
    for token in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
        println!(
            "{:>4}  {:<12} {}",
            token.position,
            format!("{:?}", token.kind).cyan(),
            token.text
        );
    }
    Ok(())
}

fn run_parse(formula: &str, json: bool) -> Result<()> {
    let expr = parse_formula(formula).map_err(|e| {
        anyhow::anyhow!("{} at position {}", e.message(), e.position())
    })?;

    if json {
        let out = serde_json::json!({
            "formula": format!("={expr}"),
            "ast": expr,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("={expr}");
    }
    Ok(())
}

fn run_refs(formula: &str, json: bool) -> Result<()> {
    let analysis = analyze_formula(formula);
    let stats = get_reference_stats(formula);

    if json {
        let out = serde_json::json!({
            "references": analysis.references,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if analysis.references.is_empty() {
        println!("(no references)");
        return Ok(());
    }
    for info in &analysis.references {
        println!(
            "{:>4}  {:<14} {}",
            info.position,
            info.reference_type.as_str().cyan(),
            info.text
        );
    }
    println!(
        "{} {} total, {} relative, {} absolute, {} mixed, {} cross-sheet",
        "Stats:".bold(),
        stats.total,
        stats.relative,
        stats.absolute,
        stats.mixed_column + stats.mixed_row,
        stats.cross_sheet
    );
    Ok(())
}

fn run_copy(formula: &str, from: &str, to: &str, clamp: bool, json: bool) -> Result<()> {
    let source =
        CellAddress::from_a1(from).with_context(|| format!("Invalid --from cell: {from}"))?;
    let target = CellAddress::from_a1(to).with_context(|| format!("Invalid --to cell: {to}"))?;
    let options = AdjustOptions {
        clamp_to_bounds: clamp,
        ..AdjustOptions::default()
    };
    let result = transform_for_copy(formula, source, target, &options)
        .with_context(|| format!("Cannot copy {formula} from {source} to {target}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{}", result.formula);
    for clamped in &result.clamped_references {
        eprintln!("{} {} was clamped to the sheet edge", "Warning:".yellow().bold(), clamped);
    }
    Ok(())
}

fn run_fill(args: &FillArgs, config: &FillConfig, json: bool) -> Result<()> {
    let operation = fill_operation(args)?;
    let mut grid = MemoryGrid::new();
    seed_grid(&mut grid, &operation, &split_values(&args.values))?;

    let result = Filler::new(config.clone()).fill(&operation, &mut grid);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if !result.success {
        anyhow::bail!(result.error.unwrap_or_else(|| "fill failed".to_string()));
    }

    if let Some(pattern) = &result.pattern {
        print_pattern("Pattern:", pattern, pattern.confidence);
    }
    for (cell, value) in &result.filled_cells {
        println!("  {:<6} {}", cell.cyan(), value);
    }
    Ok(())
}

fn run_preview(args: &FillArgs, config: &FillConfig, json: bool) -> Result<()> {
    let operation = fill_operation(args)?;
    let mut grid = MemoryGrid::new();
    seed_grid(&mut grid, &operation, &split_values(&args.values))?;

    let preview = Filler::new(config.clone()).preview(&operation, &grid)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    if let Some(pattern) = &preview.pattern {
        print_pattern("Pattern:", pattern, preview.confidence);
        if preview.ambiguity_score > 0.0 {
            println!("  ambiguity {:.2}", preview.ambiguity_score);
        }
    }
    for (cell, value) in &preview.values {
        println!("  {:<6} {}", cell.cyan(), value);
    }
    for alternative in &preview.alternative_patterns {
        print_pattern("Alternative:", alternative, alternative.confidence);
    }
    Ok(())
}

fn print_pattern(label: &str, pattern: &Pattern, confidence: f64) {
    println!(
        "{} {} ({:.2}) {}",
        label.bold(),
        pattern.pattern_type.to_string().green(),
        confidence,
        pattern.description.dimmed()
    );
}

/// Source range for `values` placed so that the fill fits on the sheet:
/// at A1 for down and right fills, after the target cells for up and left.
fn source_range(len: usize, count: u32, direction: FillDirection) -> Result<CellRange> {
    let len = u32::try_from(len)
        .ok()
        .filter(|&n| n > 0)
        .context("At least one source value is required")?;
    let offset = if direction.is_backward() { count } else { 0 };
    let last = offset
        .checked_add(len - 1)
        .with_context(|| format!("{len} values after {count} fill cells overflow the sheet"))?;
    let (start, end) = if direction.is_vertical() {
        (CellAddress::new(offset, 0), CellAddress::new(last, 0))
    } else {
        (CellAddress::new(0, offset), CellAddress::new(0, last))
    };
    Ok(CellRange::new(start, end))
}

fn fill_operation(args: &FillArgs) -> Result<FillOperation> {
    let values = split_values(&args.values);
    let source = source_range(values.len(), args.count, args.direction)?;
    let operation = FillOperation::adjacent(source, args.direction, args.count)
        .with_context(|| {
            format!(
                "Cannot fill {} cells {} of {}",
                args.count, args.direction, source
            )
        })?;
    Ok(operation.with_options(FillOptions {
        pattern: args.pattern,
        clamp_to_bounds: args.clamp,
    }))
}

fn seed_grid(grid: &mut MemoryGrid, operation: &FillOperation, values: &[Value]) -> Result<()> {
    let start = operation.source.start;
    if operation.direction.is_vertical() {
        grid.set_column(start, values.iter().cloned())?;
    } else {
        grid.set_row(start, values.iter().cloned())?;
    }
    Ok(())
}

/// Split comma separated values, keeping commas inside parentheses and
/// double-quoted strings so formulas such as `=SUM(A1,B1)` stay whole.
fn split_values(input: &str) -> Vec<Value> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;

    for c in input.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                parts.push(parse_cli_value(&current));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(parse_cli_value(&current));
    parts
}

/// Parse a CLI value string into a Value.
fn parse_cli_value(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        Value::Empty
    } else if s.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if s.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if let Some(n) = s.parse::<f64>().ok().filter(|n| n.is_finite()) {
        Value::Number(n)
    } else {
        Value::Text(s.to_string())
    }
}
