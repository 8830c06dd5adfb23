//! Flexibility study entry point: CLI wiring, input loading and reporting.

use std::path::Path;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dr_flex_sim::config::StudyConfig;
use dr_flex_sim::error::FlexError;
use dr_flex_sim::io::csv_source::{CsvLoadProvider, CsvPriceProvider, CsvSurveyProvider};
use dr_flex_sim::io::export::{export_events_csv, export_ranking_csv};
use dr_flex_sim::io::provider::{StudyInputs, load_inputs};
use dr_flex_sim::sim::batch::{BatchResult, run_batch};
use dr_flex_sim::sim::kpi::BatchSummary;
use dr_flex_sim::synthetic::SyntheticStudy;

const DEFAULT_DEMO_SEED: u64 = 42;

/// Parsed CLI arguments.
#[derive(Default)]
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    demo: bool,
    seed: Option<u64>,
    prices: Option<String>,
    load: Option<String>,
    survey: Option<String>,
    events_out: Option<String>,
    summary_out: Option<String>,
    ranking_out: Option<String>,
}

fn print_help() {
    eprintln!("dr-flex-sim: demand-response flexibility study");
    eprintln!();
    eprintln!("Usage: dr-flex-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load study from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        StudyConfig::PRESETS.join(", ")
    );
    eprintln!("  --demo                   Run on seeded synthetic data");
    eprintln!("  --seed <u64>             Seed for --demo (default: {DEFAULT_DEMO_SEED})");
    eprintln!("  --prices <path>          Price CSV (timestamp,price)");
    eprintln!("  --load <path>            Load CSV (timestamp,<appliance>...)");
    eprintln!("  --survey <path>          Normalized survey CSV");
    eprintln!("  --events-out <path>      Export all solved events to CSV");
    eprintln!("  --summary-out <path>     Export best event per day to CSV");
    eprintln!("  --ranking-out <path>     Export ranked candidate days to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the dishwasher preset is used.");
    eprintln!("Without --demo, --prices, --load and --survey are all required.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn take_value(args: &[String], i: &mut usize, flag: &str, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires {what}");
        process::exit(1);
    }
    args[*i].clone()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => cli.config_path = Some(take_value(&args, &mut i, flag, "a path argument")),
            "--preset" => cli.preset = Some(take_value(&args, &mut i, flag, "a name argument")),
            "--demo" => cli.demo = true,
            "--seed" => {
                let raw = take_value(&args, &mut i, flag, "a u64 argument");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--prices" => cli.prices = Some(take_value(&args, &mut i, flag, "a path argument")),
            "--load" => cli.load = Some(take_value(&args, &mut i, flag, "a path argument")),
            "--survey" => cli.survey = Some(take_value(&args, &mut i, flag, "a path argument")),
            "--events-out" => {
                cli.events_out = Some(take_value(&args, &mut i, flag, "a path argument"));
            }
            "--summary-out" => {
                cli.summary_out = Some(take_value(&args, &mut i, flag, "a path argument"));
            }
            "--ranking-out" => {
                cli.ranking_out = Some(take_value(&args, &mut i, flag, "a path argument"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads inputs from the synthetic generator or from the three CSV files.
fn load_study_inputs(cli: &CliArgs, config: &StudyConfig) -> Result<StudyInputs, FlexError> {
    if cli.demo {
        let seed = cli.seed.unwrap_or(DEFAULT_DEMO_SEED);
        info!(seed, "using synthetic inputs");
        let study = SyntheticStudy::new(seed);
        return load_inputs(config, &study, &study, &study);
    }
    if cli.seed.is_some() {
        warn!("--seed only applies to --demo, ignoring");
    }

    let (Some(prices), Some(load), Some(survey)) = (&cli.prices, &cli.load, &cli.survey) else {
        eprintln!("error: pass --prices, --load and --survey, or --demo");
        process::exit(1);
    };
    let prices = CsvPriceProvider::new(prices, &config.data)?;
    let load = CsvLoadProvider::new(load, &config.data)?;
    let survey = CsvSurveyProvider::new(survey);
    load_inputs(config, &prices, &load, &survey)
}

fn print_report(result: &BatchResult) {
    println!("Ranked candidate days:");
    for d in &result.ranking.ranked {
        println!(
            "  #{:<3} {}  window {}-{} ({:.2} h, {:.1}%)  peaks {}  max {:.4}  avg {:.4}",
            d.rank,
            d.date,
            d.window_start.format("%H:%M"),
            d.window_end.format("%H:%M"),
            d.window_duration_hours,
            d.window_energy_pct,
            d.count_peaks_in_window,
            d.max_price_in_window,
            d.avg_price_in_window,
        );
    }

    println!("\nBest event per day:");
    for r in &result.best_per_day {
        let (e, g) = (&r.event, &r.grid);
        match &e.error_message {
            Some(msg) => println!("  {}  no event: {msg}", e.spec.date),
            None => println!(
                "  {}  start {} for {:.1} h  offer {:.2}%  participation {:.3}  shiftable {:.3} kWh ({})",
                e.spec.date,
                e.event_start.format("%H:%M"),
                e.spec.duration_hours,
                e.offer_pct,
                e.capped_participation_rate,
                g.shiftable_energy_kwh,
                g.binding_constraint,
            ),
        }
    }

    println!("\n{}", BatchSummary::from_result(result));
}

fn export_or_exit(label: &str, path: &str, result: std::io::Result<()>) {
    if let Err(e) = result {
        eprintln!("error: failed to write {label} CSV: {e}");
        process::exit(1);
    }
    info!(path, "{label} written");
}

fn main() {
    let cli = parse_args();
    init_logging();

    // Config: --config takes priority, then --preset, then the dishwasher default
    let config = if let Some(ref path) = cli.config_path {
        match StudyConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match StudyConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        StudyConfig::dishwasher()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let inputs = match load_study_inputs(&cli, &config) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let result = match run_batch(&config, &inputs.prices, &inputs.energy, &inputs.survey) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    print_report(&result);

    if let Some(ref path) = cli.events_out {
        export_or_exit("events", path, export_events_csv(&result.events, Path::new(path)));
    }
    if let Some(ref path) = cli.summary_out {
        export_or_exit(
            "best-per-day",
            path,
            export_events_csv(&result.best_per_day, Path::new(path)),
        );
    }
    if let Some(ref path) = cli.ranking_out {
        export_or_exit(
            "ranking",
            path,
            export_ranking_csv(&result.ranking.ranked, Path::new(path)),
        );
    }
}
