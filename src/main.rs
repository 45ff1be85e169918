use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use league_standings::config::LeagueConfig;
use league_standings::pipeline::{self, CategoryStandings, RunReport};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_PARTIAL: i32 = 1;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Format {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute standings from round result files
    Run {
        /// Directory holding one sub-directory of race CSV files per round
        #[arg(short, long)]
        input: PathBuf,

        /// Rounds to include, comma separated (defaults to every configured round)
        #[arg(short, long, value_delimiter = ',')]
        rounds: Option<Vec<String>>,

        /// Write standings.json, per-category CSVs and manifest.json here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format for stdout
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Only print this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Validate the config file and exit
    Check,
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "league-standings")]
#[command(about = "Cumulative individual and team standings for running leagues", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/league-standings/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    if verbose && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "debug");
    }
    sensible_env_logger::init!();
}

fn load_valid_config(path: Option<PathBuf>) -> LeagueConfig {
    let config = match league_standings::config::load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = league_standings::scoring::validate_league(&config) {
        eprintln!("League config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    config
}

fn run_init(path: Option<PathBuf>, force: bool) -> i32 {
    let path = match path.map_or_else(league_standings::config::get_config_path, Ok) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return EXIT_CONFIG;
        }
    };

    if path.exists() && !force {
        eprintln!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return EXIT_CONFIG;
    }

    match league_standings::config::write_config(&path, &LeagueConfig::default()) {
        Ok(()) => {
            println!("Wrote starter config to {}", path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to write config: {:#}", e);
            EXIT_CONFIG
        }
    }
}

fn print_category(standings: &CategoryStandings, rounds: &[String], format: Format, use_colors: bool) {
    match format {
        Format::Table => {
            println!(
                "{}",
                league_standings::output::format_individual_table(standings, rounds, use_colors)
            );
            let teams = league_standings::output::format_team_table(standings, rounds, use_colors);
            if !teams.is_empty() {
                println!();
                println!("{}", teams);
            }
            println!();
        }
        Format::Tsv => {
            let tsv = league_standings::output::format_tsv(standings);
            if !tsv.is_empty() {
                println!("{}", tsv);
            }
        }
        Format::Json => {}
    }
}

fn print_report(report: &RunReport, category: Option<&str>, format: Format) -> Result<(), String> {
    let selected: Vec<&CategoryStandings> = match category {
        Some(code) => match report.standings.categories.get(code) {
            Some(standings) => vec![standings],
            None => return Err(format!("No standings for category '{}'", code)),
        },
        None => report.standings.categories.values().collect(),
    };

    if format == Format::Json {
        let json = match category {
            Some(_) => serde_json::to_string_pretty(&selected),
            None => serde_json::to_string_pretty(&report.standings),
        };
        match json {
            Ok(json) => println!("{}", json),
            Err(e) => return Err(format!("Failed to serialize standings: {}", e)),
        }
        return Ok(());
    }

    let use_colors = league_standings::output::should_use_colors();
    for standings in selected {
        print_category(standings, &report.standings.rounds, format, use_colors);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();
    let config_path = cli.config.map(PathBuf::from);

    let (input, rounds, output, format, category) = match cli.command {
        Commands::Init { force } => std::process::exit(run_init(config_path, force)),
        Commands::Check => {
            let config = load_valid_config(config_path);
            println!(
                "Config OK: {} rounds, {} categories",
                config.rounds.len(),
                config.categories.len()
            );
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::Run {
            input,
            rounds,
            output,
            format,
            category,
        } => (input, rounds, output, format, category),
    };

    let config = load_valid_config(config_path);

    if !input.is_dir() {
        eprintln!("Input directory not found: {}", input.display());
        std::process::exit(EXIT_INPUT);
    }

    let ordered = match pipeline::resolve_rounds(&config, rounds.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(EXIT_INPUT);
        }
    };

    let units = match league_standings::storage::load_rounds(&input, &ordered) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };

    if cli.verbose {
        eprintln!("Loaded {} race file(s) from {}", units.len(), input.display());
    }

    let report = match pipeline::run(&config, units, rounds.as_deref()).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = print_report(&report, category.as_deref(), format) {
        eprintln!("{}", e);
        std::process::exit(EXIT_INPUT);
    }

    if let Some(dir) = output {
        if let Err(e) = league_standings::output::write_report(
            &dir,
            &report.standings,
            &report.manifest,
            chrono::Utc::now(),
        ) {
            eprintln!("Failed to write output: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    }

    let use_colors = league_standings::output::should_use_colors();
    eprintln!(
        "{}",
        league_standings::output::format_manifest_summary(&report.manifest, use_colors)
    );

    if cli.verbose {
        eprintln!("Done in {:?}", start_time.elapsed());
    }

    if report.manifest.is_clean() {
        std::process::exit(EXIT_SUCCESS);
    }
    std::process::exit(EXIT_PARTIAL);
}
