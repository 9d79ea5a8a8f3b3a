//! Mototaxi Tracker CLI - Command-line interface for route registration and reporting
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates prompts and flags into route requests
//! - Handles external concerns like terminal I/O, process exit codes and config discovery
//! - Keeps every rule decision inside the library

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mototaxi_tracker::{
    OutputFormat, RejectedInput, ReportFormatter, ReportOptions, RouteBatch, RouteRequest,
    RouteTracker, TimeOfDay, TrackerConfig, ZoneSelector,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

/// Exit code for a request that failed validation
const EXIT_REJECTED: i32 = 2;

/// Mototaxi Tracker - route legality and infraction reports
#[derive(Parser)]
#[command(name = "mototaxi-tracker")]
#[command(version = "0.1.0")]
#[command(about = "Register mototaxi routes, flag infractions and rank drivers")]
#[command(long_about = "Mototaxi Tracker classifies routes as legal or infracting based on restricted zones and peak hours, and ranks drivers by their accumulated infractions.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive menu
    Session,

    /// Classify a single route
    Evaluate {
        /// Driver name
        #[arg(short, long)]
        driver: String,

        /// Departure time as HH:mm
        #[arg(short, long)]
        time: String,

        /// Zone visited, by name or catalog number (repeat in visit order)
        #[arg(short, long = "zone", action = clap::ArgAction::Append, required = true)]
        zones: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Register a YAML or JSON batch of routes and print the infraction report
    Report {
        /// Batch file containing a `routes` list
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Fail without a report if any route is rejected
        #[arg(long)]
        strict: bool,

        /// Maximum number of drivers to report
        #[arg(long)]
        max_drivers: Option<usize>,

        /// Also list the infracting routes
        #[arg(long)]
        show_routes: bool,
    },

    /// List the zone catalog and peak hours
    Zones,

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run_command(cli: Cli) -> Result<i32> {
    let use_colors = !cli.no_color;
    match cli.command {
        Commands::Session => {
            let mut tracker = build_tracker(cli.config, use_colors, None)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_session(&mut tracker, &mut stdin.lock(), &mut stdout.lock())?;
            Ok(0)
        }
        Commands::Evaluate {
            driver,
            time,
            zones,
            format,
        } => {
            let mut tracker = build_tracker(cli.config, use_colors, None)?;
            run_evaluate(&mut tracker, driver, time, zones, format.into(), &mut io::stdout())
        }
        Commands::Report {
            file,
            format,
            strict,
            max_drivers,
            show_routes,
        } => {
            let mut tracker = build_tracker(cli.config, use_colors, max_drivers)?;
            run_report(&mut tracker, file, format.into(), strict, show_routes, &mut io::stdout())
        }
        Commands::Zones => {
            let tracker = build_tracker(cli.config, use_colors, None)?;
            run_zones(&tracker, &mut io::stdout())
        }
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
    }
}

fn load_config(config_path: Option<PathBuf>) -> Result<TrackerConfig> {
    match config_path {
        Some(path) => TrackerConfig::load_from_file(&path)
            .with_context(|| format!("loading {}", path.display())),
        None => TrackerConfig::discover(".").context("loading configuration from working directory"),
    }
}

fn build_tracker(
    config_path: Option<PathBuf>,
    use_colors: bool,
    max_drivers: Option<usize>,
) -> Result<RouteTracker> {
    let config = load_config(config_path)?;
    let tracker = RouteTracker::new_with_config(config)?.with_report_formatter(ReportFormatter::new(
        ReportOptions {
            use_colors,
            max_drivers,
            ..Default::default()
        },
    ));
    tracing::debug!(fingerprint = %tracker.config_fingerprint(), "Tracker ready");
    Ok(tracker)
}

fn run_evaluate<W: Write>(
    tracker: &mut RouteTracker,
    driver: String,
    time: String,
    zones: Vec<String>,
    format: OutputFormat,
    output: &mut W,
) -> Result<i32> {
    let request = RouteRequest {
        driver,
        time,
        zones: zones.iter().map(|z| ZoneSelector::parse(z)).collect(),
    };

    let route = match tracker.register(&request) {
        Ok(route) => route.clone(),
        Err(e) => {
            if let Some(rejection) = e.as_rejection() {
                eprintln!("Route rejected: {rejection}");
                return Ok(EXIT_REJECTED);
            }
            return Err(e.into());
        }
    };
    writeln!(output, "{}", tracker.format_route(&route, format)?)?;

    Ok(if route.is_legal() { 0 } else { 1 })
}

fn run_report<W: Write>(
    tracker: &mut RouteTracker,
    file: PathBuf,
    format: OutputFormat,
    strict: bool,
    show_routes: bool,
    output: &mut W,
) -> Result<i32> {
    let batch = RouteBatch::load_from_file(&file)?;

    if strict {
        let rejected: Vec<(usize, RejectedInput)> = batch
            .routes
            .iter()
            .enumerate()
            .filter_map(|(i, request)| tracker.validate(request).err().map(|e| (i, e)))
            .collect();
        if !rejected.is_empty() {
            for (position, rejection) in &rejected {
                eprintln!("Route #{}: {}", position + 1, rejection);
            }
            return Ok(EXIT_REJECTED);
        }
    }

    let outcome = tracker.register_batch(&batch);
    for (position, rejection) in &outcome.rejected {
        eprintln!("Skipped route #{}: {}", position + 1, rejection);
    }
    tracing::info!(
        registered = outcome.registered,
        rejected = outcome.rejected.len(),
        "Batch loaded from {}",
        file.display()
    );

    if show_routes {
        let infracting = tracker.infracting_routes();
        let listed = tracker.format_routes(
            "Infracting routes",
            &infracting,
            "No infracting routes registered.",
            format,
        )?;
        writeln!(output, "{listed}")?;
    }

    writeln!(output, "{}", tracker.format_infraction_report(format)?)?;
    Ok(0)
}

fn run_zones<W: Write>(tracker: &RouteTracker, output: &mut W) -> Result<i32> {
    let catalog = tracker.catalog();

    writeln!(output, "Available zones:")?;
    for (i, zone) in catalog.all_zones().iter().enumerate() {
        let marker = if catalog.is_restricted(zone) { " [restricted]" } else { "" };
        writeln!(output, "{}. {}{}", i + 1, zone, marker)?;
    }

    let windows: Vec<String> = tracker
        .engine()
        .peak_hours()
        .windows()
        .iter()
        .map(|w| format!("{}-{}", w.start, w.end))
        .collect();
    writeln!(output)?;
    writeln!(output, "Peak hours: {}", if windows.is_empty() { "none".to_string() } else { windows.join(", ") })?;
    Ok(0)
}

fn run_validate_config(config_path: Option<PathBuf>) -> Result<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("mototaxi.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match TrackerConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("📊 Configuration summary:");
            println!(
                "  Zones: {} total, {} restricted",
                config.zones.all.len(),
                config.zones.restricted.len()
            );
            println!("  Peak windows: {}", config.peak_hours.len());
            println!("  Minimum zones per route: {}", config.min_zones_per_route);
            println!("  Fingerprint: {}", config.fingerprint());
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

/// Interactive menu loop; returns when the user exits or input ends
fn run_session<R: BufRead, W: Write>(
    tracker: &mut RouteTracker,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "=== MOTOTAXI ROUTE TRACKER ===")?;

    loop {
        writeln!(output)?;
        writeln!(output, "1. Register route")?;
        writeln!(output, "2. Show infracting routes")?;
        writeln!(output, "3. Show legal routes")?;
        writeln!(output, "4. Check a driver's routes")?;
        writeln!(output, "5. Infraction report")?;
        writeln!(output, "6. List zones")?;
        writeln!(output, "7. Exit")?;

        let Some(choice) = prompt(input, output, "Select an option (1-7): ")? else {
            break;
        };

        match choice.trim() {
            "1" => {
                if !register_interactively(tracker, input, output)? {
                    break;
                }
            }
            "2" => {
                let routes = tracker.infracting_routes();
                let text = tracker.format_routes(
                    "Infracting routes",
                    &routes,
                    "No infracting routes registered.",
                    OutputFormat::Human,
                )?;
                write!(output, "{text}")?;
            }
            "3" => {
                let routes = tracker.legal_routes();
                let text = tracker.format_routes(
                    "Legal routes",
                    &routes,
                    "No legal routes registered.",
                    OutputFormat::Human,
                )?;
                write!(output, "{text}")?;
            }
            "4" => {
                let Some(name) = prompt(input, output, "Driver name: ")? else {
                    break;
                };
                let routes = tracker.routes_for_driver(name.trim());
                if routes.is_empty() {
                    writeln!(output, "Driver not found.")?;
                } else {
                    let text = tracker.format_routes(
                        &format!("Routes for {}", name.trim()),
                        &routes,
                        "",
                        OutputFormat::Human,
                    )?;
                    write!(output, "{text}")?;
                }
            }
            "5" => {
                write!(output, "{}", tracker.format_infraction_report(OutputFormat::Human)?)?;
            }
            "6" => {
                run_zones(tracker, output)?;
            }
            "7" => {
                writeln!(output, "Goodbye!")?;
                break;
            }
            other => writeln!(output, "Invalid option '{other}'. Try again.")?,
        }
    }

    Ok(())
}

/// Prompt for one route field by field; returns `false` if input ended midway
fn register_interactively<R: BufRead, W: Write>(
    tracker: &mut RouteTracker,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    let driver = loop {
        let Some(name) = prompt(input, output, "Driver name: ")? else {
            return Ok(false);
        };
        if name.trim().is_empty() {
            writeln!(output, "{}", RejectedInput::EmptyDriverName)?;
            continue;
        }
        break name.trim().to_string();
    };

    let time = loop {
        let Some(text) = prompt(input, output, "Time as HH:mm (e.g. 08:30): ")? else {
            return Ok(false);
        };
        match text.parse::<TimeOfDay>() {
            Ok(time) => break time,
            Err(e) => writeln!(output, "{e}. Try again.")?,
        }
    };

    let min_zones = tracker.config().min_zones_per_route;
    let available = tracker.catalog().len();
    let count = loop {
        let question = format!("How many zones? (minimum {min_zones}): ");
        let Some(text) = prompt(input, output, &question)? else {
            return Ok(false);
        };
        match text.trim().parse::<usize>() {
            Ok(n) if n >= min_zones && n <= available => break n,
            _ => writeln!(output, "Enter a number between {min_zones} and {available}.")?,
        }
    };

    writeln!(output, "Available zones:")?;
    for (i, zone) in tracker.catalog().all_zones().iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, zone)?;
    }

    let mut chosen: Vec<String> = Vec::with_capacity(count);
    while chosen.len() < count {
        let question = format!("Select zone {}: ", chosen.len() + 1);
        let Some(text) = prompt(input, output, &question)? else {
            return Ok(false);
        };
        match ZoneSelector::parse(&text).resolve(tracker.catalog()) {
            Ok(zone) if chosen.iter().any(|c| c == zone) => {
                writeln!(output, "Zone already chosen. Pick another.")?;
            }
            Ok(zone) => chosen.push(zone.to_string()),
            Err(e) => writeln!(output, "{e}")?,
        }
    }

    let request = RouteRequest::new(driver, time.to_string(), chosen.iter().map(String::as_str));
    let route = tracker.register(&request)?.clone();

    writeln!(output, "\nRoute registered:")?;
    write!(output, "{}", tracker.format_route(&route, OutputFormat::Human)?)?;
    if !route.is_legal() {
        writeln!(output, "Route saved with status: ILLEGAL")?;
    }

    Ok(true)
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<Option<String>> {
    write!(output, "{message}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
