//! Fitreport CLI
//!
//! Command-line interface for the fitness export analyzer:
//! - Analyze GPX route files
//! - Summarize an Apple Health export
//! - Correct step counts for cycling/skating workouts

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fitreport::config::{generate_default_config, Config};
use fitreport::correction::{correct_export_steps, CorrectionReport, CORRECTION_REPORT_FILE};
use fitreport::health::{analyze_health, HealthReport, HEALTH_REPORT_FILE};
use fitreport::report::write_json_report;
use fitreport::routes::{analyze_routes, RoutesReport, ROUTES_REPORT_FILE};

#[derive(Parser)]
#[command(name = "fitreport")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch reports over GPX routes and Apple Health exports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: fitreport.toml, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the cutoff date (YYYY-MM-DD)
    #[arg(long, global = true)]
    cutoff: Option<String>,

    /// Override the report output directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze GPX route files
    Routes {
        /// Directory of GPX files
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Summarize the health export
    Health {
        /// Path to export.xml or the export ZIP
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Correct the step count for cycling/skating workouts
    CorrectSteps {
        /// Path to export.xml or the export ZIP
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fitreport=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default(),
    };
    if let Some(cutoff) = &cli.cutoff {
        config.analysis.cutoff_date = cutoff.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.to_string_lossy().to_string();
    }

    let cutoff = config.analysis.cutoff()?;
    let output_dir = PathBuf::from(&config.output.dir);

    match cli.command {
        Commands::Routes { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.inputs.routes_dir));
            let report = analyze_routes(&dir, cutoff)?;
            write_json_report(&output_dir, ROUTES_REPORT_FILE, &report)?;
            print_routes_summary(&report);
        }

        Commands::Health { export } => {
            let export = export.unwrap_or_else(|| PathBuf::from(&config.inputs.export_path));
            let report = analyze_health(&export, cutoff)?;
            write_json_report(&output_dir, HEALTH_REPORT_FILE, &report)?;
            print_health_summary(&report);
        }

        Commands::CorrectSteps { export } => {
            let export = export.unwrap_or_else(|| PathBuf::from(&config.inputs.export_path));
            let report = correct_export_steps(&export, cutoff)?;
            write_json_report(&output_dir, CORRECTION_REPORT_FILE, &report)?;
            print_correction_summary(&report);
        }

        Commands::Config { output } => {
            let config = generate_default_config();
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_routes_summary(report: &RoutesReport) {
    println!();
    println!("{}", "=".repeat(50));
    println!("GPX ROUTES SUMMARY ({})", report.period);
    println!("{}", "=".repeat(50));

    let totals = match report.summary.as_data() {
        Some(totals) => totals,
        None => {
            println!("No routes found for the specified period");
            return;
        }
    };

    println!("Total routes: {}", totals.total_routes);
    println!("Total distance: {:.1} km", totals.total_distance_km);
    println!("Total elevation gain: {:.0} m", totals.total_elevation_gain_m);
    println!("Total duration: {:.1} minutes", totals.total_duration_minutes);
    println!("Total track points: {}", totals.total_track_points);

    println!();
    println!("Averages per route:");
    println!("  Distance: {:.1} km", totals.average_distance_per_route);
    println!("  Elevation gain: {:.0} m", totals.average_elevation_per_route);
    println!("  Duration: {:.1} minutes", totals.average_duration_per_route);

    println!();
    println!("Monthly breakdown:");
    let mut months: Vec<_> = report.monthly_breakdown.iter().collect();
    months.sort_by(|a, b| a.0.cmp(b.0));
    for (month, stats) in months {
        println!(
            "  {}: {} routes, {:.1} km, {:.0} m",
            month, stats.routes, stats.distance_km, stats.elevation_gain_m
        );
    }

    println!();
    println!("Recent routes:");
    for route in report.routes.iter().rev().take(5).rev() {
        println!(
            "  {}: {:.1} km, {:.0} m",
            route.date, route.distance_km, route.elevation_gain_m
        );
    }
}

fn print_health_summary(report: &HealthReport) {
    println!();
    println!("{}", "=".repeat(50));
    println!("HEALTH DATA SUMMARY ({})", report.period);
    println!("{}", "=".repeat(50));
    println!("Total records: {}", report.total_records);
    println!("Total workouts: {}", report.total_workouts);

    println!();
    println!("Top 10 record types:");
    let mut types: Vec<_> = report.record_types.iter().collect();
    types.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (record_type, count) in types.into_iter().take(10) {
        println!("  {}: {}", record_type, count);
    }

    if let Some(workouts) = report.workout_summary.as_data() {
        println!();
        println!("Workout summary:");
        println!("  Total workouts: {}", workouts.total_workouts);
        println!("  Total duration: {:.1} minutes", workouts.total_duration_minutes);
        println!("  Average duration: {:.1} minutes", workouts.average_duration);

        println!();
        println!("Workout types:");
        let mut types: Vec<_> = workouts.workout_types.iter().collect();
        types.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (workout_type, count) in types {
            println!("  {}: {}", workout_type, count);
        }
    }

    if let Some(hr) = report.heart_rate_summary.as_data() {
        println!();
        println!("Heart rate summary:");
        println!("  Total readings: {}", hr.total_readings);
        println!("  Average: {:.1} bpm", hr.average);
        println!("  Range: {:.0} - {:.0} bpm", hr.min, hr.max);
    }

    if let Some(steps) = report.step_summary.as_data() {
        println!();
        println!("Step summary:");
        println!("  Total days: {}", steps.total_days);
        println!("  Total steps: {}", steps.total_steps);
        println!("  Average daily: {:.0} steps", steps.average_daily);
        println!("  Max daily: {} steps", steps.max_daily);
    }
}

fn print_correction_summary(report: &CorrectionReport) {
    let correction = &report.correction;
    let distances = &report.workout_distances;

    println!();
    println!("{}", "=".repeat(50));
    println!("STEP CORRECTION RESULTS ({})", report.period);
    println!("{}", "=".repeat(50));
    println!("Total steps: {}", correction.total_steps);
    println!("Steps during cycling workouts: {}", correction.cycling_steps);
    println!("Steps during skating workouts: {}", correction.skating_steps);
    println!("Steps during walking (keeping): {}", correction.walking_steps);
    println!("CORRECTED STEPS: {}", correction.corrected_steps);

    println!();
    println!("Total workouts: {}", report.total_workouts);
    println!(
        "Cycling: {} workouts, {:.1} km",
        correction.cycling_workouts, distances.cycling_km
    );
    println!(
        "Skating: {} workouts, {:.1} km",
        correction.skating_workouts, distances.skating_km
    );
    println!(
        "Walking: {} workouts, {:.1} km",
        correction.walking_workouts, distances.walking_km
    );
    if distances.running_km > 0.0 {
        println!("Running distance: {:.1} km", distances.running_km);
    }
}
