use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use common::config::AppConfig;
use common::logger::init_logging;
use grade_runner::{RunReport, run};
use marker::report::format_percentage;
use std::path::PathBuf;
use tracing::info;
use util::config::GraderConfig;

#[derive(Parser, Debug)]
#[command(version, about = "Grade device configuration submissions against an answer key")]
struct Args {
    /// Run configuration file (YAML)
    #[arg(long, short)]
    config: PathBuf,
    /// Pass mark as a percentage of the lab total. Overrides the config file.
    #[arg(long)]
    pass_threshold: Option<f64>,
    /// Log filter directive such as `marker=debug,info`. Overrides LOG_LEVEL.
    #[arg(long)]
    log_level: Option<String>,
    /// Directory for the rolling log file. Overrides LOG_DIR.
    #[arg(long)]
    log_dir: Option<String>,
    /// Log file name. Overrides LOG_FILE.
    #[arg(long)]
    log_file: Option<String>,
    /// Write logs to the log file only.
    #[arg(long, short)]
    quiet: bool,
}

fn apply_log_overrides(args: &Args) {
    if let Some(level) = &args.log_level {
        AppConfig::set_log_level(level.as_str());
    }
    if let Some(dir) = &args.log_dir {
        AppConfig::set_log_dir(dir.as_str());
    }
    if let Some(file) = &args.log_file {
        AppConfig::set_log_file(file.as_str());
    }
    if args.quiet {
        AppConfig::set_log_to_stdout(false);
    }
}

fn print_summary(report: &RunReport) {
    let s = &report.summary;
    println!(
        "{} {} {}",
        "Graded".green().bold(),
        report.course,
        report.lab.bold()
    );
    println!(
        "  students: {} graded, {} skipped, {} total",
        s.graded_students.to_string().green(),
        if s.skipped_students > 0 {
            s.skipped_students.to_string().yellow()
        } else {
            s.skipped_students.to_string().normal()
        },
        s.total_students
    );
    println!(
        "  average: {:.2} / {} ({})",
        s.average_score,
        report.total_points,
        format_percentage(s.average_percentage)
    );
    println!(
        "  passing: {} ({} at {})",
        s.passing_students,
        format_percentage(s.pass_rate * 100.0),
        format_percentage(s.pass_threshold)
    );
    for defect in &s.defects {
        println!("  {} {}", "pattern error:".red(), defect);
    }
    println!("  results: {}", report.results_dir.display());
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    apply_log_overrides(&args);

    let app_config = AppConfig::global().clone();
    let _log_guard = init_logging(&app_config).context("failed to initialize logging")?;
    info!(project = %app_config.project_name, config = %args.config.display(), "starting");

    let mut config = GraderConfig::load(&args.config)?;
    if let Some(threshold) = args.pass_threshold {
        config.pass_threshold = threshold;
    }

    let report = run(&config).await?;
    print_summary(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_flags_override_environment() {
        let args = Args::try_parse_from([
            "grade_runner",
            "-c",
            "run.yaml",
            "--log-level",
            "marker=debug",
            "--log-dir",
            "/tmp/grade-runner-logs",
            "--quiet",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("run.yaml"));

        apply_log_overrides(&args);
        let cfg = AppConfig::global().clone();
        assert_eq!(cfg.log_level, "marker=debug");
        assert_eq!(cfg.log_dir, "/tmp/grade-runner-logs");
        assert!(!cfg.log_to_stdout);
        AppConfig::reset();
    }

    #[test]
    fn test_config_flag_is_required() {
        assert!(Args::try_parse_from(["grade_runner"]).is_err());
    }
}
