use clap::Parser;
use manifest_backup::backup::schedule::{run_loop, Schedule};
use manifest_backup::backup::service::{BackupOutcome, BackupReport, BackupService};
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;
use tracing::{error, info};

/// Back up the files and directories listed in a config file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Location of config file
    #[arg(short = 'f', long)]
    config: PathBuf,
    /// Seconds to wait after a run before starting the next one
    #[arg(short, long, default_value_t = 10)]
    interval: u64,
    /// Cron expression for the next run, takes precedence over --interval
    #[arg(long)]
    cron: Option<String>,
    /// Run a single backup and exit
    #[arg(long)]
    once: bool,
}

fn print_report(report: &BackupReport) {
    println!("{}", report.status_code());
    println!("{}", report.log());
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let service = BackupService::new(args.config);
    info!("Using config {}", service.config_path().display());

    if args.once {
        let report = service.backup();
        print_report(&report);
        exit(match report.outcome() {
            BackupOutcome::Fatal => 1,
            BackupOutcome::Completed { errors: 0 } => 0,
            BackupOutcome::Completed { .. } => 2,
        });
    }

    let res = match args.cron {
        Some(cron) => Schedule::cron(cron),
        None => Ok(Schedule::Interval(Duration::from_secs(args.interval))),
    }
    .and_then(|schedule| run_loop(&service, &schedule, print_report));

    match res {
        Ok(_) => error!("Loop should never break without error"),
        Err(e) => error!("{e}"),
    }

    exit(1);
}
