use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::service::{BackupReport, BackupService};
use crate::backup::validate::validate_cron_str;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::info;

/// When the driver starts the next backup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed pause after each run finishes
    Interval(Duration),
    /// Next cron tick after each run finishes
    Cron(String),
}

impl Schedule {
    pub fn cron<S: Into<String>>(expr: S) -> Result<Self> {
        let expr = expr.into();
        validate_cron_str(&expr).map_err(|e| Error::Cron(e.to_string()))?;
        Ok(Schedule::Cron(expr))
    }

    pub fn next_run(&self, finished: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match self {
            Schedule::Interval(d) => chrono::Duration::from_std(*d)
                .map(|d| finished + d)
                .map_err(|e| Error::Cron(e.to_string())),
            Schedule::Cron(expr) => {
                cron_parser::parse(expr, &finished).map_err(|e| Error::Cron(format!("{e:?}")))
            }
        }
    }
}

/// Runs backups forever, handing every report to `on_report`.
///
/// Only returns when the schedule itself cannot produce a next run time.
pub fn run_loop<F: FnMut(&BackupReport)>(
    service: &BackupService,
    schedule: &Schedule,
    mut on_report: F,
) -> Result<()> {
    loop {
        info!("Trying to create backup...");
        let report = service.backup();
        on_report(&report);

        let now = Utc::now();
        let next = schedule.next_run(now)?;
        if next > now {
            info!("Sleeping until {next}");
            std::thread::sleep((next - now).to_std().unwrap_or_default());
        }
    }
}
