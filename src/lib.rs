//! # manifest-backup
//!
//! Periodic backup of a list of files and directories into a single zip
//! archive per run.
//!
//! ## Features
//!
//! - **Self-contained archives**: every run writes `<timestamp>-<task_hash>.zip`
//!   holding one JSON manifest with each source base64-encoded
//! - **Directories**: zipped recursively and embedded as a single record
//! - **Partial backups**: missing or unreadable sources are logged and counted,
//!   the rest of the run carries on
//! - **Audit log**: every run returns a log whose lines are tagged with a random
//!   task hash
//! - **Scheduling**: fixed interval or cron expression
//!
//! ## Quick Start
//!
//! ```no_run
//! use manifest_backup::backup::service::BackupService;
//!
//! // config.json: {"backup_location": "/var/backups", "data": ["/etc/hosts", "/srv/www"]}
//! let report = BackupService::new("config.json").backup();
//! let (status, log) = report.into_parts();
//! println!("{status}");
//! println!("{log}");
//! ```

pub mod backup;
