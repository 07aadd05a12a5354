//! Backup orchestration.
//!
//! A run moves through `Init -> Validating -> Encoding -> Finalizing -> Done`.
//! Configuration problems end it in `Fatal` with status `-1` before anything is
//! written. Anything that goes wrong afterwards is counted, written to the run
//! log, and the run carries on with the next item.

use crate::backup::backup_config::BackupConfig;
use crate::backup::encode::ItemEncoder;
use crate::backup::finish::Finish;
use crate::backup::manifest::{ManifestRecord, ManifestWriter};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::run_log::{timestamp, RunLog};
use crate::backup::task::TaskHash;
use derive_more::Display;
use getset::{CopyGetters, Getters};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, IntoInnerError, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, warn, Level};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Status code of a run that stopped on a configuration problem
pub const FATAL_STATUS: i64 = -1;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum RunState {
    Init,
    Validating,
    Encoding,
    Finalizing,
    Done,
    Fatal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupOutcome {
    Fatal,
    Completed { errors: usize },
}

impl BackupOutcome {
    /// `-1` for fatal, otherwise the number of recoverable errors.
    pub fn code(&self) -> i64 {
        match self {
            BackupOutcome::Fatal => FATAL_STATUS,
            BackupOutcome::Completed { errors } => i64::try_from(*errors).unwrap_or(i64::MAX),
        }
    }
}

/// What a run hands back to its driver.
#[derive(Debug, Getters, CopyGetters)]
pub struct BackupReport {
    #[getset(get_copy = "pub")]
    outcome: BackupOutcome,
    #[getset(get_copy = "pub")]
    state: RunState,
    #[getset(get_copy = "pub")]
    records: usize,
    #[getset(get = "pub")]
    archive: Option<PathBuf>,
    #[getset(get = "pub")]
    log: RunLog,
}

impl BackupReport {
    pub fn status_code(&self) -> i64 {
        self.outcome.code()
    }

    pub fn into_parts(self) -> (i64, String) {
        (self.outcome.code(), self.log.into_string())
    }
}

/// Runs backups described by the config file at `config_path`.
///
/// The config is read again on every call so edits apply to the next run.
#[derive(Clone, Debug)]
pub struct BackupService {
    config_path: PathBuf,
}

impl BackupService {
    pub fn new<P: Into<PathBuf>>(config_path: P) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backup(&self) -> BackupReport {
        self.run(TaskHash::generate())
    }

    fn run(&self, task_hash: TaskHash) -> BackupReport {
        let mut run = BackupRun::new(task_hash);
        let span = info_span!("backup", task = %run.task_hash());
        let _enter = span.enter();

        run.note(
            Level::INFO,
            format!("Starting backup of {}", self.config_path.display()),
        );
        run.transition(RunState::Validating);
        let (config, sources) = match run.validate(&self.config_path) {
            Ok(v) => v,
            Err(e) => return run.fatal(e),
        };

        let name = format!("{}-{}", timestamp(), run.task_hash());
        let manifest_path = config.backup_location().join(format!("{name}.json"));
        let archive_path = config.backup_location().join(format!("{name}.zip"));
        let writer = match ManifestWriter::create(&manifest_path) {
            Ok(w) => w,
            Err(e) => {
                return run.fatal(
                    e.with_msg(format!("Error creating manifest {}", manifest_path.display())),
                )
            }
        };

        run.transition(RunState::Encoding);
        let encoder = ItemEncoder::new(config.backup_location());
        if let Err(e) = run.encode_all(&encoder, &sources, writer) {
            run.fail(e.with_msg(format!("Error writing manifest {}", manifest_path.display())));
            return run.report(None);
        }

        run.transition(RunState::Finalizing);
        match run.finalize(&manifest_path, &archive_path) {
            Some(archive) => {
                run.transition(RunState::Done);
                run.note(
                    Level::INFO,
                    format!(
                        "Backup finished with {} errors and saved to {}",
                        run.errors,
                        archive.display()
                    ),
                );
                run.report(Some(archive))
            }
            None => run.report(None),
        }
    }
}

/// Mutable bookkeeping of one run. Never outlives [`BackupService::backup`].
struct BackupRun {
    state: RunState,
    errors: usize,
    records: usize,
    log: RunLog,
}

impl BackupRun {
    fn new(task_hash: TaskHash) -> Self {
        Self {
            state: RunState::Init,
            errors: 0,
            records: 0,
            log: RunLog::new(task_hash),
        }
    }

    fn task_hash(&self) -> &TaskHash {
        self.log.task_hash()
    }

    fn transition(&mut self, next: RunState) {
        debug!("{} -> {}", self.state, next);
        self.state = next;
    }

    fn note<D: fmt::Display>(&mut self, level: Level, message: D) {
        if level == Level::ERROR {
            error!("{message}");
        } else if level == Level::WARN {
            warn!("{message}");
        } else {
            info!("{message}");
        }
        self.log = std::mem::take(&mut self.log).append(message);
    }

    /// Records one recoverable failure.
    fn fail(&mut self, error: Error) {
        self.errors += 1;
        self.note(Level::ERROR, error);
    }

    fn fatal(mut self, error: Error) -> BackupReport {
        self.note(Level::ERROR, error);
        self.transition(RunState::Fatal);
        BackupReport {
            outcome: BackupOutcome::Fatal,
            state: self.state,
            records: 0,
            archive: None,
            log: self.log,
        }
    }

    fn report(self, archive: Option<PathBuf>) -> BackupReport {
        BackupReport {
            outcome: BackupOutcome::Completed {
                errors: self.errors,
            },
            state: self.state,
            records: self.records,
            archive,
            log: self.log,
        }
    }

    /// Loads the config, drops unusable `data` entries and prepares the
    /// backup location. Dropped entries seed the error count.
    fn validate(&mut self, config_path: &Path) -> Result<(BackupConfig, Vec<PathBuf>)> {
        let config = BackupConfig::load(config_path)?;
        let (sources, rejected) = config.partition_data();
        for entry in &rejected {
            self.note(Level::WARN, entry);
        }
        self.errors = rejected.len();
        config.prepare_backup_location()?;
        Ok((config, sources))
    }

    /// Encodes every source in order and streams the records into `writer`.
    ///
    /// Item failures are counted and skipped. Only a failure of the manifest
    /// itself is returned.
    fn encode_all<W: Write>(
        &mut self,
        encoder: &ItemEncoder,
        sources: &[PathBuf],
        mut writer: ManifestWriter<W>,
    ) -> Result<()> {
        let mut names = HashSet::new();
        for source in sources {
            let record = match encoder.encode(source) {
                Ok(record) => record,
                Err(e) => {
                    self.fail(e);
                    continue;
                }
            };
            let record = self.with_unique_name(&mut names, source, record);
            writer.append(&record)?;
            self.records = writer.records();
            debug!(
                "Added {:?} as {} ({} bytes)",
                source,
                record.name(),
                record.data().len()
            );
        }
        writer.finish()?;
        Ok(())
    }

    /// Suffixes `.1`, `.2`, ... to a name that is already in the manifest.
    fn with_unique_name(
        &mut self,
        names: &mut HashSet<String>,
        source: &Path,
        record: ManifestRecord,
    ) -> ManifestRecord {
        let name = record.name().clone();
        if names.insert(name.clone()) {
            return record;
        }
        let unique = (1..)
            .map(|n| format!("{name}.{n}"))
            .find(|candidate| names.insert(candidate.clone()))
            .unwrap_or_default();
        self.note(
            Level::WARN,
            format!(
                "Duplicate entry name {name} for {}, stored as {unique}",
                source.display()
            ),
        );
        record.rename(unique)
    }

    /// Wraps the manifest into `archive_path` and removes the manifest.
    ///
    /// On failure the manifest is left in place and `None` is returned.
    fn finalize(&mut self, manifest_path: &Path, archive_path: &Path) -> Option<PathBuf> {
        if let Err(e) = write_final_archive(manifest_path, archive_path) {
            self.fail(Error::FinalArchive {
                archive: archive_path.to_path_buf(),
                source: Box::new(e),
            });
            return None;
        }
        if let Err(e) = std::fs::remove_file(manifest_path) {
            self.fail(Error::from(e).with_msg(format!(
                "Error removing manifest {}",
                manifest_path.display()
            )));
        }
        Some(archive_path.to_path_buf())
    }
}

/// Zips the manifest as the single entry of `archive_path`.
///
/// The archive is built beside its destination under a `.tmp` suffix and only
/// renamed into place once complete.
fn write_final_archive(manifest_path: &Path, archive_path: &Path) -> Result<()> {
    let mut tmp = OsString::from(archive_path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let res = (|| -> Result<()> {
        let entry_name = manifest_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let large_file = std::fs::metadata(manifest_path)?.len() >= u64::from(u32::MAX);
        let mut writer = ZipWriter::new(BufWriter::new(File::create(&tmp)?));
        writer.start_file(
            entry_name,
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .large_file(large_file),
        )?;
        std::io::copy(&mut File::open(manifest_path)?, &mut writer)?;
        Finish::finish(writer)?
            .into_inner()
            .map_err(IntoInnerError::into_error)?
            .sync_all()?;
        std::fs::rename(&tmp, archive_path)?;
        Ok(())
    })();

    res.map_err(|mut e| {
        match std::fs::remove_file(&tmp) {
            Err(e2) if e2.kind() != ErrorKind::NotFound => e = e.chain(e2.into()),
            _ => {}
        }
        e
    })
}
