//! Append-only audit log of a single backup run.
//!
//! Entries look like `(task_hash) - [YYYY-MM-DD-HH-MM-SS] - message` and every
//! entry is preceded by a newline, so a log with entries always starts with one.

use crate::backup::task::TaskHash;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

/// Second resolution timestamp used in log entries and artifact names
pub static TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub fn format_time<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format(TIME_FORMAT).to_string()
}

pub fn timestamp() -> String {
    format_time(&Local::now())
}

/// Renders one entry, without the leading separator.
pub fn format_entry<D: Display>(task_hash: &TaskHash, time: &str, message: D) -> String {
    format!("({task_hash}) - [{time}] - {message}")
}

/// Returns `log` extended by one entry stamped with the current time.
pub fn append<D: Display>(log: &str, task_hash: &TaskHash, message: D) -> String {
    format!("{log}\n{}", format_entry(task_hash, &timestamp(), message))
}

/// Owned log value threaded through a run.
///
/// `append` consumes the log and hands back the extended one; nothing else can
/// hold a reference to it in the meantime.
#[derive(Clone, Debug, Default)]
pub struct RunLog {
    task_hash: TaskHash,
    text: String,
}

impl RunLog {
    pub fn new(task_hash: TaskHash) -> Self {
        Self {
            task_hash,
            text: String::new(),
        }
    }

    #[must_use]
    pub fn append<D: Display>(mut self, message: D) -> Self {
        self.text.push('\n');
        self.text
            .push_str(&format_entry(&self.task_hash, &timestamp(), message));
        self
    }

    pub fn task_hash(&self) -> &TaskHash {
        &self.task_hash
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Messages of every entry, without the hash and time prefix.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.text
            .lines()
            .filter(|l| !l.is_empty())
            .filter_map(|l| l.splitn(3, " - ").nth(2))
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl Display for RunLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
