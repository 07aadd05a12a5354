//! Manifest records and the streaming manifest writer.
//!
//! The manifest is written one record at a time so only the record being
//! encoded is held in memory:
//!
//! ```text
//! {"version":"1","data":[{"type":"file","name":"a.txt","data":"<base64>"},...]}
//! ```

use crate::backup::finish::Finish;
use crate::backup::result_error::result::Result;
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::As;
use std::fs::File;
use std::io::{BufWriter, IntoInnerError, Write};
use std::path::Path;

pub static MANIFEST_VERSION: &str = "1";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    File,
    Dir,
}

/// One encoded backup source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ManifestRecord {
    #[serde(rename = "type")]
    kind: ItemKind,
    name: String,
    /// Raw bytes of the file, or of the zip archive for a directory
    #[serde(with = "As::<Base64>")]
    data: Vec<u8>,
}

impl ManifestRecord {
    pub fn new<S: Into<String>>(kind: ItemKind, name: S, data: Vec<u8>) -> Self {
        Self {
            kind,
            name: name.into(),
            data,
        }
    }

    pub fn rename<S: Into<String>>(self, name: S) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }
}

/// Whole manifest, used when reading one back.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub version: String,
    pub data: Vec<ManifestRecord>,
}

/// Writes the manifest JSON incrementally; [`Finish::finish`] closes it.
pub struct ManifestWriter<W: Write> {
    writer: BufWriter<W>,
    records: usize,
}

impl ManifestWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> ManifestWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = BufWriter::new(inner);
        write!(writer, "{{\"version\":")?;
        serde_json::to_writer(&mut writer, MANIFEST_VERSION)?;
        write!(writer, ",\"data\":[")?;
        Ok(Self { writer, records: 0 })
    }

    pub fn append(&mut self, record: &ManifestRecord) -> Result<()> {
        if self.records > 0 {
            self.writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.writer, record)?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }
}

impl<W: Write> Finish<W> for ManifestWriter<W> {
    fn finish(mut self) -> std::io::Result<W> {
        self.writer.write_all(b"]}")?;
        self.writer.into_inner().map_err(IntoInnerError::into_error)
    }
}
