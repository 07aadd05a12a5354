pub mod dir_zip;

use crate::backup::encode::dir_zip::zip_dir;
use crate::backup::manifest::{ItemKind, ManifestRecord};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::{chain_cleanup, Result};
use crate::backup::run_log::timestamp;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Turns validated source paths into manifest records.
///
/// Directories are zipped into a scratch archive next to the backup location
/// (`<backup_location>-<entry_name>-<timestamp>.zip`) which is removed again
/// whether or not encoding succeeds.
#[derive(Clone, Debug)]
pub struct ItemEncoder {
    backup_location: PathBuf,
}

impl ItemEncoder {
    pub fn new<P: AsRef<Path>>(backup_location: P) -> Self {
        Self {
            // drops a trailing separator so the scratch archive lands beside the dir
            backup_location: backup_location.as_ref().components().collect(),
        }
    }

    pub fn encode<P: AsRef<Path>>(&self, source: P) -> Result<ManifestRecord> {
        let source = source.as_ref();
        let name = entry_name(source);
        if source.is_dir() {
            let data = self.encode_dir(source, &name)?;
            Ok(ManifestRecord::new(ItemKind::Dir, name, data))
        } else {
            let data = std::fs::read(source).map_err(|e| Error::ReadFile {
                path: source.to_path_buf(),
                source: e,
            })?;
            Ok(ManifestRecord::new(ItemKind::File, name, data))
        }
    }

    pub fn scratch_archive_path(&self, name: &str, timestamp: &str) -> PathBuf {
        let mut path = OsString::from(self.backup_location.as_os_str());
        path.push(format!("-{name}-{timestamp}.zip"));
        path.into()
    }

    fn encode_dir(&self, source: &Path, name: &str) -> Result<Vec<u8>> {
        let archive = self.scratch_archive_path(name, &timestamp());
        tracing::debug!("Archiving directory {:?} into {:?}", source, archive);
        let scratch = TempPath::try_from_path(&archive)?;

        let res = zip_dir(source, &archive)
            .map_err(|e| Error::MakeArchive {
                archive: archive.clone(),
                source: Box::new(e),
            })
            .and_then(|_| {
                std::fs::read(&archive).map_err(|e| Error::ReadArchive {
                    archive: archive.clone(),
                    source: e,
                })
            });

        let cleanup = match scratch.close() {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        };
        chain_cleanup(res, cleanup)
    }
}

/// Last component of `source`, resolving `.`-like paths through the filesystem.
pub fn entry_name(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            source
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_default()
}
