use crate::backup::result_error::WithMsg;
use itertools::Itertools;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),
    #[error("Config file {} does not exist", path.display())]
    ConfigMissing { path: PathBuf },
    #[error("Error reading config file: {reason}")]
    ConfigUnreadable { path: PathBuf, reason: String },
    #[error("Invalid config file, {0}")]
    ConfigInvalidSchema(String),
    #[error("Invalid schedule: {0}")]
    Cron(String),
    #[error("Invalid backup location {}: {reason}", path.display())]
    BackupLocation { path: PathBuf, reason: String },
    #[error("Error reading file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error making archive {}: {source}", archive.display())]
    MakeArchive {
        archive: PathBuf,
        #[source]
        source: Box<Error>,
    },
    #[error("Error reading archive {}: {source}", archive.display())]
    ReadArchive {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error making final archive {}: {source}", archive.display())]
    FinalArchive {
        archive: PathBuf,
        #[source]
        source: Box<Error>,
    },
    #[error("{msg}: {error}")]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{}", itertools::join(.0, "; "))]
    LotsOfError(Vec<Error>),
}

impl<S: Into<String>> WithMsg<S> for Error {
    fn with_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(Error::into_iter)),
            e => Box::new(std::iter::once(e)),
        }
    }

    pub fn chain(self, other: Error) -> Error {
        Error::LotsOfError(self.into_iter().chain(other.into_iter()).collect_vec())
    }
}
