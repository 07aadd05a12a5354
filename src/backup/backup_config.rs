use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::validate::validate_dir_exist_or_created;
use derive_more::Display;
use getset::Getters;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Backup configuration as authored by the user.
///
/// Only `backup_location` and `data` are interpreted, any other key is ignored.
/// `data` keeps whatever the file held, non-string entries included, so that
/// [`BackupConfig::partition_data`] can report them instead of failing the load.
#[derive(Clone, Deserialize, Debug, Validate, Getters)]
#[getset(get = "pub")]
pub struct BackupConfig {
    #[validate(custom(function = validate_dir_exist_or_created))]
    backup_location: PathBuf,
    data: Vec<DataEntry>,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum DataEntry {
    Path(String),
    Other(Value),
}

/// A `data` entry dropped before encoding.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum RejectedEntry {
    #[display("Invalid data entry {_0}, not a string (ignoring)")]
    NotAString(Value),
    #[display("Invalid data entry {_0}, does not exist (ignoring)")]
    Missing(String),
}

impl BackupConfig {
    pub fn new<P: Into<PathBuf>, I: IntoIterator<Item = S>, S: Into<String>>(
        backup_location: P,
        data: I,
    ) -> Self {
        Self {
            backup_location: backup_location.into(),
            data: data.into_iter().map(Into::into).map(DataEntry::Path).collect(),
        }
    }

    /// Loads and schema-checks the config at `path`.
    ///
    /// Files ending in `.yml` or `.yaml` are read as YAML, anything else as JSON.
    /// Both go through the same object model so the checks are identical.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigMissing {
                path: path.to_path_buf(),
            });
        }

        let unreadable = |reason: String| Error::ConfigUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let value = read_value(path).map_err(|e| unreadable(e.to_string()))?;
        if !value.is_object() {
            return Err(unreadable("File does not contain a dictionary".to_string()));
        }
        if !value.get("backup_location").is_some_and(Value::is_string) {
            return Err(Error::ConfigInvalidSchema(
                "backup_location is not a string or field missing".to_string(),
            ));
        }
        if !value.get("data").is_some_and(Value::is_array) {
            return Err(Error::ConfigInvalidSchema(
                "data is not a list or field is missing".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| Error::ConfigInvalidSchema(e.to_string()))
    }

    /// Splits `data` into the sources that will be encoded and the rejected
    /// entries, both in their original order. The config itself is left as is.
    pub fn partition_data(&self) -> (Vec<PathBuf>, Vec<RejectedEntry>) {
        let mut sources = Vec::with_capacity(self.data.len());
        let mut rejected = Vec::new();
        for entry in &self.data {
            match entry {
                DataEntry::Path(p) if Path::new(p).exists() => sources.push(PathBuf::from(p)),
                DataEntry::Path(p) => rejected.push(RejectedEntry::Missing(p.clone())),
                DataEntry::Other(v) => rejected.push(RejectedEntry::NotAString(v.clone())),
            }
        }
        (sources, rejected)
    }

    /// Makes sure `backup_location` is a directory, creating it when absent.
    pub fn prepare_backup_location(&self) -> Result<()> {
        self.validate().map_err(|e| Error::BackupLocation {
            path: self.backup_location.clone(),
            reason: e.to_string(),
        })
    }
}

fn read_value(path: &Path) -> Result<Value> {
    let reader = BufReader::new(File::open(path)?);
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"));
    if is_yaml {
        Ok(serde_yml::from_reader(reader)?)
    } else {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_missing() {
        let tmp = TempDir::new().unwrap();
        let err = BackupConfig::load(tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigMissing { .. }));
    }

    #[test]
    fn test_load_not_json() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "c.json", "{ not json");
        let err = BackupConfig::load(path).unwrap_err();
        assert!(matches!(err, Error::ConfigUnreadable { .. }));
        assert!(err.to_string().starts_with("Error reading config file: "));
    }

    #[test]
    fn test_load_wrong_root() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "c.json", "[1, 2]");
        let err = BackupConfig::load(path).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error reading config file: File does not contain a dictionary"
        );
    }

    #[test]
    fn test_load_bad_backup_location() {
        let tmp = TempDir::new().unwrap();
        for content in [r#"{"data": []}"#, r#"{"backup_location": 5, "data": []}"#] {
            let path = write_config(&tmp, "c.json", content);
            let err = BackupConfig::load(path).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid config file, backup_location is not a string or field missing"
            );
        }
    }

    #[test]
    fn test_load_bad_data() {
        let tmp = TempDir::new().unwrap();
        for content in [
            r#"{"backup_location": "/x"}"#,
            r#"{"backup_location": "/x", "data": "a.txt"}"#,
        ] {
            let path = write_config(&tmp, "c.json", content);
            let err = BackupConfig::load(path).unwrap_err();
            assert!(matches!(err, Error::ConfigInvalidSchema(_)));
            assert_eq!(
                err.to_string(),
                "Invalid config file, data is not a list or field is missing"
            );
        }
    }

    #[test]
    fn test_load_keeps_non_string_entries() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            "c.json",
            r#"{"backup_location": "/x", "data": ["a", 3, null, {"k": 1}], "extra": true}"#,
        );
        let config = BackupConfig::load(path).unwrap();
        assert_eq!(config.backup_location(), Path::new("/x"));
        assert_eq!(config.data().len(), 4);
        assert_eq!(config.data()[0], DataEntry::Path("a".to_string()));
        assert_eq!(config.data()[1], DataEntry::Other(Value::from(3)));
    }

    #[test]
    fn test_load_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            "c.yml",
            "backup_location: /x\ndata:\n  - /a\n  - /b\n",
        );
        let config = BackupConfig::load(path).unwrap();
        assert_eq!(config.data().len(), 2);
    }

    #[test]
    fn test_partition_data() {
        let tmp = TempDir::new().unwrap();
        let present = write_config(&tmp, "a.txt", "a");
        let missing = tmp.path().join("missing.txt");
        let config: BackupConfig = serde_json::from_value(serde_json::json!({
            "backup_location": tmp.path().join("out"),
            "data": [present, 7, missing, ""],
        }))
        .unwrap();

        let (sources, rejected) = config.partition_data();
        assert_eq!(sources, vec![present.clone()]);
        assert_eq!(rejected.len(), 3);
        assert_eq!(
            rejected[0].to_string(),
            "Invalid data entry 7, not a string (ignoring)"
        );
        assert_eq!(
            rejected[1].to_string(),
            format!("Invalid data entry {}, does not exist (ignoring)", missing.display())
        );
        // untouched
        assert_eq!(config.data().len(), 4);
    }

    #[test]
    fn test_prepare_backup_location() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("nested/out");
        BackupConfig::new(&out, Vec::<String>::new())
            .prepare_backup_location()
            .unwrap();
        assert!(out.is_dir());

        let file = write_config(&tmp, "file", "");
        let err = BackupConfig::new(&file, Vec::<String>::new())
            .prepare_backup_location()
            .unwrap_err();
        assert!(matches!(err, Error::BackupLocation { .. }));
    }
}
