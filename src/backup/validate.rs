//! Validation functions for configuration values.

use validator::ValidationError;

use std::path::Path;

pub fn validate_dir_exist_or_created<P: AsRef<Path>>(dir: P) -> Result<(), ValidationError> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ValidationError::new("InvalidDirectory")
                .with_message(format!("{:?} is not a directory", dir).into()));
        }
    } else {
        tracing::info!("Creating backup location {:?}", dir);
        return std::fs::create_dir_all(dir).map_err(|e| {
            ValidationError::new("InvalidDirectory").with_message(
                format!("cannot create or access backup_location {:?}: {}", dir, e).into(),
            )
        });
    }

    Ok(())
}

pub fn validate_cron_str<S: AsRef<str>>(cron: S) -> Result<(), ValidationError> {
    let cron = cron.as_ref();
    if cron_parser::parse(cron, &chrono::Utc::now()).is_err() {
        return Err(ValidationError::new("InvalidCron")
            .with_message(format!("Invalid cron string: {cron:?}").into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_created_with_parents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");
        validate_dir_exist_or_created(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_existing_dir_ok() {
        let tmp = TempDir::new().unwrap();
        assert!(validate_dir_exist_or_created(tmp.path()).is_ok());
    }

    #[test]
    fn test_file_is_not_dir() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f");
        std::fs::write(&file, "x").unwrap();
        let err = validate_dir_exist_or_created(&file).unwrap_err();
        assert_eq!(err.code, "InvalidDirectory");
    }

    #[test]
    fn test_cron_str() {
        assert!(validate_cron_str("*/5 * * * *").is_ok());
        assert!(validate_cron_str("not a cron").is_err());
    }
}
