use crate::backup::finish::Finish;
use crate::backup::result_error::result::Result;
use itertools::Itertools;
use std::fs::File;
use std::io::{BufWriter, IntoInnerError, Write};
use std::path::{Component, Path};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn file_options(large_file: bool) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(large_file)
}

/// Name of `rel` inside the archive, always `/` separated.
fn archive_name(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .join("/")
}

/// Zips the full recursive content of `src_dir` into a new file at `dst`.
///
/// Entry names are relative to `src_dir`. Symlinks are followed; a dangling one
/// fails the whole archive. `dst` itself is skipped if it happens to live
/// under `src_dir`.
pub fn zip_dir<P1: AsRef<Path>, P2: AsRef<Path>>(src_dir: P1, dst: P2) -> Result<()> {
    let src_dir = src_dir.as_ref();
    let dst = dst.as_ref();
    let mut writer = ZipWriter::new(BufWriter::new(File::create(dst)?));

    let mut file_count = 0usize;
    for entry in WalkDir::new(src_dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if path == dst {
            continue;
        }
        let rel = path.strip_prefix(src_dir)?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let name = archive_name(rel);
        if entry.file_type().is_dir() {
            tracing::trace!("Adding directory {:?} as {name}", path);
            writer.add_directory(name, file_options(false))?;
        } else if entry.file_type().is_file() {
            tracing::trace!("Adding file {:?} as {name}", path);
            let large_file = entry.metadata()?.len() >= u64::from(u32::MAX);
            writer.start_file(name, file_options(large_file))?;
            std::io::copy(&mut File::open(path)?, &mut writer)?;
            file_count += 1;
        } else {
            tracing::trace!("Skipping {:?}, not a regular file", path);
        }
    }

    let mut file = Finish::finish(writer)?
        .into_inner()
        .map_err(IntoInnerError::into_error)?;
    file.flush()?;
    tracing::debug!("Archived {file_count} files from {:?} into {:?}", src_dir, dst);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn create_test_files(dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir.join("subdir/empty"))?;
        std::fs::write(dir.join("file1.txt"), "content1")?;
        std::fs::write(dir.join("subdir/file2.bin"), [0u8, 1, 2, 255])?;
        Ok(())
    }

    #[test]
    fn test_archive_name() {
        assert_eq!(archive_name(Path::new("a/b/c.txt")), "a/b/c.txt");
        assert_eq!(archive_name(Path::new("./a")), "a");
    }

    #[test]
    fn test_zip_dir_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        create_test_files(&src).unwrap();
        let dst = tmp.path().join("out.zip");

        zip_dir(&src, &dst).unwrap();

        let mut archive = ZipArchive::new(File::open(&dst).unwrap()).unwrap();
        let names: Vec<_> = archive.file_names().map(str::to_string).sorted().collect();
        assert_eq!(
            names,
            vec!["file1.txt", "subdir/", "subdir/empty/", "subdir/file2.bin"]
        );

        let mut content = Vec::new();
        archive
            .by_name("subdir/file2.bin")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn test_zip_dir_skips_own_output() {
        let tmp = TempDir::new().unwrap();
        create_test_files(tmp.path()).unwrap();
        let dst = tmp.path().join("self.zip");

        zip_dir(tmp.path(), &dst).unwrap();

        let archive = ZipArchive::new(File::open(&dst).unwrap()).unwrap();
        assert!(archive.file_names().all(|n| n != "self.zip"));
    }

    #[test]
    fn test_zip_dir_missing_source() {
        let tmp = TempDir::new().unwrap();
        assert!(zip_dir(tmp.path().join("missing"), tmp.path().join("o.zip")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_zip_dir_dangling_symlink() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        create_test_files(&src).unwrap();
        std::os::unix::fs::symlink(src.join("gone"), src.join("link")).unwrap();

        assert!(zip_dir(&src, tmp.path().join("o.zip")).is_err());
    }
}
