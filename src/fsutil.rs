use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::ResultOkLogExt;

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use hostpeek::fsutil;
/// let reader = fsutil::open_file_reader("/some/file.txt")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads a file and returns its trimmed content, or `None` if the path is not
/// a regular file, cannot be read, or holds only whitespace.
///
/// This is the acceptance rule every host-path cascade tier applies: kernel
/// pseudo-files occasionally exist but read back empty, and an empty read
/// must fall through to the next tier rather than win the cascade.
///
/// # Arguments
///
/// * `path` - Absolute path of the candidate file.
///
/// # Returns
///
/// * `Some(content)` with leading/trailing whitespace removed.
/// * `None` for directories, unreadable files, and empty content.
pub fn read_trimmed(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() {
        return None;
    }
    let mut content = String::new();
    open_file_reader(path)
        .ok_trace()?
        .read_to_string(&mut content)
        .ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_open_file_reader_success() {
        let tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        let path = tmp.path();
        let reader = open_file_reader(path).expect("should open test file");
        let metadata = reader.get_ref().metadata().unwrap();
        assert!(metadata.is_file());
    }

    #[test]
    fn test_open_file_reader_error() {
        let result = open_file_reader("/definitely/does/not/exist");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.path, PathBuf::from("/definitely/does/not/exist"));
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_read_trimmed_strips_whitespace() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "  MemTotal: 1024 kB  ").unwrap();
        assert_eq!(
            read_trimmed(tmp.path()).as_deref(),
            Some("MemTotal: 1024 kB")
        );
    }

    #[test]
    fn test_read_trimmed_rejects_empty_content() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "   \n\t").unwrap();
        assert_eq!(read_trimmed(tmp.path()), None);
    }

    #[test]
    fn test_read_trimmed_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_trimmed(dir.path()), None);
    }

    #[test]
    fn test_read_trimmed_rejects_missing_file() {
        assert_eq!(read_trimmed("/definitely/does/not/exist"), None);
    }
}
