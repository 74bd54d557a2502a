//! Flat-file export of the room index.
//!
//! The file holds one line per occupied room in ascending room order, separated by `\n`
//! with no newline after the last line. Every export replaces the whole file: the payload is
//! rendered in memory, written to a sibling temporary file and renamed over the target, so a
//! failed export leaves the previous file intact.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Writes export lines to a backing file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlatFileWriter {
    path: PathBuf,
}

impl FlatFileWriter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the file's contents with `lines`.
    ///
    /// # Errors
    ///
    /// [`Error::ExportFailed`] if the file cannot be written. The previous contents, if any,
    /// are left untouched.
    pub fn write_lines<I, S>(&self, lines: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut payload = Vec::new();
        let written = write_lines(&mut payload, lines).and_then(|written| {
            self.replace_with(&payload)?;
            Ok(written)
        });

        match written {
            Ok(written) => {
                debug!(path = %self.path.display(), lines = written, "rooms exported");
                Ok(written)
            }
            Err(source) => {
                warn!(path = %self.path.display(), error = %source, "room export failed");
                Err(Error::ExportFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    /// Sibling of the target that the payload is staged in before the rename.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map_or_else(OsString::new, OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn replace_with(&self, payload: &[u8]) -> io::Result<()> {
        let staging = self.staging_path();
        fs::write(&staging, payload)
            .and_then(|()| fs::rename(&staging, &self.path))
            .inspect_err(|_| {
                // The staged copy is useless once the rename has failed.
                let _ = fs::remove_file(&staging);
            })
    }
}

/// Writes `lines` separated by `\n`, returning how many were written.
///
/// # Errors
///
/// Any error from `out`.
pub fn write_lines<W, I, S>(out: &mut W, lines: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut written = 0;
    for line in lines {
        if written > 0 {
            out.write_all(b"\n")?;
        }
        out.write_all(line.as_ref().as_bytes())?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn no_trailing_newline() {
        let mut out = Vec::new();
        let written = write_lines(&mut out, ["0 1", "1_1_1_1 2"]).unwrap();
        assert_eq!(written, 2);
        assert_eq!(out, b"0 1\n1_1_1_1 2");
    }

    #[test]
    fn empty_export_is_empty() {
        let mut out = Vec::new();
        assert_eq!(write_lines(&mut out, Vec::<String>::new()).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn rewrite_truncates_previous_contents() {
        let path = std::env::temp_dir().join(format!("hilbert_hotel_export_{}.txt", std::process::id()));
        let writer = FlatFileWriter::new(&path);
        writer.write_lines(["0 1", "0 2", "0 3"]).unwrap();
        writer.write_lines(["0 9"]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0 9");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unwritable_path_reports_export_failed() {
        let path = std::env::temp_dir().join("hilbert_hotel_missing_dir").join("nested").join("rooms.txt");
        let error = FlatFileWriter::new(&path).write_lines(["0 1"]).unwrap_err();
        assert!(matches!(error, Error::ExportFailed { path: failed, .. } if failed == path));
    }

    #[test]
    fn successful_export_leaves_no_staging_file() {
        let path = std::env::temp_dir().join(format!("hilbert_hotel_staging_{}.txt", std::process::id()));
        let writer = FlatFileWriter::new(&path);
        writer.write_lines(["0 1"]).unwrap();
        assert!(!writer.staging_path().exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0 1");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_replace_keeps_the_target_and_cleans_up() {
        // A non-empty directory cannot be replaced by a file, so the rename fails after the
        // payload has been staged.
        let path = std::env::temp_dir().join(format!("hilbert_hotel_blocked_{}", std::process::id()));
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let writer = FlatFileWriter::new(&path);
        let error = writer.write_lines(["0 1", "0 2"]).unwrap_err();
        assert!(matches!(error, Error::ExportFailed { .. }));
        assert!(path.join("occupied").is_dir());
        assert!(!writer.staging_path().exists());

        std::fs::remove_dir_all(&path).unwrap();
    }
}
