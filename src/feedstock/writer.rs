//! Feedstock sink
//!
//! - One JSON document per line
//! - Line 1 is the dataset, every later line a record
//! - Opened with truncation; one writer owns one file
//! - Flushed and synced on close, flushed on drop
//! - A failed write poisons the writer: later writes are refused and
//!   closing cuts the file back to the last complete line

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::{FeedstockError, FeedstockResult};

/// Newline-delimited JSON writer for one dataset's feedstock.
pub struct FeedstockWriter<W: Write = BufWriter<File>> {
    path: PathBuf,
    sink: Option<W>,
    lines_written: u64,
    /// Bytes belonging to complete lines
    committed_bytes: u64,
    poisoned: bool,
}

impl FeedstockWriter {
    /// Returns the conventional feedstock path for a source name.
    pub fn path_for(feedstock_dir: &Path, source_name: &str) -> PathBuf {
        feedstock_dir.join(format!("{}_all.json", source_name))
    }

    /// Creates (or truncates) the feedstock file at `path`.
    ///
    /// Parent directories are created if missing.
    pub fn open(path: &Path) -> FeedstockResult<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    FeedstockError::io(
                        format!("Failed to create feedstock directory: {}", dir.display()),
                        e,
                    )
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            FeedstockError::io(format!("Failed to open feedstock: {}", path.display()), e)
        })?;

        Ok(Self::from_sink(path, BufWriter::new(file)))
    }

    /// Flushes, syncs and closes the file.
    ///
    /// A poisoned writer drops its buffer and truncates the file to the
    /// last complete line instead of flushing.
    pub fn close(&mut self) -> FeedstockResult<()> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };

        let file = if self.poisoned {
            let (file, _torn) = sink.into_parts();
            file.set_len(self.committed_bytes).map_err(|e| {
                FeedstockError::io(format!("Failed to truncate {}", self.path.display()), e)
            })?;
            file
        } else {
            sink.flush().map_err(|e| {
                FeedstockError::io(format!("Failed to flush {}", self.path.display()), e)
            })?;
            let (file, _) = sink.into_parts();
            file
        };

        file.sync_all().map_err(|e| {
            FeedstockError::io(format!("Failed to sync {}", self.path.display()), e)
        })?;
        Ok(())
    }

    /// Closes the file and deletes it.
    pub fn discard(&mut self) -> FeedstockResult<()> {
        if let Some(sink) = self.sink.take() {
            drop(sink.into_parts());
        }

        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                FeedstockError::io(
                    format!("Failed to remove partial feedstock: {}", self.path.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

impl<W: Write> FeedstockWriter<W> {
    /// Wraps an already opened sink; `path` labels errors and summaries.
    pub fn from_sink(path: &Path, sink: W) -> Self {
        Self {
            path: path.to_path_buf(),
            sink: Some(sink),
            lines_written: 0,
            committed_bytes: 0,
            poisoned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    /// True once a write has failed part way.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Serializes `document` and appends it as one line.
    ///
    /// Nothing is written once the writer is poisoned.
    pub fn write_line(&mut self, document: &Value) -> FeedstockResult<()> {
        let sink = self.sink.as_mut().ok_or_else(FeedstockError::not_initialized)?;
        if self.poisoned {
            return Err(FeedstockError::poisoned(&self.path, self.lines_written));
        }

        let mut line = serde_json::to_vec(document).map_err(|e| {
            FeedstockError::io("Failed to serialize feedstock line", e.into())
        })?;
        line.push(b'\n');

        if let Err(e) = sink.write_all(&line) {
            self.poisoned = true;
            return Err(FeedstockError::io(
                format!(
                    "Failed to write line {} of {}",
                    self.lines_written + 1,
                    self.path.display()
                ),
                e,
            ));
        }

        self.lines_written += 1;
        self.committed_bytes += line.len() as u64;
        Ok(())
    }
}

impl<W: Write> Drop for FeedstockWriter<W> {
    fn drop(&mut self) {
        if self.poisoned {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use tempfile::TempDir;

    /// Accepts `budget` bytes, then fails every write.
    struct ShortSink {
        written: Vec<u8>,
        budget: usize,
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device full"));
            }
            let n = buf.len().min(self.budget);
            self.written.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lines_are_newline_delimited() {
        let temp_dir = TempDir::new().unwrap();
        let path = FeedstockWriter::path_for(temp_dir.path(), "oqmd");

        let mut writer = FeedstockWriter::open(&path).unwrap();
        writer.write_line(&json!({"n": 1})).unwrap();
        writer.write_line(&json!({"n": 2})).unwrap();
        writer.close().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![r#"{"n":1}"#, r#"{"n":2}"#]);
        assert_eq!(writer.lines_written(), 2);
        assert!(path.ends_with("oqmd_all.json"));
    }

    #[test]
    fn test_open_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("x_all.json");

        let mut writer = FeedstockWriter::open(&path).unwrap();
        writer.close().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = FeedstockWriter::open(&temp_dir.path().join("a_all.json")).unwrap();
        writer.close().unwrap();

        assert!(!writer.is_open());
        assert!(writer.write_line(&json!({})).is_err());
    }

    #[test]
    fn test_discard_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("b_all.json");

        let mut writer = FeedstockWriter::open(&path).unwrap();
        writer.write_line(&json!({"partial": true})).unwrap();
        writer.discard().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_drop_flushes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("c_all.json");

        {
            let mut writer = FeedstockWriter::open(&path).unwrap();
            writer.write_line(&json!({"kept": true})).unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"kept\":true}\n");
    }

    #[test]
    fn test_failed_write_poisons_writer() {
        let sink = ShortSink {
            written: Vec::new(),
            budget: 12,
        };
        let mut writer = FeedstockWriter::from_sink(Path::new("mem_all.json"), sink);

        writer.write_line(&json!({"n": 1})).unwrap();
        let err = writer.write_line(&json!({"n": 22})).unwrap_err();
        assert_eq!(err.code(), crate::feedstock::FeedstockErrorCode::MdfFeedstockIo);
        assert!(writer.is_poisoned());
        assert_eq!(writer.lines_written(), 1);

        let err = writer.write_line(&json!({"n": 3})).unwrap_err();
        assert_eq!(err.code(), crate::feedstock::FeedstockErrorCode::MdfFeedstockIo);

        let written = String::from_utf8(writer.sink.take().unwrap().written).unwrap();
        assert_eq!(written, "{\"n\":1}\n{\"n\"");
    }

    #[test]
    fn test_close_after_failure_keeps_complete_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("d_all.json");

        let mut writer = FeedstockWriter::open(&path).unwrap();
        writer.write_line(&json!({"n": 1})).unwrap();
        writer.sink.as_mut().unwrap().flush().unwrap();

        // Simulate a write that got half way before failing.
        writer.sink.as_mut().unwrap().write_all(b"{\"n\":").unwrap();
        writer.sink.as_mut().unwrap().flush().unwrap();
        writer.poisoned = true;

        writer.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"n\":1}\n");
    }
}
