//! File sink
//!
//! Appends one line per message to a single file through a buffered writer,
//! flushed after every message.

use crate::config::FileSinkConfig;
use crate::core::level::LogLevel;
use crate::error::Result;
use crate::sinks::traits::{Sink, SinkError, SinkResult};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Single file sink
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    /// `None` once closed
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// Open (or create) the file named by `config`, creating missing parent
    /// directories.
    pub fn open(config: &FileSinkConfig) -> Result<Self> {
        let path = config.path.clone();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if config.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&path)?;

        tracing::debug!("FileSink opened {}", path.display());
        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    /// Append to the file at `path`
    pub fn append<P: Into<PathBuf>>(path: P) -> Result<Self> {
        Self::open(&FileSinkConfig::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and release the file. Later writes fail with [`SinkError::Closed`].
    pub fn close(&self) -> SinkResult<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut w) = writer.take() {
            w.flush()?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        let writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.is_none()
    }
}

impl Sink for FileSink {
    fn write(&self, _level: LogLevel, message: &str) -> SinkResult<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let w = writer.as_mut().ok_or(SinkError::Closed)?;
        writeln!(w, "{}", message)?;
        w.flush()?;
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(w) = writer.as_mut() {
            w.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }

    fn stats(&self) -> String {
        format!("FileSink: {}", self.path.display())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!("FileSink failed to flush {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_writes_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("app.log");
        let sink = FileSink::append(&path).unwrap();

        sink.write(LogLevel::Info, "[I:001ms]: first").unwrap();
        sink.write(LogLevel::Error, "second").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[I:001ms]: first\nsecond\n");
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn test_file_sink_append_and_truncate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let sink = FileSink::append(&path).unwrap();
        sink.write(LogLevel::Info, "new").unwrap();
        drop(sink);
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");

        let config = FileSinkConfig {
            append: false,
            ..FileSinkConfig::new(&path)
        };
        let sink = FileSink::open(&config).unwrap();
        sink.write(LogLevel::Info, "fresh").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_closed_sink_rejects_writes() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::append(temp_dir.path().join("app.log")).unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());
        assert!(matches!(
            sink.write(LogLevel::Info, "late"),
            Err(SinkError::Closed)
        ));
        assert!(sink.flush().is_ok());
    }
}
