//! Raw log line providers. These are thin collaborators: the detection
//! engine only needs a batch of lines, not a file or a journal.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source does not exist at all; distinct from "present but no
    /// usable lines", which the parser/aggregator layers report.
    #[error("log source not found: {name}")]
    NotFound { name: String },

    #[error("reading {name}: {detail}")]
    Read { name: String, detail: String },
}

/// Provider of one batch of raw log lines per scan.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn lines(&self) -> Result<Vec<String>, SourceError>;
    fn describe(&self) -> String;
}

/// Reads an auth.log-style file. The file may be appended to while we read;
/// a truncated final line comes through as-is and the parser treats it as
/// unmatched. Decoding is lossy per batch: a torn multi-byte character or a
/// stray non-UTF-8 byte (usernames in auth.log are attacker-controlled)
/// mangles that line only, never the scan.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LogSource for FileSource {
    async fn lines(&self) -> Result<Vec<String>, SourceError> {
        let name = self.describe();
        if !self.path.exists() {
            return Err(SourceError::NotFound { name });
        }
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SourceError::Read {
                name,
                detail: e.to_string(),
            })?;
        let text = String::from_utf8_lossy(&raw);
        Ok(text.lines().map(str::to_string).collect())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Queries the systemd journal for one unit via `journalctl`.
pub struct JournalSource {
    unit: String,
}

impl JournalSource {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }
}

#[async_trait]
impl LogSource for JournalSource {
    async fn lines(&self) -> Result<Vec<String>, SourceError> {
        let name = self.describe();
        let output = tokio::process::Command::new("journalctl")
            .args(["-u", &self.unit, "--no-pager"])
            .output()
            .await
            .map_err(|e| SourceError::NotFound {
                name: format!("{name} ({e})"),
            })?;

        if !output.status.success() {
            return Err(SourceError::Read {
                name,
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(str::to_string).collect())
    }

    fn describe(&self) -> String {
        format!("journalctl -u {}", self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_source_missing_is_not_found() {
        let src = FileSource::new("/nonexistent/auth.log");
        match src.lines().await {
            Err(SourceError::NotFound { .. }) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_file_source_reads_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        std::fs::write(&path, "one\ntwo\nthree").unwrap();

        let src = FileSource::new(&path);
        let lines = src.lines().await.unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_file_source_tolerates_torn_utf8_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        // a concurrent writer cut off mid multi-byte character
        let mut bytes =
            b"sshd[1]: Failed password for root from 203.0.113.7 port 22 ssh2\n".to_vec();
        bytes.extend_from_slice(&[0xE2, 0x94]);
        std::fs::write(&path, bytes).unwrap();

        let src = FileSource::new(&path);
        let lines = src.lines().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("203.0.113.7"));
        // torn tail decodes lossily into an unmatched line, not an error
        assert!(lines[1].contains('\u{FFFD}'));
    }
}
