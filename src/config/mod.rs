//! Runtime configuration. Every tunable is an explicit value handed to the
//! component that uses it; nothing reads process-global state.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detect::SeverityThresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Severity band boundaries for the daily count.
    pub thresholds: SeverityThresholds,
    /// Failures from one source within a scan to flag it a suspect.
    pub suspect_threshold: u64,
    /// Trailing moving-average window over the daily series, in days.
    pub smoothing_window: usize,
    /// Snapshots retained in history before the oldest are evicted.
    pub history_capacity: usize,
    /// Lines kept from the tail of captured stdout/stderr.
    pub tail_lines: usize,
    /// Process exit code meaning "findings, not critical".
    pub warn_exit_code: i32,
    pub scan: ScanConfig,
    /// Directory holding `auth_summary_*.csv` extracts.
    pub reports_dir: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seconds between automated scans when automation is enabled.
    pub interval_secs: u64,
    /// Auth log consulted when not reading the journal.
    pub log_path: String,
    /// systemd unit queried in journal mode.
    pub unit: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
            suspect_threshold: 5,
            smoothing_window: 7,
            history_capacity: 10,
            tail_lines: 40,
            warn_exit_code: 2,
            scan: ScanConfig::default(),
            reports_dir: "reports".to_string(),
            db_path: "data/authwatch.db".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 21_600,
            log_path: "/var/log/auth.log".to_string(),
            unit: "sshd".to_string(),
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults for absent keys.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load the named file, or defaults when no path was given. A path the
    /// user named but that cannot be read is an error, not a silent
    /// fallback, so config typos surface immediately.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.thresholds.low_max, 5);
        assert_eq!(c.thresholds.med_max, 20);
        assert_eq!(c.suspect_threshold, 5);
        assert_eq!(c.smoothing_window, 7);
        assert_eq!(c.history_capacity, 10);
        assert_eq!(c.warn_exit_code, 2);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            suspect_threshold = 3

            [thresholds]
            low_max = 2
            med_max = 8

            [scan]
            interval_secs = 60
        "#;
        let c: Config = toml::from_str(toml).unwrap();
        assert_eq!(c.suspect_threshold, 3);
        assert_eq!(c.thresholds.low_max, 2);
        assert_eq!(c.thresholds.med_max, 8);
        assert_eq!(c.scan.interval_secs, 60);
        // untouched keys keep defaults
        assert_eq!(c.smoothing_window, 7);
        assert_eq!(c.scan.unit, "sshd");
    }

    #[test]
    fn test_load_or_default_no_path_uses_defaults() {
        let c = Config::load_or_default(None).unwrap();
        assert_eq!(c.history_capacity, 10);
    }

    #[test]
    fn test_load_or_default_named_missing_path_errors() {
        let result = Config::load_or_default(Some(Path::new("/nonexistent/authwatch.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_named_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authwatch.toml");
        std::fs::write(&path, "suspect_threshold = 9\n").unwrap();
        let c = Config::load_or_default(Some(&path)).unwrap();
        assert_eq!(c.suspect_threshold, 9);
    }
}
