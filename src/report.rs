use crate::cache::ContentFingerprint;
use crate::error::Result;
use crate::utils::format_file_size;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Running totals over files that were actually replaced by a smaller version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionStats {
    pub files_compressed: u64,
    pub bytes_saved: u64,
    pub bytes_original: u64,
}

impl CompressionStats {
    /// Records one accepted compression. Callers guarantee `compressed <= original`.
    pub fn record(&mut self, original: u64, compressed: u64) {
        self.files_compressed += 1;
        self.bytes_saved += original.saturating_sub(compressed);
        self.bytes_original += original;
    }

    pub fn bytes_after(&self) -> u64 {
        self.bytes_original - self.bytes_saved
    }

    pub fn saved_percent(&self) -> f64 {
        self.bytes_saved as f64 * 100.0 / self.bytes_original.max(1) as f64
    }

    pub fn summary_line(&self) -> String {
        format!(
            "compressed {} files, before {}, after {}, saved {}, saved-percent {:.0}%",
            self.files_compressed,
            format_file_size(self.bytes_original),
            format_file_size(self.bytes_after()),
            format_file_size(self.bytes_saved),
            self.saved_percent()
        )
    }
}

/// Writes the cache file and the report file.
///
/// Both files are replaced on every flush, so calling it again with the
/// same inputs leaves the same bytes on disk. Each file is written to a
/// sibling temp file and renamed over the old one; a reader never sees a
/// half-written list. A `None` path disables that artifact.
#[derive(Debug, Clone, Default)]
pub struct PersistenceSink {
    cache_path: Option<PathBuf>,
    report_path: Option<PathBuf>,
}

impl PersistenceSink {
    pub fn new(cache_path: Option<PathBuf>, report_path: Option<PathBuf>) -> Self {
        Self {
            cache_path,
            report_path,
        }
    }

    /// Persist the settled set and the report
    ///
    /// # Arguments
    /// * `snapshot` - Settled fingerprints in insertion order
    /// * `report_lines` - Per-file report records collected so far
    /// * `stats` - Running totals; their summary line always ends the report
    ///
    /// # Returns
    /// * `Ok(())` once both files are in place, or the first I/O or JSON error
    pub fn flush(
        &self,
        snapshot: &[ContentFingerprint],
        report_lines: &[String],
        stats: &CompressionStats,
    ) -> Result<()> {
        if let Some(path) = &self.cache_path {
            write_json(path, snapshot)?;
        }

        if let Some(path) = &self.report_path {
            let mut lines = report_lines.to_vec();
            lines.push(stats.summary_line());
            write_json(path, &lines)?;
        }

        Ok(())
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(file.as_file_mut(), value)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Reads the last line of a report file, normally the summary.
pub fn read_last_report_line(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let lines: Vec<String> = serde_json::from_str(&content).ok()?;
    lines.into_iter().last()
}
