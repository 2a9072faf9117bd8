use crate::error::{CompressionError, Result};
use crate::orchestrator::{CompressOutcome, Compressor, FileTask};
use crate::service::CompressionService;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Include and exclude globs over `/`-separated paths relative to the base.
///
/// A pattern starting with `!` excludes. A path is selected when it matches
/// at least one include and no exclude.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if let Some(negated) = pattern.strip_prefix('!') {
                exclude.push(Pattern::new(negated)?);
            } else if !pattern.is_empty() {
                include.push(Pattern::new(pattern)?);
            }
        }

        Ok(Self { include, exclude })
    }

    pub fn matches(&self, relative_path: &str) -> bool {
        self.include
            .iter()
            .any(|p| p.matches_with(relative_path, MATCH_OPTIONS))
            && !self
                .exclude
                .iter()
                .any(|p| p.matches_with(relative_path, MATCH_OPTIONS))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub rewritten: usize,
    pub unchanged: usize,
    /// Stopped early because every API key was exhausted
    pub halted: bool,
}

/// Collect files under `base` whose relative paths pass the filters
///
/// # Arguments
/// * `base` - Asset directory to walk
/// * `filters` - Globs over relative paths; `!` marks an exclude
///
/// # Returns
/// * Paths relative to `base`, sorted, hidden entries skipped
pub fn collect_asset_files<S: AsRef<str>>(base: &Path, filters: &[S]) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Err(CompressionError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("base path is not a directory: {}", base.display()),
        )));
    }

    let filter = FileFilter::new(filters)?;
    let mut files = Vec::new();

    let walker = WalkDir::new(base)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(base) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        if filter.matches(&to_slash_path(&relative)) {
            files.push(relative);
        }
    }

    files.sort();
    Ok(files)
}

/// Runs every file through the compressor, one at a time.
///
/// A file is rewritten only when its bytes actually changed. Stops at the
/// first `CredentialsExhausted`; other per-file failures are outcomes, not
/// errors. Read and write errors abort the batch.
pub async fn compress_tree<S: CompressionService>(
    compressor: &mut Compressor<S>,
    base: &Path,
    files: &[PathBuf],
) -> Result<BatchSummary> {
    let start_time = Instant::now();
    let mut summary = BatchSummary {
        total: files.len(),
        ..BatchSummary::default()
    };

    crate::info!("📊 Found {} files to process", files.len());

    for relative in files {
        let full_path = base.join(relative);
        let original = fs::read(&full_path)?;
        let mut task = FileTask::new(to_slash_path(relative), original.clone());

        match compressor.compress(&mut task).await {
            Ok(CompressOutcome::Compressed { .. }) if task.bytes != original => {
                fs::write(&full_path, &task.bytes)?;
                summary.rewritten += 1;
            }
            Ok(_) => summary.unchanged += 1,
            Err(CompressionError::CredentialsExhausted) => {
                summary.halted = true;
                break;
            }
            Err(e) => return Err(e),
        }
    }

    crate::verbose!(
        "Processed {} files in {:?} ({} rewritten, {} unchanged)",
        summary.rewritten + summary.unchanged,
        start_time.elapsed(),
        summary.rewritten,
        summary.unchanged
    );

    Ok(summary)
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
