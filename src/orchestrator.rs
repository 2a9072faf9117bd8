use crate::cache::{ContentCache, ContentFingerprint};
use crate::config::CompressorConfig;
use crate::credentials::CredentialRotor;
use crate::error::{CompressionError, Result};
use crate::report::{CompressionStats, PersistenceSink};
use crate::service::{CompressionService, ShrinkResult};
use crate::utils::{calculate_compression_ratio, format_file_size};
use indicatif::ProgressBar;

/// One file handed to the compressor.
///
/// The path is fixed at construction. `bytes` is replaced in place when a
/// smaller version is accepted.
#[derive(Debug, Clone)]
pub struct FileTask {
    relative_path: String,
    pub bytes: Vec<u8>,
}

impl FileTask {
    pub fn new(relative_path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            relative_path: relative_path.into(),
            bytes,
        }
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressOutcome {
    /// Zero-length file, nothing recorded
    EmptySkip,
    /// Content already settled by an earlier run or an identical file
    CacheHit,
    /// Fingerprint recorded in bootstrap mode without calling the service
    Seeded,
    /// Bytes replaced by the smaller version
    Compressed { original: u64, compressed: u64 },
    /// Service result discarded because it saved too little
    LowGainSkip { saved_percent: f64 },
    /// Service refused the file; it will not be retried
    Rejected { message: String },
    /// Network failure; the file stays eligible for the next run
    TransportFailed { message: String },
}

/// Drives the per-file pipeline: cache lookup, remote attempt with key
/// rotation, ratio check, cache and stats update, flush.
///
/// Owns all run state. Files must be fed one at a time; after the last key is
/// exhausted every further call fails with `CredentialsExhausted`. Call
/// [`Compressor::finalize`] when the batch ends. Dropping an unfinalized
/// compressor finalizes it.
pub struct Compressor<S> {
    service: S,
    cache: ContentCache,
    rotor: CredentialRotor,
    sink: PersistenceSink,
    stats: CompressionStats,
    report_lines: Vec<String>,
    min_compress_percent_limit: f64,
    bootstrap_mode: bool,
    spinner: Option<ProgressBar>,
    remote_attempts: u64,
    halted: bool,
    finalized: bool,
}

impl<S: CompressionService> Compressor<S> {
    /// Build a compressor, loading the settled set from `config.cache_path`
    ///
    /// # Arguments
    /// * `config` - Keys, artifact paths, limit and mode for this run
    /// * `service` - Remote service that does the actual compression
    ///
    /// # Returns
    /// * The compressor, or the validation error for a bad config
    pub fn new(config: &CompressorConfig, service: S) -> Result<Self> {
        let cache = match &config.cache_path {
            Some(path) => ContentCache::load(path),
            None => ContentCache::new(),
        };
        Self::with_cache(config, cache, service)
    }

    pub fn with_cache(config: &CompressorConfig, cache: ContentCache, service: S) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            service,
            cache,
            rotor: CredentialRotor::new(config.credentials.iter().cloned()),
            sink: PersistenceSink::new(config.cache_path.clone(), config.report_path.clone()),
            stats: CompressionStats::default(),
            report_lines: Vec::new(),
            min_compress_percent_limit: config.min_compress_percent_limit,
            bootstrap_mode: config.bootstrap_mode,
            spinner: None,
            remote_attempts: 0,
            halted: false,
            finalized: false,
        })
    }

    /// Shows the file currently being compressed on `spinner`.
    pub fn with_spinner(mut self, spinner: ProgressBar) -> Self {
        self.spinner = Some(spinner);
        self
    }

    /// Run one file through the pipeline
    ///
    /// # Arguments
    /// * `task` - The file; its bytes are replaced when a smaller version is kept
    ///
    /// # Returns
    /// * The outcome for this file, already flushed to the cache and report
    /// * `Err(CredentialsExhausted)` once no key is left; the file keeps its
    ///   original bytes and the run should stop
    /// * I/O or JSON errors from the flush
    pub async fn compress(&mut self, task: &mut FileTask) -> Result<CompressOutcome> {
        if self.halted {
            return Err(CompressionError::CredentialsExhausted);
        }

        if task.bytes.is_empty() {
            self.announce(|| {
                crate::warn!("{}: empty file, skipping compression", task.relative_path())
            });
            return Ok(CompressOutcome::EmptySkip);
        }

        let fingerprint = ContentFingerprint::of(&task.bytes);
        if self.cache.is_settled(&fingerprint) {
            self.announce(|| crate::info!("⏭️  Cached: {}", task.relative_path()));
            self.flush()?;
            return Ok(CompressOutcome::CacheHit);
        }

        if self.bootstrap_mode {
            self.cache.mark_settled(fingerprint);
            self.announce(|| crate::info!("🌱 Seeded: {}", task.relative_path()));
            self.flush()?;
            return Ok(CompressOutcome::Seeded);
        }

        if let Some(pb) = &self.spinner {
            pb.set_message(task.relative_path().to_string());
        }
        let result = self.attempt_remote(task).await;
        if let Some(pb) = &self.spinner {
            pb.set_message("");
        }

        let outcome = match result? {
            ShrinkResult::Success(compressed) => self.settle_compressed(task, fingerprint, compressed),
            ShrinkResult::RejectedFormat(message) => {
                self.cache.mark_settled(fingerprint);
                self.report_lines
                    .push(format!("rejected ({}): {}", message, task.relative_path()));
                self.announce(|| {
                    crate::error!("{}: not compressible - {}", task.relative_path(), message);
                });
                CompressOutcome::Rejected { message }
            }
            ShrinkResult::TransportError(message) | ShrinkResult::CredentialError(message) => {
                self.report_lines.push(format!(
                    "transport failure ({}): {}",
                    message,
                    task.relative_path()
                ));
                self.announce(|| {
                    crate::error!(
                        "{}: transfer failed, will retry next run - {}",
                        task.relative_path(),
                        message
                    );
                });
                CompressOutcome::TransportFailed { message }
            }
        };

        self.flush()?;
        Ok(outcome)
    }

    /// Calls the service, rotating keys on credential errors.
    ///
    /// Never returns `ShrinkResult::CredentialError`: a credential error either
    /// moves to the next key or halts the run.
    async fn attempt_remote(&mut self, task: &FileTask) -> Result<ShrinkResult> {
        loop {
            let token = match self.rotor.current() {
                Ok(credential) => {
                    crate::verbose!(
                        "Using API key #{} ({})",
                        self.rotor.position(),
                        credential.masked()
                    );
                    credential.auth_token()
                }
                Err(e) => {
                    self.halt(None);
                    return Err(e);
                }
            };

            self.remote_attempts += 1;
            match self.service.shrink(&task.bytes, &token).await {
                ShrinkResult::CredentialError(message) => {
                    let position = self.rotor.position();
                    if !self.rotor.advance() {
                        self.halt(Some(format!("key #{}: {}", position, message)));
                        return Err(CompressionError::CredentialsExhausted);
                    }
                    self.announce(|| {
                        crate::warn!(
                            "API key #{} unusable ({}), switching to key #{}",
                            position,
                            message,
                            position + 1
                        )
                    });
                }
                other => return Ok(other),
            }
        }
    }

    fn settle_compressed(
        &mut self,
        task: &mut FileTask,
        original_fingerprint: ContentFingerprint,
        compressed: Vec<u8>,
    ) -> CompressOutcome {
        let original = task.bytes.len() as u64;
        let compressed_len = compressed.len() as u64;
        let saved_percent = calculate_compression_ratio(original, compressed_len);

        if saved_percent < self.min_compress_percent_limit {
            self.cache.mark_settled(original_fingerprint);
            self.report_lines.push(format!(
                "low gain ({:.0}%), kept original: {}",
                saved_percent,
                task.relative_path()
            ));
            self.announce(|| {
                crate::info!(
                    "🔸 Saving below {}%, kept original: {} ({:.0}%)",
                    self.min_compress_percent_limit,
                    task.relative_path(),
                    saved_percent
                )
            });
            return CompressOutcome::LowGainSkip { saved_percent };
        }

        self.stats.record(original, compressed_len);
        self.cache.mark_settled(ContentFingerprint::of(&compressed));
        task.bytes = compressed;

        let record = format!(
            "compressed  {:<18}{:<18}{:<18}{:<20}{}",
            format!("before: {}", format_file_size(original)),
            format!("after: {}", format_file_size(compressed_len)),
            format!("saved: {}", format_file_size(original - compressed_len)),
            format!("percent: {:.2}%", saved_percent),
            task.relative_path()
        );
        self.announce(|| crate::info!("✅ {}", record));
        self.report_lines.push(record);

        CompressOutcome::Compressed {
            original,
            compressed: compressed_len,
        }
    }
}

impl<S> Compressor<S> {
    pub fn stats(&self) -> &CompressionStats {
        &self.stats
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn report_lines(&self) -> &[String] {
        &self.report_lines
    }

    /// Number of requests sent to the service, including rotated retries.
    pub fn remote_attempts(&self) -> u64 {
        self.remote_attempts
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Writes the cache and the report with its summary line, once.
    ///
    /// Later calls return `Ok(())` without touching the files.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
        crate::info!("📊 {}", self.stats.summary_line());
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        self.sink.flush(self.cache.snapshot(), &self.report_lines, &self.stats)
    }

    /// Stops the run. `last_failure` names the key that failed last, if any.
    fn halt(&mut self, last_failure: Option<String>) {
        self.halted = true;
        self.announce(|| match last_failure {
            Some(detail) => {
                crate::error!(
                    "All API keys are invalid or over their monthly limit (last {})",
                    detail
                );
            }
            None => {
                crate::error!("All API keys are invalid or over their monthly limit");
            }
        });
    }

    fn announce<F: FnOnce()>(&self, log: F) {
        match &self.spinner {
            Some(pb) => pb.suspend(log),
            None => log(),
        }
    }
}

impl<S> Drop for Compressor<S> {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            crate::error!("Failed to write cache and report: {}", e);
        }
    }
}
