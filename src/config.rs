use crate::constants::{
    CLI_MIN_COMPRESS_PERCENT, DEFAULT_CACHE_FILE_NAME, DEFAULT_CONFIG_FILE_NAME,
    DEFAULT_FILE_FILTERS, DEFAULT_MIN_COMPRESS_PERCENT, DEFAULT_REPORT_FILE_NAME,
    DEFAULT_SHRINK_ENDPOINT, MAX_COMPRESS_PERCENT, MIN_COMPRESS_PERCENT,
};
use crate::error::{CompressionError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for one compressor run.
#[derive(Debug, Clone)]
pub struct CompressorConfig {
    pub credentials: Vec<String>,
    pub cache_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    /// Minimum saving, in percent, for a compressed result to be kept
    pub min_compress_percent_limit: f64,
    /// Record fingerprints of the current files without calling the service
    pub bootstrap_mode: bool,
    pub endpoint: String,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            cache_path: None,
            report_path: None,
            min_compress_percent_limit: DEFAULT_MIN_COMPRESS_PERCENT,
            bootstrap_mode: false,
            endpoint: DEFAULT_SHRINK_ENDPOINT.to_string(),
        }
    }
}

impl CompressorConfig {
    /// Config with the cache and report files placed in `base_path`.
    pub fn for_base_path(base_path: &Path, credentials: Vec<String>) -> Self {
        Self {
            credentials,
            cache_path: Some(base_path.join(DEFAULT_CACHE_FILE_NAME)),
            report_path: Some(base_path.join(DEFAULT_REPORT_FILE_NAME)),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let limit = self.min_compress_percent_limit;
        if !limit.is_finite() || !(MIN_COMPRESS_PERCENT..=MAX_COMPRESS_PERCENT).contains(&limit) {
            return Err(CompressionError::InvalidCompressPercent(limit));
        }

        if !self.bootstrap_mode && self.credentials.is_empty() {
            return Err(CompressionError::NoCredentials);
        }

        Ok(())
    }
}

/// Optional JSON config file, usually `tinypng.config.json` next to the assets.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    pub base_path: Option<PathBuf>,
    pub api_key_list: Vec<String>,
    pub file_filter: Vec<String>,
    pub create_md5_form_origin: bool,
    pub min_compress_percent_limit: Option<f64>,
    pub md5_record_file_path: Option<PathBuf>,
    pub report_file_path: Option<PathBuf>,
    pub endpoint: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CompressionError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads `tinypng.config.json` from `dir` when present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if path.is_file() {
            crate::verbose!("Using config file {:?}", path);
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn filters(&self) -> Vec<String> {
        if self.file_filter.is_empty() {
            DEFAULT_FILE_FILTERS.iter().map(|s| s.to_string()).collect()
        } else {
            self.file_filter.clone()
        }
    }
}

/// Values given on the command line. `None` and empty lists defer to the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_path: Option<PathBuf>,
    pub keys: Option<Vec<String>>,
    pub filters: Vec<String>,
    pub min_compress_percent: Option<f64>,
    pub cache_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub bootstrap_mode: bool,
}

/// Everything a batch run needs, after merging flags, config file and defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_path: PathBuf,
    pub filters: Vec<String>,
    pub compressor: CompressorConfig,
}

impl RunSettings {
    /// Merges with precedence: command line, then config file, then defaults.
    pub fn resolve(cli: CliOverrides, file: ConfigFile, current_dir: &Path) -> Self {
        let filters = if cli.filters.is_empty() {
            file.filters()
        } else {
            cli.filters
        };

        let base_path = cli
            .base_path
            .or(file.base_path)
            .unwrap_or_else(|| current_dir.to_path_buf());

        let compressor = CompressorConfig {
            credentials: cli.keys.unwrap_or(file.api_key_list),
            cache_path: Some(
                cli.cache_path
                    .or(file.md5_record_file_path)
                    .unwrap_or_else(|| base_path.join(DEFAULT_CACHE_FILE_NAME)),
            ),
            report_path: Some(
                cli.report_path
                    .or(file.report_file_path)
                    .unwrap_or_else(|| base_path.join(DEFAULT_REPORT_FILE_NAME)),
            ),
            min_compress_percent_limit: cli
                .min_compress_percent
                .or(file.min_compress_percent_limit)
                .unwrap_or(CLI_MIN_COMPRESS_PERCENT),
            bootstrap_mode: cli.bootstrap_mode || file.create_md5_form_origin,
            endpoint: file
                .endpoint
                .unwrap_or_else(|| DEFAULT_SHRINK_ENDPOINT.to_string()),
        };

        Self {
            base_path,
            filters,
            compressor,
        }
    }
}

/// Splits a comma separated key list, dropping blanks.
pub fn parse_key_list(keys: &str) -> Vec<String> {
    keys.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}
