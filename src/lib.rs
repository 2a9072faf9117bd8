pub mod logger;

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod service;
pub mod utils;

pub use batch::{collect_asset_files, compress_tree, BatchSummary, FileFilter};
pub use cache::{ContentCache, ContentFingerprint};
pub use config::{CliOverrides, CompressorConfig, ConfigFile, RunSettings};
pub use credentials::{Credential, CredentialRotor};
pub use error::{CompressionError, Result};
pub use orchestrator::{CompressOutcome, Compressor, FileTask};
pub use report::{CompressionStats, PersistenceSink};
pub use service::{classify_error_message, CompressionService, ShrinkResult, TinifyClient};
