pub const DEFAULT_SHRINK_ENDPOINT: &str = "https://api.tinypng.com/shrink";

/// Basic auth user name the service expects in front of every API key.
pub const AUTH_USER: &str = "api";

// Error messages the service returns for a key that can no longer be used
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Credentials are invalid.";
pub const MONTHLY_LIMIT_MESSAGE: &str = "Your monthly limit has been exceeded.";
pub const CREDENTIAL_ERROR_MESSAGES: &[&str] = &[INVALID_CREDENTIALS_MESSAGE, MONTHLY_LIMIT_MESSAGE];

pub const DEFAULT_CACHE_FILE_NAME: &str = "tinypngMd5Record.json";
pub const DEFAULT_REPORT_FILE_NAME: &str = "tinypngReport.json";
pub const DEFAULT_CONFIG_FILE_NAME: &str = "tinypng.config.json";

pub const DEFAULT_MIN_COMPRESS_PERCENT: f64 = 0.0;
pub const CLI_MIN_COMPRESS_PERCENT: f64 = 10.0;
pub const MIN_COMPRESS_PERCENT: f64 = 0.0;
pub const MAX_COMPRESS_PERCENT: f64 = 100.0;

pub const DEFAULT_FILE_FILTERS: &[&str] = &[
    "**/*.png",
    "**/*.jpg",
    "**/*.jpeg",
    "!node_modules/**",
    "!dist/**",
];

pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const SPINNER_TICK_MILLIS: u64 = 200;
pub const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";
pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} Compressing {msg}";
