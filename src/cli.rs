use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tiny-squeeze",
    about = "Batch image compression through TinyPNG with a content-addressed cache",
    long_about = "tiny-squeeze sends PNG and JPEG assets to the TinyPNG service and writes the smaller \
                  versions back in place. Fingerprints of every settled file are cached, so repeat runs \
                  over the same tree make no API calls for files that did not change. API keys are \
                  rotated automatically when one becomes invalid or hits its monthly limit.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    tiny-squeeze compress ./web -k KEY1,KEY2 -m 10\n  \
    tiny-squeeze compress ./web -f \"**/*.png\" -f \"!vendor/**\"\n  \
    tiny-squeeze seed ./web\n  \
    tiny-squeeze status ./web"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress all matching images under a directory",
        long_about = "Compress every matching image through the remote service, skipping files whose \
                      content is already in the cache. Files are processed one at a time."
    )]
    Compress {
        #[command(flatten)]
        options: RunOptions,

        #[arg(
            short = 'k',
            long,
            help = "Comma separated TinyPNG API keys",
            long_help = "API keys used in order. When a key is invalid or over its monthly limit \
                         the next one is used. Overrides apiKeyList from the config file."
        )]
        keys: Option<String>,

        #[arg(
            short = 'm',
            long,
            help = "Minimum saving in percent (0-100, default: 10)",
            long_help = "Compressed results that save less than this percentage are discarded \
                         and the original file is kept."
        )]
        min_percent: Option<f64>,
    },

    #[command(
        about = "Record fingerprints of existing images without compressing",
        long_about = "Seed the cache with the current content of every matching file. \
                      No API key is needed and no request is sent."
    )]
    Seed {
        #[command(flatten)]
        options: RunOptions,
    },

    #[command(
        about = "Show cache and report status",
        long_about = "Print how many fingerprints are cached and the summary line of the last report."
    )]
    Status {
        #[arg(help = "Asset directory (default: current directory)")]
        base_path: Option<PathBuf>,

        #[arg(short = 'c', long, help = "JSON config file")]
        config: Option<PathBuf>,

        #[arg(long, help = "Cache file path")]
        cache: Option<PathBuf>,

        #[arg(long, help = "Report file path")]
        report: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunOptions {
    #[arg(help = "Asset directory (default: current directory)")]
    pub base_path: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        help = "JSON config file",
        long_help = "Config file with apiKeyList, fileFilter, minCompressPercentLimit and other \
                     settings. Defaults to tinypng.config.json in the asset directory when present."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'f',
        long = "filter",
        help = "Glob filter, repeatable; prefix with ! to exclude",
        long_help = "Glob over paths relative to the asset directory. \
                     Default: **/*.png **/*.jpg **/*.jpeg !node_modules/** !dist/**"
    )]
    pub filters: Vec<String>,

    #[arg(long, help = "Cache file path (default: <base>/tinypngMd5Record.json)")]
    pub cache: Option<PathBuf>,

    #[arg(long, help = "Report file path (default: <base>/tinypngReport.json)")]
    pub report: Option<PathBuf>,

    #[arg(short = 'q', long, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short = 'v', long, help = "Print cache hits, key usage and timings")]
    pub verbose: bool,
}
