use clap::Parser;
use parking_lot::RwLock;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use super::types::LogLevel;

// -----------------------------------------------------------------------------
// ----- Global Singleton ------------------------------------------------------

static CLI_CONFIG: OnceLock<Arc<RwLock<CliConfig>>> = OnceLock::new();

// -----------------------------------------------------------------------------
// ----- CliConfig -------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct CliConfig {
    pub config_file_location: PathBuf,
    pub log_level: LogLevel,
}

impl CliConfig {
    pub fn init() {
        CLI_CONFIG.get_or_init(|| {
            let cfg = Self::from_args();
            cfg.validate();
            Arc::new(RwLock::new(cfg))
        });
    }

    pub fn snapshot() -> CliConfig {
        handle().read().clone()
    }
}

// -----------------------------------------------------------------------------
// ----- CliConfig: Private ----------------------------------------------------

impl CliConfig {
    fn from_args() -> Self {
        let args = Args::try_parse().unwrap_or_else(|e| e.exit());

        Self {
            config_file_location: args.config_file,
            log_level: args.log_level,
        }
    }

    fn validate(&self) {
        must_exist_file(&self.config_file_location, "--config / relaycrab.toml");
    }
}

// -----------------------------------------------------------------------------
// ----- Args ------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "relaycrab", version, about = "Gateway event queue and shard relay")]
struct Args {
    // Not required via CLI or ENV (defaults to info).
    #[arg(long = "log", env = "RELAYCRAB_LOG", default_value = "info")]
    log_level: LogLevel,

    // Must exist.
    #[arg(
        long = "config",
        short = 'c',
        env = "RELAYCRAB_CONFIG_FILE",
        default_value = "relaycrab.toml"
    )]
    config_file: PathBuf,
}

// -----------------------------------------------------------------------------
// ----- Private Utils ---------------------------------------------------------

fn handle() -> Arc<RwLock<CliConfig>> {
    CLI_CONFIG
        .get()
        .expect("cli config not initialized; call CliConfig::init() first")
        .clone()
}

fn must_exist_file(path: &Path, hint: &str) {
    let md = fs::metadata(path).unwrap_or_else(|_| {
        panic!("required file missing: {} (from {hint})", path.display());
    });

    if !md.is_file() {
        panic!("path is not a file: {} (from {hint})", path.display());
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
