use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

use super::{
    cli::CliConfig,
    file::{RelayFile, StoreSettings, WorkerSettings},
    types::LogLevel,
};

// -----------------------------------------------------------------------------
// ----- Global Singleton ------------------------------------------------------

static ROOT_CONFIG: OnceLock<Arc<RwLock<Config>>> = OnceLock::new();

// -----------------------------------------------------------------------------
// ----- Config ----------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: LogLevel,
    pub store: StoreSettings,
    pub worker: WorkerSettings,
}

// -----------------------------------------------------------------------------
// ----- Config: Static --------------------------------------------------------

impl Config {
    /// Init: panic on any error. Do not start with a bad config.
    pub async fn init() {
        CliConfig::init();

        let cli = CliConfig::snapshot();
        let file = RelayFile::from_file_async(&cli.config_file_location)
            .await
            .unwrap_or_else(|e| {
                panic!(
                    "failed to load config from {:?}: {e}",
                    cli.config_file_location
                )
            });

        Self::store(Self::assemble(&cli, file));
    }

    pub fn snapshot() -> Config {
        Self::handle().read().clone()
    }
}

// -----------------------------------------------------------------------------
// ----- Config: Private -------------------------------------------------------

impl Config {
    fn assemble(cli: &CliConfig, file: RelayFile) -> Config {
        Config {
            log_level: cli.log_level,
            store: file.store,
            worker: file.worker,
        }
    }

    fn store(next: Config) {
        if let Some(handle) = ROOT_CONFIG.get() {
            *handle.write() = next;
        } else {
            let _ = ROOT_CONFIG.set(Arc::new(RwLock::new(next)));
        }
    }

    fn handle() -> Arc<RwLock<Config>> {
        ROOT_CONFIG
            .get()
            .expect("Config not initialized; call Config::init().await first")
            .clone()
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
