pub mod cli;
pub mod config;
pub mod file;
pub mod types;

pub use config::Config;
pub use file::{RelayFile, RelayFileError, StoreSettings, WorkerSettings};
pub use types::{LogLevel, StoreBackend};
