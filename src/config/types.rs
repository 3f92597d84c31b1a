use serde::Deserialize;

// -------------------------------------------------------------------------------------------------
// ---- LogLevel -----------------------------------------------------------------------------------

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// -------------------------------------------------------------------------------------------------
// ---- StoreBackend -------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

// -------------------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------
