use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{path::Path, time::Duration};
use thiserror::Error;
use tokio::fs;

use super::types::StoreBackend;
use crate::queue::GATEWAY_MESSAGE_KEY;

// -----------------------------------------------------------------------------
// ----- Defaults --------------------------------------------------------------

const DEFAULT_POP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(60);

// -----------------------------------------------------------------------------
// ----- RelayFile -------------------------------------------------------------

/// Parsed and validated `relaycrab.toml`.
#[derive(Debug, Clone)]
pub struct RelayFile {
    pub store: StoreSettings,
    pub worker: WorkerSettings,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub url: Option<SecretString>,
    pub queue_key: String,
}

impl StoreSettings {
    pub fn url_exposed(&self) -> Option<&str> {
        self.url.as_ref().map(|url| url.expose_secret())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    pub pop_timeout: Duration,
    pub max_backoff: Duration,
    pub report_interval: Duration,
}

// -----------------------------------------------------------------------------
// ----- RelayFile: Static -----------------------------------------------------

impl RelayFile {
    pub async fn from_file_async(path: &Path) -> Result<RelayFile, RelayFileError> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| RelayFileError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<RelayFile, RelayFileError> {
        let doc: RelayFileDoc = toml::from_str(raw).map_err(|e| RelayFileError::Toml { source: e })?;

        let store = StoreSettings {
            backend: doc.store.backend,
            url: doc
                .store
                .url
                .filter(|url| !url.trim().is_empty())
                .map(|url| SecretString::new(url.into_boxed_str())),
            queue_key: doc
                .store
                .queue_key
                .unwrap_or_else(|| GATEWAY_MESSAGE_KEY.to_string()),
        };

        let worker = WorkerSettings {
            pop_timeout: doc.worker.pop_timeout.unwrap_or(DEFAULT_POP_TIMEOUT),
            max_backoff: doc.worker.max_backoff.unwrap_or(DEFAULT_MAX_BACKOFF),
            report_interval: doc.worker.report_interval.unwrap_or(DEFAULT_REPORT_INTERVAL),
        };

        validate(&store, &worker)?;

        Ok(RelayFile { store, worker })
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: On-disk format ----------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RelayFileDoc {
    #[serde(default)]
    store: StoreSection,

    #[serde(default)]
    worker: WorkerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreSection {
    #[serde(default)]
    backend: StoreBackend,

    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    queue_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkerSection {
    #[serde(default, deserialize_with = "de_duration")]
    pop_timeout: Option<Duration>,

    #[serde(default, deserialize_with = "de_duration")]
    max_backoff: Option<Duration>,

    #[serde(default, deserialize_with = "de_duration")]
    report_interval: Option<Duration>,
}

// -----------------------------------------------------------------------------
// ----- Internal: Helpers -----------------------------------------------------

fn validate(store: &StoreSettings, worker: &WorkerSettings) -> Result<(), RelayFileError> {
    if store.backend == StoreBackend::Redis && store.url.is_none() {
        return Err(RelayFileError::InvalidField(
            "store.url (required for the redis backend)".into(),
        ));
    }
    if store.queue_key.trim().is_empty() {
        return Err(RelayFileError::InvalidField("store.queue_key".into()));
    }
    if worker.pop_timeout.is_zero() {
        return Err(RelayFileError::InvalidField("worker.pop_timeout".into()));
    }
    if worker.max_backoff.is_zero() {
        return Err(RelayFileError::InvalidField("worker.max_backoff".into()));
    }
    if worker.report_interval.is_zero() {
        return Err(RelayFileError::InvalidField("worker.report_interval".into()));
    }
    Ok(())
}

/// Integer milliseconds (`5000`) or a humantime string (`"5s"`).
fn de_duration<'de, D>(d: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Option<Duration>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("integer milliseconds (e.g., 5000) or a duration string (e.g., \"5s\")")
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Duration::from_millis(v)))
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
            if v < 0 {
                return Err(E::invalid_value(Unexpected::Signed(v), &self));
            }
            Ok(Some(Duration::from_millis(v as u64)))
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    d.deserialize_any(DurationVisitor)
}

// -----------------------------------------------------------------------------
// ----- Errors ----------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RelayFileError {
    #[error("invalid or missing field '{0}'")]
    InvalidField(String),

    #[error("read error for {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("toml parse error: {source}")]
    Toml { source: toml::de::Error },
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
