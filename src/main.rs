use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use relaycrab::config::StoreBackend;
use relaycrab::store::{ListStore, MemoryStore, RedisStore, StoreError};
use relaycrab::{Config, GatewayMessageQueue, LogHandler, QueueWorker, admin};

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const APP_NAME: &str = "🦀 relaycrab";

// -----------------------------------------------------------------------------
// ----- Main ------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), StoreError> {
    setup().await;
    run_forever().await
}

// -----------------------------------------------------------------------------
// ----- Setup -----------------------------------------------------------------

async fn setup() {
    // This has to be the first thing we do, because it initializes the config
    Config::init().await;

    init_tracing();
}

fn init_tracing() {
    let config = Config::snapshot();
    let filter = EnvFilter::try_new(config.log_level.as_str())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

async fn connect_store(config: &Config) -> Result<Arc<dyn ListStore>, StoreError> {
    match config.store.backend {
        StoreBackend::Redis => {
            let url = config.store.url_exposed().unwrap_or_default();
            Ok(Arc::new(RedisStore::connect(url).await?))
        }
        StoreBackend::Memory => {
            info!("using in-process store; queued events die with this process");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Run -------------------------------------------------------------------

async fn run_forever() -> Result<(), StoreError> {
    let config = Config::snapshot();

    let store = connect_store(&config).await.inspect_err(|e| {
        error!("{} could not reach the store: {e}", APP_NAME);
    })?;

    let queue = GatewayMessageQueue::with_key(store, &config.store.queue_key);
    let reporter = tokio::spawn(report_forever(
        queue.clone(),
        config.worker.report_interval,
    ));

    let mut worker = QueueWorker::new(
        queue,
        LogHandler,
        config.worker.pop_timeout,
        config.worker.max_backoff,
    );

    info!("{} started", APP_NAME);

    worker
        .run(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("failed to listen for ctrl-c: {e}");
            }
            info!("{} shutting down", APP_NAME);
        })
        .await;

    reporter.abort();
    Ok(())
}

async fn report_forever(queue: GatewayMessageQueue, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let backlog = queue.size().await.ok();
        info!(
            "stats\n{}",
            admin::format_relay_stats(admin::relay_stats(), backlog)
        );
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
