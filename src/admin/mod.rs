use crate::analytics::{self, RelayStats};

pub fn relay_stats() -> RelayStats {
    analytics::snapshot()
}

pub fn format_relay_stats(stats: RelayStats, backlog: Option<u64>) -> String {
    let backlog = backlog.map_or_else(|| "unknown".to_string(), |n| n.to_string());

    format!(
        "queue_backlog={backlog}\n\
         session_picks={}\n\
         no_shards={}\n\
         envelopes_pushed={}\n\
         envelopes_popped={}\n\
         empty_polls={}\n\
         decode_errors={}\n\
         store_errors={}",
        stats.session_picks,
        stats.no_shards,
        stats.envelopes_pushed,
        stats.envelopes_popped,
        stats.empty_polls,
        stats.decode_errors,
        stats.store_errors,
    )
}
