use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    pub session_picks: u64,
    pub no_shards: u64,
    pub envelopes_pushed: u64,
    pub envelopes_popped: u64,
    pub empty_polls: u64,
    pub decode_errors: u64,
    pub store_errors: u64,
}

static SESSION_PICK: AtomicU64 = AtomicU64::new(0);
static NO_SHARDS: AtomicU64 = AtomicU64::new(0);
static ENVELOPE_PUSHED: AtomicU64 = AtomicU64::new(0);
static ENVELOPE_POPPED: AtomicU64 = AtomicU64::new(0);
static EMPTY_POLL: AtomicU64 = AtomicU64::new(0);
static DECODE_ERROR: AtomicU64 = AtomicU64::new(0);
static STORE_ERROR: AtomicU64 = AtomicU64::new(0);

pub fn inc_session_pick() {
    SESSION_PICK.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_no_shards() {
    NO_SHARDS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_envelope_pushed() {
    ENVELOPE_PUSHED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_envelope_popped() {
    ENVELOPE_POPPED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_empty_poll() {
    EMPTY_POLL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_decode_error() {
    DECODE_ERROR.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_store_error() {
    STORE_ERROR.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> RelayStats {
    RelayStats {
        session_picks: SESSION_PICK.load(Ordering::Relaxed),
        no_shards: NO_SHARDS.load(Ordering::Relaxed),
        envelopes_pushed: ENVELOPE_PUSHED.load(Ordering::Relaxed),
        envelopes_popped: ENVELOPE_POPPED.load(Ordering::Relaxed),
        empty_polls: EMPTY_POLL.load(Ordering::Relaxed),
        decode_errors: DECODE_ERROR.load(Ordering::Relaxed),
        store_errors: STORE_ERROR.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide and other tests bump them concurrently,
    // so only lower bounds are checked.
    #[test]
    fn counters_only_move_forward() {
        let before = snapshot();
        inc_session_pick();
        inc_no_shards();
        inc_envelope_pushed();
        inc_envelope_pushed();
        inc_decode_error();
        let after = snapshot();

        assert!(after.session_picks >= before.session_picks + 1);
        assert!(after.no_shards >= before.no_shards + 1);
        assert!(after.envelopes_pushed >= before.envelopes_pushed + 2);
        assert!(after.decode_errors >= before.decode_errors + 1);
        assert!(after.store_errors >= before.store_errors);
    }
}
