// Queue policy constants (no magic values)
use std::time::Duration;

/// How long a called student has to show up before the sweep removes them (5 minutes)
pub const DEFAULT_CALL_TIMEOUT_MS: i64 = 5 * 60 * 1000;

/// Fixed service time assumed per entry for wait estimates
pub const DEFAULT_MINUTES_PER_ENTRY: i64 = 5;

/// Give up generating an access code after this many collisions
pub const MAX_ACCESS_CODE_ATTEMPTS: usize = 16;

/// How often the server-owned sweep runs (30 seconds)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// How often housekeeping (retention GC + VACUUM) runs (24 hours)
pub const DEFAULT_HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Buffered change events per feed before slow subscribers start lagging
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Timing knobs for the queue-state module
#[derive(Debug, Clone, Copy)]
pub struct QueuePolicy {
    pub call_timeout_ms: i64,
    pub minutes_per_entry: i64,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            minutes_per_entry: DEFAULT_MINUTES_PER_ENTRY,
        }
    }
}
