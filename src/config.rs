use std::time::Duration;

const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_REINDEX_UPSERT_BATCH_SIZE: usize = 100;

/// Tuning knobs for the aggregator, read once at startup.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// How long a tenant may sit without new mutations before its pending
    /// requests are drained and its worker terminates.
    pub idle_timeout: Duration,
    /// Pending-request count that triggers an immediate flush.
    pub batch_size: usize,
    /// Chunk ids per fetch/upsert round-trip during a reindex pass.
    pub reindex_upsert_batch_size: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            reindex_upsert_batch_size: DEFAULT_REINDEX_UPSERT_BATCH_SIZE,
        }
    }
}

impl StatsConfig {
    /// Read configuration from `SHORTSTACK_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let idle_secs = env_parse("SHORTSTACK_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS);
        let batch_size = env_parse("SHORTSTACK_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1);
        let reindex_batch = env_parse(
            "SHORTSTACK_REINDEX_UPSERT_BATCH_SIZE",
            DEFAULT_REINDEX_UPSERT_BATCH_SIZE,
        )
        .max(1);

        StatsConfig {
            idle_timeout: Duration::from_secs(idle_secs),
            batch_size,
            reindex_upsert_batch_size: reindex_batch,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn defaults() {
        let _guard = ENV_MUTEX.lock().expect("lock env mutex");
        std::env::remove_var("SHORTSTACK_IDLE_TIMEOUT_SECS");
        std::env::remove_var("SHORTSTACK_BATCH_SIZE");
        std::env::remove_var("SHORTSTACK_REINDEX_UPSERT_BATCH_SIZE");

        let cfg = StatsConfig::from_env();
        assert_eq!(cfg.idle_timeout, Duration::from_secs(30));
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.reindex_upsert_batch_size, 100);
    }

    #[test]
    fn env_overrides() {
        let _guard = ENV_MUTEX.lock().expect("lock env mutex");
        std::env::set_var("SHORTSTACK_IDLE_TIMEOUT_SECS", "5");
        std::env::set_var("SHORTSTACK_BATCH_SIZE", "3");
        std::env::set_var("SHORTSTACK_REINDEX_UPSERT_BATCH_SIZE", "25");

        let cfg = StatsConfig::from_env();

        std::env::remove_var("SHORTSTACK_IDLE_TIMEOUT_SECS");
        std::env::remove_var("SHORTSTACK_BATCH_SIZE");
        std::env::remove_var("SHORTSTACK_REINDEX_UPSERT_BATCH_SIZE");

        assert_eq!(cfg.idle_timeout, Duration::from_secs(5));
        assert_eq!(cfg.batch_size, 3);
        assert_eq!(cfg.reindex_upsert_batch_size, 25);
    }

    #[test]
    fn garbage_and_zero_values_fall_back() {
        let _guard = ENV_MUTEX.lock().expect("lock env mutex");
        std::env::set_var("SHORTSTACK_BATCH_SIZE", "not-a-number");
        let cfg = StatsConfig::from_env();
        assert_eq!(cfg.batch_size, 10);

        // A batch size of 0 would never trigger; clamp to 1.
        std::env::set_var("SHORTSTACK_BATCH_SIZE", "0");
        let cfg = StatsConfig::from_env();
        std::env::remove_var("SHORTSTACK_BATCH_SIZE");
        assert_eq!(cfg.batch_size, 1);
    }
}
