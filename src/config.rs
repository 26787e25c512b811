//! Configuration Module
//!
//! Handles loading cache limits, GC scheduling and per-class TTLs from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheClass;

/// Bytes per megabyte used for memory budgets and reporting.
pub const BYTES_PER_MB: usize = 1024 * 1024;

// == TTL Table ==
/// Freshness window, in milliseconds, for each cache class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlTable {
    pub dashboard_ms: u64,
    pub leads_ms: u64,
    pub commissions_ms: u64,
    pub messages_ms: u64,
    pub admin_ms: u64,
}

impl TtlTable {
    /// Returns the TTL in milliseconds for a cache class.
    pub fn ttl_for(&self, class: CacheClass) -> u64 {
        match class {
            CacheClass::Dashboard => self.dashboard_ms,
            CacheClass::Leads => self.leads_ms,
            CacheClass::Commissions => self.commissions_ms,
            CacheClass::Messages => self.messages_ms,
            CacheClass::Admin => self.admin_ms,
        }
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dashboard_ms: env_or("TTL_DASHBOARD_MS", defaults.dashboard_ms),
            leads_ms: env_or("TTL_LEADS_MS", defaults.leads_ms),
            commissions_ms: env_or("TTL_COMMISSIONS_MS", defaults.commissions_ms),
            messages_ms: env_or("TTL_MESSAGES_MS", defaults.messages_ms),
            admin_ms: env_or("TTL_ADMIN_MS", defaults.admin_ms),
        }
    }
}

impl Default for TtlTable {
    fn default() -> Self {
        Self {
            dashboard_ms: 20_000,
            leads_ms: 30_000,
            commissions_ms: 60_000,
            messages_ms: 20_000,
            admin_ms: 30_000,
        }
    }
}

// == GC Limits ==
/// Budgets the garbage collector enforces on the cache store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcLimits {
    /// Entry count above which the oldest entries are evicted
    pub max_entries: usize,
    /// Approximate memory budget in bytes
    pub max_memory_bytes: usize,
    /// Fraction of either budget at which a non-forced sweep runs
    pub force_gc_threshold: f64,
}

impl Default for GcLimits {
    fn default() -> Self {
        Config::default().gc_limits()
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries kept after a GC sweep
    pub max_entries: usize,
    /// Estimated memory budget in megabytes
    pub max_memory_mb: usize,
    /// Interval between periodic GC sweeps in milliseconds
    pub gc_interval_ms: u64,
    /// Fraction of the budgets that triggers a non-forced sweep
    pub force_gc_threshold: f64,
    /// Delay before the forced startup sweep in milliseconds
    pub startup_gc_delay_ms: u64,
    /// Admin HTTP server port
    pub server_port: u16,
    /// Per-class TTLs
    pub ttl: TtlTable,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 50)
    /// - `MAX_MEMORY_MB` - Memory budget in MB (default: 20)
    /// - `GC_INTERVAL_MS` - Periodic GC interval (default: 120000)
    /// - `FORCE_GC_THRESHOLD` - Budget fraction that triggers GC (default: 0.8)
    /// - `STARTUP_GC_DELAY_MS` - Delay before the forced startup GC (default: 1000)
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    /// - `TTL_DASHBOARD_MS`, `TTL_LEADS_MS`, `TTL_COMMISSIONS_MS`,
    ///   `TTL_MESSAGES_MS`, `TTL_ADMIN_MS` - Per-class TTL overrides
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            max_memory_mb: env_or("MAX_MEMORY_MB", defaults.max_memory_mb),
            gc_interval_ms: env_or("GC_INTERVAL_MS", defaults.gc_interval_ms),
            force_gc_threshold: env_or("FORCE_GC_THRESHOLD", defaults.force_gc_threshold),
            startup_gc_delay_ms: env_or("STARTUP_GC_DELAY_MS", defaults.startup_gc_delay_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            ttl: TtlTable::from_env(),
        }
    }

    /// Returns the limits the store's garbage collector enforces.
    pub fn gc_limits(&self) -> GcLimits {
        GcLimits {
            max_entries: self.max_entries,
            max_memory_bytes: self.max_memory_mb * BYTES_PER_MB,
            force_gc_threshold: self.force_gc_threshold,
        }
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.gc_interval_ms)
    }

    pub fn startup_gc_delay(&self) -> Duration {
        Duration::from_millis(self.startup_gc_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 50,
            max_memory_mb: 20,
            gc_interval_ms: 2 * 60 * 1000,
            force_gc_threshold: 0.8,
            startup_gc_delay_ms: 1000,
            server_port: 3000,
            ttl: TtlTable::default(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
