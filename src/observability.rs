//! Metric names recorded through the `metrics` facade. The library installs
//! no exporter; the embedding application decides where these go.

/// Counter: tracked-cache lookups that hit. Labels: cache.
pub const CACHE_HITS_TOTAL: &str = "innkeep_cache_hits_total";

/// Counter: tracked-cache lookups that missed. Labels: cache.
pub const CACHE_MISSES_TOTAL: &str = "innkeep_cache_misses_total";

/// Counter: eviction passes that actually ran (signal above threshold).
pub const CACHE_EVICTION_PASSES_TOTAL: &str = "innkeep_cache_eviction_passes_total";

/// Counter: entries removed across all caches by eviction passes.
pub const CACHE_EVICTED_ENTRIES_TOTAL: &str = "innkeep_cache_evicted_entries_total";

/// Counter: snapshot save attempts that failed (logged and swallowed).
pub const SNAPSHOT_SAVE_FAILURES_TOTAL: &str = "innkeep_snapshot_save_failures_total";

/// Counter: snapshot loads that failed and degraded to an empty collection.
pub const SNAPSHOT_LOAD_FAILURES_TOTAL: &str = "innkeep_snapshot_load_failures_total";

/// Counter: booking records parsed from the ledger directory.
pub const LEDGER_RECORDS_LOADED_TOTAL: &str = "innkeep_ledger_records_loaded_total";

/// Counter: ledger files skipped (unparseable or duplicate booking id).
pub const LEDGER_RECORDS_SKIPPED_TOTAL: &str = "innkeep_ledger_records_skipped_total";
