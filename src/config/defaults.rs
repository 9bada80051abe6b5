//! Built-in default constants.
//!
//! Used when no config file is present and as the `serde` defaults for
//! missing keys.

// ============================================================================
// Endpoint
// ============================================================================

/// Write path: one fact per form-encoded POST.
pub const SAVE_FACT_URL: &str = "https://development.kpi-drive.ru/_api/facts/save_fact";

/// Read path: facts for one indicator over a period.
pub const GET_FACTS_URL: &str = "https://development.kpi-drive.ru/_api/indicators/get_facts";

// ============================================================================
// Delivery
// ============================================================================

/// Pending-fact queue capacity. Producers suspend once this many facts are
/// waiting for the worker.
pub const QUEUE_CAPACITY: usize = 1000;

/// Wall-clock timeout for one HTTP request (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Environment
// ============================================================================

/// Path to a TOML config file.
pub const CONFIG_PATH_ENV: &str = "FACT_RELAY_CONFIG";

/// Bearer token override, applied after the file is loaded.
pub const TOKEN_ENV: &str = "FACT_RELAY_TOKEN";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "fact_relay.toml";
