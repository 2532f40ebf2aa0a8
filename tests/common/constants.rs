//! Shared constants for end-to-end tests
//!
//! When fixture data changes, update only this file and `fixtures.rs`.

// ============================================================================
// Fixture Songs
// ============================================================================

pub const MUSE: &str = "Muse";
pub const QUEEN: &str = "Queen";

pub const SUPERMASSIVE: &str = "Supermassive Black Hole";
pub const UPRISING: &str = "Uprising";
pub const BOHEMIAN: &str = "Bohemian Rhapsody";

/// Release date the metadata stub reports for `SUPERMASSIVE`.
pub const SUPERMASSIVE_RELEASE_DATE: &str = "16.07.2006";

/// A song the metadata stub does not know about.
pub const UNKNOWN_SONG: &str = "Never Recorded";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Timeout for HTTP requests in tests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
