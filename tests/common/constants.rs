//! Shared constants for end-to-end tests
//!
//! When fixture data changes, update only this file.

// ============================================================================
// Fixture Artists
// ============================================================================

/// Artist owning most of the engagement in the trending fixture
pub const LEADING_ARTIST: &str = "Bonobo";

pub const SECOND_ARTIST: &str = "Four Tet";

pub const THIRD_ARTIST: &str = "Tycho";

// ============================================================================
// Fixture Tracks
// ============================================================================

/// Most played trending track
pub const TOP_TRACK_TITLE: &str = "Kerala";

pub const SECOND_TRACK_TITLE: &str = "Baby";

pub const THIRD_TRACK_TITLE: &str = "Awake";

/// Genre with the most engagement in the trending fixture
pub const LEADING_GENRE: &str = "Electronic";

/// Number of tracks returned by the fake trending endpoint
pub const TRENDING_FIXTURE_LEN: usize = 5;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for a server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// HTTP request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server readiness
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Per-request timeout the resolver uses toward fake nodes
pub const NODE_REQUEST_TIMEOUT_SECS: u64 = 5;
