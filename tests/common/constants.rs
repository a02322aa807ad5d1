//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (identities, server tuning, etc.),
//! update only this file.

// ============================================================================
// Test Identities
// ============================================================================

/// User id performing the social action in most tests
pub const SENDER_ID: usize = 1;

/// Username reported for the acting user in test events
pub const SENDER_USERNAME: &str = "ann";

/// User id receiving notifications in most tests
pub const RECIPIENT_ID: usize = 2;

/// A third user for ownership-scoping tests
pub const OTHER_USER_ID: usize = 3;

// ============================================================================
// Test Server Configuration
// ============================================================================

/// Shared secret the test server accepts on the event intake endpoint
pub const TEST_INTERNAL_TOKEN: &str = "test-internal-token";

/// Dedup window configured on the test server (seconds)
pub const TEST_DEDUP_WINDOW_SEC: i64 = 300;

/// Fan-out concurrency configured on the test server
pub const TEST_FANOUT_CONCURRENCY: usize = 4;

// ============================================================================
// Test Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
