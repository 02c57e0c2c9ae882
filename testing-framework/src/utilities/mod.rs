// File: testing-framework/src/utilities/mod.rs
//
// Testing Utilities
//
// Assertion helpers shared by contract tests: revert reasons, emitted
// events and token balance deltas.

/// Assertions over transaction outcomes
pub mod assertions;

// Re-export commonly used utilities
pub use assertions::{
    count_events, expect_emit, expect_revert, expect_revert_with, expect_token_balance_changes,
};
