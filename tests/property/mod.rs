//! Property-based tests for naming and output invariants

mod slug;
