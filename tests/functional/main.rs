// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for the Pod mutation admission flow.
//!
//! These tests exercise the full request path - envelope decode, eligibility,
//! directory read, patch synthesis, response construction - WITHOUT a live
//! Kubernetes cluster. Only the Service directory is mocked; everything
//! else runs the production code.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run with verbose output
//! cargo test --test functional -- --nocapture
//! ```

mod admission_tests;
mod mock_directory;

pub use mock_directory::*;
