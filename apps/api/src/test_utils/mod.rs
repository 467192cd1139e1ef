//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - A stub billing gateway and a permissive rate limiter
//! - `TestAppStateBuilder` for HTTP-level tests

mod account_mocks;
mod app_state_builder;
mod billing_mocks;
mod dashboard_mocks;
mod factories;

pub use account_mocks::*;
pub use app_state_builder::*;
pub use billing_mocks::*;
pub use dashboard_mocks::*;
pub use factories::*;
