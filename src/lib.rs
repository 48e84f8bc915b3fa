//! Web3 payroll backend.
//!
//! Layers:
//! - [`domain`]: types, errors, the payroll ledger model and the traits the
//!   services depend on
//! - [`app`]: business services and shared state
//! - [`infra`]: PostgreSQL, the simulated ledger client, ENS and the bonus store
//! - [`api`]: axum handlers, authentication and routing

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
