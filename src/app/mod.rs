//! Application layer containing business logic and shared state.

pub mod analytics;
pub mod ens_service;
pub mod payroll;
pub mod service;
pub mod state;
pub mod worker;

pub use analytics::AnalyticsService;
pub use ens_service::EnsService;
pub use payroll::PayrollService;
pub use service::AppService;
pub use state::AppState;
pub use worker::{PayrollScheduler, SchedulerConfig, spawn_scheduler};
