//! Rental property management core: records and their status rules, the
//! multi-step form machinery used by applications and leases, direct-to-storage
//! uploads, and the services landlords and tenants act through.

pub mod accounting;
pub mod config;
pub mod domain;
pub mod error;
pub mod forms;
pub mod money;
pub mod services;
pub mod session;
pub mod submission;
pub mod telemetry;
pub mod uploads;
