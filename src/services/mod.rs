//! Service layer for business logic
//!
//! Shared between the CLI report commands and any embedding caller.

mod report_service;

pub use report_service::*;
