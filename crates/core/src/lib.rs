//! Core business logic for civic-report-rs.

pub mod roles;
pub mod services;

pub use roles::RoleKind;
pub use services::*;
