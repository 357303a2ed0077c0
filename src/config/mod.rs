//! Configuration loading and management for the staffing portal.
//!
//! This module provides functionality to load the portal configuration from
//! YAML files, including deployment metadata, company holidays, the alert
//! schedule and versioned attendance policies.
//!
//! # Example
//!
//! ```no_run
//! use staffing_portal::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/portal").unwrap();
//! println!("Loaded portal: {}", config.portal().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AlertCheck, AlertSchedule, AttendancePolicy, DeductionPolicy, Holiday, HolidaysConfig,
    PendingApprovalCheck, PortalConfig, PortalMetadata, QuotaPolicy, QuotaShortfallCheck,
    ShiftPolicy, WeekendPolicy,
};
