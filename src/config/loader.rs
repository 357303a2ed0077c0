//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the portal
//! configuration from YAML files.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::error::{PortalError, PortalResult};

use super::types::{
    AlertSchedule, AttendancePolicy, Holiday, HolidaysConfig, PortalConfig, PortalMetadata,
};

/// Loads and provides access to portal configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and answers policy, holiday and alert-schedule lookups.
///
/// # Directory Structure
///
/// ```text
/// config/portal/
/// ├── portal.yaml          # Deployment metadata
/// ├── holidays.yaml        # Company holidays
/// ├── alerts.yaml          # Alert scheduler settings
/// └── policies/
///     └── 2025-01-01.yaml  # Attendance policy effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use staffing_portal::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/portal").unwrap();
/// let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
/// let policy = loader.policy_for(date).unwrap();
/// println!("Quota: {}", policy.quota.daily_applications);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PortalConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any required file is missing, contains invalid
    /// YAML, or a policy version fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> PortalResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<PortalMetadata>(&path.join("portal.yaml"))?;
        let holidays = Self::load_yaml::<HolidaysConfig>(&path.join("holidays.yaml"))?;
        let alerts = Self::load_yaml::<AlertSchedule>(&path.join("alerts.yaml"))?;
        let policies = Self::load_policies(&path.join("policies"))?;

        Ok(Self {
            config: PortalConfig::new(metadata, holidays.holidays, policies, alerts),
        })
    }

    /// Builds a loader from already-parsed parts, applying the same
    /// validation as [`ConfigLoader::load`].
    pub fn from_parts(
        metadata: PortalMetadata,
        holidays: Vec<Holiday>,
        policies: Vec<AttendancePolicy>,
        alerts: AlertSchedule,
    ) -> PortalResult<Self> {
        if policies.is_empty() {
            return Err(PortalError::ConfigNotFound {
                path: "policies (no policy versions supplied)".to_string(),
            });
        }
        for policy in &policies {
            Self::validate_policy(policy, &format!("policy {}", policy.effective_date))?;
        }
        Ok(Self {
            config: PortalConfig::new(metadata, holidays, policies, alerts),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> PortalResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| PortalError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| PortalError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate_policy(policy: &AttendancePolicy, source: &str) -> PortalResult<()> {
        policy
            .validate()
            .map_err(|message| PortalError::ConfigParseError {
                path: source.to_string(),
                message,
            })
    }

    /// Loads all policy versions from the policies directory.
    fn load_policies(policies_dir: &Path) -> PortalResult<Vec<AttendancePolicy>> {
        let dir_str = policies_dir.display().to_string();

        let entries = fs::read_dir(policies_dir).map_err(|_| PortalError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut policies = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| PortalError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let policy = Self::load_yaml::<AttendancePolicy>(&path)?;
                Self::validate_policy(&policy, &path.display().to_string())?;
                policies.push(policy);
            }
        }

        if policies.is_empty() {
            return Err(PortalError::ConfigNotFound {
                path: format!("{} (no policy files found)", dir_str),
            });
        }

        Ok(policies)
    }

    /// Returns the underlying portal configuration.
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Returns the portal metadata.
    pub fn portal(&self) -> &PortalMetadata {
        self.config.portal()
    }

    /// Returns the alert schedule.
    pub fn alerts(&self) -> &AlertSchedule {
        self.config.alerts()
    }

    /// Gets the attendance policy in force on a given date.
    ///
    /// The most recent version whose effective date is on or before `date`
    /// wins.
    pub fn policy_for(&self, date: NaiveDate) -> PortalResult<&AttendancePolicy> {
        self.config
            .policies()
            .iter()
            .rev()
            .find(|p| p.effective_date <= date)
            .ok_or(PortalError::PolicyNotFound { date })
    }

    /// Returns the holiday on `date`, if any.
    pub fn holiday(&self, date: NaiveDate) -> Option<&Holiday> {
        self.config.holidays().get(&date)
    }
}
