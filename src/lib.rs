//! Staffing agency operations portal
//!
//! This crate tracks recruiters' work on their candidates (applications,
//! interviews and assessments) and evaluates recruiter attendance against
//! versioned attendance policies: effective status, half-day flags, the
//! daily application quota, sandwich leave and deductions.

#![warn(missing_docs)]

pub mod alerts;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod policy;
