//! linkspam - global link usage reports for a wiki farm
//!
//! This crate provides:
//! - Site directory resolution (replica database with sitematrix API fallback)
//! - Per-site external link search across protocol and subdomain variants
//! - Report aggregation and a JSON report store shared with the web front end
//! - A run gate that lets operators halt future runs from a wiki page

pub mod commands;
pub mod config;
pub mod error;
pub mod linksearch;
pub mod ordered_map;
pub mod progress;
pub mod quote;
pub mod report;
pub mod rungate;
pub mod sitematrix;
pub mod store;
pub mod wiki;

pub use config::Config;
pub use error::{Error, Result};
