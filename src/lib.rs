//! mxsift (mail list sifter) - validate CSV email lists and keep the results
//!
//! This library provides the core functionality for mxsift, including:
//! - CSV ingestion with user-chosen column mapping
//! - Per-address validation: syntax check, then a DNS MX lookup over
//!   DNS-over-HTTPS
//! - Sequential batch processing with progress reporting and summary counts
//! - CSV export of results
//! - SQLite storage of named result lists per user
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use mxsift::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod repo;
pub mod session;
pub mod cli;
