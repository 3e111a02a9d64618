//! appshell - offline app-shell cache and update controller
//!
//! Installs each release of a web app's static assets into a versioned
//! bucket, serves requests from the current bucket cache-first or
//! stale-while-revalidate, and drops old buckets when a new release becomes
//! current.

pub mod audit;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod manifest;
pub mod network;
pub mod registration;
pub mod store;
pub mod ui;

pub use error::{AppShellError, AppShellResult};
