//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Artifact maintenance (status, invalidate, clean)
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`prewarm`] - Generate tier collections ahead of traffic
//! - [`serve`] - HTTP server

pub mod cache;
pub mod config;
pub mod prewarm;
pub mod serve;
