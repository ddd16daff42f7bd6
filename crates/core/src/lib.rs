//! Core types and shared functionality for offcache.
//!
//! This crate provides:
//! - Request/response snapshots
//! - Generation-labeled cache storage with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, Generation};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, Response, ResponseType};
