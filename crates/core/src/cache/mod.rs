//! SQLite-backed storage for cache generations.
//!
//! Each generation is an independently creatable and deletable set of
//! request → response entries, stored in one database file through
//! tokio-rusqlite:
//!
//! - Request-identity keys hashed with SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Entries cascade-delete with their generation

pub mod connection;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::Generation;
