//! # quotahub-database
//!
//! The quota record store: the [`repositories::QuotaStore`] interface,
//! its PostgreSQL and in-memory implementations, connection pool
//! management, and the migration runner.

pub mod connection;
pub mod migration;
pub mod repositories;
