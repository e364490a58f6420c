//! Quota lifecycle management.

pub mod service;

pub use service::QuotaService;
