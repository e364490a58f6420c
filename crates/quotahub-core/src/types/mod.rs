//! Shared types used across QuotaHub crates.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
