//! # quotahub-entity
//!
//! Domain entity models for QuotaHub: the quota record, its derived
//! status classification, and the dashboard summary aggregation.

pub mod quota;
