//! # quotahub-service
//!
//! Business logic for QuotaHub: the quota lifecycle manager
//! ([`quota::QuotaService`]) and the escalation alert dispatcher
//! ([`alert::AlertDispatcher`]).

pub mod alert;
pub mod quota;
