//! Escalation alerting for quota status transitions.

pub mod dispatcher;

pub use dispatcher::{AlertDispatcher, LogNotifier, Notifier, QuotaAlert};
