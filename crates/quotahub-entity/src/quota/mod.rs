//! Quota domain entities.

pub mod entity_kind;
pub mod model;
pub mod status;
pub mod summary;

pub use entity_kind::EntityKind;
pub use model::{AllocateQuota, QuotaFilter, QuotaRecord};
pub use status::QuotaStatus;
pub use summary::{QuotaSummary, StatusCounts};
