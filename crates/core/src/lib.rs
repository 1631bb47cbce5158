pub mod config;
pub mod contact;
pub mod domain;
pub mod money;
pub mod roles;

pub use config::{
    AppConfig, ConfigError, ConfigOverrides, Lifecycle, LoadOptions, LogFormat,
    DEFAULT_APPROVAL_TIMEOUT_HOURS,
};
pub use contact::{is_valid_email, normalize_phone};
pub use domain::requisition::{HistoryEntry, Requisition, RequisitionId, RequisitionStatus};
pub use domain::user::UserRecord;
pub use money::format_kes;
pub use roles::Role;
