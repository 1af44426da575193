//! Configuration domain module.

mod binding;
mod settings;

pub use binding::{TagBinding, normalize_tag, parse_csv_list};
pub use settings::{
    CredentialSource, DEFAULT_LAST_ACTIVE_BEHAVIOR, DEFAULT_MODEL, DEFAULT_RETENTION_DAYS,
    DEFAULT_SYSTEM_BEHAVIOR, MAX_RETENTION_DAYS, Settings, clamp_retention_days,
};
