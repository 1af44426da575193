//! Data transfer objects for persisted state.
//!
//! Each DTO is versioned; older layouts migrate forward with `MigratesTo`
//! and convert to the domain with `IntoDomain`.

mod legacy;
mod state;

pub use legacy::{LegacyConversationV1_0_0, LegacyPluginDataV1_0_0};
pub use state::{STATE_VERSION, SessionRecordV2_0_0, SettingsRecordV2_0_0, StateV2_0_0};
