pub mod dto;
pub mod fs_vault_host;
pub mod paths;
pub mod storage;
pub mod toml_state_repository;

pub use crate::fs_vault_host::FsVaultHost;
pub use crate::paths::TagchatPaths;
pub use crate::toml_state_repository::TomlStateRepository;
