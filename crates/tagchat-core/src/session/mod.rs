//! Session domain module.
//!
//! - `message`: `Role` and `Turn`
//! - `model`: the `Session` entity
//! - `repository`: persistence trait for settings and the session snapshot

mod message;
mod model;
mod repository;

pub use message::{Role, Turn};
pub use model::Session;
pub use repository::{PersistedState, StateRepository};
