//! Session storage for the application layer.

mod lock;
mod store;

pub use lock::KeyedLocks;
pub use store::SessionStore;
