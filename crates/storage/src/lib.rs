#![forbid(unsafe_code)]

pub mod progress;
pub mod session;

pub use progress::SessionProgressStore;
pub use session::{InMemorySessionStore, SessionStore, StorageError};
