pub mod docs;
pub mod session;

pub use docs::{DocumentStore, MemoryStore};
pub use session::SessionTracker;
