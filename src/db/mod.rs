//! Persistence: the document store seam, its backends and typed repositories

pub mod memory;
pub mod mongo;
pub mod query;
pub mod repository;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query::{Query, SortOrder};
pub use repository::{IdentityStore, Patch, ProfileUpdate, Repository, UserRepository};
pub use store::{Collection, DocumentStore};
