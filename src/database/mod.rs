pub mod memory;
pub mod models;
pub mod seed;
pub mod store;

pub use memory::MemoryDatabase;
pub use store::{DatabaseError, PrincipalStore, Repository, ResourceStore};
pub use seed::{seed_admin, SeedError};
