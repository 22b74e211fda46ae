//! Data layer module
//!
//! Handles all data persistence:
//! - Repository interface over document collections
//! - In-memory backend (tests, default)
//! - SQLite backend (production)

mod database;
mod memory;
mod models;
mod repository;

pub use database::Database;
pub use memory::InMemoryRepository;
pub use models::*;
pub use repository::{ContentRepository, RepositoryExt, WriteBatch, WriteOp};
