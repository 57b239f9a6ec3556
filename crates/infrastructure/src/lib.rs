//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_grant_repository;
mod postgres_grant_repository;

pub use in_memory_grant_repository::InMemoryGrantRepository;
pub use postgres_grant_repository::PostgresGrantRepository;
