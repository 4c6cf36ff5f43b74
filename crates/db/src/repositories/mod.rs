//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod credential_repo;
pub mod customer_repo;
pub mod project_repo;
pub mod update_repo;

pub use credential_repo::CredentialRepo;
pub use customer_repo::CustomerRepo;
pub use project_repo::ProjectRepo;
pub use update_repo::UpdateRepo;
