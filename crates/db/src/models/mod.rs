//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts (or a plain struct when the
//!   input is assembled server-side)
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod credential;
pub mod customer;
pub mod project;
pub mod update;
