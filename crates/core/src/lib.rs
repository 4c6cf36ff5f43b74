//! Domain logic for the sitetrack project-management backend.
//!
//! This crate has no database or HTTP dependencies. It owns the role model,
//! the ownership policy, the project status lifecycle, customer field rules,
//! attachment classification and the on-disk attachment store.

pub mod access;
pub mod attachment;
pub mod credentials;
pub mod customer;
pub mod error;
#[cfg(feature = "postgres")]
mod pg;
pub mod project_status;
pub mod roles;
pub mod storage;
pub mod types;
