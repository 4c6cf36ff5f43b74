pub mod auth;
pub mod customer;
pub mod project;
pub mod update;
