//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, where rows are inserted by this service, a create DTO.

pub mod instructor;
pub mod job;
pub mod status;
pub mod swing;
