//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - An update DTO (all `Option` fields) where the entity is editable

pub mod allocation;
pub mod office;
pub mod person;
pub mod project;
pub mod stage;
