//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` input DTO for inserts
//! - An update DTO (all `Option` fields) for patches

pub mod attachment;
pub mod discussion;
pub mod idea;
pub mod task;
pub mod trail_event;
