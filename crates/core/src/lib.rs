//! Domain vocabulary shared by every ideaflow crate.
//!
//! This crate has zero internal dependencies so the store adapter, the
//! workflow engine and the HTTP layer can all agree on ids, statuses, the
//! transition graph and the error taxonomy without depending on each other.

pub mod discussion;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod roles;
pub mod status;
pub mod task;
pub mod trail;
pub mod transition;
pub mod types;
pub mod undo;
