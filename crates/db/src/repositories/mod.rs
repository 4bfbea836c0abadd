//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod discussion_repo;
pub mod idea_repo;
pub mod task_repo;
pub mod trail_event_repo;

pub use discussion_repo::DiscussionRepo;
pub use idea_repo::IdeaRepo;
pub use task_repo::TaskRepo;
pub use trail_event_repo::TrailEventRepo;
