//! Idea workflow: state machines, audit trail, discussions, approvals and undo.
//!
//! Dependency order, leaves first:
//!
//! - [`AuditTrailLogger`] appends hash-chained trail events and swallows its
//!   own failures.
//! - [`DiscussionLockManager`] owns thread existence, the lock flag and
//!   message admission.
//! - [`WorkflowEngine`] validates and applies idea and task changes, and is
//!   the single capability-checked entry point.
//! - [`ActionNotifier`] turns each finished action into one notification.
//! - [`UndoCache`] holds the one retained [`UndoRecord`].
//! - [`ApprovalCoordinator`] runs approve, reject and undo behind a
//!   single-flight guard and emits exactly one notification per action.

pub mod approval;
pub mod config;
pub mod discussion;
pub mod engine;
pub mod error;
pub mod notify;
pub mod trail;
pub mod undo;

pub use approval::ApprovalCoordinator;
pub use config::WorkflowConfig;
pub use discussion::DiscussionLockManager;
pub use engine::WorkflowEngine;
pub use error::{WorkflowError, WorkflowResult};
pub use notify::ActionNotifier;
pub use trail::{AuditTrailLogger, TrailEntry};
pub use undo::{UndoCache, UndoRecord};
