//! Ideaflow event bus and notification plumbing.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, carrying [`PlatformEvent`]s published after
//!   committed workflow mutations.
//! - [`ActivityLogger`] is a background subscriber that writes every event to
//!   the tracing pipeline.
//! - [`notification`] holds the user-facing [`Notification`] and the
//!   [`NotificationSink`] it is emitted to.

pub mod activity;
pub mod bus;
pub mod notification;

pub use activity::ActivityLogger;
pub use bus::{EventBus, PlatformEvent};
pub use notification::{BroadcastNotifier, Notification, NotificationKind, NotificationSink};
