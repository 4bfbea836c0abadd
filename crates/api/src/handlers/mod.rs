pub mod approvals;
pub mod discussions;
pub mod ideas;
pub mod notifications;
pub mod tasks;
pub mod trail;
