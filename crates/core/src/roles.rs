//! Roles and the capability table.
//!
//! Every capability check in the workflow goes through
//! [`role_has_capability`]; call sites never compare role names themselves.

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_APPROVER: &str = "approver";
pub const ROLE_CONTRIBUTOR: &str = "contributor";

/// All known roles.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_APPROVER, ROLE_CONTRIBUTOR];

/// Something an actor may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Submit new ideas and edit one's own pending ideas.
    SubmitIdeas,
    /// Approve, reject and undo review decisions.
    ReviewIdeas,
    /// Create tasks and edit every task field.
    ManageTasks,
    /// Change status and progress of tasks the actor is assigned to.
    UpdateAssignedTasks,
    /// Move ideas to `Completed`.
    CompleteIdeas,
    /// Lock and unlock discussion threads.
    ModerateDiscussions,
    /// Post messages to unlocked threads.
    Comment,
}

/// Returns `true` if `role` grants `capability`. Unknown roles grant nothing.
pub fn role_has_capability(role: &str, capability: Capability) -> bool {
    use Capability::*;

    match role {
        ROLE_ADMIN => true,
        ROLE_APPROVER => matches!(
            capability,
            SubmitIdeas | ReviewIdeas | UpdateAssignedTasks | Comment
        ),
        ROLE_CONTRIBUTOR => matches!(capability, SubmitIdeas | UpdateAssignedTasks | Comment),
        _ => false,
    }
}

/// Returns `true` if the role name is one of [`VALID_ROLES`].
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}
