//! Status and priority enums mapping to SMALLINT columns.
//!
//! Each variant's discriminant is the value stored in the database; the
//! snake_case name is what travels over JSON and into trail events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant in discriminant order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Return the wire name (snake_case).
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            /// Look up a variant by its database ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Parse a wire name.
            pub fn parse(name: &str) -> Result<Self, CoreError> {
                match name {
                    $( $text => Ok($name::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        "Invalid {} '{other}'", $label
                    ))),
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl TryFrom<StatusId> for $name {
            type Error = CoreError;

            fn try_from(value: StatusId) -> Result<Self, Self::Error> {
                Self::from_id(value).ok_or_else(|| {
                    CoreError::Validation(format!("Unknown {} id {value}", $label))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Idea lifecycle status.
    IdeaStatus as "idea status" {
        PendingApproval = 1 => "pending_approval",
        Approved = 2 => "approved",
        Rejected = 3 => "rejected",
        InProgress = 4 => "in_progress",
        Completed = 5 => "completed",
    }
}

define_status_enum! {
    /// Task execution status. Transitions among these are unconstrained.
    TaskStatus as "task status" {
        NotStarted = 1 => "not_started",
        InProgress = 2 => "in_progress",
        Completed = 3 => "completed",
        OnHold = 4 => "on_hold",
    }
}

define_status_enum! {
    /// Priority shared by ideas and tasks.
    Priority as "priority" {
        Low = 1 => "low",
        Medium = 2 => "medium",
        High = 3 => "high",
        Critical = 4 => "critical",
    }
}

impl IdeaStatus {
    /// `approvedBy` must be set exactly when the idea carries a review decision.
    pub fn carries_decision(self) -> bool {
        matches!(self, IdeaStatus::Approved | IdeaStatus::Rejected)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}
