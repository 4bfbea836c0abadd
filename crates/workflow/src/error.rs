use ideaflow_core::error::CoreError;
use ideaflow_db::StoreError;

/// Error returned by every workflow operation.
///
/// Store lookups that miss are folded into [`CoreError::NotFound`] so callers
/// see one not-found shape regardless of backend.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Store failure: {0}")]
    Store(StoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                WorkflowError::Core(CoreError::NotFound { entity, id })
            }
            other => WorkflowError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(errors: validator::ValidationErrors) -> Self {
        WorkflowError::Core(CoreError::Validation(errors.to_string()))
    }
}

impl WorkflowError {
    pub fn is_store_failure(&self) -> bool {
        matches!(self, WorkflowError::Store(_))
    }

    pub fn core(&self) -> Option<&CoreError> {
        match self {
            WorkflowError::Core(e) => Some(e),
            WorkflowError::Store(_) => None,
        }
    }

    /// Short title for the failure notification shown to the user.
    pub fn notification_title(&self) -> &'static str {
        match self {
            WorkflowError::Core(CoreError::NotFound { .. }) => "Not found",
            WorkflowError::Core(CoreError::InvalidTransition { .. }) => "Action not allowed",
            WorkflowError::Core(CoreError::Busy(_)) => "Please wait",
            WorkflowError::Core(CoreError::DiscussionLocked { .. }) => "Discussion locked",
            WorkflowError::Core(CoreError::NothingToUndo) => "Nothing to undo",
            WorkflowError::Core(CoreError::Validation(_)) => "Invalid input",
            WorkflowError::Core(CoreError::Conflict(_)) => "Conflict",
            WorkflowError::Core(CoreError::Unauthorized(_) | CoreError::Forbidden(_)) => {
                "Permission denied"
            }
            WorkflowError::Core(CoreError::Internal(_)) | WorkflowError::Store(_) => {
                "Action failed"
            }
        }
    }
}
