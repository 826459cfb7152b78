use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunbookError {
    #[error("playbook has no tasks: tasks[] is empty or missing")]
    EmptyPlaybook,

    #[error("duplicate task id in playbook: {0}")]
    DuplicateTask(String),

    #[error("playbook not found: {0}")]
    PlaybookNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("mode '{mode}' not found for task '{task}'")]
    ModeNotFound { task: String, mode: String },

    #[error("task '{0}' has no modes")]
    NoModes(String),

    #[error("no active scope selected")]
    NoActiveScope,

    #[error("task '{0}' declares nothing producible")]
    NothingProducible(String),

    #[error("invalid parameter '{0}': expected key=value")]
    InvalidParam(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RunbookError {
    /// Selection errors are per-call and leave the session usable.
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            RunbookError::TaskNotFound(_)
                | RunbookError::ModeNotFound { .. }
                | RunbookError::NoModes(_)
        )
    }

    /// Recorder rejections: user-input errors where nothing was mutated.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RunbookError::NoActiveScope | RunbookError::NothingProducible(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RunbookError>;
