use std::fmt;

/// Failure reported by a lifecycle hook handler.
///
/// Returning any variant from a handler aborts the operation the hook is
/// guarding. The engine surfaces it as `ModelError::HookAborted` with the
/// rendered message as its reason.
#[derive(Debug, Clone, PartialEq)]
pub enum HookError {
    Validation {
        message: String,
        hint: Option<String>,
    },
    Rejected {
        reason: String,
    },
    Storage {
        message: String,
    },
}

impl HookError {
    pub fn validation(message: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn validation_with_hint(message: &str, hint: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
        }
    }

    pub fn storage(message: &str) -> Self {
        Self::Storage {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::Validation { message, hint } => {
                write!(f, "{}", message)?;
                if let Some(hint) = hint {
                    write!(f, " (hint: {})", hint)?;
                }
                Ok(())
            }
            HookError::Rejected { reason } => write!(f, "{}", reason),
            HookError::Storage { message } => write!(f, "storage failure: {}", message),
        }
    }
}

impl std::error::Error for HookError {}

impl From<crate::error::ModelError> for HookError {
    fn from(err: crate::error::ModelError) -> Self {
        Self::storage(&err.to_string())
    }
}
