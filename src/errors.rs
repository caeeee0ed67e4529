use tracing::{error, info, warn};

/// Centralized error types for everything the study engine can surface
#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    #[error("Dataset could not be loaded: {0}")]
    DatasetLoad(String),

    #[error("Dataset is invalid: {0}")]
    InvalidDataset(String),

    #[error("Import rejected: {0}")]
    ImportRejected(String),

    #[error("Feature not available: {0}")]
    FeatureDisabled(&'static str),

    #[error("Answer choice {choice} is out of range for question '{question_id}'")]
    InvalidChoice { question_id: String, choice: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
            user_friendly_message: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl StudyError {
    /// Log the error at a level matching its kind and return the message
    /// the presentation layer should show
    pub fn to_user_message_with_context(&self, context: ErrorContext) -> String {
        match self {
            StudyError::DatasetLoad(_) | StudyError::InvalidDataset(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Dataset unavailable"
                );
                context.user_friendly_message.unwrap_or_else(|| {
                    "The question bank could not be loaded. Check the dataset location and restart."
                        .to_string()
                })
            }
            StudyError::ImportRejected(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Import rejected"
                );
                context.user_friendly_message.unwrap_or_else(|| {
                    "The file could not be imported. Make sure it is a valid export.".to_string()
                })
            }
            StudyError::FeatureDisabled(_) | StudyError::InvalidChoice { .. } => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Request refused"
                );
                context.user_friendly_message.unwrap_or_else(|| self.to_string())
            }
            StudyError::Storage(_) | StudyError::Io(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Storage failure"
                );
                context.user_friendly_message.unwrap_or_else(|| {
                    format!("Could not access the {}. Please try again.", context.resource_type)
                })
            }
        }
    }

    /// Simple conversion without context
    pub fn to_user_message(&self) -> String {
        self.to_user_message_with_context(ErrorContext::new("unknown", "resource"))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StudyError::DatasetLoad(_) | StudyError::InvalidDataset(_))
    }
}

impl From<reqwest::Error> for StudyError {
    fn from(err: reqwest::Error) -> Self {
        StudyError::DatasetLoad(err.to_string())
    }
}
