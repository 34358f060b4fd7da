use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TenancyError {
    StoreError(String),
    MessagingError(String),
    StateTransitionError(String),
    OrchestrationError(String),
    ValidationError(String),
    ConfigurationError(String),
    DatabaseError(String),
    InvalidInput(String),
}

impl fmt::Display for TenancyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenancyError::StoreError(msg) => write!(f, "Store error: {msg}"),
            TenancyError::MessagingError(msg) => write!(f, "Messaging error: {msg}"),
            TenancyError::StateTransitionError(msg) => {
                write!(f, "State transition error: {msg}")
            }
            TenancyError::OrchestrationError(msg) => write!(f, "Orchestration error: {msg}"),
            TenancyError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            TenancyError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            TenancyError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            TenancyError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
        }
    }
}

impl std::error::Error for TenancyError {}

pub type Result<T> = std::result::Result<T, TenancyError>;

impl From<crate::store::StoreError> for TenancyError {
    fn from(err: crate::store::StoreError) -> Self {
        TenancyError::StoreError(err.to_string())
    }
}

impl From<crate::messaging::MessagingError> for TenancyError {
    fn from(err: crate::messaging::MessagingError) -> Self {
        TenancyError::MessagingError(err.to_string())
    }
}

impl From<crate::state_machine::StateMachineError> for TenancyError {
    fn from(err: crate::state_machine::StateMachineError) -> Self {
        TenancyError::StateTransitionError(err.to_string())
    }
}

impl From<crate::orchestration::OrchestrationError> for TenancyError {
    fn from(err: crate::orchestration::OrchestrationError) -> Self {
        TenancyError::OrchestrationError(err.to_string())
    }
}

impl From<crate::database::ProvisionerError> for TenancyError {
    fn from(err: crate::database::ProvisionerError) -> Self {
        TenancyError::DatabaseError(err.to_string())
    }
}
