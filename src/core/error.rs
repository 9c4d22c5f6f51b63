use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid input: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl ProjectionError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}
