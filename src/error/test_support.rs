use super::{AppError, ValidationError};

impl From<&'static str> for AppError {
    fn from(message: &'static str) -> Self {
        AppError::Validation(ValidationError::TestExpectation { message })
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(ValidationError::TestExpectationValue {
            message: "Test expectation failed",
            value,
        })
    }
}
