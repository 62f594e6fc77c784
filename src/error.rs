use thiserror::Error;

use crate::validation::PromptRejection;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(#[from] PromptRejection),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Image generation failed: {0}")]
    BackendUnavailable(String),
    #[error("Render error: {0}")]
    RenderError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl GeneratorError {
    /// Text shown to HTTP callers. Internal failures stay in the server log.
    pub fn public_detail(&self) -> String {
        match self {
            GeneratorError::InvalidPrompt(rejection) => rejection.to_string(),
            GeneratorError::BackendUnavailable(_) | GeneratorError::RenderError(_) => {
                self.to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(feature = "server")]
mod response {
    use super::GeneratorError;
    use crate::models::ErrorResponse;
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};

    impl ResponseError for GeneratorError {
        fn status_code(&self) -> StatusCode {
            match self {
                GeneratorError::InvalidPrompt(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }

        fn error_response(&self) -> HttpResponse {
            let status = self.status_code();
            if status.is_server_error() {
                log::error!("Request failed: {}", self);
            }
            HttpResponse::build(status).json(ErrorResponse::new(self.public_detail()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_not_leaked() {
        let err = GeneratorError::InternalError("db password=hunter2".into());
        assert_eq!(err.public_detail(), "Internal server error");
    }

    #[test]
    fn prompt_rejection_detail_is_passed_through() {
        let err: GeneratorError = PromptRejection::TooShort { min: 3, actual: 0 }.into();
        assert!(err.public_detail().contains("at least 3"));
    }

    #[cfg(feature = "server")]
    #[test]
    fn status_codes() {
        use actix_web::{http::StatusCode, ResponseError};

        let rejected: GeneratorError = PromptRejection::TooLong { max: 1000, actual: 1001 }.into();
        assert_eq!(rejected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GeneratorError::RenderError("oom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
