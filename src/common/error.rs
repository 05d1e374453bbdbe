use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or missing authentication token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    // Regra de negócio violada (sessão fechada, lote esgotado...)
    #[error("{0}")]
    Conflict(String),

    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    // Variante para erros de banco de dados
    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` captura o contexto de qualquer outro erro inesperado
    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Corpo de erro devolvido pela API: `{ "error": ..., "details": ... }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

/// `par_stock_level` -> `parStockLevel`, para casar com os nomes do JSON.
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Campo -> mensagens, já com as chaves em camelCase.
pub fn field_messages(errors: &validator::ValidationErrors) -> HashMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", e.code),
                })
                .collect();
            (camel_case(&field), messages)
        })
        .collect()
}

impl AppError {
    pub fn to_api_error(&self) -> ApiError {
        match self {
            AppError::ValidationError(errors) => ApiError {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: "One or more fields are invalid.".into(),
                details: Some(json!(field_messages(errors))),
            },
            AppError::EmailAlreadyExists => {
                ApiError::new(StatusCode::CONFLICT, "This email is already in use.")
            }
            AppError::InvalidCredentials => {
                ApiError::new(StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AppError::InvalidToken => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "Authentication token is invalid or missing.",
            ),
            AppError::Forbidden(message) => ApiError::new(StatusCode::FORBIDDEN, message.clone()),
            AppError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, self.to_string()),
            AppError::Conflict(_) | AppError::InvalidTransition { .. } => {
                ApiError::new(StatusCode::CONFLICT, self.to_string())
            }
            AppError::BadRequest(message) => {
                ApiError::new(StatusCode::BAD_REQUEST, message.clone())
            }

            // Todos os outros erros viram 500. O `tracing` loga o detalhe.
            e => {
                tracing::error!("Internal server error: {}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.")
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn snake_case_fields_become_camel_case() {
        assert_eq!(camel_case("par_stock_level"), "parStockLevel");
        assert_eq!(camel_case("name"), "name");
        assert_eq!(camel_case("default_location_id"), "defaultLocationId");
    }

    #[test]
    fn validation_errors_map_to_422_with_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = ValidationError::new("range");
        err.message = Some("Must be greater than 0.".into());
        errors.add("par_stock_level", err);

        let api = AppError::ValidationError(errors).to_api_error();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        let details = api.details.unwrap();
        assert_eq!(details["parStockLevel"][0], "Must be greater than 0.");
    }

    #[test]
    fn business_errors_map_to_expected_statuses() {
        assert_eq!(AppError::InvalidCredentials.to_api_error().status, StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).to_api_error().status, StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("Session").to_api_error().status, StatusCode::NOT_FOUND);
        let closed = AppError::Conflict("Cannot modify closed session".into()).to_api_error();
        assert_eq!(closed.status, StatusCode::CONFLICT);
        assert_eq!(closed.error, "Cannot modify closed session");
        let transition = AppError::InvalidTransition { from: "OPEN".into(), to: "COMPLETED".into() };
        assert_eq!(transition.to_api_error().status, StatusCode::CONFLICT);
    }
}
