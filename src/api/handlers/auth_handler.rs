//! Authentication handlers.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{UserResponse, UserRole};
use crate::errors::AppResult;
use crate::services::{SignUp, TokenResponse};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    /// User display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    #[schema(example = "John Doe")]
    pub name: String,
    /// ORGANIZER or VISITOR (default VISITOR)
    #[schema(example = "VISITOR")]
    pub role: Option<String>,
}

impl RegisterRequest {
    fn into_sign_up(self) -> AppResult<SignUp> {
        let role = self.role.as_deref().map(UserRole::parse).transpose()?;
        Ok(SignUp {
            email: self.email,
            password: self.password,
            name: self.name,
            role,
        })
    }
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Requested role cannot be self-assigned"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .services
        .auth()
        .register(payload.into_sign_up()?)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .auth()
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn request(role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: "new@example.com".to_string(),
            password: "LongEnough1".to_string(),
            name: "New".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_role_is_optional() {
        assert_eq!(request(None).into_sign_up().unwrap().role, None);
        assert_eq!(
            request(Some("organizer")).into_sign_up().unwrap().role,
            Some(UserRole::Organizer)
        );
    }

    #[test]
    fn test_unknown_role_is_validation_error() {
        assert!(matches!(
            request(Some("superuser")).into_sign_up(),
            Err(AppError::Validation(_))
        ));
    }
}
