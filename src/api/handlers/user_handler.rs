//! User handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{Actor, UserChanges, UserResponse, UserRole};
use crate::errors::AppResult;
use crate::types::{Paginated, PaginationParams};

/// User update request with validation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// New display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    /// New role (admin only)
    #[schema(example = "ORGANIZER")]
    pub role: Option<String>,
    /// Activate or deactivate the account (admin only)
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    fn into_changes(self) -> AppResult<UserChanges> {
        Ok(UserChanges {
            name: self.name,
            role: self.role.as_deref().map(UserRole::parse).transpose()?,
            is_active: self.is_active,
        })
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_current_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    match state.cache.get_user(&actor.id).await {
        Ok(Some(profile)) => return Ok(Json(profile)),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Profile cache read failed"),
    }

    let profile = UserResponse::from(state.services.users().get_user(&actor, actor.id).await?);

    if let Err(e) = state.cache.set_user(&profile).await {
        tracing::warn!(error = %e, "Profile cache write failed");
    }

    Ok(Json(profile))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "One page of users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let page = state.services.users().list_users(&actor, &params).await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Get user by ID (own profile or admin)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Can only view own profile unless admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users().get_user(&actor, id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update user (own name, or admin for role and active flag)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .services
        .users()
        .update_user(&actor, id, payload.into_changes()?)
        .await?;

    invalidate_profile(&state, id).await;
    Ok(Json(UserResponse::from(user)))
}

/// Delete user (admin only)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still owns events or registrations")
    )
)]
pub async fn delete_user(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.users().delete_user(&actor, id).await?;
    invalidate_profile(&state, id).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn invalidate_profile(state: &AppState, id: Uuid) {
    if let Err(e) = state.cache.invalidate_user(&id).await {
        tracing::warn!(user_id = %id, error = %e, "Profile cache invalidation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_parses_role() {
        let request = UpdateUserRequest {
            name: None,
            role: Some("visitor".to_string()),
            is_active: Some(false),
        };
        let changes = request.into_changes().unwrap();
        assert_eq!(changes.role, Some(UserRole::Visitor));
        assert!(changes.touches_privileges());
    }
}
