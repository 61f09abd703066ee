//! Registration handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{resolve_visitor, Actor, RegisterForEvent, RegistrationResponse};
use crate::errors::AppResult;

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    pub event_id: Uuid,
    /// Defaults to the caller; only admins may name another visitor
    pub visitor_id: Option<Uuid>,
    /// Access code of a PRIVATE event
    pub private_code: Option<String>,
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

impl CreateRegistrationRequest {
    fn for_actor(self, actor: &Actor) -> AppResult<RegisterForEvent> {
        Ok(RegisterForEvent {
            visitor_id: resolve_visitor(actor, self.visitor_id)?,
            event_id: self.event_id,
            private_code: self.private_code,
            phone: self.phone,
            notes: self.notes,
        })
    }
}

/// Create registration routes
pub fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register_for_event))
        .route("/mine", get(list_my_registrations))
        .route("/cancel/:id", put(cancel_registration))
        .route("/:id", get(get_registration))
}

/// Register for an event
#[utoipa::path(
    post,
    path = "/registrations",
    tag = "Registrations",
    security(("bearer_auth" = [])),
    request_body = CreateRegistrationRequest,
    responses(
        (status = 200, description = "Registration confirmed", body = RegistrationResponse),
        (status = 400, description = "Validation error, e.g. missing private code"),
        (status = 403, description = "Wrong private code or role"),
        (status = 404, description = "Event or visitor not found"),
        (status = 409, description = "Already registered, event inactive or full")
    )
)]
pub async fn register_for_event(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateRegistrationRequest>,
) -> AppResult<Json<RegistrationResponse>> {
    let registration = state
        .services
        .registrations()
        .register_for_event(payload.for_actor(&actor)?)
        .await?;

    Ok(Json(RegistrationResponse::from(registration)))
}

/// Cancel a registration
#[utoipa::path(
    put,
    path = "/registrations/cancel/{id}",
    tag = "Registrations",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration cancelled"),
        (status = 403, description = "Not the registration's visitor"),
        (status = 404, description = "Registration not found"),
        (status = 409, description = "Already cancelled")
    )
)]
pub async fn cancel_registration(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .services
        .registrations()
        .cancel_registration(&actor, id)
        .await?;

    Ok(StatusCode::OK)
}

/// The caller's registrations
#[utoipa::path(
    get,
    path = "/registrations/mine",
    tag = "Registrations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's registrations, newest first", body = Vec<RegistrationResponse>)
    )
)]
pub async fn list_my_registrations(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RegistrationResponse>>> {
    let registrations = state
        .services
        .registrations()
        .list_my_registrations(&actor)
        .await?;

    Ok(Json(
        registrations
            .into_iter()
            .map(RegistrationResponse::from)
            .collect(),
    ))
}

/// Get one registration
#[utoipa::path(
    get,
    path = "/registrations/{id}",
    tag = "Registrations",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration", body = RegistrationResponse),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Registration not found")
    )
)]
pub async fn get_registration(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RegistrationResponse>> {
    let registration = state
        .services
        .registrations()
        .get_registration(&actor, id)
        .await?;

    Ok(Json(RegistrationResponse::from(registration)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::errors::AppError;

    #[test]
    fn test_visitor_registers_self() {
        let actor = Actor::new(Uuid::new_v4(), "v@example.com", UserRole::Visitor);
        let request: CreateRegistrationRequest = serde_json::from_value(serde_json::json!({
            "eventId": Uuid::new_v4(),
            "privateCode": "ABC123",
            "phone": "+1 555 0100"
        }))
        .unwrap();

        let command = request.for_actor(&actor).unwrap();
        assert_eq!(command.visitor_id, actor.id);
        assert_eq!(command.private_code.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_organizer_cannot_register() {
        let actor = Actor::new(Uuid::new_v4(), "o@example.com", UserRole::Organizer);
        let request = CreateRegistrationRequest {
            event_id: Uuid::new_v4(),
            visitor_id: None,
            private_code: None,
            phone: None,
            notes: None,
        };
        assert!(matches!(
            request.for_actor(&actor),
            Err(AppError::Forbidden(_))
        ));
    }
}
