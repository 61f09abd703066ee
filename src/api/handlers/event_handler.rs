//! Event handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{
    Actor, Event, EventChanges, EventDraft, EventFilter, EventResponse, EventType,
    RegistrationResponse,
};
use crate::errors::AppResult;
use crate::types::{Paginated, PaginationParams};

/// Event creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    #[schema(example = "RustConf Meetup")]
    pub title: String,
    pub description: Option<String>,
    /// Start date and time (RFC 3339); must not be in the past
    pub starts_at: DateTime<Utc>,
    #[validate(length(min = 1, max = 255, message = "Location must be 1 to 255 characters"))]
    #[schema(example = "Main Hall")]
    pub location: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
    #[validate(range(min = 1, message = "maxAttendees must be at least 1"))]
    pub max_attendees: Option<i32>,
    pub is_active: Option<bool>,
    /// PUBLIC (default) or PRIVATE
    pub event_type: Option<EventType>,
    /// Required for PRIVATE events
    pub private_code: Option<String>,
}

impl From<CreateEventRequest> for EventDraft {
    fn from(request: CreateEventRequest) -> Self {
        EventDraft {
            title: request.title,
            description: request.description,
            starts_at: request.starts_at,
            location: request.location,
            address: request.address,
            city: request.city,
            category: request.category,
            image_url: request.image_url,
            max_attendees: request.max_attendees,
            is_active: request.is_active,
            event_type: request.event_type.unwrap_or(EventType::Public),
            private_code: request.private_code,
        }
    }
}

/// Event update request; absent fields stay unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 255, message = "Location must be 1 to 255 characters"))]
    pub location: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
    #[validate(range(min = 1, message = "maxAttendees must be at least 1"))]
    pub max_attendees: Option<i32>,
    pub is_active: Option<bool>,
    pub event_type: Option<EventType>,
    pub private_code: Option<String>,
}

impl From<UpdateEventRequest> for EventChanges {
    fn from(request: UpdateEventRequest) -> Self {
        EventChanges {
            title: request.title,
            description: request.description,
            starts_at: request.starts_at,
            location: request.location,
            address: request.address,
            city: request.city,
            category: request.category,
            image_url: request.image_url,
            max_attendees: request.max_attendees,
            is_active: request.is_active,
            event_type: request.event_type,
            private_code: request.private_code,
        }
    }
}

/// Listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventQuery {
    /// Exact category, case-insensitive
    pub category: Option<String>,
    /// Exact city, case-insensitive
    pub city: Option<String>,
    /// Include deactivated events (admin only, ignored otherwise)
    #[serde(default)]
    pub include_inactive: bool,
}

impl From<EventQuery> for EventFilter {
    fn from(query: EventQuery) -> Self {
        EventFilter {
            category: query.category,
            city: query.city,
            include_inactive: query.include_inactive,
        }
    }
}

/// Shape an event for the caller; only managers see the private code
fn present(event: Event, actor: &Actor) -> EventResponse {
    if event.is_managed_by(actor) {
        EventResponse::with_code(event)
    } else {
        EventResponse::from(event)
    }
}

/// Create event routes
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/mine", get(list_my_events))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
        .route("/:id/registrations", get(list_event_registrations))
}

/// Create an event (organizers only)
#[utoipa::path(
    post,
    path = "/events",
    tag = "Events",
    security(("bearer_auth" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Only organizers can create events")
    )
)]
pub async fn create_event(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<EventResponse>)> {
    let event = state
        .services
        .events()
        .create_event(&actor, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(EventResponse::with_code(event))))
}

/// Browse events
#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(EventQuery, PaginationParams),
    responses(
        (status = 200, description = "One page of events", body = Vec<EventResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_events(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<EventResponse>>> {
    let page = state
        .services
        .events()
        .list_events(&actor, query.into(), &params)
        .await?;

    Ok(Json(page.map(|event| present(event, &actor))))
}

/// The caller's own events (organizers only)
#[utoipa::path(
    get,
    path = "/events/mine",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "One page of the organizer's events", body = Vec<EventResponse>),
        (status = 403, description = "Only organizers own events")
    )
)]
pub async fn list_my_events(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<EventResponse>>> {
    let page = state
        .services
        .events()
        .list_my_events(&actor, &params)
        .await?;

    Ok(Json(page.map(EventResponse::with_code)))
}

/// Get one event
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventResponse>> {
    let event = state.services.events().get_event(&actor, id).await?;
    Ok(Json(present(event, &actor)))
}

/// Update an event (owning organizer only)
#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the owning organizer"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateEventRequest>,
) -> AppResult<Json<EventResponse>> {
    let event = state
        .services
        .events()
        .update_event(&actor, id, payload.into())
        .await?;

    Ok(Json(EventResponse::with_code(event)))
}

/// Delete an event and its registrations (owner or admin)
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn delete_event(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.events().delete_event(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attendee list of an event (owner or admin)
#[utoipa::path(
    get,
    path = "/events/{id}/registrations",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registrations of the event", body = Vec<RegistrationResponse>),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn list_event_registrations(
    Extension(actor): Extension<Actor>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<RegistrationResponse>>> {
    let registrations = state
        .services
        .registrations()
        .list_event_registrations(&actor, id)
        .await?;

    Ok(Json(
        registrations
            .into_iter()
            .map(RegistrationResponse::from)
            .collect(),
    ))
}
