//! OpenAPI documentation configuration.
//!
//! Served through Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, event_handler, registration_handler, user_handler};
use crate::domain::{
    EventResponse, EventType, RegistrationResponse, RegistrationStatus, UserResponse, UserRole,
};
use crate::services::TokenResponse;

/// OpenAPI documentation for the Event Hub API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Event Hub API",
        version = "0.1.0",
        description = "Organizers publish events, visitors register and receive tickets",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        // User endpoints
        user_handler::get_current_user,
        user_handler::list_users,
        user_handler::get_user,
        user_handler::update_user,
        user_handler::delete_user,
        // Event endpoints
        event_handler::create_event,
        event_handler::list_events,
        event_handler::list_my_events,
        event_handler::get_event,
        event_handler::update_event,
        event_handler::delete_event,
        event_handler::list_event_registrations,
        // Registration endpoints
        registration_handler::register_for_event,
        registration_handler::cancel_registration,
        registration_handler::list_my_registrations,
        registration_handler::get_registration,
    ),
    components(
        schemas(
            // Domain types
            UserRole,
            UserResponse,
            EventType,
            EventResponse,
            RegistrationStatus,
            RegistrationResponse,
            // Auth types
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            TokenResponse,
            // Request bodies
            user_handler::UpdateUserRequest,
            event_handler::CreateEventRequest,
            event_handler::UpdateEventRequest,
            registration_handler::CreateRegistrationRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign up and login"),
        (name = "Users", description = "Profiles and user administration"),
        (name = "Events", description = "Publishing and browsing events"),
        (name = "Registrations", description = "Registering for events and cancelling")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_registration_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/registrations"));
        assert!(paths.contains_key("/registrations/cancel/{id}"));
        assert!(paths.contains_key("/events/{id}/registrations"));
    }
}
