//! Event service tests against the in-memory Unit of Work.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use event_hub::domain::{
    Actor, EventChanges, EventFilter, EventType, RegisterForEvent, User, UserRole,
};
use event_hub::errors::AppError;
use event_hub::services::{
    EventManager, EventService, LogTicketIssuer, RegistrationManager, RegistrationService,
};
use event_hub::types::PaginationParams;

use support::MemoryUnitOfWork;

fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.email.clone(), user.role)
}

fn setup() -> (MemoryUnitOfWork, EventManager<MemoryUnitOfWork>, User) {
    let uow = MemoryUnitOfWork::new();
    let organizer = uow.insert_user(support::user(UserRole::Organizer));
    let service = EventManager::new(Arc::new(uow.clone()));
    (uow, service, organizer)
}

#[tokio::test]
async fn test_organizer_creates_event() {
    let (uow, service, organizer) = setup();

    let event = service
        .create_event(&actor(&organizer), support::draft(EventType::Public, Some(20)))
        .await
        .unwrap();

    assert_eq!(event.organizer_id, organizer.id);
    assert_eq!(event.current_attendees, 0);
    assert!(event.is_active);
    assert!(uow.event(event.id).is_some());
}

#[tokio::test]
async fn test_visitor_cannot_create_event() {
    let (uow, service, _) = setup();
    let v = uow.insert_user(support::user(UserRole::Visitor));

    let result = service
        .create_event(&actor(&v), support::draft(EventType::Public, None))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_past_start_is_rejected() {
    let (_, service, organizer) = setup();
    let mut draft = support::draft(EventType::Public, None);
    draft.starts_at = Utc::now() - Duration::hours(1);

    let result = service.create_event(&actor(&organizer), draft).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_private_event_needs_code() {
    let (_, service, organizer) = setup();
    let mut draft = support::draft(EventType::Private, None);
    draft.private_code = Some("  ".to_string());

    let result = service.create_event(&actor(&organizer), draft).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_public_event_drops_code() {
    let (_, service, organizer) = setup();
    let mut draft = support::draft(EventType::Public, None);
    draft.private_code = Some("IGNORED".to_string());

    let event = service
        .create_event(&actor(&organizer), draft)
        .await
        .unwrap();
    assert_eq!(event.private_code, None);
}

#[tokio::test]
async fn test_update_checks_existence_then_ownership() {
    let (uow, service, organizer) = setup();
    let rival = uow.insert_user(support::user(UserRole::Organizer));
    let event = uow.insert_event(support::event(&organizer, EventType::Public, None));

    let missing = service
        .update_event(&actor(&rival), Uuid::new_v4(), EventChanges::default())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    // Ownership is checked before the invalid change is looked at
    let changes = EventChanges {
        title: Some(String::new()),
        ..Default::default()
    };
    let foreign = service.update_event(&actor(&rival), event.id, changes).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_admin_cannot_update_foreign_event() {
    let (uow, service, organizer) = setup();
    let admin = uow.insert_user(support::user(UserRole::Admin));
    let event = uow.insert_event(support::event(&organizer, EventType::Public, None));

    let result = service
        .update_event(&actor(&admin), event.id, EventChanges::default())
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_update_preserves_counter_and_owner() {
    let (uow, service, organizer) = setup();
    let mut event = support::event(&organizer, EventType::Public, Some(10));
    event.current_attendees = 4;
    let event = uow.insert_event(event);

    let changes = EventChanges {
        title: Some("  Renamed  ".to_string()),
        max_attendees: Some(6),
        ..Default::default()
    };
    let updated = service
        .update_event(&actor(&organizer), event.id, changes)
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.max_attendees, Some(6));
    assert_eq!(updated.current_attendees, 4);
    assert_eq!(updated.organizer_id, organizer.id);
}

#[tokio::test]
async fn test_capacity_cannot_drop_below_attendees() {
    let (uow, service, organizer) = setup();
    let mut event = support::event(&organizer, EventType::Public, Some(10));
    event.current_attendees = 4;
    let event = uow.insert_event(event);

    let changes = EventChanges {
        max_attendees: Some(3),
        ..Default::default()
    };
    let result = service
        .update_event(&actor(&organizer), event.id, changes)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(uow.event(event.id).unwrap().max_attendees, Some(10));
}

#[tokio::test]
async fn test_switching_to_private_requires_code() {
    let (uow, service, organizer) = setup();
    let event = uow.insert_event(support::event(&organizer, EventType::Public, None));

    let without_code = EventChanges {
        event_type: Some(EventType::Private),
        ..Default::default()
    };
    let rejected = service
        .update_event(&actor(&organizer), event.id, without_code)
        .await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));

    let with_code = EventChanges {
        event_type: Some(EventType::Private),
        private_code: Some("VIP".to_string()),
        ..Default::default()
    };
    let updated = service
        .update_event(&actor(&organizer), event.id, with_code)
        .await
        .unwrap();
    assert_eq!(updated.private_code.as_deref(), Some("VIP"));
}

#[tokio::test]
async fn test_switching_to_public_clears_code() {
    let (uow, service, organizer) = setup();
    let event = uow.insert_event(support::event(&organizer, EventType::Private, None));

    let changes = EventChanges {
        event_type: Some(EventType::Public),
        ..Default::default()
    };
    let updated = service
        .update_event(&actor(&organizer), event.id, changes)
        .await
        .unwrap();

    assert_eq!(updated.event_type, EventType::Public);
    assert_eq!(updated.private_code, None);
}

#[tokio::test]
async fn test_delete_removes_registrations() {
    let (uow, service, organizer) = setup();
    let event = uow.insert_event(support::event(&organizer, EventType::Public, None));
    let v = uow.insert_user(support::user(UserRole::Visitor));

    RegistrationManager::new(Arc::new(uow.clone()), Arc::new(LogTicketIssuer))
        .register_for_event(RegisterForEvent {
            visitor_id: v.id,
            event_id: event.id,
            private_code: None,
            phone: None,
            notes: None,
        })
        .await
        .unwrap();

    service
        .delete_event(&actor(&organizer), event.id)
        .await
        .unwrap();

    assert!(uow.event(event.id).is_none());
    assert!(uow.registrations_for(event.id).is_empty());
}

#[tokio::test]
async fn test_delete_by_admin_and_stranger() {
    let (uow, service, organizer) = setup();
    let admin = uow.insert_user(support::user(UserRole::Admin));
    let rival = uow.insert_user(support::user(UserRole::Organizer));
    let event = uow.insert_event(support::event(&organizer, EventType::Public, None));

    let forbidden = service.delete_event(&actor(&rival), event.id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
    assert!(uow.event(event.id).is_some());

    service.delete_event(&actor(&admin), event.id).await.unwrap();
    assert!(uow.event(event.id).is_none());
}

#[tokio::test]
async fn test_inactive_event_hidden_from_visitors() {
    let (uow, service, organizer) = setup();
    let v = uow.insert_user(support::user(UserRole::Visitor));
    let mut event = support::event(&organizer, EventType::Public, None);
    event.is_active = false;
    let event = uow.insert_event(event);

    assert!(matches!(
        service.get_event(&actor(&v), event.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(service.get_event(&actor(&organizer), event.id).await.is_ok());
}

#[tokio::test]
async fn test_list_filters_and_inactive_flag() {
    let (uow, service, organizer) = setup();
    let admin = uow.insert_user(support::user(UserRole::Admin));
    let v = uow.insert_user(support::user(UserRole::Visitor));

    let mut paris = support::event(&organizer, EventType::Public, None);
    paris.city = Some("Paris".to_string());
    uow.insert_event(paris);
    uow.insert_event(support::event(&organizer, EventType::Public, None));
    let mut hidden = support::event(&organizer, EventType::Public, None);
    hidden.is_active = false;
    uow.insert_event(hidden);

    let params = PaginationParams::default();
    let everything = EventFilter {
        include_inactive: true,
        ..Default::default()
    };

    let visible = service
        .list_events(&actor(&v), everything.clone(), &params)
        .await
        .unwrap();
    assert_eq!(visible.meta.total, 2);

    let all = service
        .list_events(&actor(&admin), everything, &params)
        .await
        .unwrap();
    assert_eq!(all.meta.total, 3);

    let in_paris = EventFilter {
        city: Some("paris".to_string()),
        ..Default::default()
    };
    let filtered = service
        .list_events(&actor(&v), in_paris, &params)
        .await
        .unwrap();
    assert_eq!(filtered.data.len(), 1);
}

#[tokio::test]
async fn test_list_my_events_is_for_organizers() {
    let (uow, service, organizer) = setup();
    let v = uow.insert_user(support::user(UserRole::Visitor));
    let rival = uow.insert_user(support::user(UserRole::Organizer));
    uow.insert_event(support::event(&organizer, EventType::Public, None));
    uow.insert_event(support::event(&rival, EventType::Public, None));

    let params = PaginationParams::default();
    let mine = service
        .list_my_events(&actor(&organizer), &params)
        .await
        .unwrap();
    assert_eq!(mine.data.len(), 1);
    assert_eq!(mine.data[0].organizer_id, organizer.id);

    assert!(matches!(
        service.list_my_events(&actor(&v), &params).await,
        Err(AppError::Forbidden(_))
    ));
}
