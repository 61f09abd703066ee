//! In-memory Unit of Work shared by the integration tests.
//!
//! Repository calls are atomic one by one and yield to the scheduler in
//! between, so concurrent transactions really interleave. Conditional
//! updates follow the same contracts as the SQL statements: they report
//! `false` instead of writing when the guard fails. A failed transaction
//! replays its undo journal in reverse.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use event_hub::domain::{
    Event, EventDraft, EventFilter, EventType, Registration, RegistrationStatus, User,
    UserChanges, UserRole,
};
use event_hub::errors::{AppError, AppResult};
use event_hub::infra::{
    EventRepository, RegistrationRepository, TransactionContext, TxFuture, UnitOfWork,
    UserRepository,
};
use event_hub::types::PaginationParams;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    registrations: Vec<Registration>,
}

type Undo = Box<dyn FnOnce(&mut Tables) + Send>;

/// Repositories over the shared tables. Inside a transaction every write
/// pushes its inverse onto the journal.
#[derive(Clone)]
struct MemoryRepos {
    tables: Arc<Mutex<Tables>>,
    journal: Option<Arc<Mutex<Vec<Undo>>>>,
}

impl MemoryRepos {
    fn record(&self, undo: Undo) {
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(undo);
        }
    }

    async fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        tokio::task::yield_now().await;
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }
}

fn page<T>(items: Vec<T>, params: &PaginationParams) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let data = items
        .into_iter()
        .skip(params.offset() as usize)
        .take(params.limit() as usize)
        .collect();
    (data, total)
}

fn same_text(stored: &Option<String>, wanted: &Option<String>) -> bool {
    match wanted {
        Some(wanted) => stored
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case(wanted))
            .unwrap_or(false),
        None => true,
    }
}

#[async_trait]
impl UserRepository for MemoryRepos {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.with(|t| t.users.get(&id).cloned()).await)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.to_string();
        Ok(self
            .with(|t| t.users.values().find(|u| u.email == email).cloned())
            .await)
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let created = self
            .with(|t| {
                if t.users.values().any(|u| u.email == user.email) {
                    return Err(AppError::conflict("email already registered"));
                }
                t.users.insert(user.id, user.clone());
                Ok(user)
            })
            .await?;

        let id = created.id;
        self.record(Box::new(move |t| {
            t.users.remove(&id);
        }));
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let (before, after) = self
            .with(|t| {
                let user = t.users.get_mut(&id).ok_or_else(|| AppError::not_found("user"))?;
                let before = user.clone();
                if let Some(name) = changes.name {
                    user.name = name;
                }
                if let Some(role) = changes.role {
                    user.role = role;
                }
                if let Some(is_active) = changes.is_active {
                    user.is_active = is_active;
                }
                user.updated_at = Utc::now();
                Ok::<_, AppError>((before, user.clone()))
            })
            .await?;

        self.record(Box::new(move |t| {
            t.users.insert(before.id, before);
        }));
        Ok(after)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let removed = self
            .with(|t| {
                let owns_rows = t.events.values().any(|e| e.organizer_id == id)
                    || t.registrations.iter().any(|r| r.visitor_id == id);
                if owns_rows {
                    return Err(AppError::conflict("user still owns events or registrations"));
                }
                t.users.remove(&id).ok_or_else(|| AppError::not_found("user"))
            })
            .await?;

        self.record(Box::new(move |t| {
            t.users.insert(removed.id, removed);
        }));
        Ok(())
    }

    async fn list_paginated(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let mut users = self.with(|t| t.users.values().cloned().collect::<Vec<_>>()).await;
        users.sort_by_key(|u| u.created_at);
        Ok(page(users, params))
    }
}

#[async_trait]
impl EventRepository for MemoryRepos {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Event>> {
        Ok(self.with(|t| t.events.get(&id).cloned()).await)
    }

    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<Event>> {
        EventRepository::find_by_id(self, id).await
    }

    async fn list(
        &self,
        filter: &EventFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Event>, u64)> {
        let filter = filter.clone();
        let mut events = self
            .with(|t| {
                t.events
                    .values()
                    .filter(|e| filter.include_inactive || e.is_active)
                    .filter(|e| same_text(&e.category, &filter.category))
                    .filter(|e| same_text(&e.city, &filter.city))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        events.sort_by_key(|e| e.starts_at);
        Ok(page(events, params))
    }

    async fn list_by_organizer(
        &self,
        organizer_id: Uuid,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Event>, u64)> {
        let mut events = self
            .with(|t| {
                t.events
                    .values()
                    .filter(|e| e.organizer_id == organizer_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        events.sort_by_key(|e| e.starts_at);
        Ok(page(events, params))
    }

    async fn create(&self, event: Event) -> AppResult<Event> {
        let id = event.id;
        let created = self
            .with(|t| {
                t.events.insert(event.id, event.clone());
                event
            })
            .await;

        self.record(Box::new(move |t| {
            t.events.remove(&id);
        }));
        Ok(created)
    }

    async fn update(&self, event: Event) -> AppResult<Event> {
        let (before, after) = self
            .with(|t| {
                let stored = t
                    .events
                    .get_mut(&event.id)
                    .ok_or_else(|| AppError::not_found("event"))?;
                let before = stored.clone();
                // Owner and counter are never written by an update
                *stored = Event {
                    organizer_id: before.organizer_id,
                    current_attendees: before.current_attendees,
                    created_at: before.created_at,
                    ..event
                };
                Ok::<_, AppError>((before, stored.clone()))
            })
            .await?;

        self.record(Box::new(move |t| {
            t.events.insert(before.id, before);
        }));
        Ok(after)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let removed = self
            .with(|t| {
                if t.registrations.iter().any(|r| r.event_id == id) {
                    return Err(AppError::conflict("event still has registrations"));
                }
                t.events.remove(&id).ok_or_else(|| AppError::not_found("event"))
            })
            .await?;

        self.record(Box::new(move |t| {
            t.events.insert(removed.id, removed);
        }));
        Ok(())
    }

    async fn try_reserve_seat(&self, id: Uuid) -> AppResult<bool> {
        let reserved = self
            .with(|t| match t.events.get_mut(&id) {
                Some(e) if e.max_attendees.map_or(true, |max| e.current_attendees < max) => {
                    e.current_attendees += 1;
                    true
                }
                _ => false,
            })
            .await;

        if reserved {
            self.record(Box::new(move |t| {
                if let Some(e) = t.events.get_mut(&id) {
                    e.current_attendees -= 1;
                }
            }));
        }
        Ok(reserved)
    }

    async fn release_seat(&self, id: Uuid) -> AppResult<bool> {
        let released = self
            .with(|t| match t.events.get_mut(&id) {
                Some(e) if e.current_attendees > 0 => {
                    e.current_attendees -= 1;
                    true
                }
                _ => false,
            })
            .await;

        if released {
            self.record(Box::new(move |t| {
                if let Some(e) = t.events.get_mut(&id) {
                    e.current_attendees += 1;
                }
            }));
        }
        Ok(released)
    }
}

#[async_trait]
impl RegistrationRepository for MemoryRepos {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Registration>> {
        Ok(self
            .with(|t| t.registrations.iter().find(|r| r.id == id).cloned())
            .await)
    }

    async fn find_active(
        &self,
        visitor_id: Uuid,
        event_id: Uuid,
    ) -> AppResult<Option<Registration>> {
        Ok(self
            .with(|t| {
                t.registrations
                    .iter()
                    .find(|r| r.visitor_id == visitor_id && r.event_id == event_id && r.is_active())
                    .cloned()
            })
            .await)
    }

    async fn create(&self, registration: Registration) -> AppResult<Registration> {
        let created = self
            .with(|t| {
                if !t.events.contains_key(&registration.event_id)
                    || !t.users.contains_key(&registration.visitor_id)
                {
                    return Err(AppError::not_found("event or visitor"));
                }
                // Partial unique index on active (event, visitor) pairs
                let duplicate = t.registrations.iter().any(|r| {
                    r.is_active()
                        && r.event_id == registration.event_id
                        && r.visitor_id == registration.visitor_id
                });
                if duplicate {
                    return Err(AppError::conflict("already registered"));
                }
                t.registrations.push(registration.clone());
                Ok(registration)
            })
            .await?;

        let id = created.id;
        self.record(Box::new(move |t| {
            t.registrations.retain(|r| r.id != id);
        }));
        Ok(created)
    }

    async fn mark_cancelled(&self, id: Uuid) -> AppResult<bool> {
        let cancelled = self
            .with(|t| {
                match t
                    .registrations
                    .iter_mut()
                    .find(|r| r.id == id && r.status != RegistrationStatus::Cancelled)
                {
                    Some(r) => {
                        r.status = RegistrationStatus::Cancelled;
                        r.updated_at = Some(Utc::now());
                        true
                    }
                    None => false,
                }
            })
            .await;

        if cancelled {
            self.record(Box::new(move |t| {
                if let Some(r) = t.registrations.iter_mut().find(|r| r.id == id) {
                    r.status = RegistrationStatus::Confirmed;
                }
            }));
        }
        Ok(cancelled)
    }

    async fn list_by_visitor(&self, visitor_id: Uuid) -> AppResult<Vec<Registration>> {
        let mut list = self
            .with(|t| {
                t.registrations
                    .iter()
                    .filter(|r| r.visitor_id == visitor_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        list.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(list)
    }

    async fn list_by_event(&self, event_id: Uuid) -> AppResult<Vec<Registration>> {
        let mut list = self
            .with(|t| {
                t.registrations
                    .iter()
                    .filter(|r| r.event_id == event_id)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        list.sort_by_key(|r| r.registered_at);
        Ok(list)
    }

    async fn delete_by_event(&self, event_id: Uuid) -> AppResult<u64> {
        let removed = self
            .with(|t| {
                let (removed, kept) = std::mem::take(&mut t.registrations)
                    .into_iter()
                    .partition::<Vec<_>, _>(|r| r.event_id == event_id);
                t.registrations = kept;
                removed
            })
            .await;

        let count = removed.len() as u64;
        self.record(Box::new(move |t| t.registrations.extend(removed)));
        Ok(count)
    }
}

impl TransactionContext for MemoryRepos {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn events(&self) -> &dyn EventRepository {
        self
    }

    fn registrations(&self) -> &dyn RegistrationRepository {
        self
    }
}

/// In-memory Unit of Work with seeding and inspection helpers
#[derive(Clone)]
pub struct MemoryUnitOfWork {
    repos: MemoryRepos,
}

impl Default for MemoryUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUnitOfWork {
    pub fn new() -> Self {
        Self {
            repos: MemoryRepos {
                tables: Arc::new(Mutex::new(Tables::default())),
                journal: None,
            },
        }
    }

    pub fn insert_user(&self, user: User) -> User {
        self.repos
            .tables
            .lock()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        user
    }

    pub fn insert_event(&self, event: Event) -> Event {
        self.repos
            .tables
            .lock()
            .unwrap()
            .events
            .insert(event.id, event.clone());
        event
    }

    pub fn event(&self, id: Uuid) -> Option<Event> {
        self.repos.tables.lock().unwrap().events.get(&id).cloned()
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.repos.tables.lock().unwrap().users.get(&id).cloned()
    }

    pub fn registrations_for(&self, event_id: Uuid) -> Vec<Registration> {
        self.repos
            .tables
            .lock()
            .unwrap()
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect()
    }

    pub fn active_count(&self, event_id: Uuid) -> usize {
        self.registrations_for(event_id)
            .iter()
            .filter(|r| r.is_active())
            .count()
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(self.repos.clone())
    }

    fn events(&self) -> Arc<dyn EventRepository> {
        Arc::new(self.repos.clone())
    }

    fn registrations(&self) -> Arc<dyn RegistrationRepository> {
        Arc::new(self.repos.clone())
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(&'a dyn TransactionContext) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let journal = Arc::new(Mutex::new(Vec::<Undo>::new()));
        let scope = MemoryRepos {
            tables: self.repos.tables.clone(),
            journal: Some(journal.clone()),
        };

        let outcome = f(&scope).await;

        if outcome.is_err() {
            let undo = std::mem::take(&mut *journal.lock().unwrap());
            let mut tables = self.repos.tables.lock().unwrap();
            for step in undo.into_iter().rev() {
                step(&mut tables);
            }
        }
        outcome
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn user(role: UserRole) -> User {
    let id = Uuid::new_v4();
    User::new(
        format!("{}@example.com", id.simple()),
        "hashed".to_string(),
        format!("{} {}", role, &id.simple().to_string()[..6]),
        role,
    )
}

pub fn draft(event_type: EventType, max_attendees: Option<i32>) -> EventDraft {
    EventDraft {
        title: "Rust Meetup".to_string(),
        description: Some("Talks and pizza".to_string()),
        starts_at: Utc::now() + Duration::days(7),
        location: "Main Hall".to_string(),
        address: None,
        city: Some("Berlin".to_string()),
        category: Some("Tech".to_string()),
        image_url: None,
        max_attendees,
        is_active: None,
        event_type,
        private_code: match event_type {
            EventType::Private => Some("ABC123".to_string()),
            EventType::Public => None,
        },
    }
}

pub fn event(organizer: &User, event_type: EventType, max_attendees: Option<i32>) -> Event {
    Event::new(organizer.id, draft(event_type, max_attendees))
}
