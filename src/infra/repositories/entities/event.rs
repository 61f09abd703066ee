//! Event database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Event, EventType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub starts_at: DateTimeUtc,
    pub location: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub max_attendees: Option<i32>,
    pub current_attendees: i32,
    pub is_active: bool,
    pub event_type: String,
    pub private_code: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OrganizerId",
        to = "super::user::Column::Id"
    )]
    Organizer,
    #[sea_orm(has_many = "super::registration::Entity")]
    Registrations,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizer.def()
    }
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Event {
    fn from(model: Model) -> Self {
        Event {
            id: model.id,
            organizer_id: model.organizer_id,
            title: model.title,
            description: model.description,
            starts_at: model.starts_at,
            location: model.location,
            address: model.address,
            city: model.city,
            category: model.category,
            image_url: model.image_url,
            max_attendees: model.max_attendees,
            current_attendees: model.current_attendees,
            is_active: model.is_active,
            event_type: EventType::from(model.event_type.as_str()),
            private_code: model.private_code,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
