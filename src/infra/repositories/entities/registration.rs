//! Registration database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Registration, RegistrationStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "registrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub visitor_id: Uuid,
    pub status: String,
    pub registered_at: DateTimeUtc,
    pub phone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::VisitorId",
        to = "super::user::Column::Id"
    )]
    Visitor,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Visitor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Registration {
    fn from(model: Model) -> Self {
        Registration {
            id: model.id,
            event_id: model.event_id,
            visitor_id: model.visitor_id,
            status: RegistrationStatus::from(model.status.as_str()),
            registered_at: model.registered_at,
            phone: model.phone,
            notes: model.notes,
            updated_at: model.updated_at,
        }
    }
}
