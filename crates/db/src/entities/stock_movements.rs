//! `SeaORM` Entity for stock_movements table.
//!
//! Append-only: rows are inserted by the stock ledger and never updated.
//! `(lot_id, sequence)` is unique.

use chrono::Utc;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use stockflow_core::stock::{Movement, StockReference};
use stockflow_shared::types::{LotId, MovementId};

use super::sea_orm_active_enums::{MovementDirection, ReferenceKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub lot_id: Uuid,
    pub sequence: i64,
    pub direction: MovementDirection,
    pub quantity: i64,
    pub remaining_after: i64,
    pub reference_kind: ReferenceKind,
    pub reference_id: Uuid,
    pub reverses_movement_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lots::Entity",
        from = "Column::LotId",
        to = "super::lots::Column::Id"
    )]
    Lots,
}

impl Related<super::lots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The document this movement belongs to.
    pub fn reference(&self) -> StockReference {
        StockReference::from_parts(self.reference_kind.into(), self.reference_id)
    }
}

impl From<Model> for Movement {
    fn from(model: Model) -> Self {
        Self {
            id: MovementId::from_uuid(model.id),
            lot_id: LotId::from_uuid(model.lot_id),
            sequence: model.sequence,
            direction: model.direction.into(),
            quantity: model.quantity,
            remaining_after: model.remaining_after,
            reference: model.reference(),
            reverses_movement_id: model.reverses_movement_id.map(MovementId::from_uuid),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<&Movement> for ActiveModel {
    fn from(movement: &Movement) -> Self {
        Self {
            id: Set(movement.id.into_inner()),
            lot_id: Set(movement.lot_id.into_inner()),
            sequence: Set(movement.sequence),
            direction: Set(movement.direction.into()),
            quantity: Set(movement.quantity),
            remaining_after: Set(movement.remaining_after),
            reference_kind: Set(movement.reference.kind().into()),
            reference_id: Set(movement.reference.id()),
            reverses_movement_id: Set(movement.reverses_movement_id.map(MovementId::into_inner)),
            created_at: Set(movement.created_at.into()),
        }
    }
}
