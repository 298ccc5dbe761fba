//! `batches(batch_id PK,...)` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub batch_id: Uuid,
    pub source_chain: String,
    pub destination_chain: String,
    #[sea_orm(column_type = "Binary(BlobSize::Blob(None))", nullable)]
    pub merkle_root: Option<Vec<u8>>,
    pub status: String,
    pub destination_tx_hash: Option<String>,
    pub gas_saved_estimate: Option<i64>,
    pub created_at: DateTimeUtc,
    pub sealed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::batch_messages::Entity")]
    BatchMessages,
}

impl Related<super::batch_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchMessages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
