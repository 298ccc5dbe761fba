//! `SeaORM` entity for `queue_items`, the Delivery Queue's backing table.
//! Shaped like `relayer-store-entity`'s models: a physical-column
//! `DeriveEntityModel` struct, no relations to other entities.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "queue_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_type = "Binary(BlobSize::Blob(None))")]
    pub message_id: Vec<u8>,
    pub source_chain: String,
    pub destination_chain: String,
    pub consumer_group: String,
    pub enqueued_at: DateTimeUtc,
    pub visible_at: DateTimeUtc,
    pub attempts: i32,
    pub leased_by: Option<String>,
    pub leased_until: Option<DateTimeUtc>,
    pub acked_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
