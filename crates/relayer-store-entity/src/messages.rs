//! `SeaORM` Entity for the `messages` table ("Persistent state
//! layout"). Shaped the way `da-indexer-entity`'s `celestia_blobs.rs`
//! generates a model: `DeriveEntityModel` over the exact physical columns.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Binary(BlobSize::Blob(None))")]
    pub message_id: Vec<u8>,
    pub kind: String,
    pub source_chain: String,
    pub destination_chain: String,
    pub sender: String,
    pub recipient: String,
    pub token: String,
    /// Decimal string: `amount` (TokenTransfer) or `token_id` (NftTransfer).
    /// u128 has no native sea-orm column type, so it is carried as text and
    /// parsed at the `relayer-store` boundary.
    pub amount_or_token_id: String,
    pub source_tx_hash: String,
    pub source_block: i64,
    pub source_log_index: i64,
    pub nonce: i64,
    pub status: String,
    pub destination_tx_hash: Option<String>,
    pub destination_block: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::signatures::Entity")]
    Signatures,
    #[sea_orm(has_many = "super::batch_messages::Entity")]
    BatchMessages,
    #[sea_orm(has_one = "super::processed_messages::Entity")]
    ProcessedMessage,
}

impl Related<super::signatures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Signatures.def()
    }
}

impl Related<super::batch_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchMessages.def()
    }
}

impl Related<super::processed_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProcessedMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
