use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("queue item {0} was not found")]
    ItemNotFound(i64),

    #[error("queue item {0} is leased by another consumer")]
    LeaseHeld(i64),

    #[error("stored field could not be decoded: {0}")]
    Decode(String),
}
