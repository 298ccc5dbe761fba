//! Postgres-backed Delivery Queue: at-least-once, partitioned by
//! `(source_chain, destination_chain)`, leased per consumer group via
//! `SELECT... FOR UPDATE SKIP LOCKED` rather than a side-channel broker.

use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    LockBehavior, LockType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};

use relayer_types::{ChainId, MessageId};

use crate::entity::{self, Entity as QueueItems};
use crate::error::QueueError;

#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: i64,
    pub message_id: MessageId,
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub attempts: i32,
}

fn to_work_item(model: entity::Model) -> Result<WorkItem, QueueError> {
    let bytes: [u8; 32] = model
        .message_id
        .try_into()
        .map_err(|_| QueueError::Decode("queue_items.message_id is not 32 bytes".into()))?;
    Ok(WorkItem {
        id: model.id,
        message_id: MessageId(bytes),
        source_chain: ChainId(model.source_chain),
        destination_chain: ChainId(model.destination_chain),
        attempts: model.attempts,
    })
}

pub struct DeliveryQueue {
    db: DatabaseConnection,
    lease_ttl: Duration,
}

impl DeliveryQueue {
    pub fn new(db: DatabaseConnection, lease_ttl: Duration) -> Self {
        DeliveryQueue { db, lease_ttl }
    }

    /// Enqueues `message_id` on the partition for `(source, destination)`.
    /// Idempotent per `(message_id, consumer_group)` via the unique index —
    /// re-enqueuing a message already on a given consumer group's queue is
    /// a no-op.
    pub async fn enqueue(
        &self,
        message_id: MessageId,
        source_chain: &ChainId,
        destination_chain: &ChainId,
        consumer_group: &str,
    ) -> Result<(), QueueError> {
        let now = Utc::now();
        let active = entity::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            message_id: Set(message_id.as_bytes().to_vec()),
            source_chain: Set(source_chain.0.clone()),
            destination_chain: Set(destination_chain.0.clone()),
            consumer_group: Set(consumer_group.to_string()),
            enqueued_at: Set(now),
            visible_at: Set(now),
            attempts: Set(0),
            leased_by: Set(None),
            leased_until: Set(None),
            acked_at: Set(None),
        };
        let on_conflict = sea_orm::sea_query::OnConflict::columns([
            entity::Column::MessageId,
            entity::Column::ConsumerGroup,
        ])
            .do_nothing()
            .to_owned();
        match QueueItems::insert(active)
            .on_conflict(on_conflict)
            .exec(&self.db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(QueueError::Database(e)),
        }
    }

    /// Claims the oldest unleased, visible item for `consumer_group`
    /// ("Ordering guarantee"). `SKIP LOCKED` lets
    /// concurrent workers and instances pull distinct rows without
    /// blocking on each other.
    pub async fn dequeue(&self, consumer_group: &str, worker: &str) -> Result<Option<WorkItem>, QueueError> {
        self.dequeue_filtered(consumer_group, worker, None).await
    }

    /// As [`Self::dequeue`], restricted to one `(source, destination)`
    /// partition — the partition-affinity optimization.
    pub async fn dequeue_partition(
        &self,
        consumer_group: &str,
        worker: &str,
        source_chain: &ChainId,
        destination_chain: &ChainId,
    ) -> Result<Option<WorkItem>, QueueError> {
        self.dequeue_filtered(consumer_group, worker, Some((source_chain, destination_chain)))
            .await
    }

    async fn dequeue_filtered(
        &self,
        consumer_group: &str,
        worker: &str,
        partition: Option<(&ChainId, &ChainId)>,
    ) -> Result<Option<WorkItem>, QueueError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;
        let mut query = QueueItems::find()
            .filter(entity::Column::ConsumerGroup.eq(consumer_group))
            .filter(entity::Column::AckedAt.is_null())
            .filter(entity::Column::VisibleAt.lte(now))
            .order_by_asc(entity::Column::EnqueuedAt)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);
        if let Some((source, destination)) = partition {
            query = query
                .filter(entity::Column::SourceChain.eq(source.0.clone()))
                .filter(entity::Column::DestinationChain.eq(destination.0.clone()));
        }
        let Some(model) = query.one(&txn).await? else {
            txn.commit().await?;
            return Ok(None);
        };
        let leased_until = now + chrono::Duration::from_std(self.lease_ttl).unwrap_or(chrono::Duration::seconds(60));
        entity::Entity::update_many()
            .col_expr(entity::Column::LeasedBy, Expr::value(worker.to_string()))
            .col_expr(entity::Column::LeasedUntil, Expr::value(leased_until))
            .col_expr(entity::Column::Attempts, Expr::value(model.attempts + 1))
            .filter(entity::Column::Id.eq(model.id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        let mut claimed = model;
        claimed.attempts += 1;
        Ok(Some(to_work_item(claimed)?))
    }

    /// Marks `id` delivered and done; it will never be redelivered.
    pub async fn ack(&self, id: i64) -> Result<(), QueueError> {
        let result = entity::Entity::update_many()
            .col_expr(entity::Column::AckedAt, Expr::value(Some(Utc::now())))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(QueueError::ItemNotFound(id));
        }
        Ok(())
    }

    /// Releases the lease and makes `id` visible again after `backoff`
    /// ("If another worker holds the lease, NACK and
    /// continue").
    pub async fn nack(&self, id: i64, backoff: Duration) -> Result<(), QueueError> {
        let visible_at = Utc::now() + chrono::Duration::from_std(backoff).unwrap_or(chrono::Duration::zero());
        let result = entity::Entity::update_many()
            .col_expr(entity::Column::LeasedBy, Expr::value(Option::<String>::None))
            .col_expr(entity::Column::LeasedUntil, Expr::value(Option::<chrono::DateTime<Utc>>::None))
            .col_expr(entity::Column::VisibleAt, Expr::value(visible_at))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(QueueError::ItemNotFound(id));
        }
        Ok(())
    }

    /// Number of unacked items waiting for `consumer_group`, surfaced on the
    /// status/metrics endpoints.
    pub async fn pending_count(&self, consumer_group: &str) -> Result<u64, QueueError> {
        let count = QueueItems::find()
            .filter(entity::Column::ConsumerGroup.eq(consumer_group))
            .filter(entity::Column::AckedAt.is_null())
            .count(&self.db)
            .await?;
        Ok(count)
    }
}
