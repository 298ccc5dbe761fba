//! `Store`: the concrete `sea-orm`-backed implementation of the Message
//! Store contract. Wraps a `DatabaseConnection` and an
//! in-process [`LeaseTable`] for the soft worker lease ("Worker lease on `message_id` is logical").

use std::time::Duration;

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use relayer_store_entity::{batch_messages, batches, listener_cursors, messages, processed_messages, signatures};
use relayer_types::{
    Batch, BatchId, BatchStatus, ChainId, Message, MessageId, MessageStatus, ProcessedMessage,
    Signature,
};

use crate::convert;
use crate::error::StoreError;
use crate::lease::{Lease, LeaseTable};

/// Outcome of [`Store::insert_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Existed,
}

/// Outcome of [`Store::claim_for_processing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    /// Another worker holds a live lease (local or implied by the status CAS
    /// already having moved the row to `Validating`).
    AlreadyLeased,
}

pub struct Store {
    db: DatabaseConnection,
    leases: LeaseTable,
}

impl Store {
    pub fn new(db: DatabaseConnection, lease_ttl: Duration) -> Self {
        Store {
            db,
            leases: LeaseTable::new(lease_ttl),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn lease_table(&self) -> &LeaseTable {
        &self.leases
    }

    /// Idempotent by `message_id`. The
    /// `(source_chain, source_tx_hash, source_log_index)` unique index is
    /// the storage-level backstop the Listener relies on when it rescans a
    /// range after a restart ("On primary-key conflict, skip").
    pub async fn insert_message(&self, message: &Message) -> Result<InsertOutcome, StoreError> {
        let active = convert::message_to_active_model(message);
        let on_conflict = OnConflict::column(messages::Column::MessageId)
            .do_nothing()
            .to_owned();
        match messages::Entity::insert(active)
            .on_conflict(on_conflict)
            .exec(&self.db)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(DbErr::RecordNotInserted) => Ok(InsertOutcome::Existed),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub async fn get_message(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let model = messages::Entity::find_by_id(id.as_bytes().to_vec())
            .one(&self.db)
            .await?;
        model.map(convert::model_to_message).transpose()
    }

    /// Compare-and-set `status`. Rejects transitions absent from the state
    /// machine before ever touching the database, then enforces
    /// the CAS itself with a single `UPDATE... WHERE status = $from`.
    pub async fn update_message_status(
        &self,
        id: MessageId,
        from: MessageStatus,
        to: MessageStatus,
    ) -> Result<(), StoreError> {
        if !from.can_transition(to) {
            return Err(StoreError::StatusMismatch {
                message_id: id,
                expected: from,
                actual: from,
            });
        }
        let result = messages::Entity::update_many()
            .col_expr(messages::Column::Status, Expr::value(convert::status_to_str(to)))
            .col_expr(messages::Column::UpdatedAt, Expr::value(convert::now()))
            .filter(messages::Column::MessageId.eq(id.as_bytes().to_vec()))
            .filter(messages::Column::Status.eq(convert::status_to_str(from)))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            let actual = self
                .get_message(id)
                .await?
                .map(|m| m.status)
                .unwrap_or(from);
            return Err(StoreError::StatusMismatch {
                message_id: id,
                expected: from,
                actual,
            });
        }
        Ok(())
    }

    /// Unique on `(message_id, validator_id)`.
    pub async fn append_signature(&self, sig: &Signature) -> Result<(), StoreError> {
        let active = convert::signature_to_active_model(sig);
        let on_conflict = OnConflict::columns([signatures::Column::MessageId, signatures::Column::ValidatorId])
            .do_nothing()
            .to_owned();
        match signatures::Entity::insert(active)
            .on_conflict(on_conflict)
            .exec(&self.db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    pub async fn list_signatures(&self, id: MessageId) -> Result<Vec<Signature>, StoreError> {
        let rows = signatures::Entity::find()
            .filter(signatures::Column::MessageId.eq(id.as_bytes().to_vec()))
            .all(&self.db)
            .await?;
        rows.into_iter().map(convert::model_to_signature).collect()
    }

    /// Atomic: sets the in-memory lease and CASes `Pending -> Validating`,
    /// or `Signing -> Validating` for a message a batch revert sent back
    /// for a fresh round. Returns [`ClaimOutcome::AlreadyLeased`] if another
    /// worker holds a live lease locally, or if the row was in neither
    /// status (another process already claimed it).
    pub async fn claim_for_processing(
        &self,
        id: MessageId,
        worker: u64,
    ) -> Result<ClaimOutcome, StoreError> {
        if !self.leases.try_acquire(id, worker) {
            return Ok(ClaimOutcome::AlreadyLeased);
        }
        match self
            .update_message_status(id, MessageStatus::Pending, MessageStatus::Validating)
            .await
        {
            Ok(()) => return Ok(ClaimOutcome::Claimed),
            Err(StoreError::StatusMismatch { .. }) => {}
            Err(e) => {
                self.leases.release(&id);
                return Err(e);
            }
        }
        match self
            .update_message_status(id, MessageStatus::Signing, MessageStatus::Validating)
            .await
        {
            Ok(()) => Ok(ClaimOutcome::Claimed),
            Err(StoreError::StatusMismatch { .. }) => {
                self.leases.release(&id);
                Ok(ClaimOutcome::AlreadyLeased)
            }
            Err(e) => {
                self.leases.release(&id);
                Err(e)
            }
        }
    }

    pub fn lease(&self, id: &MessageId) -> Option<Lease> {
        self.leases.get(id)
    }

    pub fn release_lease(&self, id: &MessageId) {
        self.leases.release(id);
    }

    /// Releases a stuck `Validating` row back to `Pending` ("A crashed worker leaves a message in Validating").
    pub async fn release_stuck_validating(&self, id: MessageId) -> Result<(), StoreError> {
        self.leases.release(&id);
        match self
            .update_message_status(id, MessageStatus::Validating, MessageStatus::Pending)
            .await
        {
            Ok(()) | Err(StoreError::StatusMismatch {.. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn validating_messages_older_than(
        &self,
        cutoff: chrono::DateTime<Utc>,
    ) -> Result<Vec<MessageId>, StoreError> {
        let rows = messages::Entity::find()
            .filter(messages::Column::Status.eq(convert::status_to_str(MessageStatus::Validating)))
            .filter(messages::Column::UpdatedAt.lt(cutoff))
            .all(&self.db)
            .await?;
        rows.into_iter()
            .map(|m| -> Result<MessageId, StoreError> {
                let bytes: [u8; 32] = m
                    .message_id
                    .try_into()
                    .map_err(|_| StoreError::Decode("message_id is not 32 bytes".into()))?;
                Ok(MessageId(bytes))
            })
            .collect()
    }

    /// Single transaction: `Submitting -> Completed` plus the
    /// exactly-once `ProcessedMessage` write ("ProcessedMessage").
    pub async fn record_completion(
        &self,
        id: MessageId,
        destination_tx_hash: String,
        destination_block: u64,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;
        let now = convert::now();
        let result = messages::Entity::update_many()
            .col_expr(messages::Column::Status, Expr::value(convert::status_to_str(MessageStatus::Completed)))
            .col_expr(messages::Column::UpdatedAt, Expr::value(now))
            .col_expr(messages::Column::CompletedAt, Expr::value(Some(now)))
            .col_expr(messages::Column::DestinationTxHash, Expr::value(Some(destination_tx_hash.clone())))
            .col_expr(messages::Column::DestinationBlock, Expr::value(Some(destination_block as i64)))
            .filter(messages::Column::MessageId.eq(id.as_bytes().to_vec()))
            .filter(messages::Column::Status.eq(convert::status_to_str(MessageStatus::Submitting)))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::StatusMismatch {
                message_id: id,
                expected: MessageStatus::Submitting,
                actual: MessageStatus::Completed,
            });
        }
        let processed = ProcessedMessage {
            message_id: id,
            destination_tx_hash,
            confirmed_at: now,
        };
        let active = convert::processed_message_to_active_model(&processed);
        let on_conflict = OnConflict::column(processed_messages::Column::MessageId)
            .do_nothing()
            .to_owned();
        match processed_messages::Entity::insert(active)
            .on_conflict(on_conflict)
            .exec(&txn)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => {
                txn.rollback().await?;
                return Err(StoreError::Database(e));
            }
        }
        txn.commit().await?;
        self.leases.release(&id);
        Ok(())
    }

    pub async fn is_processed(&self, id: MessageId) -> Result<bool, StoreError> {
        let row = processed_messages::Entity::find_by_id(id.as_bytes().to_vec())
            .one(&self.db)
            .await?;
        Ok(row.is_some())
    }

    /// Monotonic ("rejects non-increasing updates").
    pub async fn checkpoint_listener(&self, chain: &ChainId, cursor: u64) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;
        let existing = listener_cursors::Entity::find_by_id(chain.0.clone())
            .one(&txn)
            .await?;
        match existing {
            None => {
                let active = listener_cursors::ActiveModel {
                    chain_id: sea_orm::ActiveValue::Set(chain.0.clone()),
                    cursor: sea_orm::ActiveValue::Set(cursor as i64),
                    updated_at: sea_orm::ActiveValue::Set(convert::now()),
                };
                listener_cursors::Entity::insert(active).exec(&txn).await?;
            }
            Some(row) if (row.cursor as u64) < cursor => {
                listener_cursors::Entity::update_many()
                    .col_expr(listener_cursors::Column::Cursor, Expr::value(cursor as i64))
                    .col_expr(listener_cursors::Column::UpdatedAt, Expr::value(convert::now()))
                    .filter(listener_cursors::Column::ChainId.eq(chain.0.clone()))
                    .exec(&txn)
                    .await?;
            }
            Some(row) => {
                txn.rollback().await?;
                return Err(StoreError::NonMonotonicCursor {
                    chain: chain.clone(),
                    current: row.cursor as u64,
                    proposed: cursor,
                });
            }
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn listener_cursor(&self, chain: &ChainId) -> Result<Option<u64>, StoreError> {
        let row = listener_cursors::Entity::find_by_id(chain.0.clone())
            .one(&self.db)
            .await?;
        Ok(row.map(|r| r.cursor as u64))
    }

    /// Non-`Failed` messages from `sender` since `since` ("Per-sender hourly rate limit").
    pub async fn count_messages_from_sender_since(
        &self,
        sender: &str,
        since: chrono::DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count = messages::Entity::find()
            .filter(messages::Column::Sender.eq(sender))
            .filter(messages::Column::CreatedAt.gte(since))
            .filter(messages::Column::Status.ne(convert::status_to_str(MessageStatus::Failed)))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Sum of `amount_or_token_id` for `sender` since `since` ("Per-sender daily volume"). Fetched and summed client-side since the
    /// column is stored as decimal text to preserve u128 precision.
    pub async fn sum_amount_from_sender_since(
        &self,
        sender: &str,
        since: chrono::DateTime<Utc>,
    ) -> Result<u128, StoreError> {
        let rows = messages::Entity::find()
            .filter(messages::Column::Sender.eq(sender))
            .filter(messages::Column::CreatedAt.gte(since))
            .filter(messages::Column::Status.ne(convert::status_to_str(MessageStatus::Failed)))
            .all(&self.db)
            .await?;
        let mut total: u128 = 0;
        for row in rows {
            if let Ok(amount) = row.amount_or_token_id.parse::<u128>() {
                total = total.saturating_add(amount);
            }
        }
        Ok(total)
    }

    /// Seals a batch atomically ("On seal"): persists the `Batch`
    /// row (`Sealed`) and `batch_messages` leaf index rows, and CASes every
    /// member message `Signed -> Submitting` in the same transaction.
    pub async fn seal_batch(&self, batch: &Batch) -> Result<(), StoreError> {
        if batch.status != BatchStatus::Sealed {
            return Err(StoreError::Decode("seal_batch requires a Sealed batch".into()));
        }
        let txn = self.db.begin().await?;
        let batch_active = convert::batch_to_active_model(batch);
        batches::Entity::insert(batch_active).exec(&txn).await?;
        for (leaf_index, message_id) in batch.message_ids.iter().enumerate() {
            let link = batch_messages::ActiveModel {
                batch_id: sea_orm::ActiveValue::Set(batch.batch_id.0),
                message_id: sea_orm::ActiveValue::Set(message_id.as_bytes().to_vec()),
                leaf_index: sea_orm::ActiveValue::Set(leaf_index as i32),
            };
            batch_messages::Entity::insert(link).exec(&txn).await?;
            let result = messages::Entity::update_many()
                .col_expr(messages::Column::Status, Expr::value(convert::status_to_str(MessageStatus::Submitting)))
                .col_expr(messages::Column::UpdatedAt, Expr::value(convert::now()))
                .filter(messages::Column::MessageId.eq(message_id.as_bytes().to_vec()))
                .filter(messages::Column::Status.eq(convert::status_to_str(MessageStatus::Signed)))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                txn.rollback().await?;
                return Err(StoreError::StatusMismatch {
                    message_id: *message_id,
                    expected: MessageStatus::Signed,
                    actual: MessageStatus::Submitting,
                });
            }
        }
        txn.commit().await?;
        Ok(())
    }

    /// Marks a sealed batch `Submitted` once the destination dispatch call
    /// returns a tx hash, ahead of the eventual [`Store::confirm_batch`]
    ///.
    pub async fn mark_batch_submitted(&self, batch_id: BatchId, destination_tx_hash: &str) -> Result<(), StoreError> {
        let result = batches::Entity::update_many()
            .col_expr(batches::Column::Status, Expr::value(convert::batch_status_to_str(BatchStatus::Submitted)))
            .col_expr(batches::Column::DestinationTxHash, Expr::value(Some(destination_tx_hash.to_string())))
            .filter(batches::Column::BatchId.eq(batch_id.0))
            .filter(batches::Column::Status.eq(convert::batch_status_to_str(BatchStatus::Sealed)))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::Decode(format!("batch {batch_id} not in Sealed state")));
        }
        Ok(())
    }

    /// Confirms a sealed batch atomically ("On confirm"): the
    /// batch moves to `Confirmed` and every member message to `Completed`
    /// with `destination_tx_hash` set to the batch's (testable property 7).
    pub async fn confirm_batch(&self, batch_id: BatchId, destination_tx_hash: &str) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;
        let now = convert::now();
        let result = batches::Entity::update_many()
            .col_expr(batches::Column::Status, Expr::value(convert::batch_status_to_str(BatchStatus::Confirmed)))
            .col_expr(batches::Column::DestinationTxHash, Expr::value(Some(destination_tx_hash.to_string())))
            .filter(batches::Column::BatchId.eq(batch_id.0))
            .filter(batches::Column::Status.eq(convert::batch_status_to_str(BatchStatus::Submitted)))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::Decode(format!("batch {batch_id} not in Submitted state")));
        }
        let members = batch_messages::Entity::find()
            .filter(batch_messages::Column::BatchId.eq(batch_id.0))
            .all(&txn)
            .await?;
        for member in members {
            let message_id_bytes = member.message_id.clone();
            messages::Entity::update_many()
                .col_expr(messages::Column::Status, Expr::value(convert::status_to_str(MessageStatus::Completed)))
                .col_expr(messages::Column::UpdatedAt, Expr::value(now))
                .col_expr(messages::Column::CompletedAt, Expr::value(Some(now)))
                .col_expr(messages::Column::DestinationTxHash, Expr::value(Some(destination_tx_hash.to_string())))
                .filter(messages::Column::MessageId.eq(message_id_bytes.clone()))
                .filter(messages::Column::Status.eq(convert::status_to_str(MessageStatus::Submitting)))
                .exec(&txn)
                .await?;
            let processed = processed_messages::ActiveModel {
                message_id: sea_orm::ActiveValue::Set(message_id_bytes),
                destination_tx_hash: sea_orm::ActiveValue::Set(destination_tx_hash.to_string()),
                confirmed_at: sea_orm::ActiveValue::Set(now),
            };
            let on_conflict = OnConflict::column(processed_messages::Column::MessageId)
                .do_nothing()
                .to_owned();
            match processed_messages::Entity::insert(processed)
                .on_conflict(on_conflict)
                .exec(&txn)
                .await
            {
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => {
                    txn.rollback().await?;
                    return Err(StoreError::Database(e));
                }
            }
        }
        txn.commit().await?;
        Ok(())
    }

    /// Unseals a failed batch ("On revert"): the batch moves to
    /// `Failed` and every member message returns to `Signing` for a fresh
    /// signature round on the next attempt. Returns the reverted member
    /// ids so the caller can re-enqueue them onto the Delivery Queue --
    /// `claim_for_processing` accepts a `Signing` row, but nothing
    /// redelivers the work item on its own.
    pub async fn fail_batch(&self, batch_id: BatchId) -> Result<Vec<MessageId>, StoreError> {
        let txn = self.db.begin().await?;
        batches::Entity::update_many()
            .col_expr(batches::Column::Status, Expr::value(convert::batch_status_to_str(BatchStatus::Failed)))
            .filter(batches::Column::BatchId.eq(batch_id.0))
            .exec(&txn)
            .await?;
        let members = batch_messages::Entity::find()
            .filter(batch_messages::Column::BatchId.eq(batch_id.0))
            .all(&txn)
            .await?;
        let mut reverted = Vec::with_capacity(members.len());
        for member in members {
            let result = messages::Entity::update_many()
                .col_expr(messages::Column::Status, Expr::value(convert::status_to_str(MessageStatus::Signing)))
                .col_expr(messages::Column::UpdatedAt, Expr::value(convert::now()))
                .filter(messages::Column::MessageId.eq(member.message_id.clone()))
                .filter(messages::Column::Status.eq(convert::status_to_str(MessageStatus::Submitting)))
                .exec(&txn)
                .await?;
            if result.rows_affected > 0 {
                let bytes: [u8; 32] = member
                    .message_id
                    .try_into()
                    .map_err(|_| StoreError::Decode("message_id is not 32 bytes".into()))?;
                reverted.push(MessageId(bytes));
            }
        }
        txn.commit().await?;
        Ok(reverted)
    }

    pub async fn get_batch(&self, batch_id: BatchId) -> Result<Option<Batch>, StoreError> {
        let Some(model) = batches::Entity::find_by_id(batch_id.0).one(&self.db).await? else {
            return Ok(None);
        };
        let members = batch_messages::Entity::find()
            .filter(batch_messages::Column::BatchId.eq(batch_id.0))
            .order_by_asc(batch_messages::Column::LeafIndex)
            .all(&self.db)
            .await?;
        let mut message_ids = Vec::with_capacity(members.len());
        for member in members {
            let bytes: [u8; 32] = member
                .message_id
                .try_into()
                .map_err(|_| StoreError::Decode("message_id is not 32 bytes".into()))?;
            message_ids.push(MessageId(bytes));
        }
        Ok(Some(convert::model_to_batch(model, message_ids)?))
    }

    pub fn new_batch_id() -> BatchId {
        BatchId(Uuid::new_v4())
    }

    /// Query used by `relayer-api` for the per-sender message listing behind
    /// `GET /messages?sender=...`.
    pub async fn find_by_sender(&self, sender: &str) -> Result<Vec<Message>, StoreError> {
        let rows = messages::Entity::find()
            .filter(messages::Column::Sender.eq(sender))
            .order_by_desc(messages::Column::CreatedAt)
            .all(&self.db)
            .await?;
        rows.into_iter().map(convert::model_to_message).collect()
    }

    /// Operator override behind `relayer-api`'s `POST /messages/:id/retry`
    ///. Deliberately bypasses
    /// [`MessageStatus::can_transition`] — that table governs the worker's
    /// own state machine, not an explicit human decision to re-drive a
    /// message that exhausted its retry budget — but only ever moves a
    /// message out of a terminal failure state, never out of an in-flight
    /// one, so it can never race a worker mid-pipeline.
    pub async fn retry_message(&self, id: MessageId) -> Result<(), StoreError> {
        let result = messages::Entity::update_many()
            .col_expr(messages::Column::Status, Expr::value(convert::status_to_str(MessageStatus::Pending)))
            .col_expr(messages::Column::UpdatedAt, Expr::value(convert::now()))
            .filter(messages::Column::MessageId.eq(id.as_bytes().to_vec()))
            .filter(
                messages::Column::Status
                    .eq(convert::status_to_str(MessageStatus::Failed))
                    .or(messages::Column::Status.eq(convert::status_to_str(MessageStatus::Abandoned))),
            )
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            let actual = self
                .get_message(id)
                .await?
                .ok_or(StoreError::MessageNotFound(id))?
                .status;
            return Err(StoreError::StatusMismatch {
                message_id: id,
                expected: MessageStatus::Failed,
                actual,
            });
        }
        Ok(())
    }
}
