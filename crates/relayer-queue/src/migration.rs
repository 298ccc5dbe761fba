//! Schema migration for `queue_items`, mirroring
//! `relayer-store-migration`'s raw-SQL-in-`from_sql` style.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{Statement, TransactionTrait};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(Migration)]
    }
}

#[derive(DeriveMigrationName)]
struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TABLE "queue_items" (
                "id" bigserial PRIMARY KEY,
                "message_id" bytea NOT NULL,
                "source_chain" varchar NOT NULL,
                "destination_chain" varchar NOT NULL,
                "consumer_group" varchar NOT NULL,
                "enqueued_at" timestamptz NOT NULL,
                "visible_at" timestamptz NOT NULL,
                "attempts" integer NOT NULL DEFAULT 0,
                "leased_by" varchar,
                "leased_until" timestamptz,
                "acked_at" timestamptz
            );

            CREATE INDEX "queue_items_dequeue_idx"
                ON "queue_items" ("consumer_group", "visible_at")
                WHERE "acked_at" IS NULL;
            CREATE INDEX "queue_items_partition_idx"
                ON "queue_items" ("source_chain", "destination_chain");
            CREATE UNIQUE INDEX "queue_items_message_group_idx"
                ON "queue_items" ("message_id", "consumer_group");

            COMMENT ON TABLE "queue_items" IS 'At-least-once delivery queue, partitioned by (source_chain, destination_chain), leased per consumer group';
        "#;
        from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        from_sql(manager, r#"DROP TABLE "queue_items";"#).await
    }
}

async fn from_sql(manager: &SchemaManager<'_>, content: &str) -> Result<(), DbErr> {
    let stmnts: Vec<&str> = content.split(';').collect();
    let txn = manager.get_connection().begin().await?;
    for st in stmnts.into_iter() {
        if st.trim().is_empty() {
            continue;
        }
        txn.execute(Statement::from_string(
            manager.get_database_backend(),
            st.to_string(),
        ))
        .await
        .map_err(|e| DbErr::Migration(format!("{e}\nQuery: {st}")))?;
    }
    txn.commit().await
}
