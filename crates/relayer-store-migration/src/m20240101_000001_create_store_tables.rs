use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            CREATE TABLE "messages" (
                "message_id" bytea PRIMARY KEY,
                "kind" varchar NOT NULL,
                "source_chain" varchar NOT NULL,
                "destination_chain" varchar NOT NULL,
                "sender" varchar NOT NULL,
                "recipient" varchar NOT NULL,
                "token" varchar NOT NULL,
                "amount_or_token_id" varchar NOT NULL,
                "source_tx_hash" varchar NOT NULL,
                "source_block" bigint NOT NULL,
                "source_log_index" bigint NOT NULL,
                "nonce" bigint NOT NULL,
                "status" varchar NOT NULL,
                "destination_tx_hash" varchar,
                "destination_block" bigint,
                "created_at" timestamptz NOT NULL,
                "updated_at" timestamptz NOT NULL,
                "completed_at" timestamptz
            );

            CREATE UNIQUE INDEX "messages_source_tx_log_idx"
                ON "messages" ("source_chain", "source_tx_hash", "source_log_index");
            CREATE INDEX "messages_sender_idx" ON "messages" ("sender");
            CREATE INDEX "messages_status_idx" ON "messages" ("status");

            CREATE TABLE "signatures" (
                "message_id" bytea NOT NULL references "messages"("message_id"),
                "validator_id" varchar NOT NULL,
                "scheme" varchar NOT NULL,
                "bytes" bytea NOT NULL,
                "created_at" timestamptz NOT NULL,
                PRIMARY KEY ("message_id", "validator_id")
            );

            CREATE TABLE "batches" (
                "batch_id" uuid PRIMARY KEY,
                "source_chain" varchar NOT NULL,
                "destination_chain" varchar NOT NULL,
                "merkle_root" bytea,
                "status" varchar NOT NULL,
                "destination_tx_hash" varchar,
                "gas_saved_estimate" bigint,
                "created_at" timestamptz NOT NULL,
                "sealed_at" timestamptz
            );

            CREATE TABLE "batch_messages" (
                "batch_id" uuid NOT NULL references "batches"("batch_id"),
                "message_id" bytea NOT NULL references "messages"("message_id"),
                "leaf_index" integer NOT NULL,
                PRIMARY KEY ("batch_id", "message_id")
            );

            CREATE TABLE "processed_messages" (
                "message_id" bytea PRIMARY KEY references "messages"("message_id"),
                "destination_tx_hash" varchar NOT NULL,
                "confirmed_at" timestamptz NOT NULL
            );

            CREATE TABLE "listener_cursors" (
                "chain_id" varchar PRIMARY KEY,
                "cursor" bigint NOT NULL,
                "updated_at" timestamptz NOT NULL
            );

            COMMENT ON TABLE "messages" IS 'Bridge messages carried end to end through the relay pipeline';
            COMMENT ON TABLE "processed_messages" IS 'Exactly-once oracle: consulted before every destination submission';
        "#;
        crate::from_sql(manager, sql).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let sql = r#"
            DROP TABLE "listener_cursors";
            DROP TABLE "processed_messages";
            DROP TABLE "batch_messages";
            DROP TABLE "batches";
            DROP TABLE "signatures";
            DROP TABLE "messages";
        "#;
        crate::from_sql(manager, sql).await
    }
}
