//! Mapping between `relayer_types`' domain structs and the `sea-orm`
//! entity `Model`s persisted by `relayer-store-entity`.

use chrono::Utc;
use relayer_types::{
    Batch, BatchId, BatchStatus, ChainAddress, ChainId, Message, MessageAmount, MessageId,
    MessageKind, MessageStatus, ProcessedMessage, Signature, SignatureScheme, ValidatorId,
};

use crate::error::StoreError;

pub fn message_kind_to_str(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::TokenTransfer => "token_transfer",
        MessageKind::NftTransfer => "nft_transfer",
    }
}

pub fn message_kind_from_str(s: &str) -> Result<MessageKind, StoreError> {
    match s {
        "token_transfer" => Ok(MessageKind::TokenTransfer),
        "nft_transfer" => Ok(MessageKind::NftTransfer),
        other => Err(StoreError::Decode(format!("unknown message kind {other}"))),
    }
}

pub fn status_to_str(status: MessageStatus) -> &'static str {
    match status {
        MessageStatus::Pending => "pending",
        MessageStatus::Validating => "validating",
        MessageStatus::Signing => "signing",
        MessageStatus::Signed => "signed",
        MessageStatus::Submitting => "submitting",
        MessageStatus::Completed => "completed",
        MessageStatus::Failed => "failed",
        MessageStatus::Abandoned => "abandoned",
    }
}

pub fn status_from_str(s: &str) -> Result<MessageStatus, StoreError> {
    Ok(match s {
        "pending" => MessageStatus::Pending,
        "validating" => MessageStatus::Validating,
        "signing" => MessageStatus::Signing,
        "signed" => MessageStatus::Signed,
        "submitting" => MessageStatus::Submitting,
        "completed" => MessageStatus::Completed,
        "failed" => MessageStatus::Failed,
        "abandoned" => MessageStatus::Abandoned,
        other => return Err(StoreError::Decode(format!("unknown message status {other}"))),
    })
}

pub fn batch_status_to_str(status: BatchStatus) -> &'static str {
    match status {
        BatchStatus::Assembling => "assembling",
        BatchStatus::Sealed => "sealed",
        BatchStatus::Submitted => "submitted",
        BatchStatus::Confirmed => "confirmed",
        BatchStatus::Failed => "failed",
    }
}

pub fn batch_status_from_str(s: &str) -> Result<BatchStatus, StoreError> {
    Ok(match s {
        "assembling" => BatchStatus::Assembling,
        "sealed" => BatchStatus::Sealed,
        "submitted" => BatchStatus::Submitted,
        "confirmed" => BatchStatus::Confirmed,
        "failed" => BatchStatus::Failed,
        other => return Err(StoreError::Decode(format!("unknown batch status {other}"))),
    })
}

pub fn scheme_to_str(scheme: SignatureScheme) -> &'static str {
    match scheme {
        SignatureScheme::EcdsaSecp256k1 => "ecdsa_secp256k1",
        SignatureScheme::Ed25519 => "ed25519",
    }
}

pub fn scheme_from_str(s: &str) -> Result<SignatureScheme, StoreError> {
    Ok(match s {
        "ecdsa_secp256k1" => SignatureScheme::EcdsaSecp256k1,
        "ed25519" => SignatureScheme::Ed25519,
        other => return Err(StoreError::Decode(format!("unknown signature scheme {other}"))),
    })
}

pub fn model_to_message(model: relayer_store_entity::messages::Model) -> Result<Message, StoreError> {
    let kind = message_kind_from_str(&model.kind)?;
    let amount: u128 = model
        .amount_or_token_id
        .parse()
        .map_err(|_| StoreError::Decode("amount_or_token_id is not a valid u128".into()))?;
    let payload = match kind {
        MessageKind::TokenTransfer => MessageAmount::Fungible { amount },
        MessageKind::NftTransfer => MessageAmount::NonFungible { token_id: amount },
    };
    let message_id_bytes: [u8; 32] = model
        .message_id
        .try_into()
        .map_err(|_| StoreError::Decode("message_id is not 32 bytes".into()))?;
    Ok(Message {
        message_id: MessageId(message_id_bytes),
        kind,
        source_chain: ChainId(model.source_chain),
        destination_chain: ChainId(model.destination_chain),
        sender: ChainAddress(model.sender),
        recipient: ChainAddress(model.recipient),
        token: ChainAddress(model.token),
        payload,
        source_tx_hash: model.source_tx_hash,
        source_block: model.source_block as u64,
        source_log_index: model.source_log_index as u64,
        nonce: model.nonce as u64,
        status: status_from_str(&model.status)?,
        destination_tx_hash: model.destination_tx_hash,
        destination_block: model.destination_block.map(|v| v as u64),
        created_at: model.created_at,
        updated_at: model.updated_at,
        completed_at: model.completed_at,
    })
}

pub fn message_to_active_model(message: &Message) -> relayer_store_entity::messages::ActiveModel {
    use sea_orm::ActiveValue::Set;
    let amount_or_token_id = match &message.payload {
        MessageAmount::Fungible { amount } => amount.to_string(),
        MessageAmount::NonFungible { token_id } => token_id.to_string(),
    };
    relayer_store_entity::messages::ActiveModel {
        message_id: Set(message.message_id.0.to_vec()),
        kind: Set(message_kind_to_str(message.kind).to_string()),
        source_chain: Set(message.source_chain.0.clone()),
        destination_chain: Set(message.destination_chain.0.clone()),
        sender: Set(message.sender.0.clone()),
        recipient: Set(message.recipient.0.clone()),
        token: Set(message.token.0.clone()),
        amount_or_token_id: Set(amount_or_token_id),
        source_tx_hash: Set(message.source_tx_hash.clone()),
        source_block: Set(message.source_block as i64),
        source_log_index: Set(message.source_log_index as i64),
        nonce: Set(message.nonce as i64),
        status: Set(status_to_str(message.status).to_string()),
        destination_tx_hash: Set(message.destination_tx_hash.clone()),
        destination_block: Set(message.destination_block.map(|v| v as i64)),
        created_at: Set(message.created_at),
        updated_at: Set(message.updated_at),
        completed_at: Set(message.completed_at),
    }
}

pub fn model_to_signature(model: relayer_store_entity::signatures::Model) -> Result<Signature, StoreError> {
    let message_id_bytes: [u8; 32] = model
        .message_id
        .try_into()
        .map_err(|_| StoreError::Decode("message_id is not 32 bytes".into()))?;
    Ok(Signature {
        message_id: MessageId(message_id_bytes),
        validator_id: ValidatorId(model.validator_id),
        scheme: scheme_from_str(&model.scheme)?,
        bytes: model.bytes,
        created_at: model.created_at,
    })
}

pub fn signature_to_active_model(sig: &Signature) -> relayer_store_entity::signatures::ActiveModel {
    use sea_orm::ActiveValue::Set;
    relayer_store_entity::signatures::ActiveModel {
        message_id: Set(sig.message_id.0.to_vec()),
        validator_id: Set(sig.validator_id.0.clone()),
        scheme: Set(scheme_to_str(sig.scheme).to_string()),
        bytes: Set(sig.bytes.clone()),
        created_at: Set(sig.created_at),
    }
}

pub fn model_to_batch(
    model: relayer_store_entity::batches::Model,
    message_ids: Vec<MessageId>,
) -> Result<Batch, StoreError> {
    let merkle_root = model
        .merkle_root
        .map(|bytes| -> Result<[u8; 32], StoreError> {
                bytes
                    .try_into()
                    .map_err(|_| StoreError::Decode("merkle_root is not 32 bytes".into()))
        })
        .transpose()?;
    Ok(Batch {
        batch_id: BatchId(model.batch_id),
        source_chain: ChainId(model.source_chain),
        destination_chain: ChainId(model.destination_chain),
        merkle_root,
        message_ids,
        status: batch_status_from_str(&model.status)?,
        destination_tx_hash: model.destination_tx_hash,
        gas_saved_estimate: model.gas_saved_estimate.map(|v| v as u128),
        created_at: model.created_at,
        sealed_at: model.sealed_at,
    })
}

pub fn batch_to_active_model(batch: &Batch) -> relayer_store_entity::batches::ActiveModel {
    use sea_orm::ActiveValue::Set;
    relayer_store_entity::batches::ActiveModel {
        batch_id: Set(batch.batch_id.0),
        source_chain: Set(batch.source_chain.0.clone()),
        destination_chain: Set(batch.destination_chain.0.clone()),
        merkle_root: Set(batch.merkle_root.map(|r| r.to_vec())),
        status: Set(batch_status_to_str(batch.status).to_string()),
        destination_tx_hash: Set(batch.destination_tx_hash.clone()),
        gas_saved_estimate: Set(batch.gas_saved_estimate.map(|v| v as i64)),
        created_at: Set(batch.created_at),
        sealed_at: Set(batch.sealed_at),
    }
}

pub fn processed_message_to_active_model(
    processed: &ProcessedMessage,
) -> relayer_store_entity::processed_messages::ActiveModel {
    use sea_orm::ActiveValue::Set;
    relayer_store_entity::processed_messages::ActiveModel {
        message_id: Set(processed.message_id.0.to_vec()),
        destination_tx_hash: Set(processed.destination_tx_hash.clone()),
        confirmed_at: Set(processed.confirmed_at),
    }
}

pub fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}
