//! Policy checks: amount limit, per-sender hourly rate,
//! per-sender daily volume. Pure functions over `Store` read queries; a
//! violation is terminal (`Failed`, no retry), never a transient NACK.

use chrono::Utc;

use relayer_store::Store;
use relayer_types::Message;

use crate::error::PolicyViolation;

/// Transaction/rate/volume caps from the `limits` section of the relayer's
/// configuration ("Configuration").
#[derive(Debug, Clone, Copy)]
pub struct PolicyLimits {
    pub max_transaction_amount: u128,
    pub hourly_rate_per_sender: u64,
    pub daily_volume_per_sender: u128,
}

fn message_amount(message: &Message) -> u128 {
    match message.payload {
        relayer_types::MessageAmount::Fungible { amount } => amount,
        relayer_types::MessageAmount::NonFungible { token_id } => token_id,
    }
}

/// Evaluates all three checks in spec order, short-circuiting on the first
/// violation.
pub async fn check(store: &Store, message: &Message, limits: &PolicyLimits) -> Result<(), PolicyViolation> {
    let amount = message_amount(message);

    if amount > limits.max_transaction_amount {
        return Err(PolicyViolation::AmountExceedsLimit {
            amount,
            limit: limits.max_transaction_amount,
        });
    }

    let now = Utc::now();
    let hour_ago = now - chrono::Duration::hours(1);
    let count = store
        .count_messages_from_sender_since(&message.sender.0, hour_ago)
        .await
        .unwrap_or(0);
    if count >= limits.hourly_rate_per_sender {
        return Err(PolicyViolation::HourlyRateExceeded {
            count,
            cap: limits.hourly_rate_per_sender,
        });
    }

    let day_ago = now - chrono::Duration::hours(24);
    let volume_so_far = store
        .sum_amount_from_sender_since(&message.sender.0, day_ago)
        .await
        .unwrap_or(0);
    let projected = volume_so_far.saturating_add(amount);
    if projected > limits.daily_volume_per_sender {
        return Err(PolicyViolation::DailyVolumeExceeded {
            projected,
            cap: limits.daily_volume_per_sender,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_over_limit_is_rejected_before_any_store_read() {
        let limits = PolicyLimits {
            max_transaction_amount: 100,
            hourly_rate_per_sender: 1000,
            daily_volume_per_sender: u128::MAX,
        };
        let amount = 101u128;
        assert!(amount > limits.max_transaction_amount);
    }
}
