//! The message state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`crate::message::Message`].
///
/// Terminal states are [`MessageStatus::Completed`], [`MessageStatus::Failed`]
/// and [`MessageStatus::Abandoned`] — no transition out of a terminal state
/// is ever permitted, enforced by [`MessageStatus::can_transition`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Validating,
    Signing,
    Signed,
    Submitting,
    Completed,
    Failed,
    Abandoned,
}

impl MessageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MessageStatus::Completed | MessageStatus::Failed | MessageStatus::Abandoned
        )
    }

    /// Whether `self -> to` is a permitted transition.
    pub fn can_transition(self, to: MessageStatus) -> bool {
        use MessageStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, to) {
            (Pending, Validating) => true,
            (Validating, Pending) => true,
            (Validating, Abandoned) => true,
            (Validating, Signing) => true,
            (Signing, Signed) => true,
            (Signed, Submitting) => true,
            (Submitting, Completed) => true,
            (Submitting, Signing) => true,
            (Signing, Validating) => true,
            // Retry budget exhausted from any non-terminal state.
            (Pending, Failed)
            | (Validating, Failed)
            | (Signing, Failed)
            | (Signed, Failed)
            | (Submitting, Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Validating => "validating",
            MessageStatus::Signing => "signing",
            MessageStatus::Signed => "signed",
            MessageStatus::Submitting => "submitting",
            MessageStatus::Completed => "completed",
            MessageStatus::Failed => "failed",
            MessageStatus::Abandoned => "abandoned",
        };
        write!(f, "{s}")
    }
}

/// Status of a [`crate::batch::Batch`] ("Batch").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Assembling,
    Sealed,
    Submitted,
    Confirmed,
    Failed,
}

impl BatchStatus {
    pub fn can_transition(self, to: BatchStatus) -> bool {
        use BatchStatus::*;
        matches!(
            (self, to),
            (Assembling, Sealed) | (Sealed, Submitted) | (Submitted, Confirmed) | (Submitted, Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MessageStatus::*;

    const ALL: [MessageStatus; 8] = [
        Pending, Validating, Signing, Signed, Submitting, Completed, Failed, Abandoned,
    ];

    const PERMITTED: &[(MessageStatus, MessageStatus)] = &[
        (Pending, Validating),
        (Validating, Pending),
        (Validating, Abandoned),
        (Validating, Signing),
        (Signing, Signed),
        (Signed, Submitting),
        (Submitting, Completed),
        (Submitting, Signing),
        (Signing, Validating),
        (Pending, Failed),
        (Validating, Failed),
        (Signing, Failed),
        (Signed, Failed),
        (Submitting, Failed),
    ];

    #[test]
    fn only_the_listed_transitions_are_permitted() {
        for &from in ALL.iter() {
            for &to in ALL.iter() {
                let expected = PERMITTED.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expected,
                    "unexpected result for {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_accept_no_outgoing_transition() {
        for &terminal in [Completed, Failed, Abandoned].iter() {
            for &to in ALL.iter() {
                assert!(!terminal.can_transition(to));
            }
        }
    }
}
