//! Validator Cohort ("signatures over the
//! merkle_root"): the M-of-N signature-collection capability shared by the
//! Relayer Worker Pool (per-message digests) and the Batcher (merkle roots).
//!
//! Kept in this crate rather than `relayer-worker` so the Batcher can depend
//! on it without depending on the Worker Pool, matching the dependency order
//! draws between the two (Batcher sits before the Worker Pool).

use async_trait::async_trait;
use relayer_types::ValidatorId;
use tracing::{instrument, warn};

use crate::error::SignerError;
use crate::keystore::KeyMaterial;
use crate::signer::{verify, SignedDigest};

/// Collects signatures over a single digest from a fixed validator set,
/// returning once at least `threshold` verified signatures are gathered.
#[async_trait]
pub trait ValidatorCohort: Send + Sync {
    async fn request_signatures(
        &self,
        digest: &[u8; 32],
        threshold: usize,
    ) -> Result<Vec<(ValidatorId, SignedDigest)>, SignerError>;
}

/// In-process cohort over local/remote [`KeyMaterial`] handles ("local in-process `Vec<Signer>` implementation for single-process
/// deployments"). Every returned signature is verified against the
/// claimed public key before counting toward `threshold`; an unverifiable
/// signature is logged and excluded rather than failing the whole request.
pub struct LocalCohort {
    validators: Vec<std::sync::Arc<dyn KeyMaterial>>,
}

impl LocalCohort {
    pub fn new(validators: Vec<std::sync::Arc<dyn KeyMaterial>>) -> Self {
        LocalCohort { validators }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

#[async_trait]
impl ValidatorCohort for LocalCohort {
    #[instrument(skip(self, digest))]
    async fn request_signatures(
        &self,
        digest: &[u8; 32],
        threshold: usize,
    ) -> Result<Vec<(ValidatorId, SignedDigest)>, SignerError> {
        let mut collected = Vec::with_capacity(threshold.min(self.validators.len()));
        for validator in &self.validators {
            if collected.len() >= threshold {
                break;
            }
            let signed = match validator.sign(digest).await {
                Ok(signed) => signed,
                Err(e) => {
                    warn!(validator = %validator.validator_id(), error = %e, "validator signing failed");
                    continue;
                }
            };
            if !verify(digest, &signed, &validator.public_key()) {
                warn!(validator = %validator.validator_id(), "validator returned an unverifiable signature, excluding");
                continue;
            }
            collected.push((validator.validator_id().clone(), signed));
        }
        if collected.len() < threshold {
            return Err(SignerError::ThresholdNotMet {
                required: threshold,
                collected: collected.len(),
            });
        }
        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::LocalKeystore;
    use crate::signer::{Ed25519Signer, SignerKind};

    fn keystore(id: &str) -> std::sync::Arc<dyn KeyMaterial> {
        std::sync::Arc::new(LocalKeystore::new(
            ValidatorId(id.to_string()),
            SignerKind::Ed25519(Ed25519Signer::random()),
        ))
    }

    #[tokio::test]
    async fn gathers_exactly_threshold_signatures_from_a_larger_cohort() {
        let cohort = LocalCohort::new(vec![keystore("v1"), keystore("v2"), keystore("v3")]);
        let digest = [7u8; 32];
        let signed = cohort.request_signatures(&digest, 2).await.unwrap();
        assert_eq!(signed.len(), 2);
    }

    #[tokio::test]
    async fn fails_when_cohort_is_smaller_than_threshold() {
        let cohort = LocalCohort::new(vec![keystore("v1")]);
        let digest = [7u8; 32];
        let err = cohort.request_signatures(&digest, 2).await.unwrap_err();
        assert!(matches!(err, SignerError::ThresholdNotMet { required: 2, collected: 1 }));
    }
}
