//! Key custody: the `Signer` is the only component that may hold
//! unencrypted key material. [`KeyMaterial`] is the capability every Worker
//! and Validator Cohort implementation programs against; it never exposes
//! the private bytes, only `sign`/`public_key`.

use async_trait::async_trait;
use relayer_types::{SignatureScheme, ValidatorId};

use crate::error::SignerError;
use crate::signer::{SignedDigest, SignerKind};

#[async_trait]
pub trait KeyMaterial: Send + Sync {
    fn validator_id(&self) -> &ValidatorId;
    fn scheme(&self) -> SignatureScheme;
    fn public_key(&self) -> Vec<u8>;
    async fn sign(&self, digest: &[u8; 32]) -> Result<SignedDigest, SignerError>;
}

/// Local, in-process keystore for test/dev deployments and single-process
/// validator cohorts ("local encrypted keystore (test/dev)").
///
/// The "encrypted at rest" part is a property of how the bytes are loaded
/// into `SignerKind` at construction time (from a sealed config secret, per
/// `relayer-chain`'s config layer), not of this struct — by the time a
/// `LocalKeystore` exists the key is already in memory for signing.
pub struct LocalKeystore {
    validator_id: ValidatorId,
    signer: SignerKind,
}

impl LocalKeystore {
    pub fn new(validator_id: ValidatorId, signer: SignerKind) -> Self {
        LocalKeystore { validator_id, signer }
    }
}

#[async_trait]
impl KeyMaterial for LocalKeystore {
    fn validator_id(&self) -> &ValidatorId {
        &self.validator_id
    }

    fn scheme(&self) -> SignatureScheme {
        self.signer.scheme()
    }

    fn public_key(&self) -> Vec<u8> {
        self.signer.public_key()
    }

    async fn sign(&self, digest: &[u8; 32]) -> Result<SignedDigest, SignerError> {
        self.signer.sign(digest).await
    }
}

/// Stub for a federated validator reached over a signing RPC (:
/// "in a federated deployment... peers contacted via a signing RPC (out of
/// scope — treat as an interface returning a signature given a digest)").
///
/// No transport is implemented; this exists so `ValidatorCohort` composition
/// in `relayer-worker` can be written against the same `KeyMaterial` trait
/// regardless of deployment topology.
pub struct RemoteSigner {
    validator_id: ValidatorId,
    scheme: SignatureScheme,
    public_key: Vec<u8>,
}

impl RemoteSigner {
    pub fn new(validator_id: ValidatorId, scheme: SignatureScheme, public_key: Vec<u8>) -> Self {
        RemoteSigner {
            validator_id,
            scheme,
            public_key,
        }
    }
}

#[async_trait]
impl KeyMaterial for RemoteSigner {
    fn validator_id(&self) -> &ValidatorId {
        &self.validator_id
    }

    fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    fn public_key(&self) -> Vec<u8> {
        self.public_key.clone()
    }

    async fn sign(&self, _digest: &[u8; 32]) -> Result<SignedDigest, SignerError> {
        Err(SignerError::RemoteNotConfigured)
    }
}
