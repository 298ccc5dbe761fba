//! Validator signing capability.
//!
//! Modeled as a tagged variant rather than dynamic dispatch per call site
//! ("Signature scheme variants"): a single [`SignerKind::sign`]
//! matches on the tag, and [`verify`] is the symmetric free function every
//! worker uses when accepting a signature from the cohort.

use alloy_primitives::B256;
use alloy_signer::Signer as AlloySigner;
use alloy_signer_local::PrivateKeySigner;
use ed25519_dalek::{Signer as Ed25519SignerTrait, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use relayer_types::SignatureScheme;

use crate::error::SignerError;

/// A raw signature over a 32-byte digest, scheme-tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDigest {
    pub scheme: SignatureScheme,
    pub bytes: Vec<u8>,
}

/// ECDSA/secp256k1 signer. Produces `(r, s, v)` with `v` adjusted to the
/// destination chain's convention — `alloy_signer_local::PrivateKeySigner`
/// already uses RFC 6979 deterministic `k` internally,
pub struct EcdsaSigner {
    inner: PrivateKeySigner,
}

impl EcdsaSigner {
    pub fn from_bytes(key: &[u8; 32]) -> Result<Self, SignerError> {
        let inner = PrivateKeySigner::from_bytes(&B256::from_slice(key))
            .map_err(|e| SignerError::KeyUnavailable(e.to_string()))?;
        Ok(EcdsaSigner { inner })
    }

    pub fn random() -> Self {
        EcdsaSigner {
            inner: PrivateKeySigner::random(),
        }
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.inner.address().as_slice().to_vec()
    }

    pub async fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>, SignerError> {
        let signature = self
            .inner
            .sign_hash(&B256::from_slice(digest))
            .await
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;
        // 65 bytes: r (32) || s (32) || v (1), v already chain-convention-adjusted by alloy.
        Ok(signature.as_bytes().to_vec())
    }
}

/// Ed25519 signer for account-based non-EVM destinations.
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_bytes(key: &[u8; 32]) -> Self {
        Ed25519Signer {
            signing_key: SigningKey::from_bytes(key),
        }
    }

    pub fn random() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Ed25519Signer {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    pub fn sign(&self, digest: &[u8; 32]) -> Vec<u8> {
        self.signing_key.sign(digest).to_bytes().to_vec()
    }
}

/// Tagged union over the two signature schemes.
pub enum SignerKind {
    Ecdsa(EcdsaSigner),
    Ed25519(Ed25519Signer),
}

impl SignerKind {
    pub fn scheme(&self) -> SignatureScheme {
        match self {
            SignerKind::Ecdsa(_) => SignatureScheme::EcdsaSecp256k1,
            SignerKind::Ed25519(_) => SignatureScheme::Ed25519,
        }
    }

    pub fn public_key(&self) -> Vec<u8> {
        match self {
            SignerKind::Ecdsa(s) => s.public_key_bytes(),
            SignerKind::Ed25519(s) => s.public_key_bytes(),
        }
    }

    /// Signs a digest, matching on the tag — the single call site.
    pub async fn sign(&self, digest: &[u8; 32]) -> Result<SignedDigest, SignerError> {
        let bytes = match self {
            SignerKind::Ecdsa(s) => s.sign(digest).await?,
            SignerKind::Ed25519(s) => s.sign(digest),
        };
        Ok(SignedDigest {
            scheme: self.scheme(),
            bytes,
        })
    }
}

/// Verifies a cohort signature against the claimed public key ("Verification is symmetric"). Used by every worker before a signature
/// counts toward the M-of-N threshold.
pub fn verify(digest: &[u8; 32], signed: &SignedDigest, public_key: &[u8]) -> bool {
    match signed.scheme {
        SignatureScheme::EcdsaSecp256k1 => verify_ecdsa(digest, &signed.bytes, public_key),
        SignatureScheme::Ed25519 => verify_ed25519(digest, &signed.bytes, public_key),
    }
}

fn verify_ecdsa(digest: &[u8; 32], signature_bytes: &[u8], expected_address: &[u8]) -> bool {
    let Ok(signature) = alloy_primitives::Signature::try_from(signature_bytes) else {
        return false;
    };
    let Ok(recovered) = signature.recover_address_from_prehash(&B256::from_slice(digest)) else {
        return false;
    };
    recovered.as_slice() == expected_address
}

fn verify_ed25519(digest: &[u8; 32], signature_bytes: &[u8], public_key: &[u8]) -> bool {
    let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = <[u8; 64]>::try_from(signature_bytes) else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key.verify(digest, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_signature_verifies_against_its_own_key() {
        let signer = Ed25519Signer::random();
        let digest = [3u8; 32];
        let signature_bytes = signer.sign(&digest);
        let signed = SignedDigest {
            scheme: SignatureScheme::Ed25519,
            bytes: signature_bytes,
        };
        assert!(verify(&digest, &signed, &signer.public_key_bytes()));
    }

    #[test]
    fn ed25519_signature_rejects_wrong_digest() {
        let signer = Ed25519Signer::random();
        let digest = [3u8; 32];
        let other_digest = [4u8; 32];
        let signature_bytes = signer.sign(&digest);
        let signed = SignedDigest {
            scheme: SignatureScheme::Ed25519,
            bytes: signature_bytes,
        };
        assert!(!verify(&other_digest, &signed, &signer.public_key_bytes()));
    }

    #[tokio::test]
    async fn ecdsa_signature_verifies_against_signer_address() {
        let signer = EcdsaSigner::random();
        let address = signer.public_key_bytes();
        let digest = [9u8; 32];
        let signed = SignerKind::Ecdsa(signer).sign(&digest).await.unwrap();
        assert!(verify(&digest, &signed, &address));
    }
}
