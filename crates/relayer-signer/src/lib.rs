//! Validator signing capability. Key material never leaves this
//! crate: components downstream program against [`keystore::KeyMaterial`].

pub mod cohort;
pub mod error;
pub mod keystore;
pub mod signer;

pub use cohort::{LocalCohort, ValidatorCohort};
pub use error::SignerError;
pub use keystore::{KeyMaterial, LocalKeystore, RemoteSigner};
pub use signer::{verify, EcdsaSigner, Ed25519Signer, SignedDigest, SignerKind};
