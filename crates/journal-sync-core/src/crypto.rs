//! The chain codec: sealing payloads into chained, encrypted journal entries.
//!
//! The engine only relies on the [`ChainCodec`] contract. [`SealedChainCodec`]
//! is the reference implementation: ChaCha20-Poly1305 for content and a keyed
//! Blake3 hash over the canonical `(prev, sealed)` binding for the entry id.

use bytes::Bytes;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use std::fmt;

use crate::canonical::binding_bytes;
use crate::entry::JournalEntry;
use crate::error::{CoreError, Result};
use crate::types::EntryId;

/// Length of the random nonce prefixed to every sealed payload.
pub const NONCE_LEN: usize = 12;

const ENCRYPTION_CONTEXT: &str = "journal-sync-v0 2024 entry encryption";
const ID_CONTEXT: &str = "journal-sync-v0 2024 entry id";
const SECRET_CONTEXT: &str = "journal-sync-v0 2024 collection secret";

/// Opaque keyed transform between payloads and chained journal entries.
///
/// Implementations must guarantee that changing the payload or the
/// predecessor changes the id, and that ids cannot be produced without the
/// secret. Sealing does not have to be deterministic.
pub trait ChainCodec: Send + Sync {
    /// Seal a payload as the successor of `prev`.
    fn seal(&self, payload: &[u8], prev: Option<&EntryId>) -> Result<(EntryId, Bytes)>;

    /// Recover the payload from sealed bytes.
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>>;

    /// Check that an entry's id was produced by this codec for its contents.
    fn verify_id(&self, entry: &JournalEntry) -> bool;
}

/// The per-collection secret the codec is keyed with.
#[derive(Clone, PartialEq, Eq)]
pub struct CollectionSecret([u8; 32]);

impl CollectionSecret {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive a collection secret from an account password.
    ///
    /// Different collections of the same account get unrelated secrets.
    pub fn derive(password: &str, collection_id: &str) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(SECRET_CONTEXT);
        hasher.update(collection_id.as_bytes());
        hasher.update(&[0]);
        hasher.update(password.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CollectionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CollectionSecret(..)")
    }
}

/// Reference codec: authenticated encryption plus keyed-hash entry ids.
///
/// Sealed layout: `nonce (12 bytes) || ChaCha20-Poly1305 ciphertext`.
#[derive(Clone)]
pub struct SealedChainCodec {
    encryption_key: [u8; 32],
    id_key: [u8; 32],
}

impl SealedChainCodec {
    /// Create a codec for the collection keyed by `secret`.
    pub fn new(secret: CollectionSecret) -> Self {
        Self {
            encryption_key: blake3::derive_key(ENCRYPTION_CONTEXT, secret.as_bytes()),
            id_key: blake3::derive_key(ID_CONTEXT, secret.as_bytes()),
        }
    }

    /// Compute the id binding `sealed` to `prev`.
    pub fn compute_id(&self, prev: Option<&EntryId>, sealed: &[u8]) -> EntryId {
        let binding = binding_bytes(prev, sealed);
        EntryId(*blake3::keyed_hash(&self.id_key, &binding).as_bytes())
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(&self.encryption_key)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))
    }
}

impl fmt::Debug for SealedChainCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SealedChainCodec(..)")
    }
}

impl ChainCodec for SealedChainCodec {
    fn seal(&self, payload: &[u8], prev: Option<&EntryId>) -> Result<(EntryId, Bytes)> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce), payload)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        let id = self.compute_id(prev, &sealed);
        Ok((id, Bytes::from(sealed)))
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(CoreError::DecryptionError(format!(
                "sealed payload too short: {} bytes",
                sealed.len()
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        self.cipher()
            .map_err(|e| CoreError::DecryptionError(e.to_string()))?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CoreError::DecryptionError(e.to_string()))
    }

    fn verify_id(&self, entry: &JournalEntry) -> bool {
        self.compute_id(entry.prev.as_ref(), &entry.sealed) == entry.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec() -> SealedChainCodec {
        SealedChainCodec::new(CollectionSecret::from_bytes([0x42; 32]))
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let codec = codec();
        let (_, sealed) = codec.seal(b"hello world", None).unwrap();
        assert_eq!(codec.open(&sealed).unwrap(), b"hello world");
    }

    #[test]
    fn test_id_depends_on_prev() {
        let codec = codec();
        let (_, sealed) = codec.seal(b"payload", None).unwrap();

        let a = codec.compute_id(None, &sealed);
        let b = codec.compute_id(Some(&EntryId::from_bytes([1; 32])), &sealed);
        let c = codec.compute_id(Some(&EntryId::from_bytes([2; 32])), &sealed);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_id_depends_on_secret() {
        let (_, sealed) = codec().seal(b"payload", None).unwrap();
        let other = SealedChainCodec::new(CollectionSecret::from_bytes([0x43; 32]));
        assert_ne!(codec().compute_id(None, &sealed), other.compute_id(None, &sealed));
    }

    #[test]
    fn test_open_rejects_tampering() {
        let codec = codec();
        let (_, sealed) = codec.seal(b"payload", None).unwrap();

        let mut tampered = sealed.to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert!(matches!(
            codec.open(&tampered),
            Err(CoreError::DecryptionError(_))
        ));
        assert!(codec.open(&sealed[..4]).is_err());
    }

    #[test]
    fn test_verify_id() {
        let codec = codec();
        let prev = EntryId::from_bytes([9; 32]);
        let (id, sealed) = codec.seal(b"x", Some(&prev)).unwrap();

        let entry = JournalEntry {
            id,
            prev: Some(prev),
            sealed: sealed.clone(),
        };
        assert!(codec.verify_id(&entry));

        let relinked = JournalEntry {
            id,
            prev: None,
            sealed,
        };
        assert!(!codec.verify_id(&relinked));
    }

    #[test]
    fn test_derived_secrets() {
        let a = CollectionSecret::derive("hunter2", "contacts");
        let b = CollectionSecret::derive("hunter2", "contacts");
        let c = CollectionSecret::derive("hunter2", "calendar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{:?}", a), "CollectionSecret(..)");
    }

    proptest! {
        #[test]
        fn prop_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..512), prev in any::<Option<[u8; 32]>>()) {
            let codec = codec();
            let prev = prev.map(EntryId::from_bytes);
            let (id, sealed) = codec.seal(&payload, prev.as_ref()).unwrap();
            prop_assert_eq!(codec.open(&sealed).unwrap(), payload);
            prop_assert_eq!(codec.compute_id(prev.as_ref(), &sealed), id);
        }
    }
}
