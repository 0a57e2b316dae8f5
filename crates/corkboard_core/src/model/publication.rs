//! Publication domain model and public lookup key generation.
//!
//! # Responsibility
//! - Represent the public, shareable state of a collection.
//! - Generate and validate the opaque URL-safe lookup key.
//!
//! # Invariants
//! - A publication's key is generated exactly once, at creation, and is never
//!   regenerated or rewritten for the same publication.
//! - Keys are 24 characters from the base58 alphabet (no `0`, `O`, `I`, `l`),
//!   which is ~140 bits of entropy per key.

use crate::model::collection::CollectionId;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Characters usable in public lookup keys.
///
/// Base58: ambiguous glyphs (`0`/`O`, `I`/`l`) are excluded so keys survive
/// being read aloud or retyped from a printout.
const KEY_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Length of every generated key, in characters.
pub const KEY_LENGTH: usize = 24;

static KEY_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[1-9A-HJ-NP-Za-km-z]{24}\z").expect("valid key shape regex"));

/// Opaque public lookup key for a published collection.
///
/// Treated as an opaque URL path segment by all callers; the only structure
/// the core relies on is the alphabet and length checked by [`parse`].
///
/// [`parse`]: PublicationKey::parse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationKey(String);

impl PublicationKey {
    /// Generates a fresh random key from the process CSPRNG.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let key = (0..KEY_LENGTH)
            .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect();
        Self(key)
    }

    /// Parses an externally supplied candidate key.
    ///
    /// Returns `None` for anything that is not exactly [`KEY_LENGTH`]
    /// characters of the key alphabet. Lookups for such candidates can be
    /// answered as unknown without touching storage.
    pub fn parse(candidate: &str) -> Option<Self> {
        if KEY_SHAPE_RE.is_match(candidate) {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    /// Key text, suitable for a URL path segment.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PublicationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public, shareable state of one collection.
///
/// Exists iff the collection is published. Never updated in place: publishing
/// creates it, unpublishing deletes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    collection_uuid: CollectionId,
    key: PublicationKey,
}

impl Publication {
    /// Creates an unsaved publication for `collection_uuid` with a freshly
    /// generated key.
    pub fn new(collection_uuid: CollectionId) -> Self {
        Self {
            collection_uuid,
            key: PublicationKey::generate(),
        }
    }

    /// Rebuilds a publication from persisted parts.
    pub(crate) fn from_parts(collection_uuid: CollectionId, key: PublicationKey) -> Self {
        Self {
            collection_uuid,
            key,
        }
    }

    /// Owning collection.
    pub fn collection_uuid(&self) -> CollectionId {
        self.collection_uuid
    }

    /// Public lookup key.
    pub fn key(&self) -> &PublicationKey {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::{PublicationKey, KEY_LENGTH};

    #[test]
    fn generated_keys_have_expected_shape() {
        for _ in 0..64 {
            let key = PublicationKey::generate();
            assert_eq!(key.as_str().chars().count(), KEY_LENGTH);
            assert!(
                PublicationKey::parse(key.as_str()).is_some(),
                "generated key `{key}` should round-trip through parse"
            );
        }
    }

    #[test]
    fn generated_keys_avoid_ambiguous_characters() {
        for _ in 0..64 {
            let key = PublicationKey::generate();
            assert!(
                !key.as_str().contains(['0', 'O', 'I', 'l']),
                "key `{key}` contains an ambiguous character"
            );
        }
    }

    #[test]
    fn parse_rejects_malformed_candidates() {
        assert!(PublicationKey::parse("").is_none());
        assert!(PublicationKey::parse("invalid").is_none());
        assert!(PublicationKey::parse("too-short").is_none());
        assert!(PublicationKey::parse(&"x".repeat(KEY_LENGTH + 1)).is_none());
        // Right length, wrong alphabet.
        assert!(PublicationKey::parse(&"0".repeat(KEY_LENGTH)).is_none());
        // Embedded newline must not sneak past the anchors.
        assert!(PublicationKey::parse("1111111111111111111111\n1").is_none());
    }

    #[test]
    fn parse_accepts_generated_text() {
        let key = PublicationKey::generate();
        let reparsed = PublicationKey::parse(key.as_str()).unwrap();
        assert_eq!(reparsed, key);
    }
}
