//! Collection publishing use-case service.
//!
//! # Responsibility
//! - Drive the publication lifecycle: publish, unpublish, published checks,
//!   public-key resolution.
//! - Translate raw lookup keys into domain outcomes without leaking storage
//!   details.
//!
//! # Invariants
//! - `publish` and `unpublish` are idempotent; repeated calls report typed
//!   outcomes, never errors.
//! - A key, once minted for a collection, is never replaced while the
//!   publication lives.
//! - Malformed lookup keys never reach storage.

use crate::model::collection::{Collection, CollectionId};
use crate::model::publication::{Publication, PublicationKey};
use crate::repo::collection_repo::CollectionRepository;
use crate::repo::publication_repo::{InsertPublication, PublicationRepository};
use crate::repo::RepoError;
use log::{debug, info};
use std::error::Error;
use std::fmt;

/// Convenience alias for publishing-service results.
pub type PublishingResult<T> = Result<T, PublishingError>;

/// Errors surfaced by the publishing service.
#[derive(Debug)]
pub enum PublishingError {
    /// No live publication matches the supplied lookup key.
    ///
    /// Covers malformed keys, never-issued keys, and keys whose publication
    /// has since been destroyed; callers cannot tell these apart.
    UnknownKey,
    /// Persistence failure beneath the lifecycle.
    Repo(RepoError),
}

impl fmt::Display for PublishingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey => write!(f, "no published collection matches the supplied key"),
            Self::Repo(err) => write!(f, "repository error: {err}"),
        }
    }
}

impl Error for PublishingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownKey => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for PublishingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Outcome of an idempotent [`PublishingService::publish`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The collection was not published before; a publication was created.
    Created(Publication),
    /// The collection was already published; the existing record is returned
    /// with its key untouched.
    AlreadyPublished(Publication),
}

impl PublishOutcome {
    /// The live publication, whichever way the call went.
    pub fn publication(&self) -> &Publication {
        match self {
            Self::Created(publication) | Self::AlreadyPublished(publication) => publication,
        }
    }

    /// True when this call created the publication.
    pub fn newly_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Outcome of an idempotent [`PublishingService::unpublish`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpublishOutcome {
    /// A live publication existed and was destroyed.
    Unpublished,
    /// The collection was not published; nothing changed.
    NotPublished,
}

/// Use-case service wrapper for the publication lifecycle.
pub struct PublishingService<P: PublicationRepository, C: CollectionRepository> {
    publications: P,
    collections: C,
}

impl<P: PublicationRepository, C: CollectionRepository> PublishingService<P, C> {
    /// Creates a service using the provided repository implementations.
    pub fn new(publications: P, collections: C) -> Self {
        Self {
            publications,
            collections,
        }
    }

    /// Ensures `collection_uuid` is published.
    ///
    /// # Contract
    /// - Not published: creates a publication with a freshly generated key.
    /// - Already published: returns the existing record, key untouched.
    /// - Concurrent publishes converge on one record; the race loser receives
    ///   `AlreadyPublished` with the winner's row.
    /// - Unknown collection: `PublishingError::Repo(RepoError::NotFound)`.
    pub fn publish(&self, collection_uuid: CollectionId) -> PublishingResult<PublishOutcome> {
        let outcome = match self.publications.insert_publication(collection_uuid)? {
            InsertPublication::Created(publication) => PublishOutcome::Created(publication),
            InsertPublication::AlreadyPublished(publication) => {
                PublishOutcome::AlreadyPublished(publication)
            }
        };
        info!(
            "event=collection_publish module=publishing status={} collection={collection_uuid}",
            if outcome.newly_created() {
                "created"
            } else {
                "already_published"
            }
        );
        Ok(outcome)
    }

    /// Destroys `collection_uuid`'s publication if one exists.
    ///
    /// Its key stops resolving immediately and is never reused for this or
    /// any other collection.
    pub fn unpublish(&self, collection_uuid: CollectionId) -> PublishingResult<UnpublishOutcome> {
        let removed = self.publications.delete_by_collection(collection_uuid)?;
        let outcome = if removed {
            UnpublishOutcome::Unpublished
        } else {
            UnpublishOutcome::NotPublished
        };
        info!(
            "event=collection_unpublish module=publishing status={} collection={collection_uuid}",
            if removed { "unpublished" } else { "not_published" }
        );
        Ok(outcome)
    }

    /// Live persisted truth of the published state; no caching.
    pub fn is_published(&self, collection_uuid: CollectionId) -> PublishingResult<bool> {
        Ok(self
            .publications
            .find_by_collection(collection_uuid)?
            .is_some())
    }

    /// Gets the live publication record for `collection_uuid`, if any.
    pub fn publication(&self, collection_uuid: CollectionId) -> PublishingResult<Option<Publication>> {
        Ok(self.publications.find_by_collection(collection_uuid)?)
    }

    /// Resolves a raw lookup key to the collection it publishes.
    ///
    /// # Contract
    /// - Malformed keys (wrong length or alphabet) short-circuit to
    ///   [`PublishingError::UnknownKey`] without touching storage.
    /// - Well-formed keys with no live publication, including keys of
    ///   since-unpublished collections, return the same `UnknownKey`.
    pub fn find_by_published_key(&self, raw_key: &str) -> PublishingResult<Collection> {
        let Some(key) = PublicationKey::parse(raw_key) else {
            debug!("event=published_key_lookup module=publishing status=miss reason=malformed");
            return Err(PublishingError::UnknownKey);
        };
        match self.collections.find_by_published_key(&key)? {
            Some(collection) => {
                debug!(
                    "event=published_key_lookup module=publishing status=hit collection={}",
                    collection.uuid
                );
                Ok(collection)
            }
            None => {
                debug!("event=published_key_lookup module=publishing status=miss reason=unknown");
                Err(PublishingError::UnknownKey)
            }
        }
    }
}
