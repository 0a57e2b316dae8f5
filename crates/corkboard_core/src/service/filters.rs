//! Saved-filter use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for creating, updating, and sharing saved
//!   filters.
//! - Delegate persistence (and the sanitize trigger points) to the filter
//!   repository.
//!
//! # Invariants
//! - Every filter returned by this service is in canonical form.
//! - Service APIs never bypass repository sanitize-on-write contracts.

use crate::model::filter::{Filter, FilterId, ParamBag};
use crate::model::user::UserId;
use crate::repo::filter_repo::FilterRepository;
use crate::repo::{RepoError, RepoResult};

/// Use-case service wrapper for saved-filter operations.
pub struct FilterService<R: FilterRepository> {
    repo: R,
}

impl<R: FilterRepository> FilterService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves a new filter owned by `creator_uuid` from raw request parameters.
    ///
    /// The bag is sanitized on construction and again by the repository on
    /// write, so junk input degrades instead of erroring.
    pub fn create_from_params(
        &self,
        creator_uuid: UserId,
        params: ParamBag,
    ) -> RepoResult<Filter> {
        let mut filter = Filter::from_params(params);
        filter.creator_uuid = Some(creator_uuid);
        self.repo.create_filter(&filter)
    }

    /// Persists an unsaved filter as-is.
    pub fn create_filter(&self, filter: &Filter) -> RepoResult<Filter> {
        self.repo.create_filter(filter)
    }

    /// Replaces a persisted filter's parameters wholesale.
    ///
    /// Returns repository-level not-found errors unchanged.
    pub fn update_params(&self, id: FilterId, params: ParamBag) -> RepoResult<Filter> {
        let existing = self.repo.get_filter(id)?.ok_or(RepoError::NotFound(id))?;
        let updated = Filter::from_storage(id, existing.creator_uuid, params);
        self.repo.update_filter(&updated)
    }

    /// Gets one saved filter by id.
    pub fn get_filter(&self, id: FilterId) -> RepoResult<Option<Filter>> {
        self.repo.get_filter(id)
    }

    /// Lists one creator's saved filters.
    pub fn list_filters_by_creator(&self, creator_uuid: UserId) -> RepoResult<Vec<Filter>> {
        self.repo.list_filters_by_creator(creator_uuid)
    }

    /// Deletes a saved filter by id.
    pub fn delete_filter(&self, id: FilterId) -> RepoResult<()> {
        self.repo.delete_filter(id)
    }

    /// Shareable projection of a saved filter's parameters.
    ///
    /// The projection is whitelisted and carries the filter's identity as
    /// `filter_id`; see [`Filter::to_params`].
    pub fn share_params(&self, id: FilterId) -> RepoResult<Option<ParamBag>> {
        Ok(self.repo.get_filter(id)?.map(|filter| filter.to_params()))
    }
}
