//! Core domain logic for Corkboard.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::collection::{BubbleId, Collection, CollectionId};
pub use model::filter::{AssignmentMode, Filter, FilterId, ParamBag, SortIndex};
pub use model::publication::{Publication, PublicationKey};
pub use model::user::{Role, User, UserId};
pub use repo::collection_repo::{
    CollectionListQuery, CollectionRepository, SqliteCollectionRepository,
};
pub use repo::filter_repo::{FilterRepository, SqliteFilterRepository};
pub use repo::publication_repo::{
    InsertPublication, PublicationRepository, SqlitePublicationRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::filters::FilterService;
pub use service::publishing::{
    PublishOutcome, PublishingError, PublishingResult, PublishingService, UnpublishOutcome,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
