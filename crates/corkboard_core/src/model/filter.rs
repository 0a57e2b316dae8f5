//! Filter domain model and parameter-bag canonicalization.
//!
//! # Responsibility
//! - Keep a filter's parameter bag in canonical form (id lists normalized,
//!   defaults stripped, blanks stripped).
//! - Expose typed readers for the sort index and assignment mode.
//! - Produce the whitelisted projection used for sharing links and form
//!   state.
//!
//! # Invariants
//! - A sanitized bag never contains a key whose value equals that key's
//!   default, and never contains a blank value.
//! - `sanitize` is total and idempotent; malformed input degrades, it never
//!   errors.
//! - Setters store raw values verbatim; canonicalization happens only at the
//!   next `sanitize` call.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Stable identifier for a saved filter.
pub type FilterId = Uuid;

/// Parameter key selecting the sort index.
pub const PARAM_INDEXED_BY: &str = "indexed_by";
/// Parameter key for the assignment-filter mode.
pub const PARAM_ASSIGNMENTS: &str = "assignments";
/// Parameter key scoping to specific buckets.
pub const PARAM_BUCKET_IDS: &str = "bucket_ids";
/// Parameter key scoping to specific assignees.
pub const PARAM_ASSIGNEE_IDS: &str = "assignee_ids";
/// Parameter key scoping to specific tags.
pub const PARAM_TAG_IDS: &str = "tag_ids";
/// Projection-only key carrying a persisted filter's identity.
pub const PARAM_FILTER_ID: &str = "filter_id";

/// Structured id-list keys canonicalized by [`ParamBag::sanitize`].
const ID_LIST_PARAMS: &[&str] = &[PARAM_BUCKET_IDS, PARAM_ASSIGNEE_IDS, PARAM_TAG_IDS];

/// Keys allowed through [`Filter::to_params`]; everything else is dropped.
const KNOWN_PARAMS: &[&str] = &[
    PARAM_INDEXED_BY,
    PARAM_ASSIGNMENTS,
    PARAM_BUCKET_IDS,
    PARAM_ASSIGNEE_IDS,
    PARAM_TAG_IDS,
];

/// Named sort/index selection for card listings.
///
/// The bag stores the raw string permissively; readers parse it through
/// [`SortIndex::parse`] and treat unrecognized values as "unknown index"
/// rather than failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortIndex {
    #[default]
    MostActive,
    MostDiscussed,
    MostBoosted,
    Newest,
    Oldest,
    Popped,
}

impl SortIndex {
    /// Stable string value stored in parameter bags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MostActive => "most_active",
            Self::MostDiscussed => "most_discussed",
            Self::MostBoosted => "most_boosted",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Popped => "popped",
        }
    }

    /// Parses a stored string value; `None` for unrecognized input.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "most_active" => Some(Self::MostActive),
            "most_discussed" => Some(Self::MostDiscussed),
            "most_boosted" => Some(Self::MostBoosted),
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            "popped" => Some(Self::Popped),
            _ => None,
        }
    }
}

/// Assignment-filter mode, stored as a boolean-ish string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Restrict the listing to cards with assignments (`"true"`).
    Enabled,
    /// Restrict the listing to cards without assignments (`"false"`).
    Disabled,
}

impl AssignmentMode {
    /// Stable string value stored in parameter bags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "true",
            Self::Disabled => "false",
        }
    }

    /// Parses a stored string value; `None` for unrecognized input.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "true" => Some(Self::Enabled),
            "false" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Schemaless parameter bag backing a [`Filter`].
///
/// Values are raw JSON so the bag can hold whatever the outer request layer
/// parsed, including junk; [`sanitize`] is the only path to canonical form.
/// A `BTreeMap` keeps key order, and therefore the serialized column value,
/// deterministic.
///
/// [`sanitize`]: ParamBag::sanitize
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamBag(BTreeMap<String, Value>);

impl ParamBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`; `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Canonical id list for `key`, coercing malformed values to empty.
    pub fn get_ids(&self, key: &str) -> Vec<i64> {
        self.0.get(key).map(canonical_id_list).unwrap_or_default()
    }

    /// Stores a raw value verbatim.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Iterates keys in canonical (sorted) order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Brings the bag to canonical form.
    ///
    /// In order: structured id-list keys are rewritten to ascending
    /// deduplicated integer arrays, keys holding their class-wide default are
    /// stripped, and every remaining blank value is stripped. Total over any
    /// JSON shape and idempotent.
    pub fn sanitize(&mut self) {
        self.canonicalize_id_lists();
        self.strip_default_params();
        self.strip_blank_params();
    }

    fn canonicalize_id_lists(&mut self) {
        for key in ID_LIST_PARAMS {
            if let Some(value) = self.0.get_mut(*key) {
                let canonical = canonical_id_list(value);
                *value = Value::from(canonical);
            }
        }
    }

    fn strip_default_params(&mut self) {
        self.0.retain(|key, value| !is_default_param(key, value));
    }

    fn strip_blank_params(&mut self) {
        self.0.retain(|_, value| !is_blank(value));
    }
}

/// A saved or ephemeral set of display parameters for viewing cards.
///
/// `id` is assigned by the repository; only persisted filters expose a
/// `filter_id` in their shareable projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    id: Option<FilterId>,
    /// Owner of a saved filter; `None` for ephemeral ones.
    pub creator_uuid: Option<UserId>,
    params: ParamBag,
}

impl Filter {
    /// Creates an empty, unsaved filter.
    pub fn new() -> Self {
        Self::from_params(ParamBag::new())
    }

    /// Creates an unsaved filter from externally supplied parameters.
    ///
    /// Sanitizes immediately, mirroring the load trigger: a freshly built
    /// filter is always in canonical form.
    pub fn from_params(params: ParamBag) -> Self {
        let mut filter = Self {
            id: None,
            creator_uuid: None,
            params,
        };
        filter.sanitize();
        filter
    }

    /// Rebuilds a persisted filter from storage parts, sanitizing on load.
    pub(crate) fn from_storage(
        id: FilterId,
        creator_uuid: Option<UserId>,
        params: ParamBag,
    ) -> Self {
        let mut filter = Self {
            id: Some(id),
            creator_uuid,
            params,
        };
        filter.sanitize();
        filter
    }

    /// Marks this filter as persisted under `id`.
    pub(crate) fn mark_persisted(&mut self, id: FilterId) {
        self.id = Some(id);
    }

    /// Identity of a persisted filter.
    pub fn id(&self) -> Option<FilterId> {
        self.id
    }

    /// True once the filter has been saved.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Read access to the underlying bag.
    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    /// Brings the parameter bag to canonical form. See [`ParamBag::sanitize`].
    pub fn sanitize(&mut self) {
        self.params.sanitize();
    }

    /// Stores a raw parameter verbatim; sanitized at the next [`sanitize`].
    ///
    /// [`sanitize`]: Filter::sanitize
    pub fn set_param(&mut self, key: impl Into<String>, value: Value) {
        self.params.set(key, value);
    }

    /// Selected sort index.
    ///
    /// `Some(SortIndex::MostActive)` when the key is absent (the class-wide
    /// default), `None` when a stored value is unrecognized.
    pub fn indexed_by(&self) -> Option<SortIndex> {
        match self.params.get(PARAM_INDEXED_BY) {
            None => Some(SortIndex::default()),
            Some(value) => value.as_str().and_then(SortIndex::parse),
        }
    }

    /// True when the filter is indexed by exactly `index`.
    pub fn is_indexed_by(&self, index: SortIndex) -> bool {
        self.indexed_by() == Some(index)
    }

    /// Stores a raw sort-index value verbatim.
    pub fn set_indexed_by(&mut self, value: impl Into<String>) {
        self.params
            .set(PARAM_INDEXED_BY, Value::String(value.into()));
    }

    /// Assignment-filter mode; `None` means no assignment filter.
    pub fn assignments(&self) -> Option<AssignmentMode> {
        self.params
            .get_str(PARAM_ASSIGNMENTS)
            .and_then(AssignmentMode::parse)
    }

    /// Stores a raw assignment-mode value verbatim.
    pub fn set_assignments(&mut self, value: impl Into<String>) {
        self.params
            .set(PARAM_ASSIGNMENTS, Value::String(value.into()));
    }

    /// Canonical bucket id selection.
    pub fn bucket_ids(&self) -> Vec<i64> {
        self.params.get_ids(PARAM_BUCKET_IDS)
    }

    /// Canonical assignee id selection.
    pub fn assignee_ids(&self) -> Vec<i64> {
        self.params.get_ids(PARAM_ASSIGNEE_IDS)
    }

    /// Canonical tag id selection.
    pub fn tag_ids(&self) -> Vec<i64> {
        self.params.get_ids(PARAM_TAG_IDS)
    }

    /// Whitelisted projection of the bag for links and form payloads.
    ///
    /// Contains only recognized keys; unrecognized ones are silently dropped.
    /// Persisted filters additionally carry their identity as `filter_id`.
    /// Absent keys mean "use default" on the consuming side.
    pub fn to_params(&self) -> ParamBag {
        let mut permitted = ParamBag::new();
        for key in KNOWN_PARAMS {
            if let Some(value) = self.params.get(key) {
                permitted.set(*key, value.clone());
            }
        }
        if let Some(id) = self.id {
            permitted.set(PARAM_FILTER_ID, Value::String(id.to_string()));
        }
        permitted
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical ordered-unique-integer form of a structured id-list value.
///
/// Elements that are integral JSON numbers or trimmed numeric strings are
/// kept; everything else is dropped. A non-array value coerces to the empty
/// list instead of raising.
fn canonical_id_list(value: &Value) -> Vec<i64> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let mut ids = BTreeSet::new();
    for item in items {
        if let Some(id) = coerce_id(item) {
            ids.insert(id);
        }
    }
    ids.into_iter().collect()
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn is_default_param(key: &str, value: &Value) -> bool {
    match key {
        PARAM_INDEXED_BY => value.as_str() == Some(SortIndex::MostActive.as_str()),
        _ => false,
    }
}

/// Blankness rules for stripping: JSON null, `false`, empty or
/// whitespace-only strings, empty arrays, empty objects.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(_) => false,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_id_list, is_blank, Filter, SortIndex};
    use serde_json::{json, Value};

    #[test]
    fn canonical_id_list_sorts_dedupes_and_drops_junk() {
        let ids = canonical_id_list(&json!([3, "2", 3, "", "x", 1, null, 2.5]));
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn canonical_id_list_coerces_non_arrays_to_empty() {
        assert!(canonical_id_list(&json!("not a list")).is_empty());
        assert!(canonical_id_list(&json!({"nested": true})).is_empty());
        assert!(canonical_id_list(&Value::Null).is_empty());
    }

    #[test]
    fn blankness_matches_stripping_rules() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!(false)));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!("   ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));

        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(true)));
        assert!(!is_blank(&json!("newest")));
        assert!(!is_blank(&json!([1])));
    }

    #[test]
    fn sort_index_string_table_round_trips() {
        for index in [
            SortIndex::MostActive,
            SortIndex::MostDiscussed,
            SortIndex::MostBoosted,
            SortIndex::Newest,
            SortIndex::Oldest,
            SortIndex::Popped,
        ] {
            assert_eq!(SortIndex::parse(index.as_str()), Some(index));
        }
        assert_eq!(SortIndex::parse("alphabetical"), None);
    }

    #[test]
    fn indexed_by_defaults_when_absent_and_rejects_unknown() {
        let filter = Filter::new();
        assert_eq!(filter.indexed_by(), Some(SortIndex::MostActive));

        let mut filter = Filter::new();
        filter.set_indexed_by("alphabetical");
        assert_eq!(filter.indexed_by(), None);
        assert!(!filter.is_indexed_by(SortIndex::MostActive));
    }
}
