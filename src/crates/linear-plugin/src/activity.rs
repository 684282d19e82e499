//! Bounded in-memory audit trail of remote operations.
//!
//! Every remote call the service makes appends exactly one [`ActivityItem`],
//! on the success and failure paths alike. The ledger is append-only with
//! FIFO eviction past its fixed capacity; entries are immutable after
//! insertion and the only bulk operation is [`ActivityLedger::clear`].
//! Nothing is persisted — ledger state dies with the service instance.

use chrono::Utc;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// Maximum number of retained entries.
pub const LEDGER_CAPACITY: usize = 1000;

/// Default result count for [`ActivityLedger::query`].
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// The kind of remote resource an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Issue,
    Project,
    Comment,
    Label,
    User,
    Team,
}

impl ResourceType {
    /// Stable string form used in filters and reply text.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Issue => "issue",
            ResourceType::Project => "project",
            ResourceType::Comment => "comment",
            ResourceType::Label => "label",
            ResourceType::User => "user",
            ResourceType::Team => "team",
        }
    }

    /// Inverse of [`ResourceType::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "issue" => Some(ResourceType::Issue),
            "project" => Some(ResourceType::Project),
            "comment" => Some(ResourceType::Comment),
            "label" => Some(ResourceType::Label),
            "user" => Some(ResourceType::User),
            "team" => Some(ResourceType::Team),
            _ => None,
        }
    }
}

/// One record per attempted remote operation. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityItem {
    /// Process-unique token: millisecond timestamp plus a random suffix.
    pub id: String,

    /// Creation instant as an RFC 3339 string.
    pub timestamp: String,

    /// Short verb tag, e.g. "create_issue".
    pub action: String,

    /// Resource kind the operation addressed.
    pub resource_type: ResourceType,

    /// Identifier of the affected resource, or a sentinel such as
    /// "all"/"new"/"search" when no concrete id exists yet.
    pub resource_id: String,

    /// Free-form operation context (titles, filter criteria, counts).
    pub details: Map<String, Value>,

    /// Whether the remote call succeeded.
    pub success: bool,

    /// Failure message, present only when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Equality-only query filter; set keys are ANDed together.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub action: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub resource_id: Option<String>,
    pub success: Option<bool>,
}

impl ActivityFilter {
    fn matches(&self, item: &ActivityItem) -> bool {
        if let Some(action) = &self.action {
            if &item.action != action {
                return false;
            }
        }
        if let Some(resource_type) = self.resource_type {
            if item.resource_type != resource_type {
                return false;
            }
        }
        if let Some(resource_id) = &self.resource_id {
            if &item.resource_id != resource_id {
                return false;
            }
        }
        if let Some(success) = self.success {
            if item.success != success {
                return false;
            }
        }
        true
    }
}

/// Append-only, size-bounded activity log.
///
/// Appends never await and hold the lock only for the push itself, so
/// concurrent operation handlers cannot interleave partial records.
#[derive(Debug, Default)]
pub struct ActivityLedger {
    items: Mutex<VecDeque<ActivityItem>>,
}

impl ActivityLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record. Infallible; evicts the oldest entries when the
    /// ledger would exceed [`LEDGER_CAPACITY`].
    pub fn record(
        &self,
        action: impl Into<String>,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
        details: Map<String, Value>,
        success: bool,
        error: Option<String>,
    ) -> ActivityItem {
        let item = ActivityItem {
            id: generate_entry_id(),
            timestamp: Utc::now().to_rfc3339(),
            action: action.into(),
            resource_type,
            resource_id: resource_id.into(),
            details,
            success,
            error,
        };

        tracing::debug!(
            action = %item.action,
            resource_type = item.resource_type.as_str(),
            resource_id = %item.resource_id,
            success = item.success,
            "Recorded activity"
        );

        let mut items = self.items.lock();
        items.push_back(item.clone());
        while items.len() > LEDGER_CAPACITY {
            items.pop_front();
        }

        item
    }

    /// Return up to `limit` (default 100) most-recently-inserted items in
    /// insertion order, most recent last, optionally restricted by `filter`.
    pub fn query(&self, limit: Option<usize>, filter: Option<&ActivityFilter>) -> Vec<ActivityItem> {
        let limit = limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        let items = self.items.lock();

        let matching: Vec<ActivityItem> = items
            .iter()
            .filter(|item| filter.map_or(true, |f| f.matches(item)))
            .cloned()
            .collect();

        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).collect()
    }

    /// Discard all items.
    pub fn clear(&self) {
        self.items.lock().clear();
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True when the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

fn generate_entry_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}
