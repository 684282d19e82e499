//! Data model for the tracker API.
//!
//! Wire types use the API's camelCase field names; inputs skip unset fields
//! so partial updates only send what the caller touched.

use serde::{Deserialize, Serialize};

/// A team owning issues and workflow states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: String,
    /// Short key used in issue identifiers, e.g. "ENG" in "ENG-123".
    pub key: String,
    pub name: String,
}

/// A tracker user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A project grouping issues across teams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// An issue label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A workflow state an issue can occupy (e.g. "Todo", "In Progress").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub id: String,
    pub name: String,
    /// State category: "triage", "backlog", "unstarted", "started",
    /// "completed", or "canceled".
    #[serde(rename = "type")]
    pub state_type: String,
}

/// A comment on an issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub body: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// An issue's scalar fields plus the state selected alongside searches.
///
/// Heavier relations (team, assignee, labels) are fetched separately through
/// [`crate::IssueTracker::issue_relations`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    /// Human-facing identifier, e.g. "ENG-123".
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Priority 0-4: 0 none, 1 urgent, 2 high, 3 normal, 4 low.
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub state: Option<WorkflowState>,
}

/// Related records for one issue, resolved in a single enrichment round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IssueRelations {
    pub team: Option<Team>,
    pub assignee: Option<User>,
    pub labels: Vec<Label>,
}

/// Payload for creating an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInput {
    pub title: String,
    pub team_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl IssueInput {
    /// Create a minimal input with title and owning team.
    pub fn new(title: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            team_id: team_id.into(),
            description: None,
            assignee_id: None,
            label_ids: None,
            project_id: None,
            state_id: None,
            estimate: None,
            due_date: None,
            priority: None,
        }
    }
}

/// Payload for updating an issue; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl IssueUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| v.as_object().map(|o| o.is_empty()).unwrap_or(true))
            .unwrap_or(true)
    }
}

/// Payload for creating a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    pub issue_id: String,
    pub body: String,
}

/// One search query against the issue collection.
///
/// Constructed fresh per request and consumed by
/// [`crate::IssueTracker::search_issues`]; never shared across requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchFilters {
    /// Free-text match against issue titles.
    pub query: Option<String>,
    /// Workflow state names, matched by name.
    pub states: Vec<String>,
    /// Assignee display names or ids.
    pub assignees: Vec<String>,
    /// Label names.
    pub labels: Vec<String>,
    /// Priority levels 0-4.
    pub priorities: Vec<u8>,
    /// Restrict to one team.
    pub team_id: Option<String>,
    /// Restrict to one project.
    pub project_id: Option<String>,
    /// Result count cap.
    pub limit: Option<usize>,
    /// Order newest-first by creation time.
    pub newest_first: bool,
}

impl SearchFilters {
    /// True when no criterion is set (limit and ordering are not criteria).
    pub fn is_unconstrained(&self) -> bool {
        self.query.is_none()
            && self.states.is_empty()
            && self.assignees.is_empty()
            && self.labels.is_empty()
            && self.priorities.is_empty()
            && self.team_id.is_none()
            && self.project_id.is_none()
    }
}
