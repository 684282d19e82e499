//! The `IssueTracker` trait: one async method per logical tracker operation.

use crate::error::Result;
use crate::types::{
    Comment, CommentInput, Issue, IssueInput, IssueRelations, IssueUpdate, Label, Project,
    SearchFilters, Team, User, WorkflowState,
};
use async_trait::async_trait;

/// Remote issue-tracker operations.
///
/// Each method is one stateless request/response exchange; there are no
/// retries and no local timeout beyond the transport default. A failed call
/// surfaces immediately as a [`crate::ClientError`].
///
/// Lookups that can legitimately miss return `Ok(None)` rather than an error,
/// so callers can distinguish "does not exist" from "the call failed".
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// The user the credential authenticates as. Also serves as the startup
    /// credential check.
    async fn viewer(&self) -> Result<User>;

    /// All teams visible to the credential.
    async fn teams(&self) -> Result<Vec<Team>>;

    /// Look up a team by its short key (e.g. "ENG").
    async fn team_by_key(&self, key: &str) -> Result<Option<Team>>;

    /// Fetch one issue by id or human identifier ("ENG-123").
    async fn issue(&self, id: &str) -> Result<Option<Issue>>;

    /// Related records for one issue (team, assignee, labels), resolved in a
    /// single explicit round trip.
    async fn issue_relations(&self, issue_id: &str) -> Result<IssueRelations>;

    /// Search issues matching the given filters.
    async fn search_issues(&self, filters: &SearchFilters) -> Result<Vec<Issue>>;

    /// Create an issue.
    async fn create_issue(&self, input: &IssueInput) -> Result<Issue>;

    /// Apply a partial update to an issue.
    async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<Issue>;

    /// Archive an issue. The tracker has no physical deletion; this is a
    /// state transition and the issue remains retrievable.
    async fn archive_issue(&self, id: &str) -> Result<bool>;

    /// Add a comment to an issue.
    async fn create_comment(&self, input: &CommentInput) -> Result<Comment>;

    /// All projects visible to the credential.
    async fn projects(&self) -> Result<Vec<Project>>;

    /// All users in the workspace.
    async fn users(&self) -> Result<Vec<User>>;

    /// All issue labels.
    async fn labels(&self) -> Result<Vec<Label>>;

    /// Workflow states, optionally restricted to one team.
    async fn workflow_states(&self, team_id: Option<&str>) -> Result<Vec<WorkflowState>>;
}
