//! Service layer: remote calls plus their audit trail.
//!
//! Every public operation here performs one logical remote call (enrichment
//! fan-out allowed) and appends exactly one [`ActivityItem`] before
//! returning, on the success and failure paths alike. There are no retries
//! and no local timeouts; a failed call is recorded and surfaced immediately.

use crate::activity::{ActivityLedger, ResourceType};
use crate::config::PluginConfig;
use crate::error::{PluginError, Result};
use linear_client::{
    ClientError, Comment, CommentInput, Issue, IssueInput, IssueRelations, IssueTracker,
    IssueUpdate, Label, LinearClient, Project, SearchFilters, Team, User, WorkflowState,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// One running tracker integration: remote client, audit ledger, settings.
///
/// Constructed once per process and shared by reference across operation
/// handlers; there is no ambient static state.
pub struct LinearService {
    tracker: Arc<dyn IssueTracker>,
    ledger: ActivityLedger,
    config: PluginConfig,
}

impl LinearService {
    /// Connect to the tracker and validate the credential.
    ///
    /// The `viewer` probe makes a bad credential fail construction here
    /// rather than on the first user request.
    pub async fn connect(config: PluginConfig) -> Result<Self> {
        let client = LinearClient::new(&config.api_key)?;
        let service = Self::with_tracker(config, Arc::new(client));

        service.tracker.viewer().await?;
        Ok(service)
    }

    /// Assemble a service over an existing tracker, skipping validation.
    pub fn with_tracker(config: PluginConfig, tracker: Arc<dyn IssueTracker>) -> Self {
        Self {
            tracker,
            ledger: ActivityLedger::new(),
            config,
        }
    }

    /// The audit ledger.
    pub fn ledger(&self) -> &ActivityLedger {
        &self.ledger
    }

    /// The resolved configuration.
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Create an issue.
    pub async fn create_issue(&self, input: &IssueInput) -> Result<Issue> {
        match self.tracker.create_issue(input).await {
            Ok(issue) => {
                self.ledger.record(
                    "create_issue",
                    ResourceType::Issue,
                    issue.id.clone(),
                    details(json!({
                        "identifier": issue.identifier,
                        "title": issue.title,
                        "teamId": input.team_id,
                    })),
                    true,
                    None,
                );
                Ok(issue)
            }
            Err(err) => Err(self.fail(
                "create_issue",
                ResourceType::Issue,
                "new",
                details(json!({ "title": input.title })),
                err,
            )),
        }
    }

    /// Fetch one issue with its related records. `Ok(None)` when the id does
    /// not exist — a non-fatal outcome, recorded as a successful lookup.
    pub async fn get_issue(&self, id: &str) -> Result<Option<(Issue, IssueRelations)>> {
        // Both queries accept the same id, so the enrichment runs alongside
        // the primary fetch.
        let (issue, relations) =
            tokio::join!(self.tracker.issue(id), self.tracker.issue_relations(id));

        match issue {
            Ok(Some(issue)) => {
                let relations = match relations {
                    Ok(relations) => relations,
                    Err(ClientError::NotFound(_)) => IssueRelations::default(),
                    Err(err) => {
                        return Err(self.fail(
                            "get_issue",
                            ResourceType::Issue,
                            issue.id.clone(),
                            Map::new(),
                            err,
                        ))
                    }
                };

                self.ledger.record(
                    "get_issue",
                    ResourceType::Issue,
                    issue.id.clone(),
                    details(json!({ "identifier": issue.identifier })),
                    true,
                    None,
                );
                Ok(Some((issue, relations)))
            }
            Ok(None) => {
                self.ledger.record(
                    "get_issue",
                    ResourceType::Issue,
                    id,
                    details(json!({ "found": false })),
                    true,
                    None,
                );
                Ok(None)
            }
            Err(err) => Err(self.fail("get_issue", ResourceType::Issue, id, Map::new(), err)),
        }
    }

    /// Apply a partial update.
    pub async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<Issue> {
        match self.tracker.update_issue(id, update).await {
            Ok(issue) => {
                self.ledger.record(
                    "update_issue",
                    ResourceType::Issue,
                    issue.id.clone(),
                    details(json!({ "identifier": issue.identifier })),
                    true,
                    None,
                );
                Ok(issue)
            }
            Err(err) => Err(self.fail("update_issue", ResourceType::Issue, id, Map::new(), err)),
        }
    }

    /// Archive an issue addressed by id or identifier. The tracker never
    /// deletes; this transitions the issue to its archived state and the
    /// local contract is "mark archived", not "erase". `Ok(None)` when the
    /// reference does not exist.
    pub async fn archive_issue(&self, id_ref: &str) -> Result<Option<Issue>> {
        // Pre-fetch so the ledger records the issue's stable id rather than
        // whatever token the user typed.
        let issue = match self.tracker.issue(id_ref).await {
            Ok(Some(issue)) => issue,
            Ok(None) => {
                self.ledger.record(
                    "archive_issue",
                    ResourceType::Issue,
                    id_ref,
                    details(json!({ "found": false })),
                    true,
                    None,
                );
                return Ok(None);
            }
            Err(err) => {
                return Err(self.fail("archive_issue", ResourceType::Issue, id_ref, Map::new(), err))
            }
        };

        match self.tracker.archive_issue(&issue.id).await {
            Ok(archived) => {
                self.ledger.record(
                    "archive_issue",
                    ResourceType::Issue,
                    issue.id.clone(),
                    details(json!({
                        "identifier": issue.identifier,
                        "archived": archived,
                    })),
                    true,
                    None,
                );
                Ok(Some(issue))
            }
            Err(err) => Err(self.fail(
                "archive_issue",
                ResourceType::Issue,
                issue.id.clone(),
                Map::new(),
                err,
            )),
        }
    }

    /// Search issues.
    pub async fn search_issues(&self, filters: &SearchFilters) -> Result<Vec<Issue>> {
        match self.tracker.search_issues(filters).await {
            Ok(issues) => {
                self.ledger.record(
                    "search_issues",
                    ResourceType::Issue,
                    "search",
                    details(json!({
                        "filters": serde_json::to_value(filters).unwrap_or(Value::Null),
                        "count": issues.len(),
                    })),
                    true,
                    None,
                );
                Ok(issues)
            }
            Err(err) => Err(self.fail(
                "search_issues",
                ResourceType::Issue,
                "search",
                Map::new(),
                err,
            )),
        }
    }

    /// Add a comment to an issue addressed by id or identifier. `Ok(None)`
    /// when the reference does not exist.
    pub async fn create_comment(
        &self,
        issue_ref: &str,
        body: &str,
    ) -> Result<Option<(Issue, Comment)>> {
        let issue = match self.tracker.issue(issue_ref).await {
            Ok(Some(issue)) => issue,
            Ok(None) => {
                self.ledger.record(
                    "create_comment",
                    ResourceType::Comment,
                    issue_ref,
                    details(json!({ "found": false })),
                    true,
                    None,
                );
                return Ok(None);
            }
            Err(err) => {
                return Err(self.fail(
                    "create_comment",
                    ResourceType::Comment,
                    issue_ref,
                    Map::new(),
                    err,
                ))
            }
        };

        let input = CommentInput {
            issue_id: issue.id.clone(),
            body: body.to_string(),
        };

        match self.tracker.create_comment(&input).await {
            Ok(comment) => {
                self.ledger.record(
                    "create_comment",
                    ResourceType::Comment,
                    comment.id.clone(),
                    details(json!({
                        "issueId": issue.id,
                        "identifier": issue.identifier,
                    })),
                    true,
                    None,
                );
                Ok(Some((issue, comment)))
            }
            Err(err) => Err(self.fail(
                "create_comment",
                ResourceType::Comment,
                issue.id.clone(),
                Map::new(),
                err,
            )),
        }
    }

    /// List teams.
    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        match self.tracker.teams().await {
            Ok(teams) => {
                self.ledger.record(
                    "list_teams",
                    ResourceType::Team,
                    "all",
                    details(json!({ "count": teams.len() })),
                    true,
                    None,
                );
                Ok(teams)
            }
            Err(err) => Err(self.fail("list_teams", ResourceType::Team, "all", Map::new(), err)),
        }
    }

    /// List projects.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        match self.tracker.projects().await {
            Ok(projects) => {
                self.ledger.record(
                    "list_projects",
                    ResourceType::Project,
                    "all",
                    details(json!({ "count": projects.len() })),
                    true,
                    None,
                );
                Ok(projects)
            }
            Err(err) => Err(self.fail(
                "list_projects",
                ResourceType::Project,
                "all",
                Map::new(),
                err,
            )),
        }
    }

    /// List workspace users.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        match self.tracker.users().await {
            Ok(users) => {
                self.ledger.record(
                    "list_users",
                    ResourceType::User,
                    "all",
                    details(json!({ "count": users.len() })),
                    true,
                    None,
                );
                Ok(users)
            }
            Err(err) => Err(self.fail("list_users", ResourceType::User, "all", Map::new(), err)),
        }
    }

    /// List issue labels.
    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        match self.tracker.labels().await {
            Ok(labels) => {
                self.ledger.record(
                    "list_labels",
                    ResourceType::Label,
                    "all",
                    details(json!({ "count": labels.len() })),
                    true,
                    None,
                );
                Ok(labels)
            }
            Err(err) => Err(self.fail("list_labels", ResourceType::Label, "all", Map::new(), err)),
        }
    }

    /// List workflow states, optionally for one team.
    pub async fn list_workflow_states(&self, team_id: Option<&str>) -> Result<Vec<WorkflowState>> {
        match self.tracker.workflow_states(team_id).await {
            Ok(states) => {
                self.ledger.record(
                    "list_workflow_states",
                    ResourceType::Team,
                    team_id.unwrap_or("all"),
                    details(json!({ "count": states.len() })),
                    true,
                    None,
                );
                Ok(states)
            }
            Err(err) => Err(self.fail(
                "list_workflow_states",
                ResourceType::Team,
                team_id.unwrap_or("all"),
                Map::new(),
                err,
            )),
        }
    }

    /// Resolve a team key or name to the team record. Part of other
    /// operations' enrichment, so not separately recorded.
    pub async fn resolve_team(&self, key_or_name: &str) -> Result<Option<Team>> {
        if let Some(team) = self.tracker.team_by_key(key_or_name).await? {
            return Ok(Some(team));
        }

        let teams = self.tracker.teams().await?;
        Ok(teams
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(key_or_name)))
    }

    /// Resolve a person's name to a user record (enrichment, not recorded).
    pub async fn resolve_user(&self, name: &str) -> Result<Option<User>> {
        let users = self.tracker.users().await?;
        Ok(users.into_iter().find(|u| {
            u.name.eq_ignore_ascii_case(name)
                || u.display_name
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(name))
        }))
    }

    /// Resolve label names to label records, dropping unknown names
    /// (enrichment, not recorded).
    pub async fn resolve_labels(&self, names: &[String]) -> Result<Vec<Label>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let labels = self.tracker.labels().await?;
        Ok(labels
            .into_iter()
            .filter(|l| names.iter().any(|n| l.name.eq_ignore_ascii_case(n)))
            .collect())
    }

    /// Resolve a workflow state name (enrichment, not recorded).
    pub async fn resolve_state(
        &self,
        name: &str,
        team_id: Option<&str>,
    ) -> Result<Option<WorkflowState>> {
        let states = self.tracker.workflow_states(team_id).await?;
        Ok(states
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(name)))
    }

    /// Record a failed call and convert the error.
    fn fail(
        &self,
        action: &str,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
        details: Map<String, Value>,
        err: ClientError,
    ) -> PluginError {
        self.ledger.record(
            action,
            resource_type,
            resource_id,
            details,
            false,
            Some(err.to_string()),
        );
        err.into()
    }
}

fn details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
