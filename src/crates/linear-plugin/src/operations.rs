//! Named operations exposed to the hosting agent runtime.
//!
//! Other components address these by stable string name and always get back
//! the same result shape. Every outcome — success, not-found, ambiguous, or
//! failed — carries human-readable reply text; a request is never left
//! without a textual response. Remote failures are converted into failure
//! results here rather than propagated to the host.

use crate::activity::{ActivityFilter, ResourceType};
use crate::config::{PluginConfig, SettingsProvider};
use crate::error::Result;
use crate::interpreter::{Candidate, Interpretation, Interpreter, Resolution};
use crate::service::LinearService;
use completion::CompletionModel;
use linear_client::{Issue, IssueInput, IssueRelations, IssueUpdate, SearchFilters};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Stable operation names, in the order they are usually listed.
pub const OPERATION_NAMES: &[&str] = &[
    "create-issue",
    "get-issue",
    "update-issue",
    "delete-issue",
    "search-issues",
    "create-comment",
    "list-teams",
    "list-projects",
    "get-activity",
    "clear-activity",
];

/// Default priority for created issues: 3 (Normal).
pub const DEFAULT_CREATE_PRIORITY: u8 = 3;

const CLARIFY_TEXT: &str = "I couldn't identify which issue you mean. Please include the issue \
     identifier (for example ENG-123) or describe it in more detail.";

/// One inbound request: the user's message plus optional structured options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationRequest {
    /// Free-form user text.
    #[serde(default)]
    pub message: String,

    /// Operation-specific options bag.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl OperationRequest {
    /// Build a request from just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            options: Map::new(),
        }
    }

    /// Attach one option.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Uniform result shape returned to the runtime.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    /// Successful outcome with reply text only.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            data: None,
            error: None,
        }
    }

    /// Successful outcome with reply text and structured data.
    pub fn ok_with_data(text: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            data: Some(data),
            error: None,
        }
    }

    /// Failed outcome. The message doubles as reply text so the user still
    /// gets an answer.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            text: Some(message.clone()),
            data: None,
            error: Some(message),
        }
    }
}

/// Callback channel for emitting reply text back to the requester.
pub trait Responder: Send + Sync {
    fn respond(&self, text: &str);
}

/// Outcome of turning a message into one concrete issue id.
enum TargetOutcome {
    /// Proceed with this id (or identifier).
    Id(String),
    /// Stop and return this result (ambiguous, not found, clarify, error).
    Reply(OperationResult),
}

/// The plugin: one service instance plus one interpreter, dispatching the
/// named operations.
pub struct Plugin {
    service: LinearService,
    interpreter: Interpreter,
}

impl Plugin {
    /// Resolve settings, connect, and validate the credential. Fails without
    /// constructing any state when the credential is missing or rejected.
    pub async fn from_settings(
        settings: &dyn SettingsProvider,
        model: Option<Arc<dyn CompletionModel>>,
    ) -> Result<Self> {
        let config = PluginConfig::from_settings(settings)?;
        Self::connect(config, model).await
    }

    /// Connect with an explicit configuration.
    pub async fn connect(
        config: PluginConfig,
        model: Option<Arc<dyn CompletionModel>>,
    ) -> Result<Self> {
        let service = LinearService::connect(config).await?;
        Ok(Self::assemble(service, model))
    }

    /// Assemble from parts, skipping credential validation.
    pub fn assemble(service: LinearService, model: Option<Arc<dyn CompletionModel>>) -> Self {
        let interpreter =
            Interpreter::new(model).with_default_team(service.config().default_team_key.clone());
        Self {
            service,
            interpreter,
        }
    }

    /// The underlying service (ledger access, direct calls).
    pub fn service(&self) -> &LinearService {
        &self.service
    }

    /// The operation names this plugin answers to.
    pub fn operations() -> &'static [&'static str] {
        OPERATION_NAMES
    }

    /// Dispatch one named operation.
    pub async fn handle(&self, operation: &str, request: &OperationRequest) -> OperationResult {
        tracing::info!(operation, "Handling operation");

        match operation {
            "create-issue" => self.op_create_issue(request).await,
            "get-issue" => self.op_get_issue(request).await,
            "update-issue" => self.op_update_issue(request).await,
            "delete-issue" => self.op_delete_issue(request).await,
            "search-issues" => self.op_search_issues(request).await,
            "create-comment" => self.op_create_comment(request).await,
            "list-teams" => self.op_list_teams().await,
            "list-projects" => self.op_list_projects().await,
            "get-activity" => self.op_get_activity(request),
            "clear-activity" => self.op_clear_activity(),
            other => OperationResult::failure(format!("Unknown operation '{}'", other)),
        }
    }

    /// Dispatch and emit the reply text through the responder.
    pub async fn handle_with_responder(
        &self,
        operation: &str,
        request: &OperationRequest,
        responder: &dyn Responder,
    ) -> OperationResult {
        let result = self.handle(operation, request).await;
        if let Some(text) = &result.text {
            responder.respond(text);
        }
        result
    }

    async fn op_create_issue(&self, request: &OperationRequest) -> OperationResult {
        let draft = self.interpreter.interpret_create(&request.message).await;
        if draft.title.is_empty() {
            return OperationResult::failure(
                "I couldn't work out a title for the new issue. Please rephrase.",
            );
        }

        let Some(team_ref) = draft.team else {
            return OperationResult::failure(
                "No team specified and no default team is configured.",
            );
        };
        let team = match self.service.resolve_team(&team_ref).await {
            Ok(Some(team)) => team,
            Ok(None) => {
                return OperationResult::ok(format!("Team '{}' not found.", team_ref));
            }
            Err(err) => return OperationResult::failure(err.to_string()),
        };

        let mut input = IssueInput::new(&draft.title, &team.id);
        input.description = draft.description.clone();
        input.priority = Some(draft.priority.unwrap_or(DEFAULT_CREATE_PRIORITY));

        if let Some(assignee) = &draft.assignee {
            match self.service.resolve_user(assignee).await {
                Ok(Some(user)) => input.assignee_id = Some(user.id),
                Ok(None) => {}
                Err(err) => return OperationResult::failure(err.to_string()),
            }
        }
        if !draft.labels.is_empty() {
            match self.service.resolve_labels(&draft.labels).await {
                Ok(labels) if !labels.is_empty() => {
                    input.label_ids = Some(labels.into_iter().map(|l| l.id).collect());
                }
                Ok(_) => {}
                Err(err) => return OperationResult::failure(err.to_string()),
            }
        }

        match self.service.create_issue(&input).await {
            Ok(issue) => {
                let priority = issue.priority.or(input.priority);
                OperationResult::ok_with_data(
                    format!(
                        "Created issue {}: {} (Priority: {})",
                        issue.identifier,
                        issue.title,
                        priority_name(priority)
                    ),
                    json!(issue),
                )
            }
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    async fn op_get_issue(&self, request: &OperationRequest) -> OperationResult {
        let interpretation = self.interpreter.interpret_target(&request.message).await;
        let id = match self.resolve_interpretation(interpretation).await {
            TargetOutcome::Id(id) => id,
            TargetOutcome::Reply(result) => return result,
        };

        match self.service.get_issue(&id).await {
            Ok(Some((issue, relations))) => OperationResult::ok_with_data(
                issue_details_text(&issue, &relations),
                json!({ "issue": issue, "relations": relations }),
            ),
            Ok(None) => OperationResult::ok(format!("Issue '{}' not found.", id)),
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    async fn op_update_issue(&self, request: &OperationRequest) -> OperationResult {
        let (interpretation, draft) = self.interpreter.interpret_update(&request.message).await;
        let id = match self.resolve_interpretation(interpretation).await {
            TargetOutcome::Id(id) => id,
            TargetOutcome::Reply(result) => return result,
        };

        if draft.is_empty() {
            return OperationResult::failure(
                "I couldn't tell what to change. Please say what should be updated \
                 (for example the state, priority, or title).",
            );
        }

        let mut update = IssueUpdate {
            title: draft.title.clone(),
            description: draft.description.clone(),
            priority: draft.priority,
            ..Default::default()
        };

        if let Some(state_name) = &draft.state {
            match self.service.resolve_state(state_name, None).await {
                Ok(Some(state)) => update.state_id = Some(state.id),
                Ok(None) => {
                    return OperationResult::ok(format!(
                        "Workflow state '{}' not found.",
                        state_name
                    ));
                }
                Err(err) => return OperationResult::failure(err.to_string()),
            }
        }
        if let Some(assignee) = &draft.assignee {
            match self.service.resolve_user(assignee).await {
                Ok(Some(user)) => update.assignee_id = Some(user.id),
                Ok(None) => {
                    return OperationResult::ok(format!("User '{}' not found.", assignee));
                }
                Err(err) => return OperationResult::failure(err.to_string()),
            }
        }

        match self.service.update_issue(&id, &update).await {
            Ok(issue) => OperationResult::ok_with_data(
                format!("Updated issue {}: {}", issue.identifier, issue.title),
                json!(issue),
            ),
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    async fn op_delete_issue(&self, request: &OperationRequest) -> OperationResult {
        let interpretation = self.interpreter.interpret_target(&request.message).await;
        let id = match self.resolve_interpretation(interpretation).await {
            TargetOutcome::Id(id) => id,
            TargetOutcome::Reply(result) => return result,
        };

        match self.service.archive_issue(&id).await {
            Ok(Some(issue)) => OperationResult::ok_with_data(
                format!(
                    "Archived issue {}: {}. It is not deleted and can be restored \
                     from the archive.",
                    issue.identifier, issue.title
                ),
                json!(issue),
            ),
            Ok(None) => OperationResult::ok(format!("Issue '{}' not found.", id)),
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    async fn op_search_issues(&self, request: &OperationRequest) -> OperationResult {
        match self.interpreter.interpret_search(&request.message).await {
            Interpretation::Direct(id) => match self.service.get_issue(&id).await {
                Ok(Some((issue, _))) => OperationResult::ok_with_data(
                    format!("Found 1 issue:\n- {}", issue_line(&issue)),
                    json!([issue]),
                ),
                Ok(None) => OperationResult::ok(format!("Issue '{}' not found.", id)),
                Err(err) => OperationResult::failure(err.to_string()),
            },
            Interpretation::Search { filters, team } => {
                let filters = match self.scope_team(filters, team).await {
                    Ok(filters) => filters,
                    Err(result) => return result,
                };

                match self.service.search_issues(&filters).await {
                    Ok(issues) if issues.is_empty() => {
                        OperationResult::ok("No issues found matching your search.")
                    }
                    Ok(issues) => {
                        let listing = issues
                            .iter()
                            .map(|i| format!("- {}", issue_line(i)))
                            .collect::<Vec<_>>()
                            .join("\n");
                        OperationResult::ok_with_data(
                            format!("Found {} issue(s):\n{}", issues.len(), listing),
                            json!(issues),
                        )
                    }
                    Err(err) => OperationResult::failure(err.to_string()),
                }
            }
            Interpretation::ParseFailed => OperationResult::failure(CLARIFY_TEXT),
        }
    }

    async fn op_create_comment(&self, request: &OperationRequest) -> OperationResult {
        let (interpretation, body) = self.interpreter.interpret_comment(&request.message).await;
        let id = match self.resolve_interpretation(interpretation).await {
            TargetOutcome::Id(id) => id,
            TargetOutcome::Reply(result) => return result,
        };

        let Some(body) = body else {
            return OperationResult::failure(
                "I couldn't tell what the comment should say. Please include the comment text.",
            );
        };

        match self.service.create_comment(&id, &body).await {
            Ok(Some((issue, comment))) => OperationResult::ok_with_data(
                format!("Added comment to {}: {}", issue.identifier, issue.title),
                json!({ "issue": issue, "comment": comment }),
            ),
            Ok(None) => OperationResult::ok(format!("Issue '{}' not found.", id)),
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    async fn op_list_teams(&self) -> OperationResult {
        match self.service.list_teams().await {
            Ok(teams) if teams.is_empty() => OperationResult::ok("No teams found."),
            Ok(teams) => {
                let listing = teams
                    .iter()
                    .map(|t| format!("- {}: {}", t.key, t.name))
                    .collect::<Vec<_>>()
                    .join("\n");
                OperationResult::ok_with_data(
                    format!("Found {} team(s):\n{}", teams.len(), listing),
                    json!(teams),
                )
            }
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    async fn op_list_projects(&self) -> OperationResult {
        match self.service.list_projects().await {
            Ok(projects) if projects.is_empty() => OperationResult::ok("No projects found."),
            Ok(projects) => {
                let listing = projects
                    .iter()
                    .map(|p| match &p.state {
                        Some(state) => format!("- {} ({})", p.name, state),
                        None => format!("- {}", p.name),
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                OperationResult::ok_with_data(
                    format!("Found {} project(s):\n{}", projects.len(), listing),
                    json!(projects),
                )
            }
            Err(err) => OperationResult::failure(err.to_string()),
        }
    }

    fn op_get_activity(&self, request: &OperationRequest) -> OperationResult {
        let limit = request
            .options
            .get("limit")
            .and_then(Value::as_u64)
            .map(|n| n as usize);

        let mut filter = ActivityFilter {
            action: opt_string(&request.options, "action"),
            resource_id: opt_string(&request.options, "resourceId"),
            success: request.options.get("success").and_then(Value::as_bool),
            ..Default::default()
        };
        if let Some(kind) = opt_string(&request.options, "resourceType") {
            match ResourceType::parse(&kind) {
                Some(parsed) => filter.resource_type = Some(parsed),
                None => {
                    return OperationResult::failure(format!("Unknown resource type '{}'", kind))
                }
            }
        }

        let items = self.service.ledger().query(limit, Some(&filter));
        if items.is_empty() {
            return OperationResult::ok("No activity recorded.");
        }

        let listing = items
            .iter()
            .map(|item| {
                let mark = if item.success { "ok" } else { "failed" };
                format!(
                    "- [{}] {} {} {} ({})",
                    item.timestamp,
                    item.action,
                    item.resource_type.as_str(),
                    item.resource_id,
                    mark
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        OperationResult::ok_with_data(
            format!("{} activity record(s):\n{}", items.len(), listing),
            json!(items),
        )
    }

    fn op_clear_activity(&self) -> OperationResult {
        let count = self.service.ledger().len();
        self.service.ledger().clear();
        OperationResult::ok(format!("Cleared {} activity record(s).", count))
    }

    /// Turn an interpretation into one concrete issue id, searching and
    /// narrowing when the message was descriptive. No remote mutation
    /// happens here.
    async fn resolve_interpretation(&self, interpretation: Interpretation) -> TargetOutcome {
        match interpretation {
            Interpretation::Direct(id) => TargetOutcome::Id(id),
            Interpretation::Search { filters, team } => {
                let filters = match self.scope_team(filters, team).await {
                    Ok(filters) => filters,
                    Err(result) => return TargetOutcome::Reply(result),
                };

                match self.service.search_issues(&filters).await {
                    Ok(issues) => match Interpreter::narrow(&issues) {
                        Resolution::Resolved(id) => TargetOutcome::Id(id),
                        Resolution::Ambiguous(candidates) => {
                            TargetOutcome::Reply(OperationResult::ok(disambiguation_text(
                                &candidates,
                            )))
                        }
                        Resolution::NotFound => TargetOutcome::Reply(OperationResult::ok(
                            "No matching issues found.",
                        )),
                    },
                    Err(err) => {
                        TargetOutcome::Reply(OperationResult::failure(err.to_string()))
                    }
                }
            }
            Interpretation::ParseFailed => {
                TargetOutcome::Reply(OperationResult::failure(CLARIFY_TEXT))
            }
        }
    }

    /// Resolve the team reference in a search, if any, onto the filters.
    async fn scope_team(
        &self,
        mut filters: SearchFilters,
        team: Option<String>,
    ) -> std::result::Result<SearchFilters, OperationResult> {
        if let Some(team_ref) = team {
            match self.service.resolve_team(&team_ref).await {
                Ok(Some(team)) => filters.team_id = Some(team.id),
                Ok(None) => {
                    return Err(OperationResult::ok(format!(
                        "Team '{}' not found.",
                        team_ref
                    )))
                }
                Err(err) => return Err(OperationResult::failure(err.to_string())),
            }
        }
        Ok(filters)
    }
}

/// Human name for a 0-4 priority value.
pub fn priority_name(priority: Option<u8>) -> &'static str {
    match priority {
        Some(1) => "Urgent",
        Some(2) => "High",
        Some(3) => "Normal",
        Some(4) => "Low",
        Some(0) | None => "None",
        Some(_) => "Unknown",
    }
}

fn issue_line(issue: &Issue) -> String {
    let state = issue
        .state
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or("Unknown state");
    format!(
        "{}: {} ({}, Priority: {})",
        issue.identifier,
        issue.title,
        state,
        priority_name(issue.priority)
    )
}

fn issue_details_text(issue: &Issue, relations: &IssueRelations) -> String {
    let mut lines = vec![format!("{}: {}", issue.identifier, issue.title)];

    if let Some(state) = &issue.state {
        lines.push(format!("State: {}", state.name));
    }
    lines.push(format!("Priority: {}", priority_name(issue.priority)));
    if let Some(team) = &relations.team {
        lines.push(format!("Team: {} ({})", team.name, team.key));
    }
    if let Some(assignee) = &relations.assignee {
        let name = assignee.display_name.as_deref().unwrap_or(&assignee.name);
        lines.push(format!("Assignee: {}", name));
    }
    if !relations.labels.is_empty() {
        let names: Vec<&str> = relations.labels.iter().map(|l| l.name.as_str()).collect();
        lines.push(format!("Labels: {}", names.join(", ")));
    }
    if let Some(due) = &issue.due_date {
        lines.push(format!("Due: {}", due));
    }
    if let Some(description) = &issue.description {
        if !description.trim().is_empty() {
            lines.push(format!("\n{}", description.trim()));
        }
    }
    if let Some(url) = &issue.url {
        lines.push(format!("\n{}", url));
    }

    lines.join("\n")
}

fn disambiguation_text(candidates: &[Candidate]) -> String {
    let listing = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.summary()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "I found multiple matching issues:\n{}\nPlease tell me which one by its identifier.",
        listing
    )
}

fn opt_string(options: &Map<String, Value>, key: &str) -> Option<String> {
    options
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}
