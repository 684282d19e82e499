//! Shared fixtures: an in-memory tracker and scripted completion models.

use async_trait::async_trait;
use completion::{CompletionError, CompletionModel};
use linear_client::{
    ClientError, Comment, CommentInput, Issue, IssueInput, IssueRelations, IssueTracker,
    IssueUpdate, Label, Project, SearchFilters, Team, User, WorkflowState,
};
use linear_plugin::{Plugin, PluginConfig, LinearService};
use parking_lot::Mutex;
use std::sync::Arc;

/// Completion model that replies with a fixed string.
pub struct ScriptedModel(pub String);

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> completion::Result<String> {
        Ok(self.0.clone())
    }
}

/// Completion model that always fails, forcing the regex fallback.
pub struct OfflineModel;

#[async_trait]
impl CompletionModel for OfflineModel {
    async fn complete(&self, _prompt: &str) -> completion::Result<String> {
        Err(CompletionError::Provider("offline".to_string()))
    }
}

#[derive(Default)]
struct TrackerState {
    issues: Vec<Issue>,
    comments: Vec<Comment>,
    archived: Vec<String>,
    next_number: u32,
}

/// In-memory tracker seeded with one workspace: team ENG, one user, a couple
/// of labels, three workflow states, and any issues the test adds.
pub struct MemoryTracker {
    state: Mutex<TrackerState>,
    /// When set, every call fails with this error message as a rate limit.
    pub rate_limited: Mutex<bool>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                next_number: 100,
                ..Default::default()
            }),
            rate_limited: Mutex::new(false),
        }
    }

    pub fn team() -> Team {
        Team {
            id: "team-eng".to_string(),
            key: "ENG".to_string(),
            name: "Engineering".to_string(),
        }
    }

    pub fn user() -> User {
        User {
            id: "user-alice".to_string(),
            name: "alice".to_string(),
            display_name: Some("Alice".to_string()),
            email: Some("alice@example.com".to_string()),
        }
    }

    pub fn todo_state() -> WorkflowState {
        WorkflowState {
            id: "state-todo".to_string(),
            name: "Todo".to_string(),
            state_type: "unstarted".to_string(),
        }
    }

    pub fn done_state() -> WorkflowState {
        WorkflowState {
            id: "state-done".to_string(),
            name: "Done".to_string(),
            state_type: "completed".to_string(),
        }
    }

    /// Seed one issue and return it.
    pub fn seed_issue(&self, identifier: &str, title: &str) -> Issue {
        let issue = Issue {
            id: format!("uuid-{}", identifier.to_lowercase()),
            identifier: identifier.to_string(),
            title: title.to_string(),
            description: None,
            url: None,
            priority: Some(3),
            estimate: None,
            due_date: None,
            created_at: None,
            updated_at: None,
            state: Some(Self::todo_state()),
        };
        self.state.lock().issues.push(issue.clone());
        issue
    }

    pub fn set_rate_limited(&self, limited: bool) {
        *self.rate_limited.lock() = limited;
    }

    pub fn is_archived(&self, id: &str) -> bool {
        self.state.lock().archived.iter().any(|a| a == id)
    }

    pub fn comment_count(&self) -> usize {
        self.state.lock().comments.len()
    }

    pub fn issue_count(&self) -> usize {
        self.state.lock().issues.len()
    }

    fn check_available(&self) -> linear_client::Result<()> {
        if *self.rate_limited.lock() {
            Err(ClientError::RateLimited("simulated".to_string()))
        } else {
            Ok(())
        }
    }

    fn find(&self, id: &str) -> Option<Issue> {
        self.state
            .lock()
            .issues
            .iter()
            .find(|i| i.id == id || i.identifier == id)
            .cloned()
    }
}

#[async_trait]
impl IssueTracker for MemoryTracker {
    async fn viewer(&self) -> linear_client::Result<User> {
        self.check_available()?;
        Ok(Self::user())
    }

    async fn teams(&self) -> linear_client::Result<Vec<Team>> {
        self.check_available()?;
        Ok(vec![Self::team()])
    }

    async fn team_by_key(&self, key: &str) -> linear_client::Result<Option<Team>> {
        self.check_available()?;
        Ok(Some(Self::team()).filter(|t| t.key.eq_ignore_ascii_case(key)))
    }

    async fn issue(&self, id: &str) -> linear_client::Result<Option<Issue>> {
        self.check_available()?;
        Ok(self.find(id))
    }

    async fn issue_relations(&self, _issue_id: &str) -> linear_client::Result<IssueRelations> {
        self.check_available()?;
        Ok(IssueRelations {
            team: Some(Self::team()),
            assignee: None,
            labels: Vec::new(),
        })
    }

    async fn search_issues(&self, filters: &SearchFilters) -> linear_client::Result<Vec<Issue>> {
        self.check_available()?;
        let state = self.state.lock();

        let mut matching: Vec<Issue> = state
            .issues
            .iter()
            .filter(|issue| match &filters.query {
                Some(query) => issue.title.to_lowercase().contains(&query.to_lowercase()),
                None => true,
            })
            .filter(|issue| {
                filters.states.is_empty()
                    || issue
                        .state
                        .as_ref()
                        .is_some_and(|s| filters.states.iter().any(|n| n == &s.name))
            })
            .cloned()
            .collect();

        if let Some(limit) = filters.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn create_issue(&self, input: &IssueInput) -> linear_client::Result<Issue> {
        self.check_available()?;
        let mut state = self.state.lock();
        state.next_number += 1;

        let identifier = format!("ENG-{}", state.next_number);
        let issue = Issue {
            id: format!("uuid-{}", identifier.to_lowercase()),
            identifier,
            title: input.title.clone(),
            description: input.description.clone(),
            url: None,
            priority: input.priority,
            estimate: input.estimate,
            due_date: input.due_date.clone(),
            created_at: None,
            updated_at: None,
            state: Some(Self::todo_state()),
        };
        state.issues.push(issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, id: &str, update: &IssueUpdate) -> linear_client::Result<Issue> {
        self.check_available()?;
        let mut state = self.state.lock();

        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.id == id || i.identifier == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;

        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(description) = &update.description {
            issue.description = Some(description.clone());
        }
        if let Some(priority) = update.priority {
            issue.priority = Some(priority);
        }
        if let Some(state_id) = &update.state_id {
            issue.state = if state_id == "state-done" {
                Some(Self::done_state())
            } else {
                Some(Self::todo_state())
            };
        }
        Ok(issue.clone())
    }

    async fn archive_issue(&self, id: &str) -> linear_client::Result<bool> {
        self.check_available()?;
        let mut state = self.state.lock();

        if !state.issues.iter().any(|i| i.id == id) {
            return Err(ClientError::NotFound(id.to_string()));
        }
        state.archived.push(id.to_string());
        Ok(true)
    }

    async fn create_comment(&self, input: &CommentInput) -> linear_client::Result<Comment> {
        self.check_available()?;
        let mut state = self.state.lock();

        let comment = Comment {
            id: format!("comment-{}", state.comments.len() + 1),
            body: input.body.clone(),
            created_at: None,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn projects(&self) -> linear_client::Result<Vec<Project>> {
        self.check_available()?;
        Ok(vec![Project {
            id: "project-1".to_string(),
            name: "Platform".to_string(),
            state: Some("started".to_string()),
        }])
    }

    async fn users(&self) -> linear_client::Result<Vec<User>> {
        self.check_available()?;
        Ok(vec![Self::user()])
    }

    async fn labels(&self) -> linear_client::Result<Vec<Label>> {
        self.check_available()?;
        Ok(vec![
            Label {
                id: "label-bug".to_string(),
                name: "bug".to_string(),
                color: None,
            },
            Label {
                id: "label-feature".to_string(),
                name: "feature".to_string(),
                color: None,
            },
        ])
    }

    async fn workflow_states(
        &self,
        _team_id: Option<&str>,
    ) -> linear_client::Result<Vec<WorkflowState>> {
        self.check_available()?;
        Ok(vec![Self::todo_state(), Self::done_state()])
    }
}

/// Plugin over a fresh in-memory tracker with the default team set to ENG.
pub fn plugin_with(
    tracker: Arc<MemoryTracker>,
    model: Option<Arc<dyn CompletionModel>>,
) -> Plugin {
    let config = PluginConfig::new("lin_api_test").with_default_team("ENG");
    let service = LinearService::with_tracker(config, tracker);
    Plugin::assemble(service, model)
}
