//! Request interpreter: free text in, resolved target or filters out.
//!
//! One completion call per invocation turns the user's message into a JSON
//! intent. Two failure shapes are recoverable by design: an unavailable or
//! empty completion capability, and malformed JSON output. Both fall back to
//! a regex scan for an identifier-like token (`LETTERS-DIGITS`) in the raw
//! text. Only when the fallback also finds nothing does the interpreter give
//! up and ask the user to rephrase.
//!
//! Candidate narrowing is the second half of the contract: zero matches is a
//! user-facing "not found", exactly one match resolves directly, and two or
//! more produce a disambiguation listing instead of auto-selecting.

use crate::prompts;
use completion::CompletionModel;
use linear_client::{Issue, SearchFilters};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};

/// Cap on entries in a disambiguation listing.
pub const MAX_DISAMBIGUATION_CANDIDATES: usize = 5;

/// Result limit for ordinary descriptive searches.
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Widened limit when the request hints at recency.
pub const RECENT_RESULT_LIMIT: usize = 25;

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]+-[0-9]+").expect("static pattern"))
}

fn all_qualifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\ball\b").expect("static pattern"))
}

/// How a message refers to an issue (or set of issues).
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// A direct identifier such as "ENG-123". Existence is not checked here;
    /// the downstream remote call verifies it.
    Direct(String),
    /// Descriptive criteria to search with. `team` is the literal team key or
    /// name still to be resolved against the tracker.
    Search {
        filters: SearchFilters,
        team: Option<String>,
    },
    /// Neither the completion call nor the regex fallback produced anything
    /// usable.
    ParseFailed,
}

/// Outcome of narrowing a candidate set to one issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Exactly one issue matched; carries its stable id.
    Resolved(String),
    /// Several issues matched; ask the user to pick one.
    Ambiguous(Vec<Candidate>),
    /// Nothing matched.
    NotFound,
}

/// One entry in a disambiguation listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub identifier: String,
    pub title: String,
    pub state: Option<String>,
}

impl Candidate {
    fn from_issue(issue: &Issue) -> Self {
        Self {
            identifier: issue.identifier.clone(),
            title: issue.title.clone(),
            state: issue.state.as_ref().map(|s| s.name.clone()),
        }
    }

    /// One-line listing form: "ENG-12: Fix login (In Progress)".
    pub fn summary(&self) -> String {
        match &self.state {
            Some(state) => format!("{}: {} ({})", self.identifier, self.title, state),
            None => format!("{}: {}", self.identifier, self.title),
        }
    }
}

/// Fields of a new issue extracted from free text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateDraft {
    pub title: String,
    pub description: Option<String>,
    /// Team key or name, after the default-team rule.
    pub team: Option<String>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub priority: Option<u8>,
}

/// Changes to apply to an issue, extracted from free text. Name-valued
/// fields (state, assignee) are resolved against the tracker by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<u8>,
}

impl UpdateDraft {
    /// True when no change was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.state.is_none()
            && self.assignee.is_none()
            && self.priority.is_none()
    }
}

/// Turns one line of free text plus an operation-specific template into a
/// resolved target, a filter set, or a "please clarify" signal.
///
/// Holds no mutable state and never touches the tracker; its only side
/// effect is the outbound completion call.
pub struct Interpreter {
    model: Option<Arc<dyn CompletionModel>>,
    default_team_key: Option<String>,
}

impl Interpreter {
    /// Create an interpreter. Without a model every request goes straight to
    /// the regex fallback.
    pub fn new(model: Option<Arc<dyn CompletionModel>>) -> Self {
        Self {
            model,
            default_team_key: None,
        }
    }

    /// Configure the default team applied to searches that name no team and
    /// do not ask for "all".
    pub fn with_default_team(mut self, key: Option<String>) -> Self {
        self.default_team_key = key;
        self
    }

    /// Interpret a message that refers to one issue (get/delete/comment).
    pub async fn interpret_target(&self, text: &str) -> Interpretation {
        match self.complete_intent::<TargetIntent>(text, prompts::ISSUE_TARGET).await {
            Some(intent) => self.target_to_interpretation(intent, text),
            None => self.fallback(text),
        }
    }

    /// Interpret a search request. Never fails: an uninterpretable message
    /// becomes an unconstrained search scoped by the default-team rule.
    pub async fn interpret_search(&self, text: &str) -> Interpretation {
        match self.complete_intent::<TargetIntent>(text, prompts::SEARCH_ISSUES).await {
            Some(intent) => self.target_to_interpretation(intent, text),
            None => match self.fallback(text) {
                Interpretation::ParseFailed => Interpretation::Search {
                    filters: SearchFilters {
                        limit: Some(DEFAULT_RESULT_LIMIT),
                        ..Default::default()
                    },
                    team: self.applicable_default_team(text),
                },
                other => other,
            },
        }
    }

    /// Extract the fields of a new issue.
    pub async fn interpret_create(&self, text: &str) -> CreateDraft {
        if let Some(intent) = self.complete_intent::<CreateIntent>(text, prompts::CREATE_ISSUE).await
        {
            if let Some(title) = non_empty(intent.title) {
                let team = non_empty(intent.team).or_else(|| self.applicable_default_team(text));
                return CreateDraft {
                    title,
                    description: non_empty(intent.description),
                    team,
                    assignee: non_empty(intent.assignee),
                    labels: intent.labels,
                    priority: intent.priority.as_ref().and_then(parse_priority_value),
                };
            }
        }

        // Fallback heuristic: everything after the first colon is the title,
        // otherwise the whole message.
        let title = text
            .split_once(':')
            .map(|(_, rest)| rest.trim())
            .filter(|rest| !rest.is_empty())
            .unwrap_or_else(|| text.trim())
            .to_string();

        CreateDraft {
            title,
            team: self.applicable_default_team(text),
            ..Default::default()
        }
    }

    /// Extract the target issue and the changes to apply.
    pub async fn interpret_update(&self, text: &str) -> (Interpretation, UpdateDraft) {
        match self.complete_intent::<UpdateIntent>(text, prompts::UPDATE_ISSUE).await {
            Some(intent) => {
                let draft = UpdateDraft {
                    title: non_empty(intent.updates.title),
                    description: non_empty(intent.updates.description),
                    state: non_empty(intent.updates.state),
                    assignee: non_empty(intent.updates.assignee),
                    priority: intent.updates.priority.as_ref().and_then(parse_priority_value),
                };
                (self.target_to_interpretation(intent.target, text), draft)
            }
            None => (self.fallback(text), UpdateDraft::default()),
        }
    }

    /// Extract the target issue and the comment body.
    pub async fn interpret_comment(&self, text: &str) -> (Interpretation, Option<String>) {
        match self.complete_intent::<CommentIntent>(text, prompts::CREATE_COMMENT).await {
            Some(intent) => {
                let body = non_empty(intent.body);
                (self.target_to_interpretation(intent.target, text), body)
            }
            None => {
                let body = text
                    .split_once(':')
                    .map(|(_, rest)| rest.trim().to_string())
                    .filter(|rest| !rest.is_empty());
                (self.fallback(text), body)
            }
        }
    }

    /// Narrow a candidate set to one issue.
    pub fn narrow(issues: &[Issue]) -> Resolution {
        match issues {
            [] => Resolution::NotFound,
            [only] => Resolution::Resolved(only.id.clone()),
            many => Resolution::Ambiguous(
                many.iter()
                    .take(MAX_DISAMBIGUATION_CANDIDATES)
                    .map(Candidate::from_issue)
                    .collect(),
            ),
        }
    }

    /// Run the completion call and parse its output into an intent. `None`
    /// covers every recoverable shape: no model, a failed call, empty output,
    /// no JSON found, or JSON that does not match the intent.
    async fn complete_intent<T: for<'de> Deserialize<'de>>(
        &self,
        text: &str,
        template: &str,
    ) -> Option<T> {
        let model = self.model.as_ref()?;
        let prompt = prompts::render(template, text);

        let output = match model.complete(&prompt).await {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(error = %err, "Completion call failed, using fallback");
                return None;
            }
        };

        if output.trim().is_empty() {
            tracing::debug!("Completion returned no output, using fallback");
            return None;
        }

        let json = extract_json(&output)?;
        match serde_json::from_str(&json) {
            Ok(intent) => Some(intent),
            Err(err) => {
                tracing::debug!(error = %err, "Completion output was not a usable intent");
                None
            }
        }
    }

    fn target_to_interpretation(&self, intent: TargetIntent, text: &str) -> Interpretation {
        if let Some(id) = non_empty(intent.direct_id) {
            return Interpretation::Direct(id);
        }

        let mut filters = SearchFilters {
            query: non_empty(intent.query),
            states: intent.state.into_iter().filter(|s| !s.is_empty()).collect(),
            assignees: intent
                .assignee
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect(),
            labels: intent.labels,
            priorities: intent
                .priority
                .as_ref()
                .and_then(parse_priority_value)
                .into_iter()
                .collect(),
            limit: Some(DEFAULT_RESULT_LIMIT),
            ..Default::default()
        };

        if intent.recent {
            filters.newest_first = true;
            filters.limit = Some(RECENT_RESULT_LIMIT);
        }

        let team = match non_empty(intent.team) {
            Some(team) => Some(team),
            None if intent.all => None,
            None => self.applicable_default_team(text),
        };

        if filters.is_unconstrained() && team.is_none() && !filters.newest_first {
            // The model produced an empty intent; try the raw text instead.
            return self.fallback(text);
        }

        Interpretation::Search { filters, team }
    }

    /// Regex fallback over the raw text.
    fn fallback(&self, text: &str) -> Interpretation {
        match identifier_regex().find(text) {
            Some(m) => Interpretation::Direct(m.as_str().to_string()),
            None => Interpretation::ParseFailed,
        }
    }

    /// The default team, unless the message asks for "all".
    fn applicable_default_team(&self, text: &str) -> Option<String> {
        if all_qualifier_regex().is_match(text) {
            None
        } else {
            self.default_team_key.clone()
        }
    }
}

/// Extract a JSON object from completion output, stripping Markdown code
/// fences when present.
fn extract_json(text: &str) -> Option<String> {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return Some(text[start + 7..start + 7 + end].trim().to_string());
        }
    }

    if let Some(start) = text.find("```") {
        if let Some(end) = text[start + 3..].find("```") {
            let fenced = text[start + 3..start + 3 + end].trim();
            if fenced.starts_with('{') {
                return Some(fenced.to_string());
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(text[start..=end].to_string())
    } else {
        None
    }
}

/// Map a priority word or digit to the 0-4 scale.
fn parse_priority_value(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => {
            let n = n.as_u64()?;
            (1..=4).contains(&n).then_some(n as u8)
        }
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "urgent" | "1" => Some(1),
            "high" | "2" => Some(2),
            "normal" | "medium" | "3" => Some(3),
            "low" | "4" => Some(4),
            _ => None,
        },
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Intent shapes the completion output is parsed into. Every field is
// optional; unknown fields are ignored.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TargetIntent {
    direct_id: Option<String>,
    query: Option<String>,
    team: Option<String>,
    state: Option<String>,
    assignee: Option<String>,
    labels: Vec<String>,
    priority: Option<Value>,
    recent: bool,
    all: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CreateIntent {
    title: Option<String>,
    description: Option<String>,
    team: Option<String>,
    assignee: Option<String>,
    labels: Vec<String>,
    priority: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateIntent {
    #[serde(flatten)]
    target: TargetIntent,
    updates: UpdateFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UpdateFields {
    title: Option<String>,
    description: Option<String>,
    state: Option<String>,
    assignee: Option<String>,
    priority: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CommentIntent {
    #[serde(flatten)]
    target: TargetIntent,
    body: Option<String>,
}
