//! Prompt templates for the request interpreter.
//!
//! Each template carries a single `{text}` substitution point for the user's
//! message and instructs the model to answer with one JSON object and nothing
//! else. The interpreter still tolerates fenced or chatty replies; the
//! instruction just raises the hit rate.

/// Substitution point within a template.
pub const TEXT_SLOT: &str = "{text}";

/// Substitute the user's message into a template.
pub fn render(template: &str, text: &str) -> String {
    template.replacen(TEXT_SLOT, text, 1)
}

/// Locate a single issue referenced by the message.
pub const ISSUE_TARGET: &str = r#"Extract the issue reference from this request: "{text}"

Reply with one JSON object and nothing else.
If the request names an issue identifier (like ENG-123), reply: {"directId": "ENG-123"}
Otherwise describe the issue being referred to:
{"query": "<title words>", "team": "<team key or name>", "state": "<state name>", "assignee": "<person>", "labels": ["<label>"], "priority": "urgent|high|normal|low", "recent": <true if they mean a recent issue>, "all": <true if they explicitly say all teams/issues>}
Omit fields that the request does not mention."#;

/// Translate a free-text search request into filter criteria.
pub const SEARCH_ISSUES: &str = r#"Translate this issue search request into filters: "{text}"

Reply with one JSON object and nothing else:
{"query": "<title words>", "team": "<team key or name>", "state": "<state name>", "assignee": "<person>", "labels": ["<label>"], "priority": "urgent|high|normal|low", "recent": <true if they ask for recent/latest issues>, "all": <true if they explicitly ask for all teams/issues>}
If the request names a specific issue identifier (like ENG-123), reply {"directId": "ENG-123"} instead.
Omit fields that the request does not mention."#;

/// Extract the fields of a new issue from the message.
pub const CREATE_ISSUE: &str = r#"Extract the new issue from this request: "{text}"

Reply with one JSON object and nothing else:
{"title": "<issue title>", "description": "<longer body if any>", "team": "<team key or name>", "assignee": "<person>", "labels": ["<label>"], "priority": "urgent|high|normal|low"}
The title is required; keep it short. Omit fields that the request does not mention."#;

/// Identify the target issue and the changes to apply.
pub const UPDATE_ISSUE: &str = r#"Extract the issue update from this request: "{text}"

Reply with one JSON object and nothing else. Identify the issue the same way as a lookup ({"directId": "ENG-123"} or descriptive fields), and put the changes under "updates":
{"directId": "ENG-123", "updates": {"title": "...", "description": "...", "state": "<state name>", "assignee": "<person>", "priority": "urgent|high|normal|low"}}
Omit update fields that the request does not mention."#;

/// Identify the target issue and the comment body.
pub const CREATE_COMMENT: &str = r#"Extract the comment from this request: "{text}"

Reply with one JSON object and nothing else. Identify the issue ({"directId": "ENG-123"} or descriptive fields) and include the comment text under "body":
{"directId": "ENG-123", "body": "<comment text>"}"#;
