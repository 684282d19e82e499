//! End-to-end operation flows over an in-memory tracker.

mod common;

use common::{plugin_with, MemoryTracker, OfflineModel, ScriptedModel};
use linear_plugin::{ActivityFilter, OperationRequest, Plugin, Responder, SettingsProvider};
use parking_lot::Mutex;
use std::sync::Arc;

fn request(message: &str) -> OperationRequest {
    OperationRequest::new(message)
}

#[tokio::test]
async fn test_create_issue_uses_default_team_and_priority() {
    let tracker = Arc::new(MemoryTracker::new());
    let plugin = plugin_with(tracker.clone(), None);

    let result = plugin
        .handle(
            "create-issue",
            &request("Create a new issue: Fix login button not working"),
        )
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    let text = result.text.expect("reply text");
    assert!(text.contains("Created issue ENG-101"), "got: {}", text);
    assert!(text.contains("Fix login button not working"));
    assert!(text.contains("Priority: Normal"));
    assert_eq!(tracker.issue_count(), 1);

    // Exactly one audited create, on the new issue's stable id.
    let items = plugin.service().ledger().query(None, None);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].action, "create_issue");
    assert!(items[0].success);
    assert_eq!(items[0].resource_id, "uuid-eng-101");
}

#[tokio::test]
async fn test_create_issue_with_interpreted_fields() {
    let tracker = Arc::new(MemoryTracker::new());
    let model = Arc::new(ScriptedModel(
        r#"{"title": "Crash on startup", "priority": "urgent", "labels": ["bug"],
            "assignee": "alice"}"#
            .to_string(),
    ));
    let plugin = plugin_with(tracker, Some(model));

    let result = plugin
        .handle(
            "create-issue",
            &request("urgent bug: the app crashes on startup, give it to alice"),
        )
        .await;

    assert!(result.success);
    let data = result.data.expect("issue data");
    assert_eq!(data["title"], "Crash on startup");
    assert_eq!(data["priority"], 1);
}

#[tokio::test]
async fn test_get_issue_by_identifier_includes_relations() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-123", "Fix login");
    let plugin = plugin_with(tracker, None);

    let result = plugin.handle("get-issue", &request("show me ENG-123")).await;

    assert!(result.success);
    let text = result.text.expect("reply text");
    assert!(text.contains("ENG-123: Fix login"));
    assert!(text.contains("Team: Engineering (ENG)"));
    assert!(text.contains("State: Todo"));
}

#[tokio::test]
async fn test_get_issue_unknown_identifier_is_not_an_error() {
    let tracker = Arc::new(MemoryTracker::new());
    let plugin = plugin_with(tracker, None);

    let result = plugin.handle("get-issue", &request("show me ENG-999")).await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert!(result.text.expect("reply text").contains("not found"));
}

#[tokio::test]
async fn test_ambiguous_reference_lists_candidates_without_mutation() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-1", "Login page broken");
    tracker.seed_issue("ENG-2", "Login timeout on mobile");
    let model = Arc::new(ScriptedModel(r#"{"query": "login"}"#.to_string()));
    let plugin = plugin_with(tracker.clone(), Some(model));

    let result = plugin
        .handle("delete-issue", &request("delete the login bug"))
        .await;

    // Ambiguity is a conversational outcome, not a failure, and nothing
    // was archived.
    assert!(result.success);
    assert!(result.error.is_none());
    let text = result.text.expect("reply text");
    assert!(text.contains("multiple matching issues"));
    assert!(text.contains("ENG-1"));
    assert!(text.contains("ENG-2"));
    assert!(!tracker.is_archived("uuid-eng-1"));
    assert!(!tracker.is_archived("uuid-eng-2"));
}

#[tokio::test]
async fn test_delete_issue_archives_and_records_stable_id() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-123", "Fix login");
    let plugin = plugin_with(tracker.clone(), Some(Arc::new(OfflineModel)));

    let result = plugin
        .handle("delete-issue", &request("Delete issue ENG-123"))
        .await;

    assert!(result.success);
    let text = result.text.expect("reply text");
    assert!(text.contains("Archived issue ENG-123"));
    assert!(text.contains("restored"));
    assert!(tracker.is_archived("uuid-eng-123"));

    let filter = ActivityFilter {
        action: Some("archive_issue".to_string()),
        ..Default::default()
    };
    let items = plugin.service().ledger().query(None, Some(&filter));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].resource_id, "uuid-eng-123");
}

#[tokio::test]
async fn test_update_issue_moves_state() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-5", "Ship the thing");
    let model = Arc::new(ScriptedModel(
        r#"{"directId": "ENG-5", "updates": {"state": "Done"}}"#.to_string(),
    ));
    let plugin = plugin_with(tracker, Some(model));

    let result = plugin
        .handle("update-issue", &request("mark ENG-5 as done"))
        .await;

    assert!(result.success);
    let data = result.data.expect("issue data");
    assert_eq!(data["state"]["name"], "Done");
}

#[tokio::test]
async fn test_update_without_changes_fails_with_guidance() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-5", "Ship the thing");
    let plugin = plugin_with(tracker, None);

    let result = plugin
        .handle("update-issue", &request("do something with ENG-5"))
        .await;

    assert!(!result.success);
    assert!(result.error.expect("error").contains("what to change"));
}

#[tokio::test]
async fn test_create_comment_on_direct_target() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-7", "Deploy pipeline");
    let plugin = plugin_with(tracker.clone(), None);

    let result = plugin
        .handle(
            "create-comment",
            &request("comment on ENG-7: deployed the fix to staging"),
        )
        .await;

    assert!(result.success);
    assert!(result.text.expect("reply text").contains("Added comment to ENG-7"));
    assert_eq!(tracker.comment_count(), 1);
}

#[tokio::test]
async fn test_search_issues_lists_matches() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-1", "Login page broken");
    tracker.seed_issue("ENG-2", "Login timeout on mobile");
    tracker.seed_issue("ENG-3", "Unrelated chore");
    let model = Arc::new(ScriptedModel(r#"{"query": "login"}"#.to_string()));
    let plugin = plugin_with(tracker, Some(model));

    let result = plugin
        .handle("search-issues", &request("find the login issues"))
        .await;

    assert!(result.success);
    let text = result.text.expect("reply text");
    assert!(text.contains("Found 2 issue(s)"));
    assert!(text.contains("ENG-1"));
    assert!(!text.contains("ENG-3"));
}

#[tokio::test]
async fn test_uninterpretable_search_still_searches() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-1", "Login page broken");
    let plugin = plugin_with(tracker, None);

    // No model and no identifier token; the search degrades to an
    // unconstrained query instead of asking the user to rephrase.
    let result = plugin
        .handle("search-issues", &request("what is open right now"))
        .await;

    assert!(result.success);
    assert!(result.text.expect("reply text").contains("ENG-1"));
}

#[tokio::test]
async fn test_remote_failure_is_reported_and_audited() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-123", "Fix login");
    tracker.set_rate_limited(true);
    let plugin = plugin_with(tracker, None);

    let result = plugin.handle("get-issue", &request("show ENG-123")).await;

    assert!(!result.success);
    let error = result.error.expect("error message");
    assert!(error.to_lowercase().contains("rate limit"), "got: {}", error);
    // Failure text still answers the user.
    assert!(result.text.is_some());

    let items = plugin.service().ledger().query(None, None);
    assert_eq!(items.len(), 1);
    assert!(!items[0].success);
    assert!(items[0].error.is_some());
}

#[tokio::test]
async fn test_list_teams_and_projects() {
    let tracker = Arc::new(MemoryTracker::new());
    let plugin = plugin_with(tracker, None);

    let teams = plugin.handle("list-teams", &request("")).await;
    assert!(teams.success);
    assert!(teams.text.expect("reply text").contains("ENG: Engineering"));

    let projects = plugin.handle("list-projects", &request("")).await;
    assert!(projects.success);
    assert!(projects.text.expect("reply text").contains("Platform"));
}

#[tokio::test]
async fn test_activity_operations_report_and_clear() {
    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-123", "Fix login");
    let plugin = plugin_with(tracker, None);

    plugin.handle("get-issue", &request("show ENG-123")).await;
    plugin.handle("list-teams", &request("")).await;

    let activity = plugin
        .handle(
            "get-activity",
            &request("").with_option("action", "get_issue".into()),
        )
        .await;
    assert!(activity.success);
    let text = activity.text.expect("reply text");
    assert!(text.contains("1 activity record(s)"));
    assert!(text.contains("get_issue"));
    assert!(!text.contains("list_teams"));

    // get-activity itself must not have appended anything.
    assert_eq!(plugin.service().ledger().len(), 2);

    let cleared = plugin.handle("clear-activity", &request("")).await;
    assert!(cleared.success);
    assert!(cleared.text.expect("reply text").contains("Cleared 2"));
    assert!(plugin.service().ledger().is_empty());

    let empty = plugin.handle("get-activity", &request("")).await;
    assert!(empty.success);
    assert!(empty.text.expect("reply text").contains("No activity"));
}

#[tokio::test]
async fn test_service_directory_calls_are_audited() {
    let tracker = Arc::new(MemoryTracker::new());
    let plugin = plugin_with(tracker, None);
    let service = plugin.service();

    let users = service.list_users().await.expect("users");
    assert_eq!(users[0].name, "alice");

    let labels = service.list_labels().await.expect("labels");
    assert_eq!(labels.len(), 2);

    let states = service.list_workflow_states(None).await.expect("states");
    assert!(states.iter().any(|s| s.name == "Done"));

    // One audit record per call; name resolution helpers add none.
    assert_eq!(service.ledger().len(), 3);
    let team = service.resolve_team("Engineering").await.expect("team");
    assert_eq!(team.expect("resolved").id, "team-eng");
    assert_eq!(service.ledger().len(), 3);
}

#[tokio::test]
async fn test_unknown_operation_fails() {
    let tracker = Arc::new(MemoryTracker::new());
    let plugin = plugin_with(tracker, None);

    let result = plugin.handle("frobnicate", &request("hello")).await;
    assert!(!result.success);
    assert!(result.error.expect("error").contains("frobnicate"));
}

#[tokio::test]
async fn test_missing_credential_fails_before_any_network_call() {
    struct EmptySettings;
    impl SettingsProvider for EmptySettings {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
    }

    let result = Plugin::from_settings(&EmptySettings, None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_responder_receives_reply_text() {
    #[derive(Default)]
    struct Captured(Mutex<Vec<String>>);
    impl Responder for Captured {
        fn respond(&self, text: &str) {
            self.0.lock().push(text.to_string());
        }
    }

    let tracker = Arc::new(MemoryTracker::new());
    tracker.seed_issue("ENG-123", "Fix login");
    let plugin = plugin_with(tracker, None);

    let captured = Captured::default();
    plugin
        .handle_with_responder("get-issue", &request("show ENG-123"), &captured)
        .await;

    let replies = captured.0.lock();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("ENG-123"));
}
