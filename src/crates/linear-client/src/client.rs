//! GraphQL transport and the production [`IssueTracker`] implementation.

use crate::error::{ClientError, Result};
use crate::tracker::IssueTracker;
use crate::types::{
    Comment, CommentInput, Issue, IssueInput, IssueRelations, IssueUpdate, Label, Project,
    SearchFilters, Team, User, WorkflowState,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// Default public API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";

/// Default page size for searches when the caller sets no limit.
const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Scalar selection shared by every query that returns issues.
const ISSUE_FIELDS: &str = "id identifier title description url priority estimate dueDate \
     createdAt updatedAt state { id name type }";

/// Client for the tracker's GraphQL endpoint.
#[derive(Clone)]
pub struct LinearClient {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl LinearClient {
    /// Create a client against the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build().map_err(ClientError::Http)?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client,
        })
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Execute one GraphQL request and deserialize the `data` payload.
    async fn request<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        tracing::debug!(endpoint = %self.endpoint, "Sending GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(ClientError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status.as_u16() == 401 {
                ClientError::Authentication(error_text)
            } else if status.as_u16() == 429 {
                ClientError::RateLimited(error_text)
            } else {
                ClientError::Api(format!("API error {}: {}", status, error_text))
            });
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if let Some(errors) = envelope.errors {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ClientError::Api(message));
        }

        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("response carried no data".to_string()))
    }

    /// Translate search filters into the API's issue filter object.
    fn build_issue_filter(filters: &SearchFilters) -> Value {
        let mut filter = serde_json::Map::new();

        if let Some(team_id) = &filters.team_id {
            filter.insert("team".into(), json!({ "id": { "eq": team_id } }));
        }
        if let Some(project_id) = &filters.project_id {
            filter.insert("project".into(), json!({ "id": { "eq": project_id } }));
        }
        if !filters.states.is_empty() {
            filter.insert("state".into(), json!({ "name": { "in": filters.states } }));
        }
        if !filters.assignees.is_empty() {
            filter.insert(
                "assignee".into(),
                json!({ "displayName": { "in": filters.assignees } }),
            );
        }
        if !filters.labels.is_empty() {
            filter.insert("labels".into(), json!({ "name": { "in": filters.labels } }));
        }
        if !filters.priorities.is_empty() {
            filter.insert("priority".into(), json!({ "in": filters.priorities }));
        }
        if let Some(query) = &filters.query {
            filter.insert(
                "title".into(),
                json!({ "containsIgnoreCase": query }),
            );
        }

        Value::Object(filter)
    }
}

#[async_trait]
impl IssueTracker for LinearClient {
    async fn viewer(&self) -> Result<User> {
        let query = "query { viewer { id name displayName email } }";
        let data: ViewerData = self.request(query, json!({})).await?;
        Ok(data.viewer)
    }

    async fn teams(&self) -> Result<Vec<Team>> {
        let query = "query { teams { nodes { id key name } } }";
        let data: TeamsData = self.request(query, json!({})).await?;
        Ok(data.teams.nodes)
    }

    async fn team_by_key(&self, key: &str) -> Result<Option<Team>> {
        let query = "query($key: String!) { \
             teams(filter: { key: { eq: $key } }) { nodes { id key name } } }";
        let data: TeamsData = self.request(query, json!({ "key": key })).await?;
        Ok(data.teams.nodes.into_iter().next())
    }

    async fn issue(&self, id: &str) -> Result<Option<Issue>> {
        let query = format!("query($id: String!) {{ issue(id: $id) {{ {ISSUE_FIELDS} }} }}");

        match self.request::<IssueData>(&query, json!({ "id": id })).await {
            Ok(data) => Ok(data.issue),
            // The API reports an unknown id as an entity error rather than a
            // null field.
            Err(ClientError::Api(message)) if message.to_lowercase().contains("not found") => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn issue_relations(&self, issue_id: &str) -> Result<IssueRelations> {
        let query = "query($id: String!) { issue(id: $id) { \
             team { id key name } \
             assignee { id name displayName email } \
             labels { nodes { id name color } } } }";

        let data: IssueRelationsData = self.request(query, json!({ "id": issue_id })).await?;
        let node = data
            .issue
            .ok_or_else(|| ClientError::NotFound(issue_id.to_string()))?;

        Ok(IssueRelations {
            team: node.team,
            assignee: node.assignee,
            labels: node.labels.map(|c| c.nodes).unwrap_or_default(),
        })
    }

    async fn search_issues(&self, filters: &SearchFilters) -> Result<Vec<Issue>> {
        let order_by = if filters.newest_first {
            "createdAt"
        } else {
            "updatedAt"
        };
        let query = format!(
            "query($filter: IssueFilter, $first: Int) {{ \
             issues(filter: $filter, first: $first, orderBy: {order_by}) {{ \
             nodes {{ {ISSUE_FIELDS} }} }} }}"
        );

        let variables = json!({
            "filter": Self::build_issue_filter(filters),
            "first": filters.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        });

        let data: IssuesData = self.request(&query, variables).await?;
        Ok(data.issues.nodes)
    }

    async fn create_issue(&self, input: &IssueInput) -> Result<Issue> {
        let query = format!(
            "mutation($input: IssueCreateInput!) {{ \
             issueCreate(input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
        );

        let variables = json!({ "input": input });
        let data: IssueCreateData = self.request(&query, variables).await?;

        if !data.issue_create.success {
            return Err(ClientError::Api("issue creation was rejected".to_string()));
        }
        data.issue_create
            .issue
            .ok_or_else(|| ClientError::InvalidResponse("create returned no issue".to_string()))
    }

    async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<Issue> {
        let query = format!(
            "mutation($id: String!, $input: IssueUpdateInput!) {{ \
             issueUpdate(id: $id, input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
        );

        let variables = json!({ "id": id, "input": update });
        let data: IssueUpdateData = self.request(&query, variables).await?;

        if !data.issue_update.success {
            return Err(ClientError::Api("issue update was rejected".to_string()));
        }
        data.issue_update
            .issue
            .ok_or_else(|| ClientError::InvalidResponse("update returned no issue".to_string()))
    }

    async fn archive_issue(&self, id: &str) -> Result<bool> {
        let query = "mutation($id: String!) { issueArchive(id: $id) { success } }";
        let data: IssueArchiveData = self.request(query, json!({ "id": id })).await?;
        Ok(data.issue_archive.success)
    }

    async fn create_comment(&self, input: &CommentInput) -> Result<Comment> {
        let query = "mutation($input: CommentCreateInput!) { \
             commentCreate(input: $input) { success comment { id body createdAt } } }";

        let variables = json!({ "input": input });
        let data: CommentCreateData = self.request(query, variables).await?;

        if !data.comment_create.success {
            return Err(ClientError::Api("comment creation was rejected".to_string()));
        }
        data.comment_create
            .comment
            .ok_or_else(|| ClientError::InvalidResponse("create returned no comment".to_string()))
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        let query = "query { projects { nodes { id name state } } }";
        let data: ProjectsData = self.request(query, json!({})).await?;
        Ok(data.projects.nodes)
    }

    async fn users(&self) -> Result<Vec<User>> {
        let query = "query { users { nodes { id name displayName email } } }";
        let data: UsersData = self.request(query, json!({})).await?;
        Ok(data.users.nodes)
    }

    async fn labels(&self) -> Result<Vec<Label>> {
        let query = "query { issueLabels { nodes { id name color } } }";
        let data: LabelsData = self.request(query, json!({})).await?;
        Ok(data.issue_labels.nodes)
    }

    async fn workflow_states(&self, team_id: Option<&str>) -> Result<Vec<WorkflowState>> {
        let (query, variables) = match team_id {
            Some(id) => (
                "query($teamId: ID) { \
                 workflowStates(filter: { team: { id: { eq: $teamId } } }) { \
                 nodes { id name type } } }",
                json!({ "teamId": id }),
            ),
            None => (
                "query { workflowStates { nodes { id name type } } }",
                json!({}),
            ),
        };

        let data: WorkflowStatesData = self.request(query, variables).await?;
        Ok(data.workflow_states.nodes)
    }
}

// GraphQL envelope types

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: User,
}

#[derive(Debug, Deserialize)]
struct TeamsData {
    teams: Connection<Team>,
}

#[derive(Debug, Deserialize)]
struct IssueData {
    issue: Option<Issue>,
}

#[derive(Debug, Deserialize)]
struct IssuesData {
    issues: Connection<Issue>,
}

#[derive(Debug, Deserialize)]
struct IssueRelationsData {
    issue: Option<IssueRelationsNode>,
}

#[derive(Debug, Deserialize)]
struct IssueRelationsNode {
    team: Option<Team>,
    assignee: Option<User>,
    labels: Option<Connection<Label>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateData {
    issue_create: MutationPayload<Issue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueUpdateData {
    issue_update: MutationPayload<Issue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueArchiveData {
    issue_archive: ArchivePayload,
}

#[derive(Debug, Deserialize)]
struct ArchivePayload {
    success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentCreateData {
    comment_create: CommentPayload,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    success: bool,
    comment: Option<Comment>,
}

#[derive(Debug, Deserialize)]
struct MutationPayload<T> {
    success: bool,
    issue: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ProjectsData {
    projects: Connection<Project>,
}

#[derive(Debug, Deserialize)]
struct UsersData {
    users: Connection<User>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelsData {
    issue_labels: Connection<Label>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowStatesData {
    workflow_states: Connection<WorkflowState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LinearClient::new("lin_api_test").unwrap();
        assert_eq!(client.endpoint, DEFAULT_ENDPOINT);

        let client = client.with_endpoint("http://localhost:4000/graphql");
        assert_eq!(client.endpoint, "http://localhost:4000/graphql");
    }

    #[test]
    fn test_build_issue_filter_empty() {
        let filter = LinearClient::build_issue_filter(&SearchFilters::default());
        assert_eq!(filter, json!({}));
    }

    #[test]
    fn test_build_issue_filter_full() {
        let filters = SearchFilters {
            query: Some("login".to_string()),
            states: vec!["In Progress".to_string()],
            assignees: vec!["alice".to_string()],
            labels: vec!["bug".to_string()],
            priorities: vec![1, 2],
            team_id: Some("team-1".to_string()),
            project_id: Some("proj-1".to_string()),
            limit: Some(10),
            newest_first: true,
        };

        let filter = LinearClient::build_issue_filter(&filters);
        assert_eq!(filter["team"]["id"]["eq"], "team-1");
        assert_eq!(filter["project"]["id"]["eq"], "proj-1");
        assert_eq!(filter["state"]["name"]["in"][0], "In Progress");
        assert_eq!(filter["assignee"]["displayName"]["in"][0], "alice");
        assert_eq!(filter["labels"]["name"]["in"][0], "bug");
        assert_eq!(filter["priority"]["in"], json!([1, 2]));
        assert_eq!(filter["title"]["containsIgnoreCase"], "login");
    }

    #[test]
    fn test_graphql_envelope_with_errors() {
        let body = r#"{"errors": [{"message": "Entity not found"}]}"#;
        let envelope: GraphQlResponse<IssueData> = serde_json::from_str(body).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.unwrap()[0].message, "Entity not found");
    }

    #[test]
    fn test_mutation_payload_shape() {
        let body = r#"{
            "issueCreate": {
                "success": true,
                "issue": {"id": "u1", "identifier": "ENG-1", "title": "T"}
            }
        }"#;
        let data: IssueCreateData = serde_json::from_str(body).unwrap();
        assert!(data.issue_create.success);
        assert_eq!(data.issue_create.issue.unwrap().identifier, "ENG-1");
    }
}
