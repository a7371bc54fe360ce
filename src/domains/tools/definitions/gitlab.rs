//! GitLab tool - proxies project, issue, and pipeline operations against
//! the GitLab REST API.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::core::config::CredentialsConfig;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::Parameters;
use crate::domains::tools::spec::{ActionSpec, ParamType, Tool};

/// Thin client over the GitLab REST API.
#[derive(Debug, Clone)]
pub struct GitlabClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GitlabClient {
    pub fn new(credentials: &CredentialsConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: credentials.gitlab_api_url.trim_end_matches('/').to_string(),
            token: credentials.gitlab_token.clone(),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Private-Token", token),
            None => builder,
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GitLab GET {}", url);
        let response = self
            .request(self.http.get(&url))
            .query(query)
            .send()
            .await?;
        Self::into_json(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GitLab POST {}", url);
        let response = self.request(self.http.post(&url)).json(&body).send().await?;
        Self::into_json(response).await
    }

    async fn into_json(response: reqwest::Response) -> Result<Value, ToolError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ToolError::backend_status(
                status.as_u16(),
                format!("GitLab API error: {}", body),
            ));
        }
        serde_json::from_str(&body)
            .map_err(|e| ToolError::backend(format!("GitLab API returned malformed JSON: {}", e)))
    }

    /// List all projects accessible by the authenticated user.
    pub async fn list_projects(&self, _params: Parameters) -> Result<Value, ToolError> {
        self.get("/projects", &[]).await
    }

    /// Get details for a specific project.
    pub async fn get_project(&self, params: Parameters) -> Result<Value, ToolError> {
        let project_id = params.require_str("projectId")?;
        self.get(&format!("/projects/{}", project_id), &[]).await
    }

    /// Search for projects.
    pub async fn search_projects(&self, params: Parameters) -> Result<Value, ToolError> {
        let query = params.require_str("query")?;
        self.get("/search", &[("scope", "projects"), ("search", query)])
            .await
    }

    /// Get issues for a project.
    pub async fn get_issues(&self, params: Parameters) -> Result<Value, ToolError> {
        let project_id = params.require_str("projectId")?;
        let state = params.str_opt("state").unwrap_or("opened");
        self.get(
            &format!("/projects/{}/issues", project_id),
            &[("state", state)],
        )
        .await
    }

    /// Create a new issue in a project.
    pub async fn create_issue(&self, params: Parameters) -> Result<Value, ToolError> {
        let project_id = params.require_str("projectId")?;
        let title = params.require_str("title")?;
        let description = params.str_opt("description").unwrap_or("");
        self.post(
            &format!("/projects/{}/issues", project_id),
            json!({ "title": title, "description": description }),
        )
        .await
    }

    /// Get pipelines for a project.
    pub async fn get_pipelines(&self, params: Parameters) -> Result<Value, ToolError> {
        let project_id = params.require_str("projectId")?;
        self.get(&format!("/projects/{}/pipelines", project_id), &[])
            .await
    }
}

/// The `gitlab` tool.
pub struct GitlabTool {
    client: GitlabClient,
}

impl GitlabTool {
    pub const NAME: &'static str = "gitlab";

    pub fn new(credentials: &CredentialsConfig) -> Self {
        Self {
            client: GitlabClient::new(credentials),
        }
    }
}

impl Tool for GitlabTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec::builder(
                "listProjects",
                "List all projects accessible by the authenticated user",
            )
            .returns("array", "List of project objects")
            .handler({
                let client = self.client.clone();
                move |params| {
                    let client = client.clone();
                    async move { client.list_projects(params).await }
                }
            }),
            ActionSpec::builder("getProject", "Get details for a specific project")
                .required("projectId", ParamType::String, "GitLab project ID")
                .returns("object", "Project details")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.get_project(params).await }
                    }
                }),
            ActionSpec::builder("searchProjects", "Search for projects on GitLab")
                .required("query", ParamType::String, "Search query")
                .returns("object", "Search results")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.search_projects(params).await }
                    }
                }),
            ActionSpec::builder("getIssues", "Get issues for a project")
                .required("projectId", ParamType::String, "GitLab project ID")
                .with_default(
                    "state",
                    ParamType::String,
                    "Issue state (opened, closed, all)",
                    json!("opened"),
                )
                .returns("array", "List of issue objects")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.get_issues(params).await }
                    }
                }),
            ActionSpec::builder("createIssue", "Create a new issue in a project")
                .required("projectId", ParamType::String, "GitLab project ID")
                .required("title", ParamType::String, "Issue title")
                .with_default(
                    "description",
                    ParamType::String,
                    "Issue description",
                    json!(""),
                )
                .returns("object", "Created issue")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.create_issue(params).await }
                    }
                }),
            ActionSpec::builder("getPipelines", "Get pipelines for a project")
                .required("projectId", ParamType::String, "GitLab project ID")
                .returns("array", "List of pipeline objects")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.get_pipelines(params).await }
                    }
                }),
        ]
    }
}
