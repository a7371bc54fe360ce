//! GitHub tool - proxies repository and issue operations against the
//! GitHub REST API.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::core::config::CredentialsConfig;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::Parameters;
use crate::domains::tools::spec::{ActionSpec, ParamType, Tool};

/// Thin client over the GitHub REST API.
///
/// Cheap to clone; the underlying `reqwest::Client` is shared.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(credentials: &CredentialsConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: credentials.github_api_url.trim_end_matches('/').to_string(),
            token: credentials.github_token.clone(),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("token {}", token)),
            None => builder,
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GitHub GET {}", url);
        let response = self
            .request(self.http.get(&url))
            .query(query)
            .send()
            .await?;
        Self::into_json(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GitHub POST {}", url);
        let response = self.request(self.http.post(&url)).json(&body).send().await?;
        Self::into_json(response).await
    }

    async fn into_json(response: reqwest::Response) -> Result<Value, ToolError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ToolError::backend_status(
                status.as_u16(),
                format!("GitHub API error: {}", body),
            ));
        }
        serde_json::from_str(&body)
            .map_err(|e| ToolError::backend(format!("GitHub API returned malformed JSON: {}", e)))
    }

    /// List repositories for a user or organization.
    pub async fn list_repos(&self, params: Parameters) -> Result<Value, ToolError> {
        let username = params.require_str("username")?;
        self.get(&format!("/users/{}/repos", username), &[]).await
    }

    /// Get details for a specific repository.
    pub async fn get_repo(&self, params: Parameters) -> Result<Value, ToolError> {
        let owner = params.require_str("owner")?;
        let repo = params.require_str("repo")?;
        self.get(&format!("/repos/{}/{}", owner, repo), &[]).await
    }

    /// Search for repositories.
    pub async fn search_repos(&self, params: Parameters) -> Result<Value, ToolError> {
        let query = params.require_str("query")?;
        self.get("/search/repositories", &[("q", query)]).await
    }

    /// Get issues for a repository.
    pub async fn get_issues(&self, params: Parameters) -> Result<Value, ToolError> {
        let owner = params.require_str("owner")?;
        let repo = params.require_str("repo")?;
        let state = params.str_opt("state").unwrap_or("open");
        self.get(
            &format!("/repos/{}/{}/issues", owner, repo),
            &[("state", state)],
        )
        .await
    }

    /// Create a new issue in a repository.
    pub async fn create_issue(&self, params: Parameters) -> Result<Value, ToolError> {
        let owner = params.require_str("owner")?;
        let repo = params.require_str("repo")?;
        let title = params.require_str("title")?;
        let body = params.str_opt("body").unwrap_or("");
        self.post(
            &format!("/repos/{}/{}/issues", owner, repo),
            json!({ "title": title, "body": body }),
        )
        .await
    }
}

/// The `github` tool.
pub struct GithubTool {
    client: GithubClient,
}

impl GithubTool {
    pub const NAME: &'static str = "github";

    pub fn new(credentials: &CredentialsConfig) -> Self {
        Self {
            client: GithubClient::new(credentials),
        }
    }
}

impl Tool for GithubTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec::builder("listRepos", "List repositories for a user or organization")
                .required(
                    "username",
                    ParamType::String,
                    "GitHub username or organization name",
                )
                .returns("array", "List of repository objects")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.list_repos(params).await }
                    }
                }),
            ActionSpec::builder("getRepo", "Get details for a specific repository")
                .required("owner", ParamType::String, "Repository owner")
                .required("repo", ParamType::String, "Repository name")
                .returns("object", "Repository details")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.get_repo(params).await }
                    }
                }),
            ActionSpec::builder("searchRepos", "Search for repositories")
                .required("query", ParamType::String, "Search query")
                .returns("object", "Search results")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.search_repos(params).await }
                    }
                }),
            ActionSpec::builder("getIssues", "Get issues for a repository")
                .required("owner", ParamType::String, "Repository owner")
                .required("repo", ParamType::String, "Repository name")
                .with_default(
                    "state",
                    ParamType::String,
                    "Issue state (open, closed, all)",
                    json!("open"),
                )
                .returns("array", "List of issue objects")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.get_issues(params).await }
                    }
                }),
            ActionSpec::builder("createIssue", "Create a new issue in a repository")
                .required("owner", ParamType::String, "Repository owner")
                .required("repo", ParamType::String, "Repository name")
                .required("title", ParamType::String, "Issue title")
                .with_default("body", ParamType::String, "Issue body", json!(""))
                .returns("object", "Created issue")
                .handler({
                    let client = self.client.clone();
                    move |params| {
                        let client = client.clone();
                        async move { client.create_issue(params).await }
                    }
                }),
        ]
    }
}
