use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use nowplaying_status_core::StatusPayload;
use nowplaying_status_engine::StatusPublisher;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

const CLIENT_USER_AGENT: &str = "nowplaying-status";

const CHANGE_USER_STATUS: &str = "mutation($input: ChangeUserStatusInput!) { \
     changeUserStatus(input: $input) { status { emoji message } } }";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ChangeUserStatusData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChangeUserStatusData {
    #[serde(rename = "changeUserStatus")]
    change_user_status: Option<ChangeUserStatus>,
}

#[derive(Debug, Deserialize)]
struct ChangeUserStatus {
    status: Option<UserStatus>,
}

#[derive(Debug, Deserialize)]
struct UserStatus {
    emoji: Option<String>,
    message: Option<String>,
}

pub struct GitHubStatusClient {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl GitHubStatusClient {
    pub fn new(token: impl Into<String>, api_url: &str) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("a GitHub token is required to publish the profile status");
        }
        let endpoint = Url::parse(api_url)
            .with_context(|| format!("invalid GitHub API url {api_url}"))?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        })
    }

    async fn change_user_status(&self, input: Value) -> Result<Option<StatusPayload>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .json(&request_body(input))
            .send()
            .await
            .context("github graphql request failed")?;

        let status = response.status();
        debug!(%status, "changeUserStatus request to github");

        let body = response
            .text()
            .await
            .context("failed to read github response")?;
        if !status.is_success() {
            bail!("github returned {status}: {}", body.trim());
        }

        parse_response(&body)
    }
}

#[async_trait]
impl StatusPublisher for GitHubStatusClient {
    async fn publish(&self, status: &StatusPayload) -> Result<Option<StatusPayload>> {
        self.change_user_status(json!({
            "emoji": status.emoji,
            "message": status.message,
        }))
        .await
    }

    async fn clear(&self) -> Result<bool> {
        self.change_user_status(json!({})).await?;
        Ok(true)
    }
}

fn request_body(input: Value) -> Value {
    json!({
        "query": CHANGE_USER_STATUS,
        "variables": { "input": input },
    })
}

fn parse_response(body: &str) -> Result<Option<StatusPayload>> {
    let parsed: GraphQlResponse =
        serde_json::from_str(body).context("invalid JSON from github graphql")?;

    if !parsed.errors.is_empty() {
        let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
        bail!("github graphql error: {}", messages.join("; "));
    }

    Ok(parsed
        .data
        .and_then(|d| d.change_user_status)
        .and_then(|c| c.status)
        .map(|s| StatusPayload {
            emoji: s.emoji.unwrap_or_default(),
            message: s.message,
        }))
}
