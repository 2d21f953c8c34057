use super::types::{PageProbe, RepoDetail, RepoSummary};
use super::RepositoryHost;
use crate::config::{Config, Credentials};
use crate::error::HostError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = concat!("orgrank/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Error body GitHub sends alongside non-2xx statuses.
#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(
        base_url: &str,
        credentials: Option<&Credentials>,
        timeout: Duration,
    ) -> Result<Self, HostError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        if let Some(credentials) = credentials {
            headers.insert(AUTHORIZATION, credentials.authorization());
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self, HostError> {
        Self::new(
            &config.api_base_url,
            Some(credentials),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, HostError> {
        debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());

        Err(HostError::Status {
            status,
            url: url.to_string(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, HostError> {
        let response = self.get(url, query).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| HostError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn probe(&self, url: &str, query: &[(&str, &str)]) -> Result<PageProbe, HostError> {
        let response = self.get(url, query).await?;
        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Ok(PageProbe::new(link))
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn list_org_repos(&self, org: &str, per_page: u32) -> Result<Vec<RepoSummary>, HostError> {
        let url = format!("{}/orgs/{}/repos", self.base_url, org);
        let per_page = per_page.to_string();
        self.get_json(
            &url,
            &[
                ("sort", "stars"),
                ("direction", "desc"),
                ("per_page", per_page.as_str()),
                ("type", "public"),
            ],
        )
        .await
    }

    async fn repo_detail(&self, org: &str, repo: &str) -> Result<RepoDetail, HostError> {
        let url = format!("{}/repos/{}/{}", self.base_url, org, repo);
        self.get_json(&url, &[]).await
    }

    async fn closed_pulls_probe(&self, org: &str, repo: &str) -> Result<PageProbe, HostError> {
        let url = format!("{}/repos/{}/{}/pulls", self.base_url, org, repo);
        self.probe(&url, &[("state", "closed"), ("per_page", "1")])
            .await
    }

    async fn releases_probe(&self, org: &str, repo: &str) -> Result<PageProbe, HostError> {
        let url = format!("{}/repos/{}/{}/releases", self.base_url, org, repo);
        self.probe(&url, &[("per_page", "1")]).await
    }
}
