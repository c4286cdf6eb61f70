// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GitHub OAuth and REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::json;

use super::types::{AccessToken, GitHubUser, Repository, TokenExchangeResponse};
use crate::config::GitHubOAuthConfig;

/// Scopes requested at authorization: profile plus private repository reads.
pub const OAUTH_SCOPES: &str = "read:user repo";

const USER_AGENT: &str = concat!("profile-verifier-server/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const REPOS_PER_PAGE: usize = 100;
const MAX_REPO_PAGES: usize = 10;

/// Identity-provider operations used by the OAuth flow and the proxy.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Client id and secret are both configured.
    fn is_configured(&self) -> bool;

    /// Authorization URL embedding `state`.
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError>;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError>;

    /// The user the token belongs to.
    async fn fetch_user(&self, token: &AccessToken) -> Result<GitHubUser, ProviderError>;

    /// Repositories owned by the token's user, private ones included.
    async fn list_repositories(&self, token: &AccessToken)
        -> Result<Vec<Repository>, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("GitHub OAuth is not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("GitHub rejected the access token")]
    Unauthorized,

    #[error("GitHub rejected the request: {0}")]
    Rejected(String),

    #[error("GitHub request failed: {0}")]
    Request(String),

    #[error("GitHub response was invalid: {0}")]
    InvalidResponse(String),
}

/// reqwest-backed GitHub client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    config: GitHubOAuthConfig,
    http: Client,
}

impl GitHubClient {
    pub fn new(config: GitHubOAuthConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    fn client_credentials(&self) -> Result<(&str, &str), ProviderError> {
        let client_id = self
            .config
            .client_id
            .as_deref()
            .ok_or(ProviderError::NotConfigured("GITHUB_CLIENT_ID"))?;
        let client_secret = self
            .config
            .client_secret
            .as_deref()
            .ok_or(ProviderError::NotConfigured("GITHUB_CLIENT_SECRET"))?;
        Ok((client_id, client_secret))
    }

    fn api_get(&self, path: &str, token: &AccessToken) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.config.api_base_url, path))
            .bearer_auth(token.secret())
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }
}

#[async_trait]
impl IdentityProvider for GitHubClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        let client_id = self
            .config
            .client_id
            .as_deref()
            .ok_or(ProviderError::NotConfigured("GITHUB_CLIENT_ID"))?;

        let mut url = url::Url::parse(&format!(
            "{}/login/oauth/authorize",
            self.config.oauth_base_url
        ))
        .map_err(|e| ProviderError::Request(format!("invalid GitHub OAuth base URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", OAUTH_SCOPES)
            .append_pair("state", state);

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        let (client_id, client_secret) = self.client_credentials()?;

        let response = self
            .http
            .post(format!("{}/login/oauth/access_token", self.config.oauth_base_url))
            .header(header::ACCEPT, "application/json")
            .json(&json!({
                "client_id": client_id,
                "client_secret": client_secret,
                "code": code,
                "redirect_uri": self.config.redirect_uri,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        match (body.access_token, body.error) {
            (_, Some(error)) => Err(ProviderError::Rejected(
                body.error_description.unwrap_or(error),
            )),
            (Some(token), None) if !token.is_empty() => Ok(AccessToken::new(token)),
            _ => Err(ProviderError::InvalidResponse(
                "missing access_token".to_string(),
            )),
        }
    }

    async fn fetch_user(&self, token: &AccessToken) -> Result<GitHubUser, ProviderError> {
        let response = self
            .api_get("/user", token)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ProviderError::Unauthorized),
            status if !status.is_success() => Err(ProviderError::Rejected(format!(
                "GET /user returned {status}"
            ))),
            _ => response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string())),
        }
    }

    async fn list_repositories(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<Repository>, ProviderError> {
        let mut repositories = Vec::new();

        for page in 1..=MAX_REPO_PAGES {
            let response = self
                .api_get("/user/repos", token)
                .query(&[
                    ("affiliation", "owner".to_string()),
                    ("sort", "updated".to_string()),
                    ("per_page", REPOS_PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await
                .map_err(|e| ProviderError::Request(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                return Err(ProviderError::Unauthorized);
            }
            if !status.is_success() {
                return Err(ProviderError::Rejected(format!(
                    "GET /user/repos returned {status}"
                )));
            }

            let batch: Vec<Repository> = response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
            let last_page = batch.len() < REPOS_PER_PAGE;
            repositories.extend(batch);
            if last_page {
                break;
            }
        }

        Ok(repositories)
    }
}
