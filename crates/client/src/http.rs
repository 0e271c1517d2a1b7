//! Authenticated fetch wrapper over `reqwest`.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use mizan_auth::{AccessToken, Credentials, TokenPair};

use crate::token_store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStore, TokenStoreError};

pub const TOKEN_PATH: &str = "/api/token/";
pub const TOKEN_REFRESH_PATH: &str = "/api/token/refresh/";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Storage(#[from] TokenStoreError),
}

impl ClientError {
    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(status, _) => Some(*status),
            _ => None,
        }
    }
}

/// HTTP client for the backend.
///
/// Every request carries `Authorization: Bearer <access_token>` when a token
/// is stored. There is no retry and no implicit token refresh.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, tokens)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// `base_url` + `path`; `path` is expected to start with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.tokens.get(ACCESS_TOKEN_KEY), Ok(Some(_)))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ClientError> {
        Ok(match self.tokens.get(ACCESS_TOKEN_KEY)? {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await.map_err(|e| ClientError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "backend returned non-success status");
            return Err(ClientError::Api(status.as_u16(), body));
        }

        resp.json::<T>().await.map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Authenticated GET returning decoded JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let req = self.authorize(self.http.get(&url))?;
        self.send(req).await
    }

    /// Authenticated POST of a JSON body returning decoded JSON.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let req = self.authorize(self.http.post(&url).json(body))?;
        self.send(req).await
    }

    /// Exchange credentials for a token pair and store both tokens.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ClientError> {
        let req = self.http.post(self.url(TOKEN_PATH)).json(credentials);
        let pair: TokenPair = self.send(req).await?;

        self.tokens.set(ACCESS_TOKEN_KEY, &pair.access)?;
        self.tokens.set(REFRESH_TOKEN_KEY, &pair.refresh)?;
        tracing::info!(username = %credentials.username, "signed in");
        Ok(pair)
    }

    /// Trade the stored refresh token for a new access token.
    pub async fn refresh_access_token(&self) -> Result<(), ClientError> {
        let refresh = self
            .tokens
            .get(REFRESH_TOKEN_KEY)?
            .ok_or(ClientError::NotAuthenticated)?;

        let req = self
            .http
            .post(self.url(TOKEN_REFRESH_PATH))
            .json(&serde_json::json!({ "refresh": refresh }));
        let token: AccessToken = self.send(req).await?;

        self.tokens.set(ACCESS_TOKEN_KEY, &token.access)?;
        if let Some(rotated) = &token.refresh {
            self.tokens.set(REFRESH_TOKEN_KEY, rotated)?;
        }
        tracing::info!(rotated = token.refresh.is_some(), "access token refreshed");
        Ok(())
    }

    /// Forget both tokens.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.tokens.remove(ACCESS_TOKEN_KEY)?;
        self.tokens.remove(REFRESH_TOKEN_KEY)?;
        tracing::info!("signed out");
        Ok(())
    }
}
