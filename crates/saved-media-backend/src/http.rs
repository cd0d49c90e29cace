use crate::dto::{WireAuth, WireList, WireProfile, WireToggle};
use crate::error::BackendError;
use crate::traits::SavedMediaApi;
use crate::url::normalize_base_url;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use saved_media_config::BackendConfig;
use saved_media_models::{AuthTokens, SavedItem, ToggleResponse, UserProfile};
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};

/// reqwest-backed client for the site's REST API.
///
/// Holds the bearer token in memory; the session layer is responsible for
/// persisting it.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: &str, force_https: bool, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = normalize_base_url(base_url, force_https)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cuongphim/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {}", e)))?;
        debug!("Backend base URL: {}", base_url);
        Ok(Self {
            client,
            base_url,
            access_token: RwLock::new(None),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            &config.base_url,
            config.force_https,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn require_token(&self) -> Result<String, BackendError> {
        self.token().ok_or(BackendError::NotAuthenticated)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T, BackendError> {
        let response = request.send().await?;
        let response = check_status(response, what).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Could not decode {} response: {}", what, e);
            BackendError::Decode(format!("{}: {}", what, e))
        })
    }

    async fn fetch_list(&self, path: &str, what: &str) -> Result<Vec<SavedItem>, BackendError> {
        let token = self.require_token()?;
        let request = self.authorized(self.client.get(self.endpoint(path)), &token);
        let list: WireList = self.send_json(request, what).await?;
        let items = list.into_items();
        debug!("Fetched {} ({} items)", what, items.len());
        Ok(items)
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }
    let body = response.text().await.unwrap_or_default();
    warn!("{} failed: {} - {}", what, status, body);
    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SavedMediaApi for HttpBackend {
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    fn set_access_token(&self, token: Option<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token.filter(|t| !t.is_empty());
    }

    async fn toggle_watchlist(&self, movie_id: u64) -> Result<ToggleResponse, BackendError> {
        let token = self.require_token()?;
        let url = self.endpoint(&format!("/movies/{}/watchlist", movie_id));
        let request = self.authorized(self.client.post(url), &token);
        let wire: WireToggle = self.send_json(request, "watchlist toggle").await?;
        Ok(wire.into())
    }

    async fn fetch_watchlist(&self) -> Result<Vec<SavedItem>, BackendError> {
        self.fetch_list("/movies/watchlist", "watchlist").await
    }

    async fn fetch_legacy_favorites(&self) -> Result<Vec<SavedItem>, BackendError> {
        self.fetch_list("/user/favorites", "legacy favorites").await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, BackendError> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let request = self
            .client
            .post(self.endpoint("/auth/login"))
            .header("Accept", "application/json")
            .json(&payload);
        let wire: WireAuth = self.send_json(request, "login").await?;
        Ok(wire.into())
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthTokens, BackendError> {
        let payload = serde_json::json!({ "email": email, "password": password, "name": name });
        let request = self
            .client
            .post(self.endpoint("/auth/register"))
            .header("Accept", "application/json")
            .json(&payload);
        let wire: WireAuth = self.send_json(request, "register").await?;
        Ok(wire.into())
    }

    async fn profile(&self) -> Result<UserProfile, BackendError> {
        let token = self.require_token()?;
        let request = self.authorized(self.client.get(self.endpoint("/auth/profile")), &token);
        let wire: WireProfile = self.send_json(request, "profile").await?;
        wire.into_profile()
            .ok_or_else(|| BackendError::Decode("profile: user id is not numeric".to_string()))
    }
}
