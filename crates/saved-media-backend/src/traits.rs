use crate::error::BackendError;
use async_trait::async_trait;
use saved_media_models::{AuthTokens, SavedItem, ToggleResponse, UserProfile};

/// The site's REST backend, as far as saved media and sessions go.
#[async_trait]
pub trait SavedMediaApi: Send + Sync {
    /// An access credential is currently held
    fn is_authenticated(&self) -> bool;

    /// Hand the client a credential (or take it away on logout)
    fn set_access_token(&self, token: Option<String>);

    // Saved media
    async fn toggle_watchlist(&self, movie_id: u64) -> Result<ToggleResponse, BackendError>;
    async fn fetch_watchlist(&self) -> Result<Vec<SavedItem>, BackendError>;

    /// Read-only access to the older per-user favorites endpoint
    async fn fetch_legacy_favorites(&self) -> Result<Vec<SavedItem>, BackendError>;

    // Session
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, BackendError>;
    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthTokens, BackendError>;
    async fn profile(&self) -> Result<UserProfile, BackendError>;
}
