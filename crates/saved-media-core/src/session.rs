use crate::error::SessionError;
use chrono::{DateTime, Utc};
use saved_media_backend::SavedMediaApi;
use saved_media_config::CredentialStore;
use saved_media_models::UserProfile;
use std::sync::Arc;
use tracing::{info, warn};

/// Current user and credential.
///
/// The stored token is what makes requests authenticated; the profile is
/// what makes the user count as signed in.
pub struct AuthSession {
    api: Arc<dyn SavedMediaApi>,
    credentials: CredentialStore,
    user: Option<UserProfile>,
    auth_checked: bool,
}

fn credentials_error(e: anyhow::Error) -> SessionError {
    SessionError::Credentials(e.to_string())
}

impl AuthSession {
    pub fn new(api: Arc<dyn SavedMediaApi>, credentials: CredentialStore) -> Self {
        Self {
            api,
            credentials,
            user: None,
            auth_checked: false,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// When the stored credential was issued
    pub fn signed_in_since(&self) -> Option<DateTime<Utc>> {
        self.credentials.get_token_issued_at()
    }

    /// Account the stored credential belongs to, known even when the
    /// profile could not be loaded
    pub fn stored_email(&self) -> Option<&str> {
        self.credentials.get_email().map(String::as_str)
    }

    /// True once `restore`, `login` or `register` has finished (either way)
    pub fn auth_checked(&self) -> bool {
        self.auth_checked
    }

    /// Pick up a stored credential on startup and load the profile for it.
    ///
    /// A credential the backend rejects is forgotten. A network failure keeps
    /// it for next time.
    pub async fn restore(&mut self) -> Result<(), SessionError> {
        let result = self.restore_inner().await;
        self.auth_checked = true;
        result
    }

    async fn restore_inner(&mut self) -> Result<(), SessionError> {
        self.credentials.load().map_err(credentials_error)?;
        let Some(token) = self.credentials.get_access_token().cloned() else {
            self.api.set_access_token(None);
            return Ok(());
        };

        self.api.set_access_token(Some(token));
        match self.api.profile().await {
            Ok(profile) => {
                info!("Restored session for {}", profile.email);
                self.user = Some(profile);
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                info!("Stored credential was rejected, signing out");
                self.forget_credential()?;
                Ok(())
            }
            Err(e) => {
                warn!("Could not load profile for stored credential: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&UserProfile, SessionError> {
        let result = self.api.login(email, password).await;
        self.auth_checked = true;
        let tokens = result?;
        self.start_session(email, tokens.access_token).await
    }

    pub async fn register(&mut self, email: &str, password: &str, name: &str) -> Result<&UserProfile, SessionError> {
        let result = self.api.register(email, password, name).await;
        self.auth_checked = true;
        let tokens = result?;
        self.start_session(email, tokens.access_token).await
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.forget_credential()?;
        info!("Signed out");
        Ok(())
    }

    /// The credential is only kept once the profile for it has loaded, so a
    /// token never outlives a failed sign-in.
    async fn start_session(&mut self, email: &str, access_token: String) -> Result<&UserProfile, SessionError> {
        self.api.set_access_token(Some(access_token.clone()));
        let profile = match self.api.profile().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Signed in but the profile could not be loaded: {}", e);
                self.api.set_access_token(None);
                return Err(e.into());
            }
        };

        self.credentials.set_access_token(access_token);
        self.credentials.set_email(email.to_string());
        if let Err(e) = self.credentials.save() {
            self.api.set_access_token(None);
            self.credentials.clear_session();
            return Err(credentials_error(e));
        }

        info!("Signed in as {}", profile.email);
        let profile: &UserProfile = self.user.insert(profile);
        Ok(profile)
    }

    fn forget_credential(&mut self) -> Result<(), SessionError> {
        self.user = None;
        self.api.set_access_token(None);
        self.credentials.clear_session();
        self.credentials.save().map_err(credentials_error)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user.as_ref().map(|u| &u.email))
            .field("auth_checked", &self.auth_checked)
            .finish()
    }
}
