use crate::auth_watcher::AuthWatcher;
use crate::error::{ReconcileError, SessionError};
use crate::migration::{cleanup_expired_backup, migrate, BackupCleanup, MigrationOutcome};
use crate::reconcile::{HydrateOutcome, Reconciler, ToggleOutcome, WatchlistState};
use crate::session::AuthSession;
use chrono::{DateTime, Duration, Utc};
use saved_media_backend::SavedMediaApi;
use saved_media_config::CredentialStore;
use saved_media_models::{SavedItem, UserProfile};
use saved_media_store::CollectionStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened during [`SavedMediaClient::start`]
#[derive(Debug, Clone, PartialEq)]
pub struct StartReport {
    pub migration: MigrationOutcome,
    pub backup: BackupCleanup,
    pub restore_error: Option<String>,
    /// Set when the restored session triggered a hydrate
    pub hydrated: Option<HydrateOutcome>,
    pub hydrate_error: Option<String>,
}

/// Session, saved-media collection and local storage wired together the
/// way an app instance uses them.
pub struct SavedMediaClient {
    session: AuthSession,
    watcher: AuthWatcher,
    reconciler: Arc<Reconciler>,
    store: CollectionStore,
    backup_retention: Duration,
}

impl SavedMediaClient {
    pub fn new(
        api: Arc<dyn SavedMediaApi>,
        store: CollectionStore,
        credentials: CredentialStore,
        backup_retention: Duration,
    ) -> Self {
        Self {
            session: AuthSession::new(api.clone(), credentials),
            watcher: AuthWatcher::new(),
            reconciler: Arc::new(Reconciler::new(api, store.clone())),
            store,
            backup_retention,
        }
    }

    /// App-load sequence: migrate legacy storage, drop an expired backup,
    /// restore the stored session and hydrate if that signed the user in.
    pub async fn start(&mut self, now: DateTime<Utc>) -> StartReport {
        let migration = migrate(&self.store, now, self.backup_retention);
        if matches!(migration, MigrationOutcome::Migrated { .. }) {
            self.reconciler.reload();
        }
        let backup = cleanup_expired_backup(&self.store, now);

        let restore_error = self.session.restore().await.err().map(|e| e.to_string());

        let (hydrated, hydrate_error) = match self.on_auth_change().await {
            Some(Ok(outcome)) => (Some(outcome), None),
            Some(Err(e)) => (None, Some(e.to_string())),
            None => (None, None),
        };

        StartReport {
            migration,
            backup,
            restore_error,
            hydrated,
            hydrate_error,
        }
    }

    /// Hydrates when the session has just become signed in.
    async fn on_auth_change(&mut self) -> Option<Result<HydrateOutcome, ReconcileError>> {
        let signed_in = self
            .watcher
            .observe(self.session.is_authenticated(), self.session.auth_checked());
        if !signed_in {
            return None;
        }
        debug!("Sign-in detected, hydrating watchlist");
        Some(self.reconciler.hydrate().await)
    }

    /// Sign in. A failed hydrate afterwards is not an error here: the stale
    /// collection stays and the failure shows up in [`WatchlistState::error`].
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, SessionError> {
        let profile = self.session.login(email, password).await?.clone();
        if let Some(Err(e)) = self.on_auth_change().await {
            warn!("Hydrate after login failed: {}", e);
        }
        Ok(profile)
    }

    pub async fn register(&mut self, email: &str, password: &str, name: &str) -> Result<UserProfile, SessionError> {
        let profile = self.session.register(email, password, name).await?.clone();
        if let Some(Err(e)) = self.on_auth_change().await {
            warn!("Hydrate after registration failed: {}", e);
        }
        Ok(profile)
    }

    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.session.logout()?;
        // Re-arms the watcher for the next sign-in
        self.on_auth_change().await;
        Ok(())
    }

    pub async fn toggle(&self, item: SavedItem) -> Result<ToggleOutcome, ReconcileError> {
        self.reconciler.toggle(item).await
    }

    /// Explicit re-fetch from the backend
    pub async fn refresh(&self) -> Result<HydrateOutcome, ReconcileError> {
        self.reconciler.hydrate().await
    }

    pub fn snapshot(&self) -> WatchlistState {
        self.reconciler.snapshot()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.user()
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn reconciler(&self) -> Arc<Reconciler> {
        self.reconciler.clone()
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }
}

impl std::fmt::Debug for SavedMediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavedMediaClient")
            .field("session", &self.session)
            .field("reconciler", &self.reconciler)
            .finish()
    }
}
