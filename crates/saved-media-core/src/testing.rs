use async_trait::async_trait;
use saved_media_backend::{BackendError, SavedMediaApi};
use saved_media_models::{AuthTokens, Collection, ItemKey, SavedItem, ToggleResponse, UserProfile};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Held toggle reply; a failing gate drops the connection once released
struct Gate {
    release: oneshot::Receiver<()>,
    fails: bool,
}

/// In-memory stand-in for the REST backend.
///
/// The server-side watchlist flips when a toggle call arrives; the response
/// can be held back with a gate to simulate slow or reordered replies.
#[derive(Default)]
pub struct FakeApi {
    token: Mutex<Option<String>>,
    server: Mutex<Collection>,
    legacy: Mutex<Vec<SavedItem>>,
    offline: Mutex<bool>,
    fail_fetch: Mutex<bool>,
    reject_token: Mutex<bool>,
    fail_profile: Mutex<bool>,
    gates: Mutex<VecDeque<Gate>>,
    arrivals: Mutex<Option<mpsc::UnboundedSender<u64>>>,
    pub toggle_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_items(items: Vec<SavedItem>) -> Self {
        let api = Self::new();
        *api.server.lock().unwrap() = Collection::from_items(items);
        api
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    /// Only the list endpoint fails; login and toggles keep working
    pub fn set_fail_fetch(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }

    pub fn set_reject_token(&self, reject: bool) {
        *self.reject_token.lock().unwrap() = reject;
    }

    /// Login works but the profile endpoint answers 500
    pub fn set_fail_profile(&self, fail: bool) {
        *self.fail_profile.lock().unwrap() = fail;
    }

    pub fn set_legacy_favorites(&self, items: Vec<SavedItem>) {
        *self.legacy.lock().unwrap() = items;
    }

    pub fn server_contains(&self, id: u64) -> bool {
        self.server.lock().unwrap().contains(&ItemKey::Id(id))
    }

    /// Next toggle call waits for the returned sender before responding
    pub fn push_gate(&self) -> oneshot::Sender<()> {
        self.push(false)
    }

    /// Like `push_gate`, but the call fails with a network error after the
    /// gate opens and the server never records the toggle
    pub fn push_failing_gate(&self) -> oneshot::Sender<()> {
        self.push(true)
    }

    fn push(&self, fails: bool) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(Gate { release: rx, fails });
        tx
    }

    /// Receives the movie id of every toggle call as it reaches the server
    pub fn arrivals(&self) -> mpsc::UnboundedReceiver<u64> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.arrivals.lock().unwrap() = Some(tx);
        rx
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if *self.offline.lock().unwrap() {
            return Err(BackendError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_token(&self) -> Result<(), BackendError> {
        if self.token.lock().unwrap().is_none() {
            return Err(BackendError::NotAuthenticated);
        }
        if *self.reject_token.lock().unwrap() {
            return Err(BackendError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl SavedMediaApi for FakeApi {
    fn is_authenticated(&self) -> bool {
        self.token.lock().unwrap().is_some()
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn toggle_watchlist(&self, movie_id: u64) -> Result<ToggleResponse, BackendError> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.check_token()?;

        let gate = self.gates.lock().unwrap().pop_front();
        let fails = gate.as_ref().is_some_and(|gate| gate.fails);

        let added = fails || {
            let mut server = self.server.lock().unwrap();
            let key = ItemKey::Id(movie_id);
            if server.contains(&key) {
                server.remove(&key);
                false
            } else {
                server.insert_front(SavedItem::new(movie_id, format!("movie-{}", movie_id), "server copy"));
                true
            }
        };

        if let Some(tx) = self.arrivals.lock().unwrap().as_ref() {
            let _ = tx.send(movie_id);
        }
        if let Some(gate) = gate {
            let _ = gate.release.await;
        }
        if fails {
            return Err(BackendError::Network("connection reset".to_string()));
        }
        Ok(ToggleResponse { added })
    }

    async fn fetch_watchlist(&self) -> Result<Vec<SavedItem>, BackendError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if *self.fail_fetch.lock().unwrap() {
            return Err(BackendError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        self.check_token()?;
        Ok(self.server.lock().unwrap().items().to_vec())
    }

    async fn fetch_legacy_favorites(&self) -> Result<Vec<SavedItem>, BackendError> {
        self.check_online()?;
        self.check_token()?;
        Ok(self.legacy.lock().unwrap().clone())
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, BackendError> {
        self.check_online()?;
        if password != "secret" {
            return Err(BackendError::Status {
                status: 400,
                body: "invalid credentials".to_string(),
            });
        }
        Ok(AuthTokens {
            access_token: format!("token-for-{}", email),
        })
    }

    async fn register(&self, email: &str, password: &str, _name: &str) -> Result<AuthTokens, BackendError> {
        self.login(email, password).await
    }

    async fn profile(&self) -> Result<UserProfile, BackendError> {
        self.check_online()?;
        self.check_token()?;
        if *self.fail_profile.lock().unwrap() {
            return Err(BackendError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        let token = self.token.lock().unwrap().clone().unwrap_or_default();
        Ok(UserProfile {
            id: 1,
            email: token.trim_start_matches("token-for-").to_string(),
            name: Some("Viewer".to_string()),
            role: Some("user".to_string()),
            created_at: None,
        })
    }
}

pub fn item(id: u64) -> SavedItem {
    SavedItem::new(id, format!("movie-{}", id), format!("Movie {}", id))
}
