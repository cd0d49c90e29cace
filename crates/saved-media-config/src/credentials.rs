use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Persistent holder of the session credential.
///
/// Plays the role the session cookie plays in the browser: whoever holds an
/// access token here is treated as signed in.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_access_token(&self) -> Option<&String> {
        self.get("access_token").filter(|token| !token.is_empty())
    }

    /// Store a freshly issued token, stamping when it was received
    pub fn set_access_token(&mut self, token: String) {
        self.set("access_token".to_string(), token);
        self.set("token_issued_at".to_string(), Utc::now().to_rfc3339());
    }

    pub fn get_token_issued_at(&self) -> Option<DateTime<Utc>> {
        self.get("token_issued_at")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn get_email(&self) -> Option<&String> {
        self.get("email")
    }

    pub fn set_email(&mut self, email: String) {
        self.set("email".to_string(), email);
    }

    /// Forget everything tied to the current session
    pub fn clear_session(&mut self) {
        self.remove("access_token");
        self.remove("token_issued_at");
        self.remove("email");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_access_token("jwt-token".to_string());
        store.set_email("viewer@example.vn".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.get_access_token(), Some(&"jwt-token".to_string()));
        assert_eq!(loaded_store.get_email(), Some(&"viewer@example.vn".to_string()));
        let issued = loaded_store.get_token_issued_at().unwrap();
        assert!((Utc::now() - issued).num_seconds().abs() < 5);
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/unused"));
        store.set("access_token".to_string(), String::new());
        assert_eq!(store.get_access_token(), None);
    }

    #[test]
    fn test_clear_session() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/unused"));
        store.set_access_token("t".to_string());
        store.set_email("e@x.vn".to_string());
        store.set("unrelated".to_string(), "kept".to_string());

        store.clear_session();
        assert_eq!(store.get_access_token(), None);
        assert_eq!(store.get_email(), None);
        assert!(store.get_token_issued_at().is_none());
        assert_eq!(store.get("unrelated"), Some(&"kept".to_string()));
    }
}
