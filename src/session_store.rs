use std::{
    fs,
    path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose};
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

use crate::types::User;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("No session stored")]
    SessionNotFound,
}

pub type Result<T> = std::result::Result<T, SessionStoreError>;

/// The authenticated user's identity: profile snapshot plus bearer token.
/// Created at login, loaded from disk at startup, destroyed on logout.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Remembered login credentials, stored obfuscated on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberedCredentials {
    pub email: String,
    pub password: String,
}

/// Key-value store for the persisted client state: the session snapshot,
/// last-used email, an optional remembered credential pair, and the one-time
/// promotional banner flag. Entries live in a single JSON file with no schema
/// versioning, matching what the backend expects of clients.
///
/// Credential values are obfuscated with a per-device XOR key before hitting
/// disk. This is not cryptography; it only keeps passwords out of casual
/// reads of the data directory.
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn device_key(&self) -> Result<Vec<u8>> {
        let uuid_file = self.data_dir.join("stride_uuid");

        let uuid = if uuid_file.exists() {
            fs::read_to_string(&uuid_file)?
                .parse::<Uuid>()
                .map_err(SessionStoreError::UuidError)?
        } else {
            let new_uuid = Uuid::new_v4();
            fs::create_dir_all(&self.data_dir)?;
            fs::write(uuid_file, new_uuid.to_string())?;
            new_uuid
        };

        Ok(uuid.as_bytes().to_vec())
    }

    fn file_path(&self) -> PathBuf {
        self.data_dir.join("stride.json")
    }

    fn obfuscate(&self, data: &str) -> Result<String> {
        let device_key = self.device_key()?;
        let xored: Vec<u8> = data
            .as_bytes()
            .iter()
            .zip(device_key.iter().cycle())
            .map(|(&x1, &x2)| x1 ^ x2)
            .collect();
        Ok(general_purpose::STANDARD_NO_PAD.encode(xored))
    }

    fn deobfuscate(&self, data: &str) -> Result<String> {
        let device_key = self.device_key()?;
        let decoded = general_purpose::STANDARD_NO_PAD.decode(data)?;
        let xored: Vec<u8> = decoded
            .iter()
            .zip(device_key.iter().cycle())
            .map(|(&x1, &x2)| x1 ^ x2)
            .collect();
        String::from_utf8(xored).map_err(SessionStoreError::Utf8Error)
    }

    fn read_entries(&self) -> Result<Value> {
        let content = match fs::read_to_string(self.file_path()) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::from("{}"),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn write_entries(&self, entries: &Value) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(self.file_path(), content)?;
        Ok(())
    }

    /// Persists the session snapshot so the next launch can log in without
    /// asking for credentials again.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or(json!({}));
        entries["token"] = json!(session.token);
        entries["user"] = serde_json::to_value(&session.user)?;
        self.write_entries(&entries)
    }

    /// Loads the persisted session. Returns `None` on a fresh install or when
    /// the stored entries are malformed (malformed entries are logged and
    /// treated as absent rather than failing startup).
    pub fn load_session(&self) -> Result<Option<Session>> {
        let entries = self.read_entries()?;
        let token = match entries["token"].as_str() {
            Some(token) => token.to_string(),
            None => return Ok(None),
        };
        let user: User = match serde_json::from_value(entries["user"].clone()) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(
                    target: "stride::session_store",
                    "Ignoring malformed persisted user snapshot: {}",
                    e
                );
                return Ok(None);
            }
        };
        Ok(Some(Session { user, token }))
    }

    /// Removes the session snapshot and token. Remembered credentials and the
    /// last-used email survive logout.
    pub fn clear_session(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if let Some(obj) = entries.as_object_mut() {
            obj.remove("token");
            obj.remove("user");
        }
        self.write_entries(&entries)
    }

    pub fn set_last_email(&self, email: &str) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or(json!({}));
        entries["last_email"] = json!(email);
        self.write_entries(&entries)
    }

    pub fn last_email(&self) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries["last_email"].as_str().map(String::from))
    }

    pub fn remember_credentials(&self, credentials: &RememberedCredentials) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or(json!({}));
        entries["remembered_email"] = json!(self.obfuscate(&credentials.email)?);
        entries["remembered_password"] = json!(self.obfuscate(&credentials.password)?);
        self.write_entries(&entries)
    }

    pub fn remembered_credentials(&self) -> Result<Option<RememberedCredentials>> {
        let entries = self.read_entries()?;
        let (email, password) = match (
            entries["remembered_email"].as_str(),
            entries["remembered_password"].as_str(),
        ) {
            (Some(email), Some(password)) => (email, password),
            _ => return Ok(None),
        };
        Ok(Some(RememberedCredentials {
            email: self.deobfuscate(email)?,
            password: self.deobfuscate(password)?,
        }))
    }

    pub fn forget_credentials(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if let Some(obj) = entries.as_object_mut() {
            obj.remove("remembered_email");
            obj.remove("remembered_password");
        }
        self.write_entries(&entries)
    }

    pub fn mark_promo_banner_shown(&self) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or(json!({}));
        entries["promo_banner_shown"] = json!(true);
        self.write_entries(&entries)
    }

    pub fn promo_banner_shown(&self) -> Result<bool> {
        let entries = self.read_entries()?;
        Ok(entries["promo_banner_shown"].as_bool().unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_temp_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp directory")
    }

    fn test_session() -> Session {
        Session {
            user: User {
                id: 42,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                role: String::new(),
            },
            token: "token-abc123".to_string(),
        }
    }

    #[test]
    fn test_save_and_load_session() -> Result<()> {
        let temp_dir = setup_temp_dir();
        let store = SessionStore::new(temp_dir.path());
        let session = test_session();

        store.save_session(&session)?;
        let loaded = store.load_session()?.expect("session should exist");

        assert_eq!(loaded, session);
        Ok(())
    }

    #[test]
    fn test_load_session_fresh_install() -> Result<()> {
        let temp_dir = setup_temp_dir();
        let store = SessionStore::new(temp_dir.path());

        assert!(store.load_session()?.is_none());
        Ok(())
    }

    #[test]
    fn test_clear_session_keeps_last_email() -> Result<()> {
        let temp_dir = setup_temp_dir();
        let store = SessionStore::new(temp_dir.path());

        store.set_last_email("alice@example.com")?;
        store.save_session(&test_session())?;
        store.clear_session()?;

        assert!(store.load_session()?.is_none());
        assert_eq!(
            store.last_email()?,
            Some("alice@example.com".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_remember_and_forget_credentials() -> Result<()> {
        let temp_dir = setup_temp_dir();
        let store = SessionStore::new(temp_dir.path());
        let credentials = RememberedCredentials {
            email: "alice@example.com".to_string(),
            password: "hunter2".to_string(),
        };

        assert!(store.remembered_credentials()?.is_none());

        store.remember_credentials(&credentials)?;
        let recalled = store
            .remembered_credentials()?
            .expect("credentials should exist");
        assert_eq!(recalled, credentials);

        // Password must not appear in plain text on disk
        let raw = std::fs::read_to_string(temp_dir.path().join("stride.json")).unwrap();
        assert!(!raw.contains("hunter2"));

        store.forget_credentials()?;
        assert!(store.remembered_credentials()?.is_none());
        Ok(())
    }

    #[test]
    fn test_promo_banner_flag() -> Result<()> {
        let temp_dir = setup_temp_dir();
        let store = SessionStore::new(temp_dir.path());

        assert!(!store.promo_banner_shown()?);
        store.mark_promo_banner_shown()?;
        assert!(store.promo_banner_shown()?);
        Ok(())
    }

    #[test]
    fn test_malformed_user_entry_is_ignored() -> Result<()> {
        let temp_dir = setup_temp_dir();
        let store = SessionStore::new(temp_dir.path());

        store.save_session(&test_session())?;

        // Corrupt the user snapshot while keeping the file valid JSON
        let path = temp_dir.path().join("stride.json");
        let mut entries: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        entries["user"] = json!("not-an-object");
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        assert!(store.load_session()?.is_none());
        Ok(())
    }
}
