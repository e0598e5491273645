pub use crate::api::{ApiClient, GoalPage, LoginResponse, UploadResponse};
pub use crate::assist::AssistClient;
pub use crate::channel::{ChannelConnector, ChannelState, ChatChannel};
pub use crate::chat::ChatSession;
pub use crate::chat::attachments::{FileKind, PickedFile, classify_file_name, format_file_size};
pub use crate::chat::grouping::{DateGroup, date_label, group_messages};
pub use crate::chat::message::{Attachment, Message, MessageContent, MessageKind, Sender, WireMessage};
pub use crate::chat::playback::{AudioOutput, PlaybackError, PlaybackManager};
pub use crate::chat::transport::{MessageTransport, TransportConnector};
pub use crate::chat::voice::{
    CaptureBackend, CaptureError, CaptureHandle, CapturedAudio, RecorderState, VoiceRecorder,
};
pub use crate::error::{Result, StrideError};
pub use crate::session_store::{RememberedCredentials, Session, SessionStore};
pub use crate::types::User;

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt::Layer, prelude::*, registry::Registry};

pub mod api;
pub mod assist;
pub mod channel;
pub mod chat;
mod error;
pub mod session_store;
pub mod types;

static TRACING_GUARDS: OnceLock<Mutex<Option<(WorkerGuard, WorkerGuard)>>> = OnceLock::new();
static TRACING_INIT: OnceLock<()> = OnceLock::new();

fn init_tracing(logs_dir: &Path) {
    TRACING_INIT.get_or_init(|| {
        let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix("stride")
            .filename_suffix("log")
            .build(logs_dir)
            .expect("Failed to create file appender");

        let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
        let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

        TRACING_GUARDS
            .set(Mutex::new(Some((file_guard, stdout_guard))))
            .ok();

        let stdout_layer = Layer::new()
            .with_writer(non_blocking_stdout)
            .with_ansi(true)
            .with_target(true);

        let file_layer = Layer::new()
            .with_writer(non_blocking_file)
            .with_ansi(false)
            .with_target(true);

        Registry::default()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(stdout_layer)
            .with(file_layer)
            .init();
    });
}

#[derive(Clone, Debug)]
pub struct StrideConfig {
    /// Directory for application data
    pub data_dir: PathBuf,

    /// Directory for application logs
    pub logs_dir: PathBuf,

    /// Base URL of the main API (auth, users, friends, goals)
    pub api_url: String,

    /// Base URL of the chat server (history, upload, real-time channel)
    pub chat_url: String,
}

impl StrideConfig {
    pub fn new(data_dir: &Path, logs_dir: &Path) -> Self {
        let env_suffix = if cfg!(debug_assertions) {
            "dev"
        } else {
            "release"
        };
        let formatted_data_dir = data_dir.join(env_suffix);
        let formatted_logs_dir = logs_dir.join(env_suffix);

        // Endpoint defaults follow the build profile; .env entries override
        // both for development against a local backend
        let _ = dotenvy::dotenv();
        let (default_api, default_chat) = if cfg!(debug_assertions) {
            ("http://localhost:8080", "http://localhost:4000")
        } else {
            ("https://api.stride.app", "https://chat.stride.app")
        };
        let api_url = std::env::var("STRIDE_API_URL").unwrap_or_else(|_| default_api.to_string());
        let chat_url =
            std::env::var("STRIDE_CHAT_URL").unwrap_or_else(|_| default_chat.to_string());

        Self {
            data_dir: formatted_data_dir,
            logs_dir: formatted_logs_dir,
            api_url,
            chat_url,
        }
    }

    /// WebSocket endpoint of the chat server, derived from its HTTP base URL.
    pub fn chat_ws_url(&self) -> String {
        self.chat_url.replacen("http", "ws", 1)
    }
}

/// The application handle the shell constructs once at startup. Owns the
/// persisted session, the HTTP client, and the factories for the chat
/// pipeline. There is no global auth context: the session is an explicit
/// value handed to every component that needs it.
pub struct Stride {
    pub config: StrideConfig,
    session_store: SessionStore,
    api: Arc<ApiClient>,
    session: Option<Session>,
}

impl Stride {
    /// Initializes the Stride client core with the provided configuration.
    ///
    /// This method sets up the data and log directories, configures logging,
    /// opens the session store, and loads any persisted session so a
    /// returning user is signed in without retyping credentials.
    ///
    /// # Arguments
    ///
    /// * `config` - A [`StrideConfig`] specifying directories and endpoints.
    ///
    /// # Returns
    ///
    /// Returns a [`Result`] containing a ready [`Stride`] instance on
    /// success, or a [`StrideError`] if initialization fails.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The data or log directories cannot be created.
    /// - The session store exists but cannot be read.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use stride::{Stride, StrideConfig};
    /// # use std::path::Path;
    /// # async fn example() -> Result<(), stride::StrideError> {
    /// let config = StrideConfig::new(Path::new("./data"), Path::new("./logs"));
    /// let stride = Stride::initialize_stride(config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn initialize_stride(config: StrideConfig) -> Result<Self> {
        let data_dir = &config.data_dir;
        let logs_dir = &config.logs_dir;

        // Setup directories
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))
            .map_err(StrideError::from)?;
        std::fs::create_dir_all(logs_dir)
            .with_context(|| format!("Failed to create logs directory: {:?}", logs_dir))
            .map_err(StrideError::from)?;

        // Only initialize tracing once
        init_tracing(logs_dir);

        tracing::debug!("Logging initialized in directory: {:?}", logs_dir);

        let session_store = SessionStore::new(data_dir);
        let session = session_store.load_session()?;
        if let Some(session) = &session {
            tracing::debug!(
                target: "stride::init",
                "Restored session for user {} ({})",
                session.user.username,
                session.user.id
            );
        }

        let api = Arc::new(ApiClient::new(&config.api_url, &config.chat_url));

        Ok(Self {
            config,
            session_store,
            api,
            session,
        })
    }

    pub fn api(&self) -> Arc<ApiClient> {
        self.api.clone()
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.session_store
    }

    /// The signed-in user's session, if any.
    pub fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Exchanges credentials for a session, persists it, and records the
    /// email for prefilling the next login form. With `remember` set the
    /// credential pair itself is kept (obfuscated) for one-tap login;
    /// otherwise any previously remembered pair is dropped.
    pub async fn login(&mut self, email: &str, password: &str, remember: bool) -> Result<Session> {
        let response = self.api.login(email, password).await?;
        let session = Session {
            user: response.user,
            token: response.token,
        };

        self.session_store.save_session(&session)?;
        self.session_store.set_last_email(email)?;
        if remember {
            self.session_store
                .remember_credentials(&RememberedCredentials {
                    email: email.to_string(),
                    password: password.to_string(),
                })?;
        } else {
            self.session_store.forget_credentials()?;
        }

        tracing::debug!(
            target: "stride::auth",
            "Logged in as {} ({})",
            session.user.username,
            session.user.id
        );
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Registers a new account. The caller follows up with [`login`](Self::login).
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        self.api.register(username, email, password).await
    }

    /// Destroys the session in memory and on disk.
    pub async fn logout(&mut self) -> Result<()> {
        tracing::debug!(target: "stride::auth", "Logging out");
        self.session_store.clear_session()?;
        self.session = None;
        Ok(())
    }

    /// Builds a chat session for one chat screen instance, wired to the
    /// configured chat server. Requires a signed-in session.
    pub fn chat_session(&self) -> Result<ChatSession> {
        let session = self
            .session
            .clone()
            .ok_or(StrideError::SessionRequired)?;
        let connector = Arc::new(ChannelConnector::new(&self.config.chat_ws_url()));
        Ok(ChatSession::new(self.api.clone(), session, connector))
    }
}

impl std::fmt::Debug for Stride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stride")
            .field("config", &self.config)
            .field("signed_in", &self.session.is_some())
            .field("session_store", &"<REDACTED>")
            .finish()
    }
}
