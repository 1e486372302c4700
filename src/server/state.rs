//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;

use crate::chat::{ChatService, ChatTransport};
use crate::config::AppConfig;
use crate::core::SessionId;
use crate::llm::GeminiClient;
use crate::parser::ResponseParser;
use crate::storage::{InMemorySessionStore, SessionStore, SqliteSessionStore};
use crate::workflow::{Conversation, UiState};

/// Shared application state.
pub struct AppState {
    /// Effective configuration.
    pub config: AppConfig,
    /// Chat and image transport.
    pub chat: Arc<dyn ChatTransport>,
    /// Session persistence.
    pub store: Arc<dyn SessionStore>,
    /// Reconciler driver.
    pub conversation: Conversation,
    /// UI state per session. Not persisted; the last writer wins.
    pub ui: DashMap<SessionId, UiState>,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    ///
    /// # Errors
    /// Returns an error if the response parser cannot be compiled.
    pub fn new(
        config: AppConfig,
        chat: Arc<dyn ChatTransport>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Arc<Self>, regex::Error> {
        let parser = Arc::new(ResponseParser::new()?);
        let conversation = Conversation::new(Arc::clone(&chat), Arc::clone(&store), parser);
        Ok(Arc::new(Self {
            config,
            chat,
            store,
            conversation,
            ui: DashMap::new(),
        }))
    }

    /// Build the Gemini client, the chat service and the configured store.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a collaborator
    /// cannot be created.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Arc<Self>> {
        config.validate().context("invalid configuration")?;

        let model = Arc::new(GeminiClient::new(config.gemini.clone()).context("failed to build Gemini client")?);
        let chat: Arc<dyn ChatTransport> = Arc::new(ChatService::new(model, config.retry.delays()));

        let store: Arc<dyn SessionStore> = if config.storage.is_in_memory() {
            tracing::info!("using in-memory session store");
            Arc::new(InMemorySessionStore::new())
        } else {
            tracing::info!(path = %config.storage.sqlite_path, "using SQLite session store");
            Arc::new(
                SqliteSessionStore::open(&config.storage.sqlite_path)
                    .await
                    .context("failed to open session database")?,
            )
        };

        Self::new(config, chat, store).context("failed to compile response parser")
    }

    /// UI state of a session, default when none is recorded.
    #[must_use]
    pub fn ui_state(&self, id: SessionId) -> UiState {
        self.ui.get(&id).map(|entry| entry.value().clone()).unwrap_or_default()
    }
}
