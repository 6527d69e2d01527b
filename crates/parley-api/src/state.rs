//! Application state wiring all services together.
//!
//! `AppState` pins the generic chat service to the concrete infra
//! implementations (SQLite repository, Gemini provider) and carries the
//! loaded configuration.

use std::sync::Arc;

use parley_core::chat::service::ChatService;
use parley_infra::config::{load_config, provider_api_key, resolve_data_dir};
use parley_infra::llm::gemini::GeminiProvider;
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::DatabasePool;
use parley_types::config::Config;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, GeminiProvider>;

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub config: Config,
}

impl AppState {
    /// Initialize the application state: load config, resolve the API
    /// key, connect to the database, wire the service.
    ///
    /// Fails fast on a missing or placeholder API key -- the process must
    /// not come up unable to answer any chat request.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        let api_key = provider_api_key()?;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display());
        let db_pool = DatabasePool::new(&db_url).await?;

        let repo = SqliteChatRepository::new(db_pool.clone());
        let provider = GeminiProvider::new(api_key, config.model.clone());
        let chat_service = ChatService::new(repo, provider, config.context_cache_capacity);

        Ok(Self {
            chat_service: Arc::new(chat_service),
            config,
        })
    }
}
