use std::sync::Arc;

use crate::agent::WebSearchAgent;
use crate::core::config::{
    AppPaths, ConfigService, EmbeddingSettings, LlmSettings, SearchProviderSettings,
    SearchSettings, ServerSettings,
};
use crate::llm::{build_embedding_provider, build_llm_provider};
use crate::tools::build_search_provider;

pub mod error;

use error::InitializationError;

/// Shared by every route. Provider handles inside `agent` are read-only, so
/// concurrent requests never contend on anything here.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub server: ServerSettings,
    pub agent: Arc<WebSearchAgent>,
}

impl AppState {
    /// Loads and validates the config, then wires search, embedding and chat
    /// providers into the agent.
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let values = config
            .load_validated()
            .map_err(InitializationError::Config)?;

        let server = ServerSettings::from_config(&values);
        let search = SearchSettings::from_config(&values);
        let search_provider = SearchProviderSettings::from_config(&values)
            .map_err(InitializationError::Provider)?;
        let llm_settings = LlmSettings::from_config(&values).map_err(InitializationError::Provider)?;
        let embedding_settings = EmbeddingSettings::from_config(&values);

        let search_provider = build_search_provider(&search_provider);
        let llm = build_llm_provider(&llm_settings);
        let embeddings = build_embedding_provider(&embedding_settings);

        tracing::info!(
            search = search_provider.name(),
            llm = llm.name(),
            embeddings = embeddings.name(),
            rewrite_query = search.rewrite_query,
            "Providers configured"
        );

        let agent = Arc::new(WebSearchAgent::new(
            llm,
            embeddings,
            search_provider,
            llm_settings,
            search,
        ));

        Ok(Self::from_parts(paths, server, agent))
    }

    pub fn from_parts(
        paths: Arc<AppPaths>,
        server: ServerSettings,
        agent: Arc<WebSearchAgent>,
    ) -> Arc<Self> {
        Arc::new(AppState {
            config: ConfigService::new(paths.clone()),
            paths,
            server,
            agent,
        })
    }
}
