use crate::config::AppConfig;
use crate::llm::LlmProvider;
use crate::shared::utils::DbPool;
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub conn: DbPool,
    pub llm_provider: Arc<dyn LlmProvider>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            conn: self.conn.clone(),
            llm_provider: Arc::clone(&self.llm_provider),
        }
    }
}
