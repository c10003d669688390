//! Health probing against the installed storage backend.

use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report overall health: `ok` when a storage backend is installed and
/// answering, `degraded` otherwise.
pub async fn check_health(state: &SharedState) -> HealthResponse {
    let Some(store) = state.store().await else {
        return HealthResponse::degraded();
    };

    match store.health_check().await {
        Ok(()) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{memory::MemoryStore, question_bank::StaticQuestionBank},
        state::AppState,
    };

    #[tokio::test]
    async fn degraded_until_a_store_is_installed() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(StaticQuestionBank::default()),
        );

        let health = check_health(&state).await;
        assert!(health.degraded);

        state.install_store(Arc::new(MemoryStore::new())).await;
        let health = check_health(&state).await;
        assert_eq!(health.status, "ok");
        assert!(!health.degraded);

        state.clear_store().await;
        assert!(check_health(&state).await.degraded);
    }
}
