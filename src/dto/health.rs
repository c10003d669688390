use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
/// Health payload returned by the healthcheck endpoint.
pub struct HealthResponse {
    /// Overall status string (`ok` or `degraded`).
    pub status: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

impl HealthResponse {
    /// Healthy response.
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            degraded: false,
        }
    }

    /// Degraded-mode response.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".into(),
            degraded: true,
        }
    }
}
