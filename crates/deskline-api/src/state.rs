use std::sync::Arc;

use tracing::error;

use deskline_db::Database;

use crate::error::ApiError;
use crate::identity::SessionKeys;
use crate::messaging::MessagingGateway;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub keys: SessionKeys,
    pub gateway: Arc<dyn MessagingGateway>,
    /// Template used to deliver login codes.
    pub otp_template: String,
}

/// Runs blocking store work off the async runtime.
pub async fn blocking<F, T, E>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(Into::into)
}
