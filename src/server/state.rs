use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::{
    config::Settings,
    error::{AppError, AppResult},
    manager::AttendanceManager,
};

pub struct AppState {
    pub settings: Settings,
    manager: Arc<Mutex<AttendanceManager>>,
}

impl AppState {
    pub fn new(settings: Settings) -> AppResult<Arc<Self>> {
        info!("Opening database {}", settings.database.url);
        let manager = AttendanceManager::open(&settings.database.url)?;

        Ok(Self::with_manager(settings, manager))
    }

    pub fn with_manager(settings: Settings, manager: AttendanceManager) -> Arc<Self> {
        Arc::new(Self {
            settings,
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    /// Runs `op` against the store on the blocking pool.
    ///
    /// SQLite calls may wait on the busy timeout, so they never run on a runtime worker.
    pub async fn with_store<T, F>(&self, op: F) -> AppResult<T>
    where
        F: FnOnce(&mut AttendanceManager) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let manager = Arc::clone(&self.manager);

        tokio::task::spawn_blocking(move || {
            let mut guard = manager
                .lock()
                .map_err(|_| AppError::Internal("attendance store lock poisoned".to_string()))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| {
            error!("Store task failed: {e}");
            AppError::Internal(format!("store task failed: {e}"))
        })?
    }
}
