//! Application state shared across handlers.

use std::sync::Arc;

use pickntrust_core::Settings;
use pickntrust_store::Database;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Content database.
    pub db: Arc<Database>,
    /// Runtime settings (admin password, environment).
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(config: ApiConfig, db: Arc<Database>, settings: Settings) -> Self {
        Self {
            config: Arc::new(config),
            db,
            settings: Arc::new(settings),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use pickntrust_core::Environment;
    use tempfile::tempdir;

    pub const TEST_PASSWORD: &str = "s3cret";

    /// State over a fresh on-disk database with an admin password set.
    pub fn make_test_state() -> AppState {
        make_test_state_in(Environment::Development)
    }

    pub fn make_test_state_in(environment: Environment) -> AppState {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pickntrust.sqlite");
        std::mem::forget(dir);

        let settings = Settings {
            database_path: path.clone(),
            admin_password: Some(TEST_PASSWORD.to_string()),
            environment,
            ..Settings::default()
        };

        AppState::new(
            ApiConfig::default(),
            Arc::new(Database::open(&path).unwrap()),
            settings,
        )
    }
}
