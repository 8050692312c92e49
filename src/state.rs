use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::{
    appointments::repo::{AppointmentRepo, PgAppointmentRepo},
    auth::repo::{PgUserRepo, UserRepo},
    config::AppConfig,
    lawyers::repo::{LawyerRepo, PgLawyerRepo},
    storage::{LocalStorage, StorageClient},
};

/// Handles shared by every request. Built once at startup, never mutated.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub appointments: Arc<dyn AppointmentRepo>,
    pub lawyers: Arc<dyn LawyerRepo>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        info!("connected to database");

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }

        let storage = LocalStorage::new(config.upload_dir.clone()).await?;
        info!(upload_dir = %storage.root().display(), "upload storage ready");

        Ok(Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgAppointmentRepo::new(db.clone())),
            Arc::new(PgLawyerRepo::new(db)),
            Arc::new(storage),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        appointments: Arc<dyn AppointmentRepo>,
        lawyers: Arc<dyn LawyerRepo>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            config,
            users,
            appointments,
            lawyers,
            storage,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory stores, nothing touches the network or disk.
    pub fn fake() -> Self {
        use crate::{
            appointments::repo::memory::MemoryAppointmentRepo,
            auth::repo::memory::MemoryUserRepo, lawyers::repo::memory::MemoryLawyerRepo,
            storage::memory::MemoryStorage,
        };

        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryAppointmentRepo::default()),
            Arc::new(MemoryLawyerRepo::default()),
            Arc::new(MemoryStorage::default()),
        )
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_users(mut self, users: Arc<dyn UserRepo>) -> Self {
        self.users = users;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageClient>) -> Self {
        self.storage = storage;
        self
    }
}
