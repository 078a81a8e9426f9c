pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod openai_api;
pub mod plans;
pub mod scanner;
pub mod suggest;
pub mod webdav;

mod routes;

use catalog::CatalogSession;
use config::AppConfig;
use database::{Database, StoreError};
use openai_api::OpenAiClient;
use plans::PlanBook;
use std::sync::Arc;
use suggest::{SuggestError, Suggester};
use tokio::sync::Mutex;
use webdav::{DavError, NextcloudClient};

pub use routes::build_router;

const DB_FILE: &str = "planner.db";

/// Shared application state for the HTTP handlers.
pub struct AppState {
    pub config: AppConfig,
    /// Catalog rebuilds and selection changes hold this lock for their whole run.
    pub session: Mutex<CatalogSession>,
    pub plans: PlanBook,
    /// `None` when no model API key is configured.
    pub suggester: Option<Suggester<OpenAiClient>>,
    /// `None` unless the remote share is fully configured.
    pub nextcloud: Option<NextcloudClient>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Suggest(#[from] SuggestError),
    #[error(transparent)]
    Dav(#[from] DavError),
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        std::fs::create_dir_all(&config.data_dir).map_err(|source| StartupError::DataDir {
            path: config.data_dir.display().to_string(),
            source,
        })?;
        let db = Database::new(&config.data_dir.join(DB_FILE))?;
        let plans = PlanBook::open(db);

        let suggester = match config.openai.api_key.as_deref() {
            Some(key) => Some(Suggester::new(
                OpenAiClient::new(&config.openai, key)?,
                &config.openai.model,
                &config.openai.fallback_model,
            )),
            None => {
                log::warn!("OPENAI_API_KEY is not set; suggestions are disabled");
                None
            }
        };

        let nextcloud = if config.nextcloud.is_configured() {
            Some(NextcloudClient::new(&config.nextcloud)?)
        } else {
            log::info!("Nextcloud is not configured; remote samples are disabled");
            None
        };

        let mut session = CatalogSession::new();
        for folder in &config.local_folders {
            if folder.is_dir() {
                session.connect_folder(folder);
            } else {
                log::warn!("Skipping local folder {}: not a directory", folder.display());
            }
        }
        if !session.local_roots().is_empty() {
            session.refresh();
        }

        Ok(AppState {
            config,
            session: Mutex::new(session),
            plans,
            suggester,
            nextcloud,
        })
    }
}

/// Entry point: reads the environment, builds state and serves the API.
pub async fn run() -> Result<(), StartupError> {
    env_logger::init();

    let config = AppConfig::from_env();
    let host = config.host.clone();
    let port = config.port;
    let state = Arc::new(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    log::info!("Post planner running on http://{}:{}", host, port);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
