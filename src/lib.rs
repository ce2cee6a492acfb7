use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod telemetry;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{clients, db, imaging, utils};

use clients::{cloudinary::CloudinaryClient, identity::HttpIdentityProvider, remove_bg::RemoveBgClient};
use repositories::{
    asset_store::AssetStore,
    background_removal::BackgroundRemover,
    identity::IdentityProvider,
    image::ImageRepository,
    session::SessionRepository,
    sqlx_repo::{SqlxImageRepo, SqlxSessionRepo, SqlxUserRepo},
    user::UserRepository,
};
use use_cases::{auth::AuthHandler, images::ImageHandler, processing::ImageProcessor};

pub struct AppState {
    pub auth_handler: AuthHandler,
    pub image_handler: ImageHandler,
    pub image_processor: ImageProcessor,
}

/// Every collaborator the handlers need, created once at startup.
#[derive(Clone)]
pub struct AppParts {
    pub user_repo: Arc<dyn UserRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub image_repo: Arc<dyn ImageRepository>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub remover: Arc<dyn BackgroundRemover>,
    pub asset_store: Arc<dyn AssetStore>,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Self> {
        let asset_store: Arc<dyn AssetStore> = Arc::new(CloudinaryClient::new(config)?);

        let parts = AppParts {
            user_repo: Arc::new(SqlxUserRepo::new(pool.clone())),
            session_repo: Arc::new(SqlxSessionRepo::new(pool.clone())),
            image_repo: Arc::new(SqlxImageRepo::new(pool)),
            identity_provider: Arc::new(HttpIdentityProvider::new(config)?),
            remover: Arc::new(RemoveBgClient::new(config)?),
            asset_store,
        };

        Ok(Self::from_parts(config, parts))
    }

    pub fn from_parts(config: &settings::AppConfig, parts: AppParts) -> Self {
        let folder_root = config.asset_folder_root.clone();

        AppState {
            auth_handler: AuthHandler::new(
                parts.user_repo,
                parts.session_repo,
                parts.identity_provider,
                config.session_ttl(),
            ),
            image_handler: ImageHandler::new(
                parts.image_repo.clone(),
                parts.asset_store.clone(),
                folder_root.clone(),
            ),
            image_processor: ImageProcessor::new(
                parts.image_repo,
                parts.remover,
                parts.asset_store,
                folder_root,
            ),
        }
    }
}
