pub mod asset_store;
pub mod background_removal;
pub mod identity;
pub mod image;
pub mod session;
pub mod sqlx_repo;
pub mod user;
