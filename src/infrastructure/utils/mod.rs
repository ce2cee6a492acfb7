pub mod ids;
pub mod upload;
