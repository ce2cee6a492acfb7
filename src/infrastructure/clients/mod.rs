pub mod cloudinary;
pub mod identity;
pub mod remove_bg;
