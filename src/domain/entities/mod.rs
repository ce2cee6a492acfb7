pub mod image;
pub mod option_fields;
pub mod session;
pub mod user;
