pub mod clients;
pub mod db;
pub mod imaging;
pub mod utils;
