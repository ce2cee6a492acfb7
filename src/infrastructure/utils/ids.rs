use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

const SHORT_ID_LEN: usize = 12;

fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..SHORT_ID_LEN])
}

pub fn new_user_id() -> String {
    short_id("user")
}

pub fn new_image_id() -> String {
    short_id("img")
}

/// Opaque bearer credential: 32 bytes from the OS RNG, hex encoded.
pub fn mint_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("sess_{}", hex::encode(bytes))
}
