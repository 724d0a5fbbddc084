use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes from the OS generator, hex encoded. 32 bytes yields 64 chars.
pub fn generate_hex_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn is_hex_token(value: &str, bytes: usize) -> bool {
    value.len() == bytes * 2 && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}
