//! Session token generation.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};

/// Create a new opaque session token: 32 bytes of OS randomness,
/// URL-safe base64 without padding. Unforgeable and collision-resistant;
/// the registry's unique constraint catches the astronomically rare
/// collision and the orchestrator regenerates.
pub fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    #[test]
    fn token_decodes_to_32_bytes() {
        let decoded_len = generate_session_token()
            .ok()
            .and_then(|token| URL_SAFE_NO_PAD.decode(token.as_bytes()).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn tokens_are_unique() {
        let first = generate_session_token().ok();
        let second = generate_session_token().ok();
        assert!(first.is_some());
        assert_ne!(first, second);
    }
}
