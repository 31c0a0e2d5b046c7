//! Wire prefixes that mark a body as secure-session traffic.

pub const KEY_EXCHANGE_PREFIX: &str = "?TSK";
pub const SECURE_MESSAGE_PREFIX: &str = "?TSM";
pub const PREKEY_BUNDLE_PREFIX: &str = "?TSP";

pub fn is_key_exchange(body: &str) -> bool {
    body.starts_with(KEY_EXCHANGE_PREFIX)
}

/// Pre-key bundles carry an encrypted message, so they count as one here.
pub fn is_encrypted_message(body: &str) -> bool {
    body.starts_with(SECURE_MESSAGE_PREFIX) || body.starts_with(PREKEY_BUNDLE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert!(is_key_exchange("?TSKabc"));
        assert!(!is_key_exchange("?TSMabc"));
        assert!(is_encrypted_message("?TSMabc"));
        assert!(is_encrypted_message("?TSPabc"));
        assert!(!is_encrypted_message("hello ?TSM"));
        assert!(!is_encrypted_message("?tsm lowercase"));
    }
}
