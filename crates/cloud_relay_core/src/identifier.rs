use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

pub const IDENTIFIER_BYTES: usize = 16;

/// Returns 128 bits from the OS random source, URL-safe base64 encoded with
/// the padding stripped.
pub fn generate_unique_string() -> String {
    let mut bytes = [0u8; IDENTIFIER_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn identifier_is_url_safe_without_padding() {
        let value = generate_unique_string();

        assert_eq!(value.len(), 22);
        assert!(value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
    }

    #[test]
    fn identifier_decodes_back_to_sixteen_bytes() {
        let value = generate_unique_string();
        let decoded = URL_SAFE_NO_PAD
            .decode(value.as_bytes())
            .expect("identifier should be valid base64");

        assert_eq!(decoded.len(), IDENTIFIER_BYTES);
    }

    #[test]
    fn identifiers_do_not_repeat() {
        let values: HashSet<String> = (0..1_000).map(|_| generate_unique_string()).collect();
        assert_eq!(values.len(), 1_000);
    }
}
