use sha2::{Digest, Sha256};

/// Content digest in `sha256:<hex>` form.
pub fn content_digest(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest_known_value() {
        assert_eq!(
            content_digest(b"abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_digest_distinguishes_single_byte_change() {
        assert_ne!(content_digest(b"payload"), content_digest(b"payloaD"));
    }
}
