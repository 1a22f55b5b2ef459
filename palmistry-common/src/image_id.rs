use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

const IMAGE_ID_BYTES: usize = 32;

/// Length of an encoded image id (32 bytes, unpadded url-safe base64).
pub const IMAGE_ID_LEN: usize = 43;

pub fn generate_image_id<Rng: RngCore>(rng: &mut Rng) -> String {
    let mut id = [0u8; IMAGE_ID_BYTES];
    rng.fill_bytes(&mut id);

    URL_SAFE_NO_PAD.encode(id)
}

/// Ids arrive from URLs and end up in file paths, so anything outside the
/// url-safe alphabet is rejected.
pub fn is_valid_image_id(id: &str) -> bool {
    id.len() == IMAGE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn test_generated_id_is_valid() {
        let mut rng = ChaCha20Rng::from_seed([7; 32]);
        for _ in 0..100 {
            let id = generate_image_id(&mut rng);
            assert_eq!(id.len(), IMAGE_ID_LEN);
            assert!(is_valid_image_id(&id), "{id}");
        }
    }

    #[test]
    fn test_generated_ids_differ() {
        let mut rng = Pcg64Mcg::new(42);
        let a = generate_image_id(&mut rng);
        let b = generate_image_id(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_reject_malformed_ids() {
        assert!(!is_valid_image_id(""));
        assert!(!is_valid_image_id("1700000000000-abc123"));
        assert!(!is_valid_image_id(&"a".repeat(IMAGE_ID_LEN + 1)));
        let traversal = format!("../{}", "a".repeat(IMAGE_ID_LEN - 3));
        assert!(!is_valid_image_id(&traversal));
        assert!(is_valid_image_id(&"a".repeat(IMAGE_ID_LEN)));
    }
}
