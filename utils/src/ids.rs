//! Identifier generation.
//!
//! All identifiers share the shape `<PREFIX>_<millis>_<random base36>`:
//! a millisecond timestamp keeps them roughly sortable and the random
//! suffix separates ids minted within the same millisecond.

use fraudgate_types::Timestamp;
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `len` random characters from `[0-9a-z]`.
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Client session identifier, e.g. `session_1714564800123_k3j9x0a1b`.
pub fn generate_session_id(now: Timestamp) -> String {
    format!("session_{}_{}", now.as_millis(), random_base36(9))
}

/// Order / transaction identifier, e.g. `ORD_1714564800123_X8K2QZ`.
pub fn generate_order_id(now: Timestamp) -> String {
    format!(
        "ORD_{}_{}",
        now.as_millis(),
        random_base36(6).to_ascii_uppercase()
    )
}

/// Demo login token, e.g. `TKN_1714564800123_7FJ2K9QA`.
pub fn generate_token(now: Timestamp) -> String {
    format!(
        "TKN_{}_{}",
        now.as_millis(),
        random_base36(8).to_ascii_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split3(id: &str) -> (String, String, String) {
        let mut parts = id.splitn(3, '_');
        (
            parts.next().unwrap().to_string(),
            parts.next().unwrap().to_string(),
            parts.next().unwrap().to_string(),
        )
    }

    #[test]
    fn session_id_shape() {
        let id = generate_session_id(Timestamp::from_millis(42));
        let (prefix, millis, suffix) = split3(&id);
        assert_eq!(prefix, "session");
        assert_eq!(millis, "42");
        assert_eq!(suffix.len(), 9);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn order_id_is_uppercase() {
        let id = generate_order_id(Timestamp::from_millis(1_000));
        let (prefix, millis, suffix) = split3(&id);
        assert_eq!(prefix, "ORD");
        assert_eq!(millis, "1000");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn token_has_eight_char_suffix() {
        let (prefix, _, suffix) = split3(&generate_token(Timestamp::EPOCH));
        assert_eq!(prefix, "TKN");
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn ids_differ_within_same_millisecond() {
        let now = Timestamp::from_millis(7);
        let a = generate_session_id(now);
        let b = generate_session_id(now);
        assert_ne!(a, b);
    }
}
