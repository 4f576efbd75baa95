//! Identifier and timestamp helpers

use chrono::Utc;
use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LENGTH: usize = 9;

/// Random 9-character base-36 identifier used for courses, sections,
/// notes, certificates and transactions.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Current time in nanoseconds since the Unix epoch.
///
/// Entity timestamps follow the 64-bit nanosecond convention of the chain
/// the backend services were modelled on.
pub fn now_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|nanos| u64::try_from(nanos).ok())
        .unwrap_or(0)
}

/// Current time in milliseconds, used for the aggregate's `lastUpdated`.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_base36() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_nanos_scale_matches_millis() {
        let millis = now_millis();
        let nanos = now_nanos();
        let nanos_as_millis = (nanos / 1_000_000) as i64;
        assert!((nanos_as_millis - millis).abs() < 1_000);
    }
}
