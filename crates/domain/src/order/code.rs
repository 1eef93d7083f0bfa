//! Human-readable order codes.
//!
//! Codes look like `OD-20240315-7KQ2`: a fixed prefix, the UTC date, and four
//! random characters from `[A-Z0-9]`. A candidate is checked against the
//! orders collection before use. The unique key on the collection remains
//! the final guard against two concurrent checkouts picking the same code.

use chrono::{DateTime, Utc};
use document_store::{Session, StoreError};
use rand::Rng;

use super::repository::ORDERS;

/// Characters a random suffix is drawn from.
pub const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a random suffix.
pub const SUFFIX_LEN: usize = 4;

/// Number of random candidates tried before falling back to the clock.
pub const MAX_RANDOM_ATTEMPTS: usize = 5;

/// Length of the clock-derived suffix.
pub const FALLBACK_SUFFIX_LEN: usize = 6;

const PREFIX: &str = "OD";

const BASE36_DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Source of random suffixes.
pub trait SuffixSource: Send + Sync {
    /// Returns a suffix of [`SUFFIX_LEN`] characters from [`SUFFIX_ALPHABET`].
    fn next_suffix(&self) -> String;
}

/// Draws suffixes from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> String {
        let mut rng = rand::rng();
        (0..SUFFIX_LEN)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
            .collect()
    }
}

/// Generates order codes that do not exist yet.
#[derive(Debug, Clone, Default)]
pub struct OrderCodeGenerator<R = RandomSuffix> {
    suffixes: R,
}

impl OrderCodeGenerator<RandomSuffix> {
    /// Creates a generator backed by the thread-local RNG.
    pub fn new() -> Self {
        Self {
            suffixes: RandomSuffix,
        }
    }
}

impl<R: SuffixSource> OrderCodeGenerator<R> {
    /// Creates a generator with a custom suffix source.
    pub fn with_source(suffixes: R) -> Self {
        Self { suffixes }
    }

    /// Returns a code not present in the orders collection as seen by
    /// `session`.
    ///
    /// Tries [`MAX_RANDOM_ATTEMPTS`] random suffixes, then falls back to a
    /// suffix derived from the clock. Only store errors make this fail.
    #[tracing::instrument(skip(self, session))]
    pub async fn generate(
        &self,
        session: &mut dyn Session,
        now: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let prefix = date_prefix(now);

        for attempt in 1..=MAX_RANDOM_ATTEMPTS {
            let candidate = format!("{prefix}-{}", self.suffixes.next_suffix());
            if !session.key_exists(ORDERS, &candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(attempt, %candidate, "order code collision");
        }

        let code = format!("{prefix}-{}", fallback_suffix(now));
        tracing::warn!(%code, "random order codes exhausted, using clock suffix");
        Ok(code)
    }
}

/// Returns `OD-YYYYMMDD` for the given instant.
fn date_prefix(now: DateTime<Utc>) -> String {
    format!("{PREFIX}-{}", now.format("%Y%m%d"))
}

/// Encodes the epoch milliseconds in upper-case base 36 and keeps the last
/// [`FALLBACK_SUFFIX_LEN`] characters.
pub fn fallback_suffix(now: DateTime<Utc>) -> String {
    let encoded = to_base36(now.timestamp_millis().unsigned_abs());
    let start = encoded.len().saturating_sub(FALLBACK_SUFFIX_LEN);
    encoded[start..].to_string()
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Returns true if `code` has the regular `OD-YYYYMMDD-XXXX` shape.
///
/// Codes produced by the clock fallback have a longer suffix and do not
/// match.
pub fn is_well_formed(code: &str) -> bool {
    let mut parts = code.split('-');
    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == PREFIX
        && date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use document_store::{Document, DocumentStore, InMemoryDocumentStore, SessionMode};

    use super::*;

    /// Hands out a fixed sequence of suffixes.
    struct Scripted(Mutex<Vec<&'static str>>);

    impl Scripted {
        fn new(mut suffixes: Vec<&'static str>) -> Self {
            suffixes.reverse();
            Self(Mutex::new(suffixes))
        }
    }

    impl SuffixSource for Scripted {
        fn next_suffix(&self) -> String {
            self.0.lock().unwrap().pop().unwrap_or("ZZZZ").to_string()
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    async fn store_with_codes(codes: &[&str]) -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        for code in codes {
            store
                .insert(Document::new(ORDERS, *code, serde_json::json!({"code": code})))
                .await
                .unwrap();
        }
        store
    }

    #[test]
    fn random_suffix_uses_alphabet() {
        for _ in 0..100 {
            let suffix = RandomSuffix.next_suffix();
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn generates_well_formed_code() {
        let store = InMemoryDocumentStore::new();
        let mut session = store.start_session(SessionMode::Autocommit).await.unwrap();

        let code = OrderCodeGenerator::new()
            .generate(session.as_mut(), at())
            .await
            .unwrap();

        assert!(code.starts_with("OD-20240315-"));
        assert!(is_well_formed(&code));
    }

    #[tokio::test]
    async fn skips_existing_codes() {
        let store = store_with_codes(&["OD-20240315-AAAA", "OD-20240315-BBBB"]).await;
        let mut session = store.start_session(SessionMode::Autocommit).await.unwrap();

        let generator = OrderCodeGenerator::with_source(Scripted::new(vec!["AAAA", "BBBB", "CCCC"]));
        let code = generator.generate(session.as_mut(), at()).await.unwrap();

        assert_eq!(code, "OD-20240315-CCCC");
    }

    #[tokio::test]
    async fn falls_back_to_clock_after_five_collisions() {
        let store = store_with_codes(&["OD-20240315-AAAA"]).await;
        let mut session = store.start_session(SessionMode::Autocommit).await.unwrap();

        let generator = OrderCodeGenerator::with_source(Scripted::new(vec!["AAAA"; 5]));
        let code = generator.generate(session.as_mut(), at()).await.unwrap();

        assert_eq!(code, format!("OD-20240315-{}", fallback_suffix(at())));
        assert!(!is_well_formed(&code));
    }

    #[tokio::test]
    async fn sees_codes_staged_in_the_same_transaction() {
        let store = InMemoryDocumentStore::new();
        let mut session = store
            .start_session(SessionMode::Transactional)
            .await
            .unwrap();
        session
            .insert(Document::new(ORDERS, "OD-20240315-AAAA", serde_json::json!({})))
            .await
            .unwrap();

        let generator = OrderCodeGenerator::with_source(Scripted::new(vec!["AAAA", "BBBB"]));
        let code = generator.generate(session.as_mut(), at()).await.unwrap();

        assert_eq!(code, "OD-20240315-BBBB");
        session.abort().await.unwrap();
    }

    #[test]
    fn fallback_suffix_is_last_six_base36_digits() {
        let now = at();
        let full = to_base36(now.timestamp_millis() as u64);
        let suffix = fallback_suffix(now);

        assert_eq!(suffix.len(), FALLBACK_SUFFIX_LEN);
        assert!(full.ends_with(&suffix));
        assert!(suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)));
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "ZZ");
    }

    #[test]
    fn well_formed_check() {
        assert!(is_well_formed("OD-20240315-7KQ2"));
        assert!(!is_well_formed("OD-2024031-7KQ2"));
        assert!(!is_well_formed("OD-20240315-7kq2"));
        assert!(!is_well_formed("XX-20240315-7KQ2"));
        assert!(!is_well_formed("OD-20240315-7KQ2-1"));
    }
}
