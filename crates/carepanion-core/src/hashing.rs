//! Deterministic content hashing for ratings.
//!
//! The digest is written into a permanent ledger record, so anyone holding the
//! rating fields must be able to recompute it. The pre-image is the plain
//! concatenation, without separators, of:
//!
//! `audio_id ∥ comfort_level ∥ clarity ∥ speaking_rate ∥ perceived_empathy ∥ notes`
//!
//! with integers in decimal, enums as their literal names, and absent notes as
//! the empty string. The digest is SHA-256 over the UTF-8 bytes.
//!
//! Do not change this layout: existing on-ledger attestations depend on it.

use sha2::{Digest, Sha256};

use crate::model::Rating;

/// Length of a content digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 digest of a rating's canonical string.
pub type ContentHash = [u8; DIGEST_LEN];

/// Build the canonical pre-image string for a rating.
pub fn canonical_string(rating: &Rating) -> String {
    format!(
        "{}{}{}{}{}{}",
        rating.audio_id(),
        rating.comfort_level(),
        rating.clarity(),
        rating.speaking_rate().as_str(),
        rating.perceived_empathy().as_str(),
        rating.notes().unwrap_or(""),
    )
}

/// Hash a rating.
pub fn content_hash(rating: &Rating) -> ContentHash {
    let mut h = Sha256::new();
    h.update(canonical_string(rating).as_bytes());
    h.finalize().into()
}

/// Hash a rating and return lowercase hex.
pub fn content_hash_hex(rating: &Rating) -> String {
    hex::encode(content_hash(rating))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PerceivedEmpathy, SpeakingRate};
    use proptest::prelude::*;

    fn rating(
        audio_id: u64,
        comfort: u8,
        clarity: u8,
        rate: SpeakingRate,
        empathy: PerceivedEmpathy,
        notes: Option<&str>,
    ) -> Rating {
        Rating::new(audio_id, comfort, clarity, rate, empathy, notes.map(str::to_string)).unwrap()
    }

    #[test]
    fn reference_rating_digest() {
        let r = rating(42, 4, 5, SpeakingRate::Fast, PerceivedEmpathy::High, Some(""));
        assert_eq!(canonical_string(&r), "4454FastHigh");
        assert_eq!(
            content_hash_hex(&r),
            "342d71aa76952a1f757aecf1f4cab933cd3dee18fb4404ed7490bf86d0fbe8f4"
        );
    }

    #[test]
    fn absent_and_empty_notes_hash_alike() {
        let a = rating(42, 4, 5, SpeakingRate::Fast, PerceivedEmpathy::High, None);
        let b = rating(42, 4, 5, SpeakingRate::Fast, PerceivedEmpathy::High, Some(""));
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn notes_are_hashed_verbatim() {
        let r = rating(1, 1, 1, SpeakingRate::Slow, PerceivedEmpathy::Low, Some("ช้าไป"));
        assert_eq!(canonical_string(&r), "111SlowLowช้าไป");
    }

    #[test]
    fn each_field_changes_the_digest() {
        let base = rating(42, 4, 5, SpeakingRate::Fast, PerceivedEmpathy::High, None);
        let variants = [
            rating(43, 4, 5, SpeakingRate::Fast, PerceivedEmpathy::High, None),
            rating(42, 3, 5, SpeakingRate::Fast, PerceivedEmpathy::High, None),
            rating(42, 4, 4, SpeakingRate::Fast, PerceivedEmpathy::High, None),
            rating(42, 4, 5, SpeakingRate::Slow, PerceivedEmpathy::High, None),
            rating(42, 4, 5, SpeakingRate::Fast, PerceivedEmpathy::Low, None),
            rating(42, 4, 5, SpeakingRate::Fast, PerceivedEmpathy::High, Some("x")),
        ];
        for v in &variants {
            assert_ne!(content_hash(&base), content_hash(v), "{v:?}");
        }
    }

    fn speaking_rate() -> impl Strategy<Value = SpeakingRate> {
        prop_oneof![
            Just(SpeakingRate::Slow),
            Just(SpeakingRate::Medium),
            Just(SpeakingRate::Fast)
        ]
    }

    fn empathy() -> impl Strategy<Value = PerceivedEmpathy> {
        prop_oneof![
            Just(PerceivedEmpathy::Low),
            Just(PerceivedEmpathy::Medium),
            Just(PerceivedEmpathy::High)
        ]
    }

    proptest! {
        #[test]
        fn digest_is_a_function_of_fields(
            audio_id in any::<u64>(),
            comfort in 1u8..=5,
            clarity in 1u8..=5,
            rate in speaking_rate(),
            emp in empathy(),
            notes in proptest::option::of(".{0,24}"),
        ) {
            let a = Rating::new(audio_id, comfort, clarity, rate, emp, notes.clone()).unwrap();
            let b = Rating::new(audio_id, comfort, clarity, rate, emp, notes).unwrap();
            prop_assert_eq!(content_hash(&a), content_hash(&b));
        }
    }
}
